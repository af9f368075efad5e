//! Owner-scoped recipe operations used by the HTTP layer.

use std::sync::Arc;

use ladle_core::{parse_http_url, OwnerId, Recipe, RecipeId, RecipeUpdate};
use thiserror::Error;

use crate::scraping::{HostAllowlist, Pipeline, PipelineError};
use crate::store::{RecipeStore, StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// The id does not exist or belongs to someone else. Callers cannot tell which.
    #[error("Recipe not found")]
    NotFound,

    #[error(transparent)]
    Processing(#[from] PipelineError),

    #[error("Storage failed: {0}")]
    Internal(#[from] StoreError),
}

#[derive(Clone)]
pub struct RecipeService {
    pipeline: Arc<Pipeline>,
    store: RecipeStore,
    allowlist: HostAllowlist,
}

impl RecipeService {
    pub fn new(pipeline: Arc<Pipeline>, store: RecipeStore) -> Self {
        Self {
            pipeline,
            store,
            allowlist: HostAllowlist::default(),
        }
    }

    pub fn with_allowlist(mut self, allowlist: HostAllowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Import `url` for `owner_id`, or return the record already stored for it.
    pub async fn create(&self, url: &str, owner_id: OwnerId) -> Result<Recipe, ServiceError> {
        let parsed = parse_http_url(url).map_err(ServiceError::Validation)?;
        if !self.allowlist.allows(&parsed) {
            return Err(ServiceError::Validation(format!(
                "Importing from {} is not allowed",
                parsed.host_str().unwrap_or_default()
            )));
        }

        // The caller's exact string is the cache key.
        Ok(self.pipeline.obtain(url, owner_id).await?)
    }

    pub async fn list(&self, owner_id: OwnerId) -> Result<Vec<Recipe>, ServiceError> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    pub async fn get(&self, id: RecipeId, owner_id: OwnerId) -> Result<Recipe, ServiceError> {
        self.owned(id, owner_id).await
    }

    pub async fn update(
        &self,
        id: RecipeId,
        owner_id: OwnerId,
        update: RecipeUpdate,
    ) -> Result<Recipe, ServiceError> {
        let current = self.owned(id, owner_id).await?;
        validate_update(&update)?;
        if update.is_empty() {
            return Ok(current);
        }

        let updated = self
            .store
            .update_fields(id, update)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!(recipe_id = id, owner_id, "recipe updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: RecipeId, owner_id: OwnerId) -> Result<(), ServiceError> {
        self.owned(id, owner_id).await?;
        if !self.store.delete(id).await? {
            // Removed by a concurrent request after the ownership check.
            return Err(ServiceError::NotFound);
        }
        tracing::info!(recipe_id = id, owner_id, "recipe deleted");
        Ok(())
    }

    /// Fetch by id, then compare owners, so that missing and foreign records look the same.
    async fn owned(&self, id: RecipeId, owner_id: OwnerId) -> Result<Recipe, ServiceError> {
        match self.store.get_by_id(id).await? {
            Some(recipe) if recipe.owner_id == owner_id => Ok(recipe),
            Some(_) => {
                tracing::debug!(recipe_id = id, owner_id, "recipe owned by someone else");
                Err(ServiceError::NotFound)
            }
            None => Err(ServiceError::NotFound),
        }
    }
}

fn validate_update(update: &RecipeUpdate) -> Result<(), ServiceError> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be blank".to_string()));
        }
    }
    if let Some(Some(image_url)) = &update.image_url {
        parse_http_url(image_url)
            .map_err(|e| ServiceError::Validation(format!("image_url: {e}")))?;
    }
    Ok(())
}
