//! The URL-to-recipe pipeline: cache lookup, then fetch, normalize, extract and persist.

mod error;

pub use error::{PipelineError, Stage};

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use ladle_core::{
    ContentFetcher, ContentNormalizer, FetchError, OwnerId, Recipe, RecipeExtractor,
};
use tracing::Instrument;
use url::Url;

use crate::store::{RecipeStore, StoreError};

/// Hosts recipes may be imported from. An empty allowlist allows every host.
#[derive(Debug, Clone, Default)]
pub struct HostAllowlist {
    hosts: Vec<String>,
}

impl HostAllowlist {
    pub fn new(hosts: impl IntoIterator<Item = String>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Entries match the bare host or `host:port`.
    pub fn allows(&self, url: &Url) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let host_with_port = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.clone(),
        };
        self.hosts
            .iter()
            .any(|allowed| *allowed == host || *allowed == host_with_port)
    }
}

/// Drives one URL through the stages. Each stage failure ends the run; nothing is
/// persisted unless every stage before `persist` succeeded.
pub struct Pipeline {
    store: RecipeStore,
    fetcher: Arc<dyn ContentFetcher>,
    normalizer: Arc<dyn ContentNormalizer>,
    extractor: Arc<RecipeExtractor>,
}

async fn step<F: Future>(stage: Stage, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut
        .instrument(tracing::info_span!("pipeline_step", step = stage.as_str()))
        .await;
    tracing::debug!(
        step = stage.as_str(),
        duration_ms = started.elapsed().as_millis() as u64,
        "pipeline step finished"
    );
    output
}

impl Pipeline {
    pub fn new(
        store: RecipeStore,
        fetcher: Arc<dyn ContentFetcher>,
        normalizer: Arc<dyn ContentNormalizer>,
        extractor: Arc<RecipeExtractor>,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
            extractor,
        }
    }

    /// Return the recipe stored for `url`, importing it first when there is none.
    ///
    /// The cache is shared by all owners: a hit returns the stored record as-is,
    /// original `owner_id` included.
    pub async fn obtain(&self, url: &str, owner_id: OwnerId) -> Result<Recipe, PipelineError> {
        let result = self.run(url, owner_id).await;
        if let Err(e) = &result {
            tracing::warn!(url, owner_id, stage = e.stage().as_str(), error = %e, "pipeline failed");
        }
        result
    }

    async fn run(&self, url: &str, owner_id: OwnerId) -> Result<Recipe, PipelineError> {
        let cached = step(Stage::CacheLookup, self.store.find_by_source_url(url))
            .await
            .map_err(PipelineError::store(Stage::CacheLookup))?;
        if let Some(recipe) = cached {
            tracing::info!(url, recipe_id = recipe.id, "cache hit");
            return Ok(recipe);
        }

        let raw = step(Stage::Fetch, self.fetcher.fetch(url)).await?;
        if raw.trim().is_empty() {
            return Err(FetchError::EmptyBody.into());
        }

        let normalizer = self.normalizer.clone();
        let base_url = url.to_string();
        let text = step(
            Stage::Normalize,
            tokio::task::spawn_blocking(move || normalizer.normalize(&raw, &base_url)),
        )
        .await
        .map_err(|e| PipelineError::Normalize(format!("normalizer task failed: {e}")))?;
        if text.trim().is_empty() {
            return Err(PipelineError::Normalize(
                "page has no extractable text".to_string(),
            ));
        }

        let candidate = step(Stage::Extract, self.extractor.extract(&text)).await?;

        match step(Stage::Persist, self.store.insert(candidate, url, owner_id)).await {
            Ok(recipe) => {
                tracing::info!(url, owner_id, recipe_id = recipe.id, "stored new recipe");
                Ok(recipe)
            }
            Err(StoreError::Conflict) => {
                tracing::info!(url, "another request stored this URL first, using its record");
                self.store
                    .find_by_source_url(url)
                    .await
                    .map_err(PipelineError::store(Stage::Persist))?
                    .ok_or(PipelineError::Store {
                        stage: Stage::Persist,
                        error: StoreError::Vanished,
                    })
            }
            Err(error) => Err(PipelineError::Store {
                stage: Stage::Persist,
                error,
            }),
        }
    }
}
