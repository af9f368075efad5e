//! Durable recipe storage keyed by id, unique on source URL.
//!
//! Every operation checks out one pooled connection on the blocking pool and hands it
//! back when the closure returns, whatever the outcome.

use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use ladle_core::{OwnerId, Recipe, RecipeCandidate, RecipeId, RecipeUpdate};
use thiserror::Error;

use crate::db::DbPool;
use crate::models::{encode_lines, NewRecipe, RecipeChangeset, RecipeRow};
use crate::schema::recipes;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("A recipe for this source URL already exists")]
    Conflict,

    #[error("Database connection failed: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Database query failed: {0}")]
    Query(#[from] DieselError),

    #[error("Stored {field} is not a JSON array of strings: {reason}")]
    Corrupt { field: &'static str, reason: String },

    #[error("Database task failed: {0}")]
    Task(String),

    #[error("Recipe disappeared between a conflicting insert and the re-read")]
    Vanished,
}

#[derive(Clone)]
pub struct RecipeStore {
    pool: Arc<DbPool>,
}

impl RecipeStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let _span = tracing::debug_span!("db.query", op).entered();
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Exact match on the stored URL string.
    pub async fn find_by_source_url(&self, url: &str) -> Result<Option<Recipe>, StoreError> {
        let url = url.to_string();
        self.run("find_by_source_url", move |conn| {
            recipes::table
                .filter(recipes::source_url.eq(&url))
                .select(RecipeRow::as_select())
                .first(conn)
                .optional()?
                .map(RecipeRow::into_recipe)
                .transpose()
        })
        .await
    }

    /// Insert a new record. Fails with [`StoreError::Conflict`] when `source_url` is taken.
    pub async fn insert(
        &self,
        candidate: RecipeCandidate,
        source_url: &str,
        owner_id: OwnerId,
    ) -> Result<Recipe, StoreError> {
        let source_url = source_url.to_string();
        self.run("insert", move |conn| {
            let new_recipe = NewRecipe {
                owner_id,
                name: &candidate.name,
                ingredients: encode_lines("ingredients", &candidate.ingredients)?,
                instructions: encode_lines("instructions", &candidate.instructions)?,
                image_url: candidate.image_url.as_deref(),
                source_url: &source_url,
            };

            diesel::insert_into(recipes::table)
                .values(&new_recipe)
                .returning(RecipeRow::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        StoreError::Conflict
                    }
                    other => StoreError::Query(other),
                })?
                .into_recipe()
        })
        .await
    }

    /// All records of one owner, oldest first. Empty when the owner has none.
    pub async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Recipe>, StoreError> {
        self.run("list_by_owner", move |conn| {
            recipes::table
                .filter(recipes::owner_id.eq(owner_id))
                .order(recipes::id.asc())
                .select(RecipeRow::as_select())
                .load(conn)?
                .into_iter()
                .map(RecipeRow::into_recipe)
                .collect()
        })
        .await
    }

    pub async fn get_by_id(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
        self.run("get_by_id", move |conn| {
            recipes::table
                .find(id)
                .select(RecipeRow::as_select())
                .first(conn)
                .optional()?
                .map(RecipeRow::into_recipe)
                .transpose()
        })
        .await
    }

    /// Apply the supplied fields. `None` when `id` does not exist.
    /// An empty update returns the current record without writing.
    pub async fn update_fields(
        &self,
        id: RecipeId,
        update: RecipeUpdate,
    ) -> Result<Option<Recipe>, StoreError> {
        self.run("update_fields", move |conn| {
            conn.immediate_transaction(|conn| {
                let Some(current) = recipes::table
                    .find(id)
                    .select(RecipeRow::as_select())
                    .first(conn)
                    .optional()?
                else {
                    return Ok(None);
                };

                if update.is_empty() {
                    return current.into_recipe().map(Some);
                }

                let changes = RecipeChangeset::from_update(update, Utc::now().naive_utc())?;
                diesel::update(recipes::table.find(id))
                    .set(&changes)
                    .returning(RecipeRow::as_returning())
                    .get_result(conn)?
                    .into_recipe()
                    .map(Some)
            })
        })
        .await
    }

    /// True when a record existed and was removed.
    pub async fn delete(&self, id: RecipeId) -> Result<bool, StoreError> {
        self.run("delete", move |conn| {
            let removed = diesel::delete(recipes::table.find(id)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}
