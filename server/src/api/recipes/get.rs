use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::service::ServiceError;
use crate::AppState;
use axum::{extract::State, Json};
use ladle_core::{Recipe, RecipeId};
use serde::Serialize;
use utoipa::ToSchema;

use super::RecipeIdPath;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub owner_id: i64,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            image_url: recipe.image_url,
            source_url: recipe.source_url,
            owner_id: recipe.owner_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(owner_id): AuthUser,
    State(state): State<AppState>,
    RecipeIdPath(id): RecipeIdPath,
) -> Result<Json<RecipeResponse>, ServiceError> {
    let recipe = state.recipes.get(id, owner_id).await?;
    Ok(Json(recipe.into()))
}
