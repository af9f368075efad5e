use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::service::ServiceError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use super::get::RecipeResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    /// Page to import. Used verbatim as the cache key.
    pub url: String,
}

/// Import a recipe from a URL. A URL that was imported before, by anyone, returns the
/// stored record without refetching.
#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 200, description = "Imported or previously stored recipe", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "The page could not be turned into a recipe", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(owner_id): AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ServiceError> {
    let recipe = state.recipes.create(&request.url, owner_id).await?;
    Ok(Json(recipe.into()))
}
