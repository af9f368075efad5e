use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::service::ServiceError;
use crate::AppState;
use axum::{extract::State, Json};

use super::get::RecipeResponse;

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "Recipes owned by the caller, oldest first", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(owner_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, ServiceError> {
    let recipes = state.recipes.list(owner_id).await?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}
