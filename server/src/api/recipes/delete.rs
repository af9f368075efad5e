use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::service::ServiceError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use super::RecipeIdPath;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteRecipeResponse {
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted", body = DeleteRecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(owner_id): AuthUser,
    State(state): State<AppState>,
    RecipeIdPath(id): RecipeIdPath,
) -> Result<Json<DeleteRecipeResponse>, ServiceError> {
    state.recipes.delete(id, owner_id).await?;
    Ok(Json(DeleteRecipeResponse {
        message: "Recipe deleted".to_string(),
    }))
}
