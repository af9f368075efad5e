use crate::api::{ApiJson, ErrorResponse};
use crate::auth::AuthUser;
use crate::service::ServiceError;
use crate::AppState;
use axum::{extract::State, Json};
use ladle_core::RecipeUpdate;
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use super::get::RecipeResponse;
use super::RecipeIdPath;

/// Fields to change. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    /// `null` removes the image.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdateRecipeRequest> for RecipeUpdate {
    fn from(request: UpdateRecipeRequest) -> Self {
        RecipeUpdate {
            name: request.name,
            ingredients: request.ingredients,
            instructions: request.instructions,
            image_url: request.image_url,
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(owner_id): AuthUser,
    State(state): State<AppState>,
    RecipeIdPath(id): RecipeIdPath,
    ApiJson(request): ApiJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ServiceError> {
    let recipe = state.recipes.update(id, owner_id, request.into()).await?;
    Ok(Json(recipe.into()))
}
