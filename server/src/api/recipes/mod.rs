pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::service::ServiceError;
use crate::AppState;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::routing::get;
use axum::Router;
use ladle_core::RecipeId;
use utoipa::OpenApi;

/// The `{id}` path segment. An id that does not parse cannot name a stored recipe,
/// so it is answered like any other unknown id.
pub struct RecipeIdPath(pub RecipeId);

impl<S> FromRequestParts<S> for RecipeIdPath
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<RecipeId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(RecipeIdPath(id)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "unparseable recipe id");
                Err(ServiceError::NotFound)
            }
        }
    }
}

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        create::CreateRecipeRequest,
        get::RecipeResponse,
        update::UpdateRecipeRequest,
        delete::DeleteRecipeResponse,
    ))
)]
pub struct ApiDoc;
