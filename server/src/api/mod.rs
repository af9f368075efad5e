pub mod health;
pub mod recipes;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::scraping::Stage;
use crate::service::ServiceError;
use crate::AppState;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            ServiceError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
            ServiceError::Processing(e) => match e.stage() {
                Stage::Fetch | Stage::Normalize | Stage::Extract => {
                    // The stage detail was logged by the pipeline; clients only see the remote status.
                    let message = match e.remote_status() {
                        Some(status) => {
                            format!("Failed to process recipe: source returned HTTP {status}")
                        }
                        None => "Failed to process recipe".to_string(),
                    };
                    error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
                }
                Stage::CacheLookup | Stage::Persist => {
                    tracing::error!(error = %e, "recipe import failed in storage");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            ServiceError::Internal(e) => {
                tracing::error!(error = %e, "storage error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// `Json` that answers malformed bodies with an [`ErrorResponse`] instead of plain text.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let status = match rejection {
                    JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                Err(error_response(status, rejection.body_text()))
            }
        }
    }
}

/// All routes, with Swagger UI, bound to `state`.
pub fn router(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/recipes", recipes::router())
        .merge(swagger_ui)
        .with_state(state)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "ladle", description = "Import recipes from web pages"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> =
        vec![health::ApiDoc::openapi(), recipes::ApiDoc::openapi()];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
