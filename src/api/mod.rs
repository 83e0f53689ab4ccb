//! HTTP layer: event stream and system handlers, DTOs, router composition.
//!
//! Event endpoints are mounted under `/api`; `/health` sits at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the HTTP surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(handlers::events::event_stream, handlers::system::health_handler),
    components(schemas(ErrorResponse, ErrorBody, handlers::system::HealthResponse)),
    tags(
        (name = "Events", description = "Device event streams"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete router with all HTTP endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/event"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
