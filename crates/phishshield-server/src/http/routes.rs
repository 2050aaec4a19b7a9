//! HTTP API route definitions.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{self, AppState};

/// Build the router. With `cors_enabled` every origin, method and header is
/// allowed.
pub fn create_router(app_state: AppState, cors_enabled: bool) -> Router {
    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/predict_url", post(handlers::predict_url))
        .with_state(app_state);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any);
        app.layer(cors)
    } else {
        app
    }
}
