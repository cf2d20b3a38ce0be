use crate::handlers::{
    auth::{login, logout, register},
    datasets::{get_dataset, get_filter_options, upload_dataset},
    health::health_check,
    metrics::get_metrics,
    session::{enter_dashboard, get_session},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        // Session routes
        .route("/api/v1/session", get(get_session))
        .route("/api/v1/session/dashboard", post(enter_dashboard))
        // Dataset routes
        .route("/api/v1/datasets/:username", get(get_dataset))
        .route("/api/v1/datasets/:username", post(upload_dataset))
        .route("/api/v1/datasets/:username/filters", get(get_filter_options))
        // Metrics routes
        .route("/api/v1/datasets/:username/metrics", get(get_metrics))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
