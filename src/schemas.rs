use common::{FilterCriteria, FilterOptions, MetricsResult, MonthlyRevenue, ProductRevenue, RegionFilter, RegionRevenue, SalesRow};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::repository::DatasetRepository;
use crate::sessions::SessionStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection (credential store)
    pub db: DatabaseConnection,
    /// Per-user dataset files
    pub repo: DatasetRepository,
    /// Live browser sessions
    pub sessions: SessionStore,
    /// Cache for computed metrics. Stored datasets are immutable, so a
    /// cached entry can only age out, never go stale.
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Metrics(DashboardMetrics),
}

/// Query parameters for the metrics endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct MetricsQuery {
    /// Year to filter on (e.g. 2023); must be one of the dataset's years
    pub year: i32,
    /// Region to filter on; omitted or "All" means no restriction
    pub region: Option<String>,
}

/// Everything the rendering layer needs for one filtered view: the four
/// KPI scalars, the three series, and a raw-row preview.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardMetrics {
    /// The filter these numbers were computed for
    pub filter: FilterCriteria,
    pub metrics: MetricsResult,
    /// Up to 20 filtered rows for tabular display
    pub preview: Vec<SalesRow>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::session::get_session,
        crate::handlers::session::enter_dashboard,
        crate::handlers::datasets::get_dataset,
        crate::handlers::datasets::upload_dataset,
        crate::handlers::datasets::get_filter_options,
        crate::handlers::metrics::get_metrics,
    ),
    components(
        schemas(
            ApiResponse<DashboardMetrics>,
            ApiResponse<FilterOptions>,
            ErrorResponse,
            HealthResponse,
            MetricsQuery,
            DashboardMetrics,
            FilterCriteria,
            RegionFilter,
            FilterOptions,
            MetricsResult,
            MonthlyRevenue,
            ProductRevenue,
            RegionRevenue,
            SalesRow,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AccountResponse,
            crate::handlers::session::SessionResponse,
            crate::handlers::datasets::DatasetStatusResponse,
            crate::handlers::datasets::DatasetSummary,
            crate::sessions::Stage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and logout"),
        (name = "session", description = "Per-browser session state"),
        (name = "datasets", description = "Per-user dataset upload and status"),
        (name = "metrics", description = "Filtered dashboard metrics"),
    ),
    info(
        title = "SalesDash API",
        description = "Sales Analytics Dashboard backend - per-user sales datasets with filtered KPI and chart aggregates",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
