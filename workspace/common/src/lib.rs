//! Common transport-layer types shared between the backend and a frontend.
//! These structs mirror the backend handlers' response payloads so a
//! rendering layer can deserialize API responses without duplicating shapes.

mod filter;
mod metrics;

pub use filter::{ALL_REGIONS, FilterCriteria, FilterOptions, RegionFilter};
pub use metrics::{MetricsResult, MonthlyRevenue, ProductRevenue, RegionRevenue, SalesRow};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
/// Note: The backend has its own definition in salesdash/src/schemas.rs with
/// the same field names. We mirror it here for a frontend to reuse.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}
