use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use common::{FilterCriteria, RegionFilter};
use tracing::{debug, instrument};

use crate::handlers::datasets::{dataset_error, deny, not_uploaded};
use crate::repository::DatasetOrPending;
use crate::schemas::{ApiResponse, AppState, CachedData, DashboardMetrics, ErrorResponse, MetricsQuery};

/// Filtered dashboard metrics for a user's dataset
///
/// Applies the year (and optional region) filter, then returns the four
/// KPIs, the three chart series and a preview of up to 20 filtered rows.
/// An empty filtered set yields zeros and empty series, not an error.
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{username}/metrics",
    tag = "metrics",
    params(
        ("username" = String, Path, description = "Account the dataset belongs to"),
        ("year" = i32, Query, description = "Year to filter on"),
        ("region" = Option<String>, Query, description = "Region to filter on; omitted or \"All\" means no restriction"),
    ),
    responses(
        (status = 200, description = "Metrics computed successfully", body = ApiResponse<DashboardMetrics>),
        (status = 401, description = "Session not authenticated", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 404, description = "No dataset uploaded yet", body = ErrorResponse),
        (status = 500, description = "Stored dataset is corrupt", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn get_metrics(
    Path(username): Path<String>,
    Query(query): Query<MetricsQuery>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ApiResponse<DashboardMetrics>>, (StatusCode, Json<ErrorResponse>)> {
    state
        .sessions
        .require_user(&jar, &username)
        .map_err(deny)?;

    // Create cache key. Sound because stored datasets are immutable.
    let cache_key = format!("metrics_{}_{:?}", username, query);

    // Check cache first
    if let Some(CachedData::Metrics(cached)) = state.cache.get(&cache_key).await {
        debug!("Metrics for '{}' served from cache", username);
        let response = ApiResponse {
            data: cached,
            message: "Metrics retrieved from cache".to_string(),
            success: true,
        };
        return Ok(Json(response));
    }

    let dataset = match state.repo.load_or_request_upload(&username).await {
        Ok(DatasetOrPending::Ready(dataset)) => dataset,
        Ok(DatasetOrPending::PendingUpload) => return Err(not_uploaded(&username)),
        Err(e) => return Err(dataset_error(&username, e)),
    };

    let filter = FilterCriteria::new(query.year, RegionFilter::from(query.region));
    let metrics = compute::compute_metrics(&dataset.records, &filter);
    let preview = compute::preview(&dataset.records, &filter, compute::PREVIEW_ROWS);

    let dashboard = DashboardMetrics {
        filter,
        metrics,
        preview,
    };

    // Cache the result
    state
        .cache
        .insert(cache_key, CachedData::Metrics(dashboard.clone()))
        .await;

    let response = ApiResponse {
        data: dashboard,
        message: "Metrics computed successfully".to_string(),
        success: true,
    };

    Ok(Json(response))
}
