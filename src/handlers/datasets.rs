use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use common::FilterOptions;
use model::{Dataset, ParseError};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::repository::{DatasetError, DatasetOrPending};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::sessions::AccessError;

/// Shape of a stored dataset, for status and upload responses
#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetSummary {
    /// Number of data rows
    pub rows: usize,
    /// Distinct years present, ascending
    pub years: Vec<i32>,
    /// Distinct regions present, ascending
    pub regions: Vec<String>,
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        Self {
            rows: dataset.len(),
            years: dataset.distinct_years(),
            regions: dataset.distinct_regions(),
        }
    }
}

/// Whether the user's dataset is stored or still awaited
#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetStatusResponse {
    /// "ready" or "pending_upload"
    pub status: String,
    /// Present when the dataset is stored; for uploads, whether the store
    /// already held a dataset (first upload is sticky)
    pub summary: Option<DatasetSummary>,
    pub existing: Option<bool>,
}

/// Dataset status for a user
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{username}",
    tag = "datasets",
    params(
        ("username" = String, Path, description = "Account the dataset belongs to"),
    ),
    responses(
        (status = 200, description = "Dataset status retrieved", body = ApiResponse<DatasetStatusResponse>),
        (status = 401, description = "Session not authenticated", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 500, description = "Stored dataset is corrupt", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn get_dataset(
    Path(username): Path<String>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ApiResponse<DatasetStatusResponse>>, (StatusCode, Json<ErrorResponse>)> {
    state
        .sessions
        .require_user(&jar, &username)
        .map_err(deny)?;

    match state.repo.load_or_request_upload(&username).await {
        Ok(DatasetOrPending::Ready(dataset)) => {
            debug!("Dataset for '{}' loaded with {} rows", username, dataset.len());
            let response = ApiResponse {
                data: DatasetStatusResponse {
                    status: "ready".to_string(),
                    summary: Some(DatasetSummary::from(&dataset)),
                    existing: None,
                },
                message: "Dataset loaded".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(DatasetOrPending::PendingUpload) => {
            debug!("No dataset stored for '{}' yet", username);
            let response = ApiResponse {
                data: DatasetStatusResponse {
                    status: "pending_upload".to_string(),
                    summary: None,
                    existing: None,
                },
                message: "No dataset stored yet, upload one".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(e) => Err(dataset_error(&username, e)),
    }
}

/// Upload a dataset for a user
///
/// The body is raw CSV with the required header. If the user already has a
/// dataset the stored one is kept and returned (first upload is sticky).
#[utoipa::path(
    post,
    path = "/api/v1/datasets/{username}",
    tag = "datasets",
    request_body(content = String, content_type = "text/csv"),
    params(
        ("username" = String, Path, description = "Account the dataset belongs to"),
    ),
    responses(
        (status = 201, description = "Dataset parsed and stored", body = ApiResponse<DatasetStatusResponse>),
        (status = 200, description = "A dataset was already stored and is kept", body = ApiResponse<DatasetStatusResponse>),
        (status = 400, description = "Body is not parseable as the expected CSV", body = ErrorResponse),
        (status = 401, description = "Session not authenticated", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, body))]
pub async fn upload_dataset(
    Path(username): Path<String>,
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<DatasetStatusResponse>>), (StatusCode, Json<ErrorResponse>)> {
    state
        .sessions
        .require_user(&jar, &username)
        .map_err(deny)?;

    debug!("Upload of {} bytes for '{}'", body.len(), username);

    match state.repo.save_uploaded(&username, &body).await {
        Ok(saved) => {
            let status = if saved.existing {
                info!("Kept existing dataset for '{}'", username);
                StatusCode::OK
            } else {
                info!("Stored new dataset for '{}' ({} rows)", username, saved.dataset.len());
                StatusCode::CREATED
            };
            let message = if saved.existing {
                "A dataset was already stored for this user and is kept"
            } else {
                "Dataset parsed and stored"
            };
            let response = ApiResponse {
                data: DatasetStatusResponse {
                    status: "ready".to_string(),
                    summary: Some(DatasetSummary::from(&saved.dataset)),
                    existing: Some(saved.existing),
                },
                message: message.to_string(),
                success: true,
            };
            Ok((status, Json(response)))
        }
        Err(e) => Err(dataset_error(&username, e)),
    }
}

/// Filter values the user's dataset supports
///
/// Clients populate the year and region widgets from this; filter values
/// outside these lists are a caller contract violation.
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{username}/filters",
    tag = "datasets",
    params(
        ("username" = String, Path, description = "Account the dataset belongs to"),
    ),
    responses(
        (status = 200, description = "Filter options retrieved", body = ApiResponse<FilterOptions>),
        (status = 401, description = "Session not authenticated", body = ErrorResponse),
        (status = 403, description = "Session belongs to another user", body = ErrorResponse),
        (status = 404, description = "No dataset uploaded yet", body = ErrorResponse),
        (status = 500, description = "Stored dataset is corrupt", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar))]
pub async fn get_filter_options(
    Path(username): Path<String>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ApiResponse<FilterOptions>>, (StatusCode, Json<ErrorResponse>)> {
    state
        .sessions
        .require_user(&jar, &username)
        .map_err(deny)?;

    match state.repo.load_or_request_upload(&username).await {
        Ok(DatasetOrPending::Ready(dataset)) => {
            let response = ApiResponse {
                data: compute::filter_options(&dataset),
                message: "Filter options retrieved".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(DatasetOrPending::PendingUpload) => Err(not_uploaded(&username)),
        Err(e) => Err(dataset_error(&username, e)),
    }
}

/// Map a session access failure to an error response.
pub(crate) fn deny(err: AccessError) -> (StatusCode, Json<ErrorResponse>) {
    warn!("Request denied: {}", err);
    (
        err.status(),
        Json(ErrorResponse::new(err.to_string(), err.code())),
    )
}

/// 404 for a user without a stored dataset.
pub(crate) fn not_uploaded(username: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            format!("No dataset uploaded for '{username}' yet"),
            "DATASET_NOT_UPLOADED",
        )),
    )
}

/// Map repository failures to error responses.
pub(crate) fn dataset_error(username: &str, err: DatasetError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        DatasetError::Invalid(ParseError::MissingRequiredColumn(column)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Required column '{column}' is missing from the header"),
                "MISSING_REQUIRED_COLUMN",
            )),
        ),
        DatasetError::Invalid(ParseError::MalformedFormat(message)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Input is not parseable as tabular data: {message}"),
                "MALFORMED_FORMAT",
            )),
        ),
        DatasetError::Corrupt { .. } => {
            // Hard stop for this user's data until the file is repaired.
            error!("Stored dataset for '{}' is corrupt: {}", username, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    format!("Stored dataset for '{username}' is corrupt"),
                    "CORRUPT_DATASET",
                )),
            )
        }
        DatasetError::Io(io_error) => {
            error!("Dataset storage error for '{}': {}", username, io_error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal server error while accessing the dataset",
                    "INTERNAL_ERROR",
                )),
            )
        }
    }
}
