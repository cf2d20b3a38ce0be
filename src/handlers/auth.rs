use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use model::entities::account;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::credentials::{AccountError, AuthError, CredentialStore};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::sessions::{SESSION_COOKIE, Session, session_id};

/// Request body for registering a new account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Username (must be unique)
    #[validate(length(min = 1))]
    pub username: String,
    /// Human-readable name shown in the dashboard greeting
    #[validate(length(min = 1))]
    pub display_name: String,
    /// Password (stored only as a salted hash)
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account response model
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub username: String,
    pub display_name: String,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            username: model.username,
            display_name: model.display_name,
        }
    }
}

/// Register a new account
///
/// Registering does not log the user in and does not change the session
/// stage; the client follows up with a login.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Empty username, display name or password", body = ErrorResponse),
        (status = 409, description = "Username already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Registering account with username: {}", request.username);

    if request.validate().is_err() {
        warn!("Registration rejected: empty field");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Username, display name and password must not be empty",
                "INVALID_INPUT",
            )),
        ));
    }

    let store = CredentialStore::new(state.db.clone());
    match store
        .register(&request.username, &request.display_name, &request.password)
        .await
    {
        Ok(stored) => {
            info!("Account '{}' registered successfully", stored.username);
            let response = ApiResponse {
                data: AccountResponse::from(stored),
                message: "Account registered successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(AccountError::DuplicateUsername(username)) => {
            warn!("Registration rejected: username '{}' already exists", username);
            Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse::new(
                    format!("Username '{username}' is already registered"),
                    "DUPLICATE_USERNAME",
                )),
            ))
        }
        Err(AccountError::InvalidInput) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Username, display name and password must not be empty",
                "INVALID_INPUT",
            )),
        )),
        Err(e) => {
            error!("Failed to register account '{}': {}", request.username, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal server error while registering account",
                    "INTERNAL_ERROR",
                )),
            ))
        }
    }
}

/// Log in with username and password
///
/// On success the session identified by the `session` cookie becomes
/// authenticated as that user; a fresh session is created when the request
/// carries no valid cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AccountResponse>),
        (status = 401, description = "Unknown user or wrong password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, jar, request))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AccountResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Login attempt for username: {}", request.username);

    let store = CredentialStore::new(state.db.clone());
    let account = match store.login(&request.username, &request.password).await {
        Ok(account) => account,
        Err(AuthError::UserNotFound(username)) => {
            warn!("Login failed: no account '{}'", username);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    format!("No account with username '{username}'"),
                    "USER_NOT_FOUND",
                )),
            ));
        }
        Err(AuthError::InvalidPassword) => {
            warn!("Login failed: wrong password for '{}'", request.username);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid password", "INVALID_PASSWORD")),
            ));
        }
        Err(e) => {
            error!("Login failed for '{}': {}", request.username, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal server error during login",
                    "INTERNAL_ERROR",
                )),
            ));
        }
    };

    let (jar, id) = ensure_session(&state, jar);
    state.sessions.update(&id, |s| s.login(&account.username));
    info!("User '{}' logged in", account.username);

    let response = ApiResponse {
        data: AccountResponse::from(account),
        message: "Login successful".to_string(),
        success: true,
    };
    Ok((jar, Json(response)))
}

/// Log out of the current session
///
/// Resets the session to the landing state. Always succeeds, with or
/// without an authenticated session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session reset to landing", body = ApiResponse<String>)
    )
)]
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<String>>) {
    let (jar, id) = ensure_session(&state, jar);
    state.sessions.update(&id, Session::logout);
    debug!("Session {} reset to landing", id);

    let response = ApiResponse {
        data: "logged out".to_string(),
        message: "Session reset".to_string(),
        success: true,
    };
    (jar, Json(response))
}

/// The session attached to the request, creating one (and setting the
/// cookie) when the request carries none.
pub fn ensure_session(state: &AppState, jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = session_id(&jar) {
        if state.sessions.get(&id).is_some() {
            return (jar, id);
        }
    }

    let id = state.sessions.create();
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_path("/");
    (jar.add(cookie), id)
}
