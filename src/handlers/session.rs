use axum::{extract::State, response::Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::handlers::auth::ensure_session;
use crate::schemas::{ApiResponse, AppState};
use crate::sessions::{Session, Stage};

/// Current session state as handed to the client
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    /// Username the session is bound to, when authenticated
    pub username: Option<String>,
    pub stage: Stage,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            authenticated: session.authenticated,
            username: session.current_user,
            stage: session.stage,
        }
    }
}

/// Current session state
///
/// Creates a fresh landing-stage session when the request carries none.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    tag = "session",
    responses(
        (status = 200, description = "Session state retrieved", body = ApiResponse<SessionResponse>)
    )
)]
#[instrument(skip(state, jar))]
pub async fn get_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<SessionResponse>>) {
    let (jar, id) = ensure_session(&state, jar);
    let session = state.sessions.get(&id).unwrap_or_default();

    let response = ApiResponse {
        data: SessionResponse::from(session),
        message: "Session state retrieved".to_string(),
        success: true,
    };
    (jar, Json(response))
}

/// Request the dashboard
///
/// Moves a landing-stage session to the unauthenticated stage, where the
/// client shows the login form. A no-op on any other stage.
#[utoipa::path(
    post,
    path = "/api/v1/session/dashboard",
    tag = "session",
    responses(
        (status = 200, description = "Session stage updated", body = ApiResponse<SessionResponse>)
    )
)]
#[instrument(skip(state, jar))]
pub async fn enter_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<SessionResponse>>) {
    let (jar, id) = ensure_session(&state, jar);
    let session = state
        .sessions
        .update(&id, Session::request_dashboard)
        .unwrap_or_default();
    debug!("Session {} is now at stage {:?}", id, session.stage);

    let response = ApiResponse {
        data: SessionResponse::from(session),
        message: "Session stage updated".to_string(),
        success: true,
    };
    (jar, Json(response))
}
