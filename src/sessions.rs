//! Process-local session state, one record per browser session.
//!
//! A session is identified by a UUID carried in the `session` cookie and
//! lives only as long as the process; there is no durability requirement.
//! The stage machine is pure state transitions driven by whatever interface
//! layer is in front (web handlers today, a CLI or test harness equally).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Where the user is in the landing → login → dashboard flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Landing,
    Unauthenticated,
    Authenticated,
}

/// Per-browser-session authentication state.
///
/// `current_user` is a lookup key into the credential store, not an owned
/// account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub current_user: Option<String>,
    pub stage: Stage,
}

impl Session {
    /// Fresh sessions start unauthenticated on the landing stage.
    pub fn new() -> Self {
        Self {
            authenticated: false,
            current_user: None,
            stage: Stage::Landing,
        }
    }

    /// landing → unauthenticated: the user asked for the dashboard.
    pub fn request_dashboard(&mut self) {
        if self.stage == Stage::Landing {
            self.stage = Stage::Unauthenticated;
        }
    }

    /// Successful login: bind the user and enter the dashboard.
    pub fn login(&mut self, username: &str) {
        self.authenticated = true;
        self.current_user = Some(username.to_string());
        self.stage = Stage::Authenticated;
    }

    /// Reset to the landing state. Always succeeds.
    pub fn logout(&mut self) {
        *self = Session::new();
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Why a gated request was refused.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("the session is not authenticated")]
    NotAuthenticated,

    #[error("the session does not belong to this user")]
    WrongUser,
}

impl AccessError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccessError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AccessError::WrongUser => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AccessError::NotAuthenticated => "NOT_AUTHENTICATED",
            AccessError::WrongUser => "FORBIDDEN",
        }
    }
}

/// All live sessions, shared process-wide through `AppState`.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    /// Create a fresh session and return its id.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(id, Session::new());
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .get(id)
            .cloned()
    }

    /// Apply a transition to a session, returning its updated state.
    pub fn update<F>(&self, id: &Uuid, transition: F) -> Option<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.inner.write().expect("session store lock poisoned");
        let session = sessions.get_mut(id)?;
        transition(session);
        Some(session.clone())
    }

    /// The session attached to the jar, if it is authenticated as `username`.
    pub fn require_user(&self, jar: &CookieJar, username: &str) -> Result<Session, AccessError> {
        let id = session_id(jar).ok_or(AccessError::NotAuthenticated)?;
        let session = self.get(&id).ok_or(AccessError::NotAuthenticated)?;

        if !session.authenticated {
            return Err(AccessError::NotAuthenticated);
        }

        match session.current_user.as_deref() {
            Some(user) if user == username => Ok(session),
            _ => Err(AccessError::WrongUser),
        }
    }
}

/// The session id carried by the request's cookie jar, if any.
pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_starts_on_landing() {
        let session = Session::new();
        assert!(!session.authenticated);
        assert_eq!(session.current_user, None);
        assert_eq!(session.stage, Stage::Landing);
    }

    #[test]
    fn stage_machine_walks_landing_login_logout() {
        let mut session = Session::new();

        session.request_dashboard();
        assert_eq!(session.stage, Stage::Unauthenticated);
        assert!(!session.authenticated);

        session.login("alice");
        assert_eq!(session.stage, Stage::Authenticated);
        assert!(session.authenticated);
        assert_eq!(session.current_user.as_deref(), Some("alice"));

        session.logout();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn request_dashboard_is_a_no_op_once_authenticated() {
        let mut session = Session::new();
        session.login("alice");
        session.request_dashboard();
        assert_eq!(session.stage, Stage::Authenticated);
    }

    #[test]
    fn store_updates_are_visible_to_later_reads() {
        let store = SessionStore::default();
        let id = store.create();

        store.update(&id, |s| s.login("bob"));

        let session = store.get(&id).unwrap();
        assert!(session.authenticated);
        assert_eq!(session.current_user.as_deref(), Some("bob"));
    }

    #[test]
    fn unknown_session_id_is_none() {
        let store = SessionStore::default();
        assert_eq!(store.get(&Uuid::new_v4()), None);
        assert_eq!(store.update(&Uuid::new_v4(), |s| s.logout()), None);
    }
}
