//! Credential store and authenticator over the `accounts` table.
//!
//! Passwords are hashed with argon2id and a salt generated fresh per
//! account; only the PHC hash string is stored. Username uniqueness rides
//! on the table's unique constraint, so two concurrent registrations of the
//! same name resolve first-writer-wins and the loser gets
//! [`AccountError::DuplicateUsername`].

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use model::entities::account;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a registration was rejected.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username '{0}' is already registered")]
    DuplicateUsername(String),

    #[error("username, display name and password must not be empty")]
    InvalidInput,

    #[error("password hashing failed")]
    Hash,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Why a login attempt was rejected.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no account with username '{0}'")]
    UserNotFound(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Registered accounts, keyed by username.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account with a freshly salted password hash.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<account::Model, AccountError> {
        if username.is_empty() || display_name.is_empty() || password.is_empty() {
            return Err(AccountError::InvalidInput);
        }

        let password_hash = hash_password(password)?;

        let new_account = account::ActiveModel {
            username: Set(username.to_string()),
            display_name: Set(display_name.to_string()),
            password_hash: Set(password_hash),
            ..Default::default()
        };

        match new_account.insert(&self.db).await {
            Ok(stored) => {
                info!(username, "account registered");
                Ok(stored)
            }
            Err(db_error) => {
                // The unique constraint resolves the check-and-insert race:
                // whoever inserted first owns the name.
                let message = db_error.to_string().to_lowercase();
                if message.contains("unique") || message.contains("constraint") {
                    warn!(username, "registration rejected, username taken");
                    Err(AccountError::DuplicateUsername(username.to_string()))
                } else {
                    Err(AccountError::Database(db_error))
                }
            }
        }
    }

    /// Look up an account by username.
    pub async fn lookup(&self, username: &str) -> Result<Option<account::Model>, DbErr> {
        account::Entity::find()
            .filter(account::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Verify a login attempt against the stored hash.
    ///
    /// A wrong password for an existing account is always
    /// [`AuthError::InvalidPassword`], never [`AuthError::UserNotFound`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<account::Model, AuthError> {
        let Some(stored) = self.lookup(username).await? else {
            return Err(AuthError::UserNotFound(username.to_string()));
        };

        if verify_password(password, &stored.password_hash) {
            debug!(username, "login verified");
            Ok(stored)
        } else {
            Err(AuthError::InvalidPassword)
        }
    }
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AccountError::Hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
