//! services/api/src/adapters/identity.rs
//!
//! Email + password identity provider. Implements the `IdentityService` port on
//! top of any `DatabaseService`: argon2 password hashes, opaque session tokens
//! with a fixed lifetime.

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;
use tracing::{error, info};
use uuid::Uuid;
use weekly_journal_core::domain::{AuthSession, User};
use weekly_journal_core::ports::{
    AuthError, AuthResult, DatabaseService, IdentityService, PortError,
};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

#[derive(Clone)]
pub struct PasswordIdentity {
    db: Arc<dyn DatabaseService>,
    session_ttl: Duration,
}

impl PasswordIdentity {
    pub fn new(db: Arc<dyn DatabaseService>, session_ttl: Duration) -> Self {
        Self { db, session_ttl }
    }

    async fn open_session(&self, user_id: Uuid) -> AuthResult<AuthSession> {
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| {
                error!("Session lifetime {} overflows the calendar", self.session_ttl);
                AuthError::Backend("session lifetime is out of range".to_string())
            })?;
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at,
        };
        self.db
            .create_auth_session(&session.id, session.user_id, session.expires_at)
            .await
            .map_err(|e| {
                error!("Failed to create auth session: {:?}", e);
                AuthError::from(e)
            })?;
        Ok(session)
    }
}

/// Emails are compared case-insensitively and without surrounding whitespace.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityService for PasswordIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<(User, AuthSession)> {
        let email = normalize_email(email);
        if !email_pattern().is_match(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < AuthError::MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min_len: AuthError::MIN_PASSWORD_LEN,
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                AuthError::Backend("Failed to hash password".to_string())
            })?
            .to_string();

        let user = self
            .db
            .create_user_with_email(&email, &password_hash)
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => AuthError::AlreadyRegistered,
                other => {
                    error!("Failed to create user: {:?}", other);
                    AuthError::from(other)
                }
            })?;

        let session = self.open_session(user.user_id).await?;
        info!(user_id = %user.user_id, "Account created");
        Ok((user, session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<(User, AuthSession)> {
        let creds = self
            .db
            .get_user_by_email(&normalize_email(email))
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => AuthError::InvalidCredentials,
                other => AuthError::from(other),
            })?;

        let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            AuthError::Backend("Stored password hash is unreadable".to_string())
        })?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let session = self.open_session(creds.user_id).await?;
        info!(user_id = %creds.user_id, "Logged in");
        Ok((
            User {
                user_id: creds.user_id,
                email: creds.email,
            },
            session,
        ))
    }

    async fn sign_out(&self, session_id: &str) -> AuthResult<()> {
        self.db
            .delete_auth_session(session_id)
            .await
            .map_err(AuthError::from)
    }

    async fn current_user(&self, session_id: &str) -> AuthResult<Option<User>> {
        let user_id = match self.db.validate_auth_session(session_id).await {
            Ok(user_id) => user_id,
            Err(PortError::Unauthorized) => return Ok(None),
            Err(e) => return Err(AuthError::from(e)),
        };
        match self.db.get_user_by_id(user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(AuthError::from(e)),
        }
    }
}
