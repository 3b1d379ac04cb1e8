//! crates/weekly_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the journal's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! identity providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuthSession, NewReflection, ReflectionEntry, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all persistence port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Authentication Error Kinds
//=========================================================================================

/// Why an identity operation failed. Callers branch on the variant; `Display`
/// gives the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("This email is already registered. Please log in instead.")]
    AlreadyRegistered,
    #[error("Password should be at least {min_len} characters long.")]
    WeakPassword { min_len: usize },
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,
    #[error("Please verify your email before logging in.")]
    EmailNotConfirmed,
    #[error("Authentication error: {0}")]
    Backend(String),
}

impl AuthError {
    /// Minimum password length enforced at sign-up.
    pub const MIN_PASSWORD_LEN: usize = 6;

    /// Maps a free-text error from an identity backend onto a kind.
    ///
    /// Fallback for failures that arrive as prose (every `PortError` other than
    /// `Unauthorized` goes through here). Adapters that receive structured codes
    /// construct the variant directly.
    pub fn classify(message: &str) -> Self {
        if message.contains("User already registered") {
            Self::AlreadyRegistered
        } else if message.contains("Password should be at least") {
            Self::WeakPassword {
                min_len: Self::MIN_PASSWORD_LEN,
            }
        } else if message.contains("Unable to validate email") || message.contains("Invalid email")
        {
            Self::InvalidEmail
        } else if message.contains("Invalid login credentials") {
            Self::InvalidCredentials
        } else if message.contains("Email not confirmed") {
            Self::EmailNotConfirmed
        } else {
            Self::Backend(message.to_string())
        }
    }
}

impl From<PortError> for AuthError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unauthorized => Self::InvalidCredentials,
            other => Self::classify(&other.to_string()),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Fails with `PortError::Conflict` when the email is taken.
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the user id of an unexpired session, `PortError::Unauthorized` otherwise.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Reflections ---
    async fn get_reflections_by_user(&self, user_id: Uuid) -> PortResult<Vec<ReflectionEntry>>;

    /// Inserts or replaces the row keyed by (user_id, week_key) and returns it as stored.
    async fn upsert_reflection(&self, reflection: NewReflection) -> PortResult<ReflectionEntry>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Registers a new account and opens a session for it.
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<(User, AuthSession)>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<(User, AuthSession)>;

    async fn sign_out(&self, session_id: &str) -> AuthResult<()>;

    /// `Ok(None)` for unknown or expired sessions.
    async fn current_user(&self, session_id: &str) -> AuthResult<Option<User>>;
}
