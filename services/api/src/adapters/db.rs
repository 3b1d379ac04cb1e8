//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;
use weekly_journal_core::domain::{NewReflection, Rating, ReflectionEntry, User, UserCredentials};
use weekly_journal_core::ports::{DatabaseService, PortError, PortResult};
use weekly_journal_core::week::WeekKey;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ReflectionRecord {
    id: Uuid,
    user_id: Uuid,
    week_key: String,
    went_well: String,
    challenges: String,
    learned: String,
    focus: String,
    rating: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReflectionRecord {
    /// Rows whose week key cannot be parsed are dropped.
    fn to_domain(self) -> Option<ReflectionEntry> {
        let week_key = match WeekKey::parse(&self.week_key) {
            Ok(key) => key,
            Err(e) => {
                warn!(id = %self.id, error = %e, "Skipping reflection with unreadable week key");
                return None;
            }
        };
        Some(ReflectionEntry {
            id: self.id,
            user_id: self.user_id,
            week_key,
            went_well: self.went_well,
            challenges: self.challenges,
            learned: self.learned,
            focus: self.focus,
            rating: self.rating.and_then(|r| Rating::new(i64::from(r))),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const REFLECTION_COLUMNS: &str =
    "id, user_id, week_key, went_well, challenges, learned, focus, rating, created_at, updated_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PortError::Conflict(format!("User {} already exists", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record =
            sqlx::query_as::<_, UserRecord>("SELECT user_id, email FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("User {} not found", user_id))
                    }
                    _ => unexpected(e),
                })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_reflections_by_user(&self, user_id: Uuid) -> PortResult<Vec<ReflectionEntry>> {
        let records = sqlx::query_as::<_, ReflectionRecord>(&format!(
            "SELECT {} FROM reflections WHERE user_id = $1 ORDER BY week_key DESC",
            REFLECTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().filter_map(|r| r.to_domain()).collect())
    }

    async fn upsert_reflection(&self, reflection: NewReflection) -> PortResult<ReflectionEntry> {
        let week_key = reflection.week_key.to_string();
        let record = sqlx::query_as::<_, ReflectionRecord>(&format!(
            "INSERT INTO reflections (id, user_id, week_key, went_well, challenges, learned, focus, rating, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id, week_key) DO UPDATE SET \
                 went_well = EXCLUDED.went_well, \
                 challenges = EXCLUDED.challenges, \
                 learned = EXCLUDED.learned, \
                 focus = EXCLUDED.focus, \
                 rating = EXCLUDED.rating, \
                 updated_at = EXCLUDED.updated_at \
             RETURNING {}",
            REFLECTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(reflection.user_id)
        .bind(&week_key)
        .bind(&reflection.went_well)
        .bind(&reflection.challenges)
        .bind(&reflection.learned)
        .bind(&reflection.focus)
        .bind(i16::from(reflection.rating.value()))
        .bind(reflection.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::Unexpected("Failed to save reflection.".to_string()))?;

        record.to_domain().ok_or_else(|| {
            PortError::Unexpected(format!("Stored week key {} could not be read back", week_key))
        })
    }
}
