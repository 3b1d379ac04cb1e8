//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `DatabaseService` port. Used for local
//! runs with `STORAGE_BACKEND=memory` and by the integration tests. It enforces
//! the same uniqueness rules as the Postgres schema: one account per email, one
//! reflection per (user, week).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use weekly_journal_core::domain::{NewReflection, ReflectionEntry, User, UserCredentials};
use weekly_journal_core::ports::{DatabaseService, PortError, PortResult};
use weekly_journal_core::week::WeekKey;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserCredentials>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    reflections: HashMap<(Uuid, WeekKey), ReflectionEntry>,
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: RwLock<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reflection rows across all users.
    pub async fn reflection_count(&self) -> usize {
        self.tables.read().await.reflections.len()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(PortError::Conflict(format!("User {} already exists", email)));
        }
        let user_id = Uuid::new_v4();
        tables.users.insert(
            user_id,
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&user_id)
            .map(|u| User {
                user_id: u.user_id,
                email: u.email.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.tables
            .write()
            .await
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.tables.read().await.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn get_reflections_by_user(&self, user_id: Uuid) -> PortResult<Vec<ReflectionEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<ReflectionEntry> = tables
            .reflections
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.week_key.cmp(&a.week_key));
        Ok(entries)
    }

    async fn upsert_reflection(&self, r: NewReflection) -> PortResult<ReflectionEntry> {
        let mut tables = self.tables.write().await;
        let key = (r.user_id, r.week_key);
        let (id, created_at) = tables
            .reflections
            .get(&key)
            .map(|existing| (existing.id, existing.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), Utc::now()));
        let entry = ReflectionEntry {
            id,
            user_id: r.user_id,
            week_key: r.week_key,
            went_well: r.went_well,
            challenges: r.challenges,
            learned: r.learned,
            focus: r.focus,
            rating: Some(r.rating),
            created_at,
            updated_at: r.updated_at,
        };
        tables.reflections.insert(key, entry.clone());
        Ok(entry)
    }
}
