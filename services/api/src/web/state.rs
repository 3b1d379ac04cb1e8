//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use crate::config::Config;
use chrono::Duration;
use std::sync::Arc;
use weekly_journal_core::ports::{DatabaseService, IdentityService};
use weekly_journal_core::store::ReflectionStore;
use weekly_journal_core::week::Clock;

use crate::adapters::PasswordIdentity;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Per-user journal state is never kept here; each request builds its own
/// `JournalSession` or calls the stateless `ReflectionStore`.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub store: ReflectionStore,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the password identity provider and the reflection store over `db`.
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self {
        let identity = Arc::new(PasswordIdentity::new(
            db.clone(),
            Duration::days(config.session_ttl_days),
        ));
        Self {
            store: ReflectionStore::new(db, clock),
            identity,
            config,
        }
    }
}
