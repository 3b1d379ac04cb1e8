//! crates/weekly_journal_core/src/session.rs
//!
//! Per-session journal context: who is signed in, their loaded reflections and
//! the week currently being viewed. Each authenticated session owns one of
//! these; nothing about it is global.

use crate::domain::{JournalStats, ReflectionCollection, ReflectionEntry, ReflectionFields, User};
use crate::store::{ReflectionStore, SaveOutcome, StoreError};
use crate::week::WeekKey;

pub struct JournalSession {
    store: ReflectionStore,
    user: User,
    collection: ReflectionCollection,
    selected_week: WeekKey,
    load_warning: Option<String>,
}

impl JournalSession {
    /// Loads the user's reflections and selects the current week.
    pub async fn open(store: ReflectionStore, user: User) -> Self {
        let outcome = store.load_all(user.user_id).await;
        let selected_week = store.current_week();
        Self {
            store,
            user,
            collection: outcome.collection,
            selected_week,
            load_warning: outcome.warning,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn collection(&self) -> &ReflectionCollection {
        &self.collection
    }

    /// Set when loading failed and the journal is shown empty.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn select_week(&mut self, week: WeekKey) {
        self.selected_week = week;
    }

    pub fn selected_week(&self) -> WeekKey {
        self.selected_week
    }

    pub fn selected_entry(&self) -> Option<&ReflectionEntry> {
        self.collection.get(&self.selected_week)
    }

    pub fn is_current_week(&self) -> bool {
        self.selected_week == self.store.current_week()
    }

    /// Entries for the history list, most recent week first.
    pub fn entries_newest_first(&self) -> impl Iterator<Item = &ReflectionEntry> {
        self.collection.values().rev()
    }

    pub fn stats(&self) -> JournalStats {
        self.store.compute_stats(&self.collection)
    }

    /// Saves `fields` for `week` and, on success, records the stored entry locally.
    pub async fn save(
        &mut self,
        week: WeekKey,
        fields: ReflectionFields,
    ) -> Result<SaveOutcome, StoreError> {
        let outcome = self.store.save(self.user.user_id, week, fields).await?;
        self.collection
            .insert(outcome.entry.week_key, outcome.entry.clone());
        Ok(outcome)
    }

    pub async fn save_selected(
        &mut self,
        fields: ReflectionFields,
    ) -> Result<SaveOutcome, StoreError> {
        self.save(self.selected_week, fields).await
    }
}
