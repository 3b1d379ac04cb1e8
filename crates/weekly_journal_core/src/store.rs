//! crates/weekly_journal_core/src/store.rs
//!
//! Week-keyed reflection storage on top of the `DatabaseService` port, plus the
//! statistics derived from a loaded collection.
//!
//! Persistence failures stop here: loading degrades to an empty journal with a
//! warning, saving returns a `StoreError` the caller can show verbatim.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    JournalStats, NewReflection, ReflectionCollection, ReflectionEntry, ReflectionFields,
};
use crate::ports::{DatabaseService, PortError};
use crate::week::{week_key_of, Clock, WeekKey};

/// Message returned with every successful save.
pub const SAVED_MESSAGE: &str = "Reflection saved!";

/// Why a save was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Week {0} does not exist in its ISO year")]
    InvalidWeek(WeekKey),
    #[error("Error saving reflection: {0}")]
    Persistence(#[from] PortError),
}

/// Result of [`ReflectionStore::load_all`].
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub collection: ReflectionCollection,
    /// Set when the backing store failed and the collection is empty because of it.
    pub warning: Option<String>,
}

/// Result of a successful [`ReflectionStore::save`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub entry: ReflectionEntry,
    pub message: &'static str,
}

/// Stateless request/response access to one user's reflections.
#[derive(Clone)]
pub struct ReflectionStore {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl ReflectionStore {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// The week containing today's date.
    pub fn current_week(&self) -> WeekKey {
        week_key_of(self.clock.today())
    }

    /// Loads every reflection owned by `user_id`, keyed by week.
    pub async fn load_all(&self, user_id: Uuid) -> LoadOutcome {
        match self.db.get_reflections_by_user(user_id).await {
            Ok(rows) => {
                debug!(%user_id, count = rows.len(), "Loaded reflections");
                let collection = rows
                    .into_iter()
                    .map(|entry| (entry.week_key, entry))
                    .collect();
                LoadOutcome {
                    collection,
                    warning: None,
                }
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to load reflections; showing an empty journal");
                LoadOutcome {
                    collection: ReflectionCollection::new(),
                    warning: Some(format!("Error loading reflections: {}", e)),
                }
            }
        }
    }

    /// Inserts or replaces the reflection for (`user_id`, `week_key`).
    ///
    /// A missing rating is stored as 3. The caller is responsible for putting
    /// the returned entry into any collection it holds.
    pub async fn save(
        &self,
        user_id: Uuid,
        week_key: WeekKey,
        fields: ReflectionFields,
    ) -> Result<SaveOutcome, StoreError> {
        if !week_key.is_canonical() {
            return Err(StoreError::InvalidWeek(week_key));
        }

        let record = NewReflection {
            user_id,
            week_key,
            went_well: fields.went_well,
            challenges: fields.challenges,
            learned: fields.learned,
            focus: fields.focus,
            rating: fields.rating.unwrap_or_default(),
            updated_at: self.clock.now(),
        };

        let entry = self.db.upsert_reflection(record).await.map_err(|e| {
            warn!(%user_id, %week_key, error = %e, "Failed to save reflection");
            StoreError::from(e)
        })?;

        info!(%user_id, %week_key, "Reflection saved");
        Ok(SaveOutcome {
            entry,
            message: SAVED_MESSAGE,
        })
    }

    /// Statistics relative to the store's clock.
    pub fn compute_stats(&self, collection: &ReflectionCollection) -> JournalStats {
        compute_stats_at(collection, self.clock.today())
    }
}

//=========================================================================================
// Statistics
//=========================================================================================

/// Total entries, mean of the ratings present, and the unbroken run of weeks
/// with an entry ending at the week containing `today`.
pub fn compute_stats_at(collection: &ReflectionCollection, today: NaiveDate) -> JournalStats {
    JournalStats {
        streak: streak_at(collection, today),
        avg_rating: average_rating(collection),
        total: collection.len(),
    }
}

/// Mean of present ratings rounded to one decimal place, ties to even; 0 when
/// none are present.
fn average_rating(collection: &ReflectionCollection) -> f64 {
    let ratings: Vec<f64> = collection
        .values()
        .filter_map(|entry| entry.rating)
        .map(|rating| rating.value() as f64)
        .collect();
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (mean * 10.0).round_ties_even() / 10.0
}

fn streak_at(collection: &ReflectionCollection, today: NaiveDate) -> u32 {
    let mut streak = 0;
    // A streak can never be longer than the number of entries.
    for offset in 0..=collection.len() as i64 {
        let Some(day) = today.checked_sub_signed(Duration::weeks(offset)) else {
            break;
        };
        if !collection.contains_key(&week_key_of(day)) {
            break;
        }
        streak += 1;
    }
    streak
}
