//! crates/weekly_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the journal.
//! These structs are independent of any database or serialization format.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::week::WeekKey;

//=========================================================================================
// Users and Authentication
//=========================================================================================

/// Represents a user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Ratings
//=========================================================================================

/// A weekly rating on the 1 (rough) to 5 (great) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validates a raw value. Returns `None` outside 1..=5.
    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The short word shown next to the number in the rating picker.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Rough",
            2 => "Meh",
            3 => "Okay",
            4 => "Good",
            _ => "Great",
        }
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=========================================================================================
// Reflections
//=========================================================================================

/// The part of a reflection the user writes. Any text may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionFields {
    pub went_well: String,
    pub challenges: String,
    pub learned: String,
    pub focus: String,
    pub rating: Option<Rating>,
}

/// A record handed to the persistence port for an upsert on (user_id, week_key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReflection {
    pub user_id: Uuid,
    pub week_key: WeekKey,
    pub went_well: String,
    pub challenges: String,
    pub learned: String,
    pub focus: String,
    pub rating: Rating,
    pub updated_at: DateTime<Utc>,
}

/// One user's reflection for one ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_key: WeekKey,
    pub went_well: String,
    pub challenges: String,
    pub learned: String,
    pub focus: String,
    /// Older rows may have been stored without a rating.
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every reflection of one user, keyed by week. Keys are unique by construction.
pub type ReflectionCollection = BTreeMap<WeekKey, ReflectionEntry>;

/// Aggregates shown in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JournalStats {
    pub streak: u32,
    pub avg_rating: f64,
    pub total: usize,
}
