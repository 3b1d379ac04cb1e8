pub mod domain;
pub mod ports;
pub mod session;
pub mod store;
pub mod week;

pub use domain::{
    AuthSession, JournalStats, NewReflection, Rating, ReflectionCollection, ReflectionEntry,
    ReflectionFields, User, UserCredentials,
};
pub use ports::{AuthError, AuthResult, DatabaseService, IdentityService, PortError, PortResult};
pub use session::JournalSession;
pub use store::{compute_stats_at, LoadOutcome, ReflectionStore, SaveOutcome, StoreError};
pub use week::{
    current_week, date_range_of, format_week_display, format_week_heading, week_key_of, Clock,
    FixedClock, SystemClock, WeekKey, WeekKeyError,
};
