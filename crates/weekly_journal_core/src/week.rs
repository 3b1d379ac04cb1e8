//! crates/weekly_journal_core/src/week.rs
//!
//! ISO-8601 week arithmetic. A `WeekKey` names one Monday-to-Sunday week and is
//! the storage key of every reflection, so every view (sidebar list, detail
//! heading, streak counter) derives its dates from the functions here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};

/// Errors produced while parsing or resolving a week key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeekKeyError {
    #[error("Malformed week key '{0}': expected '<year>-W<week>'")]
    Format(String),
    #[error("Week key {0} is outside the supported calendar range")]
    OutOfRange(WeekKey),
}

/// An ISO year and week number, rendered as `YYYY-Wnn`.
///
/// Ordering is chronological. The week number is not range-checked on parse, so
/// keys echoed back from storage survive a round trip even when malformed; use
/// [`WeekKey::is_canonical`] before accepting a key from a client. The week half
/// must still be an unsigned integer: `2026-W-1` is a format error, not an
/// out-of-range week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> Self {
        Self { year, week }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Splits on the literal `-W` and reads both halves as integers.
    pub fn parse(s: &str) -> Result<Self, WeekKeyError> {
        let malformed = || WeekKeyError::Format(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(malformed)?;
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let week = week.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { year, week })
    }

    /// True when the week actually exists in its ISO year.
    pub fn is_canonical(&self) -> bool {
        weeks_in_year(self.year).is_some_and(|max| (1..=max).contains(&self.week))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = WeekKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//=========================================================================================
// Date <-> Week Conversions
//=========================================================================================

/// The ISO week containing `date`.
pub fn week_key_of(date: NaiveDate) -> WeekKey {
    let iso = date.iso_week();
    WeekKey::new(iso.year(), iso.week())
}

/// The ISO week containing the clock's current date.
pub fn current_week(clock: &dyn Clock) -> WeekKey {
    week_key_of(clock.today())
}

/// Monday and Sunday of the given ISO week.
///
/// Week 1 starts on the Monday on or before January 4th; later weeks are whole
/// multiples of seven days after it, so week 1 may begin in December and the
/// last week may end in January.
pub fn date_range_of(key: WeekKey) -> Result<(NaiveDate, NaiveDate), WeekKeyError> {
    let out_of_range = || WeekKeyError::OutOfRange(key);
    let jan4 = NaiveDate::from_ymd_opt(key.year, 1, 4).ok_or_else(out_of_range)?;
    let offset = Duration::days(jan4.weekday().num_days_from_monday() as i64);
    let week1_monday = jan4.checked_sub_signed(offset).ok_or_else(out_of_range)?;
    let monday = week1_monday
        .checked_add_signed(Duration::weeks(key.week as i64 - 1))
        .ok_or_else(out_of_range)?;
    let sunday = monday
        .checked_add_signed(Duration::days(6))
        .ok_or_else(out_of_range)?;
    Ok((monday, sunday))
}

/// Number of ISO weeks (52 or 53) in `year`.
pub fn weeks_in_year(year: i32) -> Option<u32> {
    // December 28th always falls in the last ISO week of its year.
    NaiveDate::from_ymd_opt(year, 12, 28).map(|d| d.iso_week().week())
}

/// Short label used in entry lists, e.g. `Jan 05 - Jan 11, 2026`.
pub fn format_week_display(key: WeekKey) -> Result<String, WeekKeyError> {
    let (monday, sunday) = date_range_of(key)?;
    Ok(format!(
        "{} - {}",
        monday.format("%b %d"),
        sunday.format("%b %d, %Y")
    ))
}

/// Long heading for a single week, e.g. `January 05 - January 11, 2026`.
pub fn format_week_heading(key: WeekKey) -> Result<String, WeekKeyError> {
    let (monday, sunday) = date_range_of(key)?;
    Ok(format!(
        "{} - {}",
        monday.format("%B %d"),
        sunday.format("%B %d, %Y")
    ))
}

//=========================================================================================
// Clock
//=========================================================================================

/// Source of "now". Everything that asks for the current week goes through this.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock. "Today" is the server's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Noon UTC on the given date.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self(DateTime::from_naive_utc_and_offset(noon, Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
