//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the reflection endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{self, AuthResponse, LoginRequest, SignupRequest};
use crate::web::state::AppState;
use crate::web::weeks::{self, JournalResponse, WeekResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use weekly_journal_core::domain::{JournalStats, Rating, ReflectionEntry, ReflectionFields, User};
use weekly_journal_core::session::JournalSession;
use weekly_journal_core::store::StoreError;
use weekly_journal_core::week::{format_week_display, WeekKey};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        list_reflections_handler,
        get_reflection_handler,
        save_reflection_handler,
        stats_handler,
        weeks::current_week_handler,
        weeks::week_handler,
        weeks::journal_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            ReflectionPayload,
            ReflectionResponse,
            ReflectionListResponse,
            SaveReflectionResponse,
            StatsResponse,
            WeekResponse,
            JournalResponse,
        )
    ),
    tags(
        (name = "Weekly Reflection Journal API", description = "Weekly reflections keyed by ISO week, with streak and rating statistics.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A rating as sent by a client: `4` or `"4"`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum RatingInput {
    Number(i64),
    Text(String),
}

impl RatingInput {
    fn to_rating(&self) -> Option<Rating> {
        match self {
            RatingInput::Number(n) => Rating::new(*n),
            RatingInput::Text(s) => s.trim().parse::<i64>().ok().and_then(Rating::new),
        }
    }
}

/// The four prompts and the rating for one week. Omitted texts are saved empty,
/// an omitted rating is saved as 3.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct ReflectionPayload {
    #[serde(default)]
    pub went_well: String,
    #[serde(default)]
    pub challenges: String,
    #[serde(default)]
    pub learned: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    #[schema(value_type = Option<u8>, minimum = 1, maximum = 5)]
    pub rating: Option<RatingInput>,
}

impl ReflectionPayload {
    fn into_fields(self) -> Result<ReflectionFields, (StatusCode, String)> {
        let rating = match &self.rating {
            None => None,
            Some(input) => Some(input.to_rating().ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    "Rating must be a whole number from 1 to 5".to_string(),
                )
            })?),
        };
        Ok(ReflectionFields {
            went_well: self.went_well,
            challenges: self.challenges,
            learned: self.learned,
            focus: self.focus,
            rating,
        })
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ReflectionResponse {
    pub week_key: String,
    /// e.g. `Jan 05 - Jan 11, 2026`
    pub week_display: String,
    pub went_well: String,
    pub challenges: String,
    pub learned: String,
    pub focus: String,
    pub rating: Option<u8>,
    pub rating_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ReflectionEntry> for ReflectionResponse {
    fn from(entry: &ReflectionEntry) -> Self {
        Self {
            week_key: entry.week_key.to_string(),
            week_display: format_week_display(entry.week_key).unwrap_or_default(),
            went_well: entry.went_well.clone(),
            challenges: entry.challenges.clone(),
            learned: entry.learned.clone(),
            focus: entry.focus.clone(),
            rating: entry.rating.map(Rating::value),
            rating_label: entry.rating.map(|r| r.label().to_string()),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ReflectionListResponse {
    /// Most recent week first.
    pub entries: Vec<ReflectionResponse>,
    /// Present when the journal could not be loaded and is shown empty.
    pub warning: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SaveReflectionResponse {
    pub message: String,
    pub entry: ReflectionResponse,
    /// Statistics including the entry just saved.
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct StatsResponse {
    pub streak: u32,
    pub avg_rating: f64,
    pub total: usize,
}

impl From<JournalStats> for StatsResponse {
    fn from(stats: JournalStats) -> Self {
        Self {
            streak: stats.streak,
            avg_rating: stats.avg_rating,
            total: stats.total,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Parses a week key from the URL, rejecting malformed keys with 400.
pub fn parse_week_param(raw: &str) -> Result<WeekKey, (StatusCode, String)> {
    let key = WeekKey::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    if !key.is_canonical() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Week {} does not exist in its ISO year", key),
        ));
    }
    Ok(key)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every reflection of the signed-in user, newest week first.
///
/// A storage failure yields an empty list with a `warning` rather than an error.
#[utoipa::path(
    get,
    path = "/reflections",
    responses(
        (status = 200, description = "All reflections", body = ReflectionListResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_reflections_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<ReflectionListResponse> {
    let outcome = app_state.store.load_all(user.user_id).await;
    Json(ReflectionListResponse {
        entries: outcome
            .collection
            .values()
            .rev()
            .map(ReflectionResponse::from)
            .collect(),
        warning: outcome.warning,
    })
}

/// Fetch the reflection for one week.
#[utoipa::path(
    get,
    path = "/reflections/{week_key}",
    params(("week_key" = String, Path, description = "ISO week, e.g. 2026-W03")),
    responses(
        (status = 200, description = "The reflection", body = ReflectionResponse),
        (status = 400, description = "Malformed week key"),
        (status = 404, description = "No reflection for that week")
    )
)]
pub async fn get_reflection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(week_key): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = parse_week_param(&week_key)?;
    let outcome = app_state.store.load_all(user.user_id).await;
    outcome
        .collection
        .get(&key)
        .map(|entry| Json(ReflectionResponse::from(entry)))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No reflection for {}", key)))
}

/// Create or replace the reflection for one week.
#[utoipa::path(
    put,
    path = "/reflections/{week_key}",
    params(("week_key" = String, Path, description = "ISO week, e.g. 2026-W03")),
    request_body = ReflectionPayload,
    responses(
        (status = 200, description = "Reflection saved", body = SaveReflectionResponse),
        (status = 400, description = "Malformed week key or rating"),
        (status = 500, description = "The reflection could not be stored")
    )
)]
pub async fn save_reflection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(week_key): Path<String>,
    Json(payload): Json<ReflectionPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = parse_week_param(&week_key)?;
    let fields = payload.into_fields()?;

    let mut session = JournalSession::open(app_state.store.clone(), user).await;
    session.select_week(key);
    match session.save_selected(fields).await {
        Ok(outcome) => Ok(Json(SaveReflectionResponse {
            message: outcome.message.to_string(),
            entry: ReflectionResponse::from(&outcome.entry),
            stats: session.stats().into(),
        })),
        Err(e @ StoreError::InvalidWeek(_)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!("Failed to save reflection: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Streak, average rating and entry count for the signed-in user.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Journal statistics", body = StatsResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<StatsResponse> {
    let outcome = app_state.store.load_all(user.user_id).await;
    Json(app_state.store.compute_stats(&outcome.collection).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_accepts_number_or_text() {
        let payload: ReflectionPayload = serde_json::from_str(r#"{"rating": 4}"#).unwrap();
        assert_eq!(payload.into_fields().unwrap().rating, Rating::new(4));

        let payload: ReflectionPayload = serde_json::from_str(r#"{"rating": "5"}"#).unwrap();
        assert_eq!(payload.into_fields().unwrap().rating, Rating::new(5));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let fields = serde_json::from_str::<ReflectionPayload>("{}")
            .unwrap()
            .into_fields()
            .unwrap();
        assert_eq!(fields, ReflectionFields::default());
    }

    #[test]
    fn test_out_of_range_rating_is_rejected() {
        for body in [r#"{"rating": 0}"#, r#"{"rating": "9"}"#, r#"{"rating": "great"}"#] {
            let payload: ReflectionPayload = serde_json::from_str(body).unwrap();
            let err = payload.into_fields().unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_parse_week_param() {
        assert_eq!(parse_week_param("2026-W03").unwrap(), WeekKey::new(2026, 3));
        assert_eq!(parse_week_param("2026-03").unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(parse_week_param("2021-W53").unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
