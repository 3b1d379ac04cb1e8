//! services/api/src/web/weeks.rs
//!
//! Week lookup endpoints and the journal overview that backs the main page:
//! sidebar history, statistics and the selected week's reflection in one call.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use weekly_journal_core::domain::User;
use weekly_journal_core::session::JournalSession;
use weekly_journal_core::week::{
    date_range_of, format_week_display, format_week_heading, WeekKey,
};

use crate::web::auth::AuthResponse;
use crate::web::rest::{parse_week_param, ReflectionResponse, StatsResponse};
use crate::web::state::AppState;

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct WeekResponse {
    pub week_key: String,
    pub year: i32,
    pub week: u32,
    pub monday: NaiveDate,
    pub sunday: NaiveDate,
    /// e.g. `Jan 05 - Jan 11, 2026`
    pub display: String,
    /// e.g. `January 05 - January 11, 2026`
    pub heading: String,
    pub is_current: bool,
}

impl WeekResponse {
    fn build(key: WeekKey, current: WeekKey) -> Result<Self, (StatusCode, String)> {
        let bad_week = |e: weekly_journal_core::week::WeekKeyError| {
            (StatusCode::BAD_REQUEST, e.to_string())
        };
        let (monday, sunday) = date_range_of(key).map_err(bad_week)?;
        Ok(Self {
            week_key: key.to_string(),
            year: key.year(),
            week: key.week(),
            monday,
            sunday,
            display: format_week_display(key).map_err(bad_week)?,
            heading: format_week_heading(key).map_err(bad_week)?,
            is_current: key == current,
        })
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct JournalResponse {
    pub user: AuthResponse,
    pub stats: StatsResponse,
    /// Most recent week first.
    pub history: Vec<ReflectionResponse>,
    pub selected: WeekResponse,
    /// The selected week's reflection, if one has been written.
    pub entry: Option<ReflectionResponse>,
    pub warning: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct JournalQuery {
    /// Week to select; defaults to the current week.
    pub week: Option<String>,
}

/// The current ISO week and its dates.
#[utoipa::path(
    get,
    path = "/weeks/current",
    responses((status = 200, description = "The current week", body = WeekResponse))
)]
pub async fn current_week_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<WeekResponse>, (StatusCode, String)> {
    let current = app_state.store.current_week();
    WeekResponse::build(current, current).map(Json)
}

/// Dates and labels for any ISO week.
#[utoipa::path(
    get,
    path = "/weeks/{week_key}",
    params(("week_key" = String, Path, description = "ISO week, e.g. 2026-W03")),
    responses(
        (status = 200, description = "The week", body = WeekResponse),
        (status = 400, description = "Malformed week key")
    )
)]
pub async fn week_handler(
    State(app_state): State<Arc<AppState>>,
    Path(week_key): Path<String>,
) -> Result<Json<WeekResponse>, (StatusCode, String)> {
    let key = parse_week_param(&week_key)?;
    WeekResponse::build(key, app_state.store.current_week()).map(Json)
}

/// Everything the journal page shows for the signed-in user.
#[utoipa::path(
    get,
    path = "/journal",
    params(JournalQuery),
    responses(
        (status = 200, description = "Journal overview", body = JournalResponse),
        (status = 400, description = "Malformed week key"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn journal_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<JournalResponse>, (StatusCode, String)> {
    let selected = query.week.as_deref().map(parse_week_param).transpose()?;

    let mut session = JournalSession::open(app_state.store.clone(), user).await;
    if let Some(week) = selected {
        session.select_week(week);
    }

    let response = JournalResponse {
        user: AuthResponse::from(session.user().clone()),
        stats: session.stats().into(),
        history: session
            .entries_newest_first()
            .map(ReflectionResponse::from)
            .collect(),
        selected: WeekResponse::build(session.selected_week(), app_state.store.current_week())?,
        entry: session.selected_entry().map(ReflectionResponse::from),
        warning: session.load_warning().map(str::to_string),
    };
    Ok(Json(response))
}
