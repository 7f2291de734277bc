//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    ErrorResponse, ProfileQuery, RecipeSummaryRecord, StateResponse, StepRecord, TimelineQuery,
};
use crate::sim::superposition::ProfilePoint;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}

/// Returns per-recipe totals and the combined peak summary.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let recipes = state
        .recipes
        .iter()
        .map(|r| RecipeSummaryRecord {
            name: r.name.clone(),
            steps_per_cycle: r.timeline.cycle_len(),
            summary: r.summary.clone(),
        })
        .collect();

    Json(StateResponse {
        recipes,
        profile: state.profile_summary.clone(),
    })
}

/// Returns the step records of one recipe.
///
/// `GET /timeline/{name}` → 200 + `Vec<StepRecord>` JSON
/// `GET /timeline/{name}?cycle=N` → records of cycle N (1-based)
/// Unknown recipe → 404; cycle 0 or beyond the last cycle → 400
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> impl IntoResponse {
    let Some(entry) = state.recipe(&name) else {
        return Err(error(
            StatusCode::NOT_FOUND,
            format!("unknown recipe \"{name}\""),
        ));
    };

    let results = match query.cycle {
        None => entry.timeline.results(),
        Some(n) => match n.checked_sub(1).and_then(|i| entry.timeline.cycle(i)) {
            Some(cycle) => cycle,
            None => {
                return Err(error(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "`cycle` must be within 1..={}, got {n}",
                        entry.timeline.cycle_count()
                    ),
                ));
            }
        },
    };

    let records: Vec<StepRecord> = results.iter().map(StepRecord::from).collect();
    Ok(Json(records))
}

/// Returns combined profile breakpoints, optionally within a time window.
///
/// `GET /profile` → 200 + `Vec<ProfilePoint>` JSON
/// `GET /profile?from=A&to=B` → breakpoints with `A <= t <= B`
/// `GET /profile?from=5&to=1` → 400 + `ErrorResponse`
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProfileQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(f64::NEG_INFINITY);
    let to = query.to.unwrap_or(f64::INFINITY);

    if from > to {
        return Err(error(
            StatusCode::BAD_REQUEST,
            format!("`from` ({from}) must be <= `to` ({to})"),
        ));
    }

    let points: Vec<ProfilePoint> = state.profile.window(from, to);
    Ok(Json(points))
}
