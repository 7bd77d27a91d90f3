use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{debug, error};

use crate::{
    punch::PunchClock,
    storage::{entities::PunchAction, history::DayTotal, record_store::RecordStore},
    utils::{clock::Clock, time::date_to_record_name},
};

/// Shared application state, created once at startup and cloned into every
/// handler. Holds no clock state: that lives in the record files.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClockResponse {
    pub total_seconds: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_running: bool,
    pub total_seconds: i64,
    pub elapsed_seconds: i64,
    pub filename: String,
}

pub async fn start_handler(
    State(state): State<AppState>,
) -> Result<Json<ClockResponse>, (StatusCode, String)> {
    let total_seconds = apply_transition(&state, PunchAction::Start)
        .await
        .map_err(load_failure)?;
    Ok(Json(ClockResponse { total_seconds }))
}

pub async fn pause_handler(
    State(state): State<AppState>,
) -> Result<Json<ClockResponse>, (StatusCode, String)> {
    let total_seconds = apply_transition(&state, PunchAction::Pause)
        .await
        .map_err(load_failure)?;
    Ok(Json(ClockResponse { total_seconds }))
}

pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let status = read_status(&state).await.map_err(load_failure)?;
    Ok(Json(status))
}

pub async fn history_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<DayTotal>>, (StatusCode, String)> {
    let totals = state.store.day_totals().await.map_err(|e| {
        error!("History scan failed: {e:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error reading history: {e}"),
        )
    })?;
    Ok(Json(totals))
}

/// Load today's state from the record file, apply one transition, append the
/// resulting record. Each request runs this whole cycle itself; there is no
/// state shared between requests.
pub(crate) async fn apply_transition(state: &AppState, action: PunchAction) -> Result<i64> {
    let now = state.clock.now();
    let today = state.clock.today();

    let tail = state.store.load_last(today, now).await?;
    let mut clock = PunchClock::recover(&tail);

    let record = match action {
        PunchAction::Start => clock.start(now),
        PunchAction::Pause => clock.pause(now),
    };

    match record {
        Some(record) => {
            if let Err(e) = state.store.append(today, &record).await {
                // The response still reports the advanced total; only
                // durability is lost. See DESIGN.md on this trade-off.
                error!("Failed to append {} record: {e:?}", record.action.as_str());
            }
        }
        None => debug!("{} is a no-op in the current state", action.as_str()),
    }

    Ok(clock.total_worked())
}

pub(crate) async fn read_status(state: &AppState) -> Result<StatusResponse> {
    let now = state.clock.now();
    let today = state.clock.today();

    let tail = state.store.load_last(today, now).await?;
    let status = PunchClock::recover(&tail).status(now);

    Ok(StatusResponse {
        is_running: status.is_running,
        total_seconds: status.total_seconds,
        elapsed_seconds: status.elapsed_seconds,
        filename: date_to_record_name(today),
    })
}

fn load_failure(e: anyhow::Error) -> (StatusCode, String) {
    error!("Failed to load punch state: {e:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error loading punch records: {e}"),
    )
}
