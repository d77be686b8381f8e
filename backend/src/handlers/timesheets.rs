use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        session_token::ActiveSession,
        timesheet::{SaveTimesheetEntry, TimesheetEntry, TimesheetQuery},
    },
    state::AppState,
    types::TimesheetEntryId,
};

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(session): Extension<ActiveSession>,
    Query(query): Query<TimesheetQuery>,
) -> Result<Json<Vec<TimesheetEntry>>, AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::BadRequest("`from` must not be after `to`".into()));
        }
    }
    let entries = state
        .timesheets
        .entries_for_user(session.user_id, query.from, query.to)
        .await?;
    Ok(Json(entries))
}

pub async fn save_entry(
    State(state): State<AppState>,
    Extension(session): Extension<ActiveSession>,
    payload: Result<Json<SaveTimesheetEntry>, JsonRejection>,
) -> Result<Json<TimesheetEntry>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;
    let entry = payload.into_entry(session.user_id);

    // Someone else's entry id looks exactly like a missing one.
    if !state.timesheets.save_entry(&entry).await? {
        return Err(AppError::NotFound("Timesheet entry not found".into()));
    }
    tracing::debug!(user_id = %session.user_id, entry_id = %entry.id, "timesheet entry saved");
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<TimesheetEntryId>,
) -> Result<Json<Value>, AppError> {
    if !state.timesheets.delete_entry(session.user_id, id).await? {
        return Err(AppError::NotFound("Timesheet entry not found".into()));
    }
    Ok(Json(json!({ "success": true })))
}
