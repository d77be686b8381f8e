//! Timesheet entries recorded by authenticated users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::types::{TimesheetEntryId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One working day (or part of one) for a single user.
pub struct TimesheetEntry {
    pub id: TimesheetEntryId,
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Time spent on breaks, in minutes.
    pub breaks: i32,
    pub morning: String,
    pub afternoon: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_entry_span"))]
/// Payload for `POST /api/times`. Supplying an `id` updates an existing entry.
pub struct SaveTimesheetEntry {
    #[serde(default)]
    pub id: Option<TimesheetEntryId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    #[validate(range(min = 0, code = "breaks_negative"))]
    pub breaks: i32,
    #[serde(default)]
    pub morning: String,
    #[serde(default)]
    pub afternoon: String,
}

fn validate_entry_span(entry: &SaveTimesheetEntry) -> Result<(), ValidationError> {
    if entry.end < entry.start {
        return Err(ValidationError::new("entry_ends_before_start"));
    }
    Ok(())
}

impl SaveTimesheetEntry {
    pub fn into_entry(self, user_id: UserId) -> TimesheetEntry {
        TimesheetEntry {
            id: self.id.unwrap_or_default(),
            user_id,
            start: self.start,
            end: self.end,
            breaks: self.breaks,
            morning: self.morning,
            afternoon: self.afternoon,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Optional time range for listing entries.
pub struct TimesheetQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
