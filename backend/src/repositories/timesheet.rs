//! Timesheet entry persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::StoreError;
use crate::models::timesheet::TimesheetEntry;
use crate::types::{TimesheetEntryId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimesheetRepository: Send + Sync {
    /// Entries owned by `user_id` starting within `[from, to)`, oldest first.
    async fn entries_for_user(
        &self,
        user_id: UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimesheetEntry>, StoreError>;

    /// Insert or update an entry. Returns `false` if the ID belongs to an entry
    /// owned by somebody else.
    async fn save_entry(&self, entry: &TimesheetEntry) -> Result<bool, StoreError>;

    /// Returns `false` if the user has no such entry.
    async fn delete_entry(
        &self,
        user_id: UserId,
        id: TimesheetEntryId,
    ) -> Result<bool, StoreError>;
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    user_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    breaks_minutes: i32,
    morning: String,
    afternoon: String,
}

impl From<EntryRow> for TimesheetEntry {
    fn from(row: EntryRow) -> Self {
        TimesheetEntry {
            id: TimesheetEntryId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            start: row.start_time,
            end: row.end_time,
            breaks: row.breaks_minutes,
            morning: row.morning,
            afternoon: row.afternoon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgTimesheetRepository {
    pool: PgPool,
}

impl PgTimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimesheetRepository for PgTimesheetRepository {
    async fn entries_for_user(
        &self,
        user_id: UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimesheetEntry>, StoreError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, user_id, start_time, end_time, breaks_minutes, morning, afternoon
            FROM timesheet_entries
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR start_time >= $2)
              AND ($3::timestamptz IS NULL OR start_time < $3)
            ORDER BY start_time, id
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TimesheetEntry::from).collect())
    }

    async fn save_entry(&self, entry: &TimesheetEntry) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO timesheet_entries
                (id, user_id, start_time, end_time, breaks_minutes, morning, afternoon)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                breaks_minutes = EXCLUDED.breaks_minutes,
                morning = EXCLUDED.morning,
                afternoon = EXCLUDED.afternoon,
                updated_at = NOW()
            WHERE timesheet_entries.user_id = EXCLUDED.user_id
            "#,
        )
        .bind(Uuid::from(entry.id))
        .bind(Uuid::from(entry.user_id))
        .bind(entry.start)
        .bind(entry.end)
        .bind(entry.breaks)
        .bind(&entry.morning)
        .bind(&entry.afternoon)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_entry(
        &self,
        user_id: UserId,
        id: TimesheetEntryId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM timesheet_entries WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id))
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
