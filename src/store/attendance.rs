use chrono::{Months, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus, NewAttendance};
use crate::reconcile::classifier::Classifier;
use crate::reconcile::sheet::{RawSheet, SheetFormat, into_attendance, normalize};
use crate::store::{self, DATE_FORMAT};

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2100;

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

pub(crate) async fn insert_records(
    conn: &mut SqliteConnection,
    records: &[NewAttendance],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for record in records {
        inserted += sqlx::query(
            r#"
            INSERT INTO attendance (name, division, date, clock_in, clock_out, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.division)
        .bind(record.date.format(DATE_FORMAT).to_string())
        .bind(record.clock_in.as_deref())
        .bind(record.clock_out.as_deref())
        .bind(record.status.label())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

/// Inserts all records or none.
pub async fn insert_batch(pool: &SqlitePool, records: &[NewAttendance]) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;
    let inserted = insert_records(&mut tx, records).await?;
    tx.commit().await?;
    Ok(inserted)
}

/// Rows dated within the optional inclusive bounds, ordered by date. Rows that
/// no longer parse are skipped.
pub async fn list(
    pool: &SqlitePool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let rows = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, name, division, date, clock_in, clock_out, status
        FROM attendance
        WHERE (?1 IS NULL OR date >= ?1)
        AND (?2 IS NULL OR date <= ?2)
        ORDER BY date, id
        "#,
    )
    .bind(from.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(to.map(|d| d.format(DATE_FORMAT).to_string()))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            AttendanceRecord::try_from(row)
                .map_err(|e| warn!(id, error = %e, "Skipping malformed attendance row"))
                .ok()
        })
        .collect())
}

pub async fn list_month(
    pool: &SqlitePool,
    year: i32,
    month: u32,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let (first, last) = month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {year}-{month:02}")))?;
    list(pool, Some(first), Some(last)).await
}

/// Whether a sheet was already imported for the month.
pub async fn month_has_sheet_rows(pool: &SqlitePool, year: i32, month: u32) -> Result<bool, AppError> {
    Ok(list_month(pool, year, month)
        .await?
        .iter()
        .any(|r| !r.status.is_leave()))
}

/// Removes the sheet-derived rows of a month; leave-derived rows stay.
pub async fn clear_month(pool: &SqlitePool, year: i32, month: u32) -> Result<u64, AppError> {
    let ids: Vec<i64> = list_month(pool, year, month)
        .await?
        .into_iter()
        .filter(|r| !r.status.is_leave())
        .map(|r| r.id)
        .collect();

    let mut tx = pool.begin().await?;
    let mut deleted = 0;
    for id in ids {
        deleted += sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;

    info!(year, month, deleted, "Cleared sheet attendance for month");
    Ok(deleted)
}

fn checked_month(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::Validation(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }
    month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {year}-{month:02}")))
}

/// Imports a monthly sheet (CSV or xlsx). A month that already holds sheet rows must be
/// cleared first.
pub async fn upload_month(
    pool: &SqlitePool,
    classifier: &Classifier,
    year: i32,
    month: u32,
    format: SheetFormat,
    sheet_bytes: &[u8],
) -> Result<u64, AppError> {
    checked_month(year, month)?;

    if month_has_sheet_rows(pool, year, month).await? {
        return Err(AppError::Conflict(format!(
            "Attendance for {year}-{month:02} was already uploaded"
        )));
    }

    let sheet = RawSheet::read(format, sheet_bytes).map_err(|e| AppError::Validation(e.to_string()))?;
    let punches = normalize(&sheet, classifier).map_err(|e| AppError::Validation(e.to_string()))?;
    let divisions = store::employee::division_map(pool).await;
    let records = into_attendance(punches, &divisions, year, month);
    if records.is_empty() {
        return Err(AppError::Validation("No attendance data found in the sheet".into()));
    }

    let inserted = insert_batch(pool, &records).await?;
    info!(year, month, inserted, "Attendance sheet uploaded");
    Ok(inserted)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PresenceRecord {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub late: bool,
}

/// Sheet-derived rows of a month, optionally narrowed to `from..=to`.
pub async fn list_presence(
    pool: &SqlitePool,
    year: i32,
    month: u32,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<PresenceRecord>, AppError> {
    let (first, last) = checked_month(year, month)?;
    let from = from.map_or(first, |d| d.max(first));
    let to = to.map_or(last, |d| d.min(last));
    if from > to {
        return Ok(Vec::new());
    }

    Ok(list(pool, Some(from), Some(to))
        .await?
        .into_iter()
        .filter(|r| !r.status.is_leave())
        .map(|record| PresenceRecord {
            late: record.status.is_late(),
            record,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Correction {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = 12)]
    pub attendance_id: i64,
    #[schema(example = "Invalid-Time")]
    pub old_status: String,
    #[schema(example = "On-Time")]
    pub new_status: String,
    #[schema(example = "Sheet had 8.05 instead of 08:05")]
    pub reason: String,
    #[schema(example = "2024-05-06T09:12:44+00:00")]
    pub corrected_at: String,
}

/// Overrides the status of one row and records the change.
pub async fn correct(
    pool: &SqlitePool,
    attendance_id: i64,
    new_status: AttendanceStatus,
    reason: &str,
) -> Result<Correction, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("A correction reason is required".into()));
    }

    let mut tx = pool.begin().await?;

    let old_status: Option<String> =
        sqlx::query_scalar("SELECT status FROM attendance WHERE id = ?")
            .bind(attendance_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(old_status) = old_status else {
        return Err(AppError::NotFound(format!(
            "Attendance record {attendance_id} not found"
        )));
    };

    sqlx::query("UPDATE attendance SET status = ? WHERE id = ?")
        .bind(new_status.label())
        .bind(attendance_id)
        .execute(&mut *tx)
        .await?;

    let corrected_at = Utc::now().to_rfc3339();
    let id = sqlx::query(
        r#"
        INSERT INTO attendance_corrections
            (attendance_id, old_status, new_status, reason, corrected_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(attendance_id)
    .bind(&old_status)
    .bind(new_status.label())
    .bind(reason)
    .bind(&corrected_at)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(attendance_id, old = %old_status, new = %new_status, "Attendance status corrected");

    Ok(Correction {
        id,
        attendance_id,
        old_status,
        new_status: new_status.label().to_string(),
        reason: reason.to_string(),
        corrected_at,
    })
}

pub async fn corrections(pool: &SqlitePool, attendance_id: i64) -> Result<Vec<Correction>, AppError> {
    let corrections = sqlx::query_as::<_, Correction>(
        r#"
        SELECT id, attendance_id, old_status, new_status, reason, corrected_at
        FROM attendance_corrections
        WHERE attendance_id = ?
        ORDER BY id
        "#,
    )
    .bind(attendance_id)
    .fetch_all(pool)
    .await?;
    Ok(corrections)
}

pub async fn delete(pool: &SqlitePool, attendance_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(attendance_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Attendance record {attendance_id} not found"
        )));
    }
    Ok(())
}
