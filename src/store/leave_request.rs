use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::model::leave_request::{
    Decision, LeaveRequest, LeaveRow, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::reconcile::ledger::{can_transition, expand_to_attendance};
use crate::store::DATE_FORMAT;
use crate::store::attendance::insert_records;

const LEAVE_COLUMNS: &str = r#"
    id, name, division, leave_type, submitted_on, start_date, duration, status,
    supporting_doc IS NOT NULL AS has_supporting_doc,
    approval_doc IS NOT NULL AS has_approval_doc
"#;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by decision status
    pub status: Option<LeaveStatus>,
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u32>,
}

impl LeaveFilter {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DecisionOutcome {
    #[schema(example = 4)]
    pub id: i64,
    pub status: LeaveStatus,
    #[schema(example = "Leave request approved")]
    pub message: String,
    /// Attendance rows written for the covered days.
    #[schema(example = 3)]
    pub expanded_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveTypeCount {
    #[schema(example = "Sick-Leave")]
    pub leave_type: String,
    #[schema(example = 4)]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attachments {
    pub supporting_doc: Option<Vec<u8>>,
    pub approval_doc: Option<Vec<u8>>,
}

fn parse_rows(rows: Vec<LeaveRow>) -> Vec<LeaveRequest> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            LeaveRequest::try_from(row)
                .map_err(|e| warn!(leave_id = id, error = %e, "Skipping malformed leave request"))
                .ok()
        })
        .collect()
}

/// Stores a new request as Pending and returns its id.
pub async fn submit(pool: &SqlitePool, request: &NewLeaveRequest) -> Result<i64, AppError> {
    request.validate()?;

    let id = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (name, division, leave_type, submitted_on, start_date, duration,
             supporting_doc, approval_doc, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.name.trim())
    .bind(request.division.trim())
    .bind(request.leave_type.as_ref())
    .bind(request.submitted_on.format(DATE_FORMAT).to_string())
    .bind(request.start_date.format(DATE_FORMAT).to_string())
    .bind(i64::from(request.duration))
    .bind(request.supporting_doc.as_deref())
    .bind(request.approval_doc.as_deref())
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(leave_id = id, leave_type = %request.leave_type, "Leave request submitted");
    Ok(id)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<LeaveRequest>, AppError> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
    let row = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        LeaveRequest::try_from(row).map_err(|e| {
            error!(leave_id = id, error = %e, "Stored leave request is malformed");
            AppError::Storage
        })
    })
    .transpose()
}

/// Filtered, paginated listing, newest first, with the unpaginated total.
pub async fn query(
    pool: &SqlitePool,
    filter: &LeaveFilter,
) -> Result<(Vec<LeaveRequest>, i64), AppError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<&str> = Vec::new();

    if let Some(status) = &filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(status.as_ref());
    }

    if let Some(leave_type) = &filter.leave_type {
        where_sql.push_str(" AND leave_type = ?");
        args.push(leave_type.as_ref());
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(*arg);
    }
    let total = count_q.fetch_one(pool).await?;

    let per_page = i64::from(filter.per_page());
    let offset = i64::from(filter.page() - 1) * per_page;
    let data_sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    debug!(sql = %data_sql, args = ?args, per_page, offset, "Fetching leave requests");

    let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(*arg);
    }
    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((parse_rows(rows), total))
}

/// Every approved request; malformed ones are left out.
pub async fn approved(pool: &SqlitePool) -> Result<Vec<LeaveRequest>, AppError> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE status = ? ORDER BY id");
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(LeaveStatus::Approved.as_ref())
        .fetch_all(pool)
        .await?;
    Ok(parse_rows(rows))
}

/// Moves a Pending request to its terminal state. Approval writes one absence
/// row per covered day in the same transaction.
///
/// The update only matches rows that are still Pending, so a second decision
/// on the same request fails with a conflict and never expands twice.
pub async fn decide(
    pool: &SqlitePool,
    id: i64,
    decision: Decision,
) -> Result<DecisionOutcome, AppError> {
    let target = decision.target_status();
    let mut tx = pool.begin().await?;

    let current: Option<String> =
        sqlx::query_scalar("SELECT status FROM leave_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(current) = current else {
        return Err(AppError::NotFound(format!("Leave request {id} not found")));
    };
    let already_decided = || AppError::Conflict(format!("Leave request {id} is already {current}"));

    match current.parse::<LeaveStatus>() {
        Ok(status) if can_transition(status, target) => {}
        _ => return Err(already_decided()),
    }

    let updated = sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?")
        .bind(target.as_ref())
        .bind(id)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(already_decided());
    }

    let mut expanded_days = 0;
    if target == LeaveStatus::Approved {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        match LeaveRequest::try_from(row) {
            Ok(request) => {
                expanded_days = insert_records(&mut tx, &expand_to_attendance(&request)).await?;
            }
            Err(e) => {
                error!(leave_id = id, error = %e, "Approved leave could not be expanded into attendance");
            }
        }
    }

    tx.commit().await?;
    info!(leave_id = id, status = %target, expanded_days, "Leave request decided");

    Ok(DecisionOutcome {
        id,
        status: target,
        message: target.message().to_string(),
        expanded_days,
    })
}

/// Number of requests per leave type, any status.
pub async fn stats(pool: &SqlitePool) -> Result<Vec<LeaveTypeCount>, AppError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT leave_type, COUNT(*) FROM leave_requests GROUP BY leave_type ORDER BY leave_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(leave_type, count)| LeaveTypeCount { leave_type, count })
        .collect())
}

pub async fn attachments(pool: &SqlitePool, id: i64) -> Result<Option<Attachments>, AppError> {
    let row = sqlx::query_as::<_, (Option<Vec<u8>>, Option<Vec<u8>>)>(
        "SELECT supporting_doc, approval_doc FROM leave_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(supporting_doc, approval_doc)| Attachments {
        supporting_doc,
        approval_doc,
    }))
}
