use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::model::leave_request::LeaveRequest;
use crate::reconcile::summary::{DaySummary, DetailKind, calendar_feed, daily_breakdown};
use crate::session::Session;
use crate::store::{self, DATE_FORMAT};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    /// First day to include
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Last day to include
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DetailQuery {
    /// List to drill into
    pub detail: Option<DetailKind>,
}

#[derive(Serialize, ToSchema)]
pub struct DailyResponse {
    #[schema(example = "2024-05-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub summary: DaySummary,
    pub detail: Option<DetailKind>,
    /// Present or late rows, when that detail was asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<AttendanceRecord>>,
    /// Covering approved leaves, when the absent detail was asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absences: Option<Vec<LeaveRequest>>,
}

fn window(query: &CalendarQuery) -> Result<Option<(NaiveDate, NaiveDate)>, AppError> {
    let window = match (query.from, query.to) {
        (None, None) => None,
        (from, to) => Some((from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX))),
    };
    match window {
        Some((from, to)) if from > to => {
            Err(AppError::Validation("'from' must not be after 'to'".into()))
        }
        _ => Ok(window),
    }
}

#[utoipa::path(
    get,
    path = "/api/calendar",
    params(
        CalendarQuery,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Counts per day with attendance or approved leave", body = [crate::reconcile::summary::CalendarEntry]),
        (status = 400, description = "Empty window"),
        (status = 403, description = "Admin only")
    ),
    tag = "Calendar"
)]
pub async fn calendar(
    session: Session,
    pool: web::Data<SqlitePool>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let window = window(&query)?;
    let records = store::attendance::list(pool.get_ref(), query.from, query.to).await?;
    let leaves = store::leave_request::approved(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(calendar_feed(&records, &leaves, window)))
}

#[utoipa::path(
    get,
    path = "/api/calendar/{date}",
    params(
        ("date" = String, Path, description = "Day as YYYY-MM-DD"),
        DetailQuery,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Counts for the day and the requested list", body = DailyResponse),
        (status = 400, description = "Malformed date"),
        (status = 403, description = "Admin only")
    ),
    tag = "Calendar"
)]
pub async fn daily(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    query: web::Query<DetailQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let raw = path.into_inner();
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))?;

    let records = store::attendance::list(pool.get_ref(), Some(date), Some(date)).await?;
    let leaves = store::leave_request::approved(pool.get_ref()).await?;
    let breakdown = daily_breakdown(date, &records, &leaves);

    let detail = query.detail;
    let attendance = match detail {
        Some(DetailKind::Present) => Some(breakdown.present.iter().map(|r| (*r).clone()).collect()),
        Some(DetailKind::Late) => Some(breakdown.late().cloned().collect()),
        _ => None,
    };
    let absences = match detail {
        Some(DetailKind::Absent) => Some(breakdown.absent.iter().map(|l| (*l).clone()).collect()),
        _ => None,
    };

    Ok(HttpResponse::Ok().json(DailyResponse {
        date,
        summary: breakdown.summary(),
        detail,
        attendance,
        absences,
    }))
}
