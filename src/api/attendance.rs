use actix_web::{HttpRequest, HttpResponse, http::header::CONTENT_TYPE, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::error::AppError;
use crate::model::attendance::AttendanceStatus;
use crate::reconcile::sheet::SheetFormat;
use crate::session::Session;
use crate::store::{self, attendance::PresenceRecord};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    #[param(example = 2024)]
    pub year: i32,
    #[param(example = 5, minimum = 1, maximum = 12)]
    pub month: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PresenceQuery {
    #[param(example = 2024)]
    pub year: i32,
    #[param(example = 5, minimum = 1, maximum = 12)]
    pub month: u32,
    /// First day to include
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Last day to include
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct PresenceResponse {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 5)]
    pub month: u32,
    /// Whether a sheet was imported for the month.
    pub uploaded: bool,
    pub data: Vec<PresenceRecord>,
}

#[derive(Deserialize, ToSchema)]
pub struct CorrectAttendance {
    #[schema(example = "On-Time", value_type = String)]
    pub status: AttendanceStatus,
    #[schema(example = "Sheet had 8.05 instead of 08:05")]
    pub reason: String,
}

/* =========================
Upload monthly sheet
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/upload",
    params(
        MonthQuery,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    request_body(
        content = String,
        description = "Attendance sheet (CSV or xlsx): ID, Nama, Jenis and one column per day",
        content_type = "text/csv"
    ),
    responses(
        (status = 201, description = "Sheet imported", body = Object, example = json!({
            "message": "Attendance uploaded",
            "inserted": 42
        })),
        (status = 400, description = "Invalid month, unreadable sheet or no data"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Month already uploaded"),
        (status = 415, description = "Neither CSV nor xlsx")
    ),
    tag = "Attendance"
)]
pub async fn upload_attendance(
    req: HttpRequest,
    session: Session,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let format = SheetFormat::detect(content_type, &body).ok_or_else(|| {
        AppError::UnsupportedMedia(format!(
            "Unsupported sheet type '{}', expected CSV or xlsx",
            content_type.unwrap_or_default()
        ))
    })?;

    let MonthQuery { year, month } = query.into_inner();
    let inserted = store::attendance::upload_month(
        pool.get_ref(),
        &config.classifier(),
        year,
        month,
        format,
        &body,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance uploaded",
        "year": year,
        "month": month,
        "inserted": inserted
    })))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        PresenceQuery,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Sheet rows of the month, late ones flagged", body = PresenceResponse),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Admin only")
    ),
    tag = "Attendance"
)]
pub async fn presence_list(
    session: Session,
    pool: web::Data<SqlitePool>,
    query: web::Query<PresenceQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let PresenceQuery {
        year,
        month,
        from,
        to,
    } = query.into_inner();
    let data = store::attendance::list_presence(pool.get_ref(), year, month, from, to).await?;
    let uploaded = store::attendance::month_has_sheet_rows(pool.get_ref(), year, month).await?;

    Ok(HttpResponse::Ok().json(PresenceResponse {
        year,
        month,
        uploaded,
        data,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/month",
    params(
        MonthQuery,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Sheet rows removed; leave rows are kept", body = Object, example = json!({
            "message": "Attendance cleared",
            "deleted": 42
        })),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Admin only")
    ),
    tag = "Attendance"
)]
pub async fn clear_month(
    session: Session,
    pool: web::Data<SqlitePool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let MonthQuery { year, month } = query.into_inner();
    let deleted = store::attendance::clear_month(pool.get_ref(), year, month).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance cleared",
        "deleted": deleted
    })))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/correct",
    params(
        ("attendance_id" = i64, Path, description = "Attendance row to correct"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    request_body = CorrectAttendance,
    responses(
        (status = 200, description = "Status overridden", body = crate::store::attendance::Correction),
        (status = 400, description = "Missing reason or unknown status"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance"
)]
pub async fn correct_attendance(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<CorrectAttendance>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let correction = store::attendance::correct(
        pool.get_ref(),
        path.into_inner(),
        payload.status,
        &payload.reason,
    )
    .await?;
    Ok(HttpResponse::Ok().json(correction))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{attendance_id}/corrections",
    params(
        ("attendance_id" = i64, Path, description = "Attendance row"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Corrections, oldest first", body = [crate::store::attendance::Correction]),
        (status = 403, description = "Admin only")
    ),
    tag = "Attendance"
)]
pub async fn attendance_corrections(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let corrections = store::attendance::corrections(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(corrections))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{attendance_id}",
    params(
        ("attendance_id" = i64, Path, description = "Attendance row to delete"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Row deleted", body = Object, example = json!({
            "message": "Attendance record deleted"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    store::attendance::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record deleted"
    })))
}
