use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppError;
use crate::model::leave_request::{Decision, LeaveRequest, LeaveType, NewLeaveRequest};
use crate::session::Session;
use crate::store::{self, leave_request::LeaveFilter};
use crate::utils::attachment::{decode_attachment, to_data_uri};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "Research")]
    pub division: String,
    pub leave_type: LeaveType,
    /// Defaults to today.
    #[schema(example = "2024-04-28", format = "date", value_type = Option<String>)]
    pub submitted_on: Option<NaiveDate>,
    #[schema(example = "2024-05-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = 3, minimum = 1)]
    pub duration: u32,
    /// Base64 or data URI
    pub supporting_doc: Option<String>,
    /// Base64 or data URI
    pub approval_doc: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AttachmentLinks {
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQ")]
    pub supporting_doc: Option<String>,
    pub approval_doc: Option<String>,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "Pending"
         })
        ),
        (status = 400, description = "Missing name, zero duration or undecodable attachment")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    _session: Session,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();

    let request = NewLeaveRequest {
        supporting_doc: decode_attachment("supporting_doc", payload.supporting_doc.as_deref())?,
        approval_doc: decode_attachment("approval_doc", payload.approval_doc.as_deref())?,
        name: payload.name,
        division: payload.division,
        leave_type: payload.leave_type,
        submitted_on: payload
            .submitted_on
            .unwrap_or_else(|| Local::now().date_naive()),
        start_date: payload.start_date,
        duration: payload.duration,
    };
    let id = store::leave_request::submit(pool.get_ref(), &request).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": id,
        "status": "Pending"
    })))
}

/* =========================
Approve / reject (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to approve"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Leave approved and expanded into attendance", body = crate::store::leave_request::DecisionOutcome),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided", body = Object, example = json!({
            "message": "Leave request 1 is already Approved"
        }))
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let outcome =
        store::leave_request::decide(pool.get_ref(), path.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to reject"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = crate::store::leave_request::DecisionOutcome),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let outcome =
        store::leave_request::decide(pool.get_ref(), path.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request to fetch"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    match store::leave_request::get(pool.get_ref(), path.into_inner()).await? {
        Some(leave) => Ok(HttpResponse::Ok().json(leave)),
        None => Err(AppError::NotFound("Leave request not found".into())),
    }
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(
        LeaveFilter,
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = LeaveListResponse),
        (status = 403, description = "Admin only")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    session: Session,
    pool: web::Data<SqlitePool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let filter = query.into_inner();
    let (data, total) = store::leave_request::query(pool.get_ref(), &filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: filter.page(),
        per_page: filter.per_page(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/stats",
    params(
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Request count per leave type", body = [crate::store::leave_request::LeaveTypeCount]),
        (status = 403, description = "Admin only")
    ),
    tag = "Leave"
)]
pub async fn leave_stats(
    session: Session,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let stats = store::leave_request::stats(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/attachments",
    params(
        ("leave_id" = i64, Path, description = "ID of the leave request"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Attachments as data URIs", body = AttachmentLinks),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn leave_attachments(
    session: Session,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let attachments = store::leave_request::attachments(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    let content_type = config.attachment_content_type.as_str();
    let link = |blob: Option<Vec<u8>>| blob.map(|bytes| to_data_uri(&bytes, content_type));

    Ok(HttpResponse::Ok().json(AttachmentLinks {
        supporting_doc: link(attachments.supporting_doc),
        approval_doc: link(attachments.approval_doc),
    }))
}
