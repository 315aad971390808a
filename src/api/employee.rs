use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::employee::Employee;
use crate::session::Session;
use crate::store;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = 1001)]
    pub id: i64,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = "Research")]
    pub division: String,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created"
        })),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Employee ID already exists")
    ),
    params(
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    session: Session,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let payload = payload.into_inner();
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Employee name is required".into()));
    }

    let employee = Employee {
        id: payload.id,
        name: payload.name.trim().to_string(),
        division: payload.division.trim().to_string(),
    };
    store::employee::create(pool.get_ref(), &employee).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created",
        "id": employee.id
    })))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    responses(
        (status = 200, description = "All employees ordered by ID", body = [Employee]),
        (status = 403, description = "Admin only")
    ),
    params(
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    session: Session,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let employees = store::employee::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = i64, Path, description = "Employee ID"),
        ("X-Role" = String, Header, description = "Role toggle: admin or employee")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    session: Session,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let employee_id = path.into_inner();
    match store::employee::get(pool.get_ref(), employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::NotFound("Employee not found".into())),
    }
}
