use std::collections::HashMap;

use futures_util::StreamExt;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::model::employee::Employee;

pub async fn create(pool: &SqlitePool, employee: &Employee) -> Result<(), AppError> {
    let result = sqlx::query("INSERT INTO employees (id, name, division) VALUES (?, ?, ?)")
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.division)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            AppError::Conflict(format!("Employee {} already exists", employee.id)),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Employee>, AppError> {
    let employees =
        sqlx::query_as::<_, Employee>("SELECT id, name, division FROM employees ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(employees)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Employee>, AppError> {
    let employee =
        sqlx::query_as::<_, Employee>("SELECT id, name, division FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(employee)
}

/// Employee id → division, streamed from the reference table.
///
/// A failing read degrades to whatever was loaded so far; unmapped employees
/// then fall back to the sentinel division.
pub async fn division_map(pool: &SqlitePool) -> HashMap<i64, String> {
    let mut stream =
        sqlx::query_as::<_, (i64, String)>("SELECT id, division FROM employees").fetch(pool);

    let mut divisions = HashMap::new();
    while let Some(row) = stream.next().await {
        match row {
            Ok((id, division)) => {
                divisions.insert(id, division);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read employee divisions");
                break;
            }
        }
    }

    debug!(count = divisions.len(), "Loaded employee divisions");
    divisions
}
