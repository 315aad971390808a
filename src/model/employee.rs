use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Division recorded for employees missing from the reference table.
pub const NO_DIVISION: &str = "No Data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1001,
        "name": "Budi Santoso",
        "division": "Research"
    })
)]
pub struct Employee {
    #[schema(example = 1001)]
    pub id: i64,

    #[schema(example = "Budi Santoso")]
    pub name: String,

    #[schema(example = "Research")]
    pub division: String,
}
