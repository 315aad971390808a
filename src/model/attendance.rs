use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveType;

/// Status of one attendance row.
///
/// Sheet-derived rows carry a punctuality status, leave-derived rows carry the
/// leave type as the absence reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    InvalidTime,
    NoData,
    Leave(LeaveType),
}

impl AttendanceStatus {
    pub fn is_leave(self) -> bool {
        matches!(self, AttendanceStatus::Leave(_))
    }

    pub fn is_late(self) -> bool {
        matches!(self, AttendanceStatus::Late)
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "On-Time",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::InvalidTime => "Invalid-Time",
            AttendanceStatus::NoData => "No-Data",
            AttendanceStatus::Leave(leave_type) => match leave_type {
                LeaveType::AnnualLeave => "Annual-Leave",
                LeaveType::PersonalLeave => "Personal-Leave",
                LeaveType::SickLeave => "Sick-Leave",
                LeaveType::RemoteWork => "Remote-Work",
            },
        }
    }
}

impl From<LeaveType> for AttendanceStatus {
    fn from(leave_type: LeaveType) -> Self {
        AttendanceStatus::Leave(leave_type)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        // also accepts the Indonesian spellings and spaced forms as input
        match normalized.as_str() {
            "on-time" | "tepat waktu" => Ok(AttendanceStatus::OnTime),
            "late" | "telat" => Ok(AttendanceStatus::Late),
            "invalid-time" | "invalid time" => Ok(AttendanceStatus::InvalidTime),
            "no-data" | "no data" => Ok(AttendanceStatus::NoData),
            _ => s
                .trim()
                .parse::<LeaveType>()
                .map(AttendanceStatus::Leave)
                .map_err(|_| format!("unknown attendance status '{s}'")),
        }
    }
}

impl From<AttendanceStatus> for String {
    fn from(status: AttendanceStatus) -> Self {
        status.label().to_string()
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 12)]
    pub id: i64,
    #[schema(example = "Budi")]
    pub name: String,
    #[schema(example = "Research")]
    pub division: String,
    #[schema(example = "2024-05-03", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:02", nullable = true)]
    pub clock_in: Option<String>,
    #[schema(example = "17:05", nullable = true)]
    pub clock_out: Option<String>,
    #[schema(example = "On-Time", value_type = String)]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRow {
    pub id: i64,
    pub name: String,
    pub division: String,
    pub date: String,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = String;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {e}", row.date))?;
        let status = row.status.parse()?;

        // leave-derived rows were stored with empty strings instead of NULL
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(AttendanceRecord {
            id: row.id,
            name: row.name,
            division: row.division,
            date,
            clock_in: non_empty(row.clock_in),
            clock_out: non_empty(row.clock_out),
            status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub name: String,
    pub division: String,
    pub date: NaiveDate,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub status: AttendanceStatus,
}
