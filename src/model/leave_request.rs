use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

/// Longest request accepted, in days. Approval writes one attendance row per day.
pub const MAX_LEAVE_DAYS: u32 = 366;

/// Category of an absence request. The same labels are written to the
/// attendance table as the absence reason.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    #[serde(rename = "Annual-Leave")]
    #[strum(to_string = "Annual-Leave", serialize = "Cuti")]
    AnnualLeave,
    #[serde(rename = "Personal-Leave")]
    #[strum(to_string = "Personal-Leave", serialize = "Izin")]
    PersonalLeave,
    #[serde(rename = "Sick-Leave")]
    #[strum(to_string = "Sick-Leave", serialize = "Sakit")]
    SickLeave,
    #[serde(rename = "Remote-Work")]
    #[strum(to_string = "Remote-Work", serialize = "WFH")]
    RemoteWork,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    /// Text shown to the administrator after a decision.
    pub fn message(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Leave request is waiting for a decision",
            LeaveStatus::Approved => "Leave request approved",
            LeaveStatus::Rejected => "Leave request rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> LeaveStatus {
        match self {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Budi")]
    pub name: String,
    #[schema(example = "Research")]
    pub division: String,
    pub leave_type: LeaveType,
    #[schema(example = "2024-04-28", format = "date", value_type = String)]
    pub submitted_on: NaiveDate,
    #[schema(example = "2024-05-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = 3)]
    pub duration: u32,
    pub status: LeaveStatus,
    pub has_supporting_doc: bool,
    pub has_approval_doc: bool,
}

/// Row shape of `leave_requests` without the attachment blobs.
///
/// Dates and enums stay textual so that one malformed row can be skipped
/// instead of failing a whole listing.
#[derive(Debug, Clone, FromRow)]
pub struct LeaveRow {
    pub id: i64,
    pub name: String,
    pub division: String,
    pub leave_type: String,
    pub submitted_on: String,
    pub start_date: String,
    pub duration: i64,
    pub status: String,
    pub has_supporting_doc: bool,
    pub has_approval_doc: bool,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = String;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let parse_date = |field: &str, value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .map_err(|e| format!("invalid {field} '{value}': {e}"))
        };

        Ok(LeaveRequest {
            id: row.id,
            leave_type: row
                .leave_type
                .parse()
                .map_err(|_| format!("unknown leave type '{}'", row.leave_type))?,
            submitted_on: parse_date("submitted_on", &row.submitted_on)?,
            start_date: parse_date("start_date", &row.start_date)?,
            duration: u32::try_from(row.duration)
                .ok()
                .filter(|d| (1..=MAX_LEAVE_DAYS).contains(d))
                .ok_or_else(|| format!("invalid duration {}", row.duration))?,
            status: row
                .status
                .parse()
                .map_err(|_| format!("unknown status '{}'", row.status))?,
            name: row.name,
            division: row.division,
            has_supporting_doc: row.has_supporting_doc,
            has_approval_doc: row.has_approval_doc,
        })
    }
}

/// A submission as accepted by the ledger, attachments already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub name: String,
    pub division: String,
    pub leave_type: LeaveType,
    pub submitted_on: NaiveDate,
    pub start_date: NaiveDate,
    pub duration: u32,
    pub supporting_doc: Option<Vec<u8>>,
    pub approval_doc: Option<Vec<u8>>,
}

impl NewLeaveRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Employee name is required".into()));
        }
        if self.duration == 0 {
            return Err(AppError::Validation(
                "Duration must be at least one day".into(),
            ));
        }
        if self.duration > MAX_LEAVE_DAYS {
            return Err(AppError::Validation(format!(
                "Duration must not exceed {MAX_LEAVE_DAYS} days"
            )));
        }
        Ok(())
    }
}
