//! SQLite persistence for employees, leave requests and attendance rows.

pub mod attendance;
pub mod employee;
pub mod leave_request;

/// Dates are stored as ISO text so that range filters compare lexically.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
