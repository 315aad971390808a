pub mod attendance;
pub mod calendar;
pub mod employee;
pub mod leave_request;
