use crate::api::attendance::{CorrectAttendance, PresenceResponse};
use crate::api::calendar::DailyResponse;
use crate::api::employee::CreateEmployee;
use crate::api::leave_request::{AttachmentLinks, CreateLeave, LeaveListResponse};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::reconcile::summary::{CalendarEntry, DaySummary, DetailKind};
use crate::store::attendance::{Correction, PresenceRecord};
use crate::store::leave_request::{DecisionOutcome, LeaveFilter, LeaveTypeCount};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Dashboard API",
        version = "1.0.0",
        description = r#"
## Attendance Dashboard

Reconciles monthly attendance sheets with approved leave requests.

### Key Features
- **Attendance sheets**
  - Upload a month as CSV, list presence, correct or delete single rows
- **Leave ledger**
  - Submit requests with attachments, approve or reject them once
- **Calendar**
  - Present, late and absent counts per day with drill-down lists

### Roles
There is no login. Send `X-Role: admin` for administrator routes; requests
without the header act as an employee.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_stats,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_attachments,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::attendance::upload_attendance,
        crate::api::attendance::presence_list,
        crate::api::attendance::clear_month,
        crate::api::attendance::correct_attendance,
        crate::api::attendance::attendance_corrections,
        crate::api::attendance::delete_attendance,

        crate::api::calendar::calendar,
        crate::api::calendar::daily,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee
    ),
    components(
        schemas(
            CreateLeave,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeaveFilter,
            LeaveListResponse,
            LeaveTypeCount,
            DecisionOutcome,
            AttachmentLinks,
            AttendanceRecord,
            PresenceRecord,
            PresenceResponse,
            CorrectAttendance,
            Correction,
            CalendarEntry,
            DaySummary,
            DetailKind,
            DailyResponse,
            CreateEmployee,
            Employee
        )
    ),
    tags(
        (name = "Leave", description = "Leave ledger APIs"),
        (name = "Attendance", description = "Attendance sheet APIs"),
        (name = "Calendar", description = "Daily attendance summaries"),
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;
