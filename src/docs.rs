use crate::api::attendance::MarkAttendance;
use crate::api::employee::{CreateEmployee, ReportRow};
use crate::api::leave::{CreateLeave, UpdateLeaveStatus};
use crate::api::message::BroadcastMessage;
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::leave::{Leave, LeaveStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staffdesk API",
        version = "1.0.0",
        description = r#"
## Employee & Leave Management

Administrators manage employee records, review attendance, and
approve/reject leave requests; employees view their own profile and file
leave requests.

### Key Features
- **Employee Directory**: CRUD over employee records with derived,
  immutable employee IDs (`ENG_0004` style, per-department serials)
- **Leave Workflow**: submit → pending → approved (archived) or
  rejected (discarded)
- **Attendance**: daily Present/Absent marking per employee
- **Broadcast**: acknowledgement-only message stub

### Security
All business endpoints require **JWT Bearer authentication**. Employee
CRUD and leave decisions are **Admin** only; employees reach their own
records.
"#,
    ),
    paths(
        crate::api::leave::create_leave,
        crate::api::leave::list_pending,
        crate::api::leave::leaves_for_employee,
        crate::api::leave::update_leave_status,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::search_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::report_employees,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::attendance_for_employee,

        crate::api::message::broadcast_message,
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            ReportRow,
            Leave,
            LeaveStatus,
            CreateLeave,
            UpdateLeaveStatus,
            Attendance,
            MarkAttendance,
            BroadcastMessage
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Leave", description = "Leave workflow APIs"),
        (name = "Attendance", description = "Attendance APIs"),
        (name = "Message", description = "Broadcast message stub"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
