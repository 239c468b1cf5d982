use crate::api::admin::DashboardCards;
use crate::api::attendance::AttendanceMark;
use crate::api::expenses::SubmitExpenseForm;
use crate::api::leave::{CalendarEvent, CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::location::PingReq;
use crate::api::quotations::{BulkForm, QuotationDetail, UploadQuotationForm, UploadResponse};
use crate::api::todos::{CreateTodo, UpdateTodoStatus};
use crate::model::{
    attendance::Attendance,
    expense::{Expense, ExpenseStatus},
    holiday_request::{HolidayRequest, HolidayStatus},
    location_ping::LocationPing,
    product_data::ProductData,
    quotation::Quotation,
    role::Role,
    todo::{Priority, Todo, TodoStatus},
    user::UserSummary,
};
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Office Desk API",
        version = "1.0.0",
        description = r#"
## Office Desk

Internal back office for a small business.

### Features
- **Attendance**: check-in / check-out with optional coordinates
- **Leave**: requests, admin approval and a calendar feed
- **Expenses**: claims with receipts, admin review
- **Todos**: tasks assigned between colleagues
- **Quotations**: vendor price lists; spreadsheets are read row by row
  and searchable down to catalog numbers
- **Location**: periodic position pings

### Security
Everything under `/api` needs a **JWT Bearer** access token from `/auth/login`.
Admin-only operations answer `403` for employees.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::attendance::my_attendance,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::leave::my_leave,
        crate::api::leave::request_leave,
        crate::api::leave::manage,
        crate::api::leave::approve,
        crate::api::leave::reject,
        crate::api::leave::leave_events,

        crate::api::expenses::my_expenses,
        crate::api::expenses::submit_expense,
        crate::api::expenses::manage,
        crate::api::expenses::approve,
        crate::api::expenses::reject,

        crate::api::todos::my_todos,
        crate::api::todos::create,
        crate::api::todos::set_status,

        crate::api::quotations::index,
        crate::api::quotations::get,
        crate::api::quotations::upload,
        crate::api::quotations::search,
        crate::api::quotations::bulk_delete,
        crate::api::quotations::bulk_image,

        crate::api::location::ping,
        crate::api::location::my_location,
        crate::api::location::latest,

        crate::api::admin::dashboard,
        crate::api::admin::list_users
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            Role,
            UserSummary,
            Attendance,
            AttendanceMark,
            HolidayRequest,
            HolidayStatus,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            CalendarEvent,
            Expense,
            ExpenseStatus,
            SubmitExpenseForm,
            Todo,
            TodoStatus,
            Priority,
            CreateTodo,
            UpdateTodoStatus,
            Quotation,
            ProductData,
            QuotationDetail,
            UploadQuotationForm,
            UploadResponse,
            BulkForm,
            LocationPing,
            PingReq,
            DashboardCards
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login, registration and token rotation"),
        (name = "Attendance", description = "Check-in and check-out"),
        (name = "Leave", description = "Leave requests and calendar"),
        (name = "Expenses", description = "Expense claims"),
        (name = "Todos", description = "Task assignment"),
        (name = "Quotations", description = "Vendor quotation uploads and search"),
        (name = "Location", description = "Location pings"),
        (name = "Admin", description = "Admin dashboard and user list"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/attendance/check-in",
            "/api/leave/events",
            "/api/expenses/{expense_id}/approve",
            "/api/todos/{todo_id}/status",
            "/api/quotations/search",
            "/api/location/latest",
            "/api/admin/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
