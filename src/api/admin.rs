use crate::{
    auth::auth::AuthUser,
    error::AppResult,
    model::{
        expense::ExpenseStatus, holiday_request::HolidayStatus, todo::TodoStatus, user::UserSummary,
    },
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct DashboardCards {
    /// Check-ins and check-outs recorded since UTC midnight
    #[schema(example = 14)]
    pub attendance_today: i64,
    #[schema(example = 2)]
    pub pending_leaves: i64,
    #[schema(example = 5)]
    pub pending_expenses: i64,
    #[schema(example = 11)]
    pub open_todos: i64,
    #[schema(example = 42)]
    pub quotations: i64,
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Counters for the admin landing page", body = DashboardCards),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let cards = sqlx::query_as::<_, DashboardCards>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM attendance WHERE timestamp >= UTC_DATE()) AS attendance_today,
            (SELECT COUNT(*) FROM holiday_requests WHERE status = ?) AS pending_leaves,
            (SELECT COUNT(*) FROM expenses WHERE status = ?) AS pending_expenses,
            (SELECT COUNT(*) FROM todos WHERE status = ?) AS open_todos,
            (SELECT COUNT(*) FROM quotations) AS quotations
        "#,
    )
    .bind(HolidayStatus::Pending.as_ref())
    .bind(ExpenseStatus::Submitted.as_ref())
    .bind(TodoStatus::Open.as_ref())
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(cards))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users, for assignment pickers", body = [UserSummary]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role, active, created_at FROM users ORDER BY name, id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(users))
}
