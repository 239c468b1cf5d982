use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::todo::{Priority, Todo, TodoStatus},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateTodo {
    #[schema(example = "Send GST invoices")]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the caller; only admins may assign to someone else
    #[schema(example = 3)]
    pub assignee_id: Option<u64>,
    #[schema(example = "2026-01-10T17:00")]
    pub due_at: Option<String>,
    #[schema(example = "2026-01-10T09:00")]
    pub reminder_at: Option<String>,
    #[schema(example = "HIGH")]
    pub priority: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTodoStatus {
    #[schema(example = "IN_PROGRESS")]
    pub status: String,
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Accepts ISO date-times with or without seconds, or a bare date (midnight).
fn parse_datetime(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDateTime>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {field}: {raw}")))
}

fn parse_priority(raw: Option<&str>) -> AppResult<Priority> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(Priority::default()),
        Some(p) => p
            .parse::<Priority>()
            .map_err(|_| AppError::BadRequest(format!("Unknown priority: {p}"))),
    }
}

/// Employees can only assign to themselves; anything else is quietly redirected.
fn effective_assignee(auth: &AuthUser, requested: Option<u64>) -> u64 {
    match requested {
        Some(id) if auth.is_admin() => id,
        _ => auth.user_id,
    }
}

#[utoipa::path(
    get,
    path = "/api/todos",
    responses(
        (status = 200, description = "Todos assigned to the caller", body = [Todo]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn my_todos(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let todos = sqlx::query_as::<_, Todo>(
        r#"
        SELECT id, owner_id, assignee_id, title, description, due_at, reminder_at,
               priority, status, created_at
        FROM todos
        WHERE assignee_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(todos))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Task created", body = Object, example = json!({
            "message": "Task created", "assignee_id": 3
        })),
        (status = 400, description = "Missing title, bad date, unknown priority or assignee"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn create(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTodo>,
) -> AppResult<HttpResponse> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }
    if title.chars().count() > 255 {
        return Err(AppError::BadRequest("title is limited to 255 characters".into()));
    }

    let due_at = parse_datetime("due_at", payload.due_at.as_deref())?;
    let reminder_at = parse_datetime("reminder_at", payload.reminder_at.as_deref())?;
    let priority = parse_priority(payload.priority.as_deref())?;
    let assignee_id = effective_assignee(&auth, payload.assignee_id);

    if assignee_id != auth.user_id {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(assignee_id)
            .fetch_one(pool.get_ref())
            .await?;
        if found == 0 {
            return Err(AppError::BadRequest(format!("Unknown assignee: {assignee_id}")));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO todos (owner_id, assignee_id, title, description, due_at, reminder_at, priority, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(assignee_id)
    .bind(title)
    .bind(payload.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
    .bind(due_at)
    .bind(reminder_at)
    .bind(priority.as_ref())
    .bind(TodoStatus::Open.as_ref())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(owner_id = auth.user_id, assignee_id, %priority, "Task created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Task created",
        "assignee_id": assignee_id,
    })))
}

#[utoipa::path(
    post,
    path = "/api/todos/{todo_id}/status",
    params(("todo_id" = u64, Path, description = "Todo id")),
    request_body = UpdateTodoStatus,
    responses(
        (status = 200, description = "Updated", body = Object, example = json!({"message": "Updated"})),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Neither owner nor assignee"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Todos"
)]
pub async fn set_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTodoStatus>,
) -> AppResult<HttpResponse> {
    let todo_id = path.into_inner();

    let (owner_id, assignee_id) =
        sqlx::query_as::<_, (u64, u64)>("SELECT owner_id, assignee_id FROM todos WHERE id = ?")
            .bind(todo_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))?;

    if auth.user_id != owner_id && auth.user_id != assignee_id {
        return Err(AppError::Forbidden("Not allowed".into()));
    }

    let status = payload
        .status
        .trim()
        .parse::<TodoStatus>()
        .map_err(|_| AppError::BadRequest(format!("Unknown status: {}", payload.status)))?;

    sqlx::query("UPDATE todos SET status = ? WHERE id = ?")
        .bind(status.as_ref())
        .bind(todo_id)
        .execute(pool.get_ref())
        .await?;

    tracing::debug!(todo_id, user_id = auth.user_id, %status, "Todo status changed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 7,
            email: "ravi@example.com".into(),
            role,
        }
    }

    #[test]
    fn employees_assign_to_themselves() {
        assert_eq!(effective_assignee(&user(Role::Employee), Some(9)), 7);
        assert_eq!(effective_assignee(&user(Role::Employee), None), 7);
        assert_eq!(effective_assignee(&user(Role::Admin), Some(9)), 9);
        assert_eq!(effective_assignee(&user(Role::Admin), None), 7);
    }

    #[test]
    fn datetime_local_values_parse() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("due_at", Some("2026-01-10T17:00")).unwrap(), Some(expected));
        assert_eq!(parse_datetime("due_at", Some("2026-01-10T17:00:00")).unwrap(), Some(expected));
        assert_eq!(parse_datetime("due_at", Some("2026-01-10 17:00:00")).unwrap(), Some(expected));
        assert_eq!(
            parse_datetime("due_at", Some("2026-01-10")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn blank_dates_are_absent_and_garbage_is_rejected() {
        assert_eq!(parse_datetime("due_at", None).unwrap(), None);
        assert_eq!(parse_datetime("due_at", Some("  ")).unwrap(), None);
        assert!(matches!(
            parse_datetime("reminder_at", Some("next tuesday")),
            Err(AppError::BadRequest(msg)) if msg.contains("reminder_at")
        ));
    }

    #[test]
    fn priority_defaults_and_validates() {
        assert_eq!(parse_priority(None).unwrap(), Priority::Med);
        assert_eq!(parse_priority(Some("")).unwrap(), Priority::Med);
        assert_eq!(parse_priority(Some("high")).unwrap(), Priority::High);
        assert!(parse_priority(Some("URGENT")).is_err());
    }
}
