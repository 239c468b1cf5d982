use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::holiday_request::{HolidayRequest, HolidayStatus},
};
use actix_web::{HttpResponse, web};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Sick")]
    pub leave_type: Option<String>,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by status (PENDING, APPROVED, REJECTED)
    #[schema(example = "PENDING")]
    pub status: Option<String>,
    /// Page number, starting at 1
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Items per page, at most 100
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<HolidayRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/// One entry of the leave calendar feed
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: u64,
    #[schema(example = "Asha Rao: Sick")]
    pub title: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start: NaiveDate,
    /// Exclusive end, the day after the last day off
    #[schema(example = "2026-01-04", format = "date", value_type = String)]
    pub end: NaiveDate,
    pub all_day: bool,
    #[schema(example = "#F0AD4E", value_type = String)]
    pub color: &'static str,
    #[schema(value_type = Object)]
    pub extended_props: serde_json::Value,
}

#[derive(FromRow)]
struct LeaveWithUser {
    id: u64,
    user_id: u64,
    user_name: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: Option<String>,
    reason: Option<String>,
    status: String,
}

impl LeaveWithUser {
    fn into_event(self) -> CalendarEvent {
        let name = self
            .user_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("User {}", self.user_id));
        let leave_type = self
            .leave_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Leave".to_string());

        CalendarEvent {
            id: self.id,
            title: format!("{name}: {leave_type}"),
            start: self.start_date,
            end: self
                .end_date
                .checked_add_days(Days::new(1))
                .unwrap_or(self.end_date),
            all_day: true,
            color: HolidayStatus::calendar_color(&self.status),
            extended_props: serde_json::json!({
                "status": self.status,
                "reason": self.reason.unwrap_or_default(),
            }),
        }
    }
}

const SELECT_LEAVE: &str = r#"
    SELECT id, user_id, start_date, end_date, leave_type, reason, status,
           decided_by, decided_at, created_at
    FROM holiday_requests
"#;

#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "The caller's leave requests", body = [HolidayRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leave(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let sql = format!("{SELECT_LEAVE} WHERE user_id = ? ORDER BY id DESC");

    let requests = sqlx::query_as::<_, HolidayRequest>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave requested", body = Object, example = json!({
            "message": "Leave requested", "status": "PENDING"
        })),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn request_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    if payload.start_date > payload.end_date {
        return Err(AppError::BadRequest("start_date cannot be after end_date".into()));
    }

    let leave_type = payload.leave_type.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if leave_type.is_some_and(|t| t.chars().count() > 50) {
        return Err(AppError::BadRequest("leave_type is limited to 50 characters".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO holiday_requests (user_id, start_date, end_date, leave_type, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(leave_type)
    .bind(payload.reason.as_deref())
    .bind(HolidayStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(user_id = auth.user_id, start = %payload.start_date, end = %payload.end_date, "Leave requested");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave requested",
        "status": HolidayStatus::Pending,
    })))
}

/// Rows skipped before a 1-based page.
fn page_offset(page: u64, per_page: u64) -> AppResult<u64> {
    page.saturating_sub(1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::BadRequest(format!("page {page} is out of range")))
}

#[utoipa::path(
    get,
    path = "/api/leave/manage",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave requests", body = LeaveListResponse),
        (status = 400, description = "Unknown status or page out of range"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn manage(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = page_offset(page, per_page)?;

    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<HolidayStatus>()
                .map_err(|_| AppError::BadRequest(format!("Unknown status: {s}")))
        })
        .transpose()?;

    let where_sql = if status.is_some() { " WHERE status = ?" } else { "" };

    let count_sql = format!("SELECT COUNT(*) FROM holiday_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(s) = status {
        count_q = count_q.bind(s.to_string());
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!("{SELECT_LEAVE}{where_sql} ORDER BY id DESC LIMIT ? OFFSET ?");
    let mut data_q = sqlx::query_as::<_, HolidayRequest>(&data_sql);
    if let Some(s) = status {
        data_q = data_q.bind(s.to_string());
    }
    let data = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

async fn decide(
    auth: &AuthUser,
    pool: &MySqlPool,
    req_id: u64,
    outcome: HolidayStatus,
) -> AppResult<()> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        UPDATE holiday_requests
        SET status = ?, decided_by = ?, decided_at = UTC_TIMESTAMP()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(outcome.as_ref())
    .bind(auth.user_id)
    .bind(req_id)
    .bind(HolidayStatus::Pending.as_ref())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let found =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM holiday_requests WHERE id = ?")
                .bind(req_id)
                .fetch_one(pool)
                .await?;

        return Err(if found > 0 {
            AppError::Conflict("Leave request already decided".into())
        } else {
            AppError::NotFound("Leave request not found".into())
        });
    }

    tracing::info!(req_id, decided_by = auth.user_id, %outcome, "Leave decided");
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/leave/{req_id}/approve",
    params(("req_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Approved", body = Object, example = json!({"message": "Approved"})),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(&auth, pool.get_ref(), path.into_inner(), HolidayStatus::Approved).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Approved" })))
}

#[utoipa::path(
    post,
    path = "/api/leave/{req_id}/reject",
    params(("req_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Rejected", body = Object, example = json!({"message": "Rejected"})),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(&auth, pool.get_ref(), path.into_inner(), HolidayStatus::Rejected).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Rejected" })))
}

/// Calendar feed: admins see everyone, employees only themselves
#[utoipa::path(
    get,
    path = "/api/leave/events",
    responses(
        (status = 200, description = "Calendar events", body = [CalendarEvent]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_events(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let mut sql = String::from(
        r#"
        SELECT h.id, h.user_id, u.name AS user_name, h.start_date, h.end_date,
               h.leave_type, h.reason, h.status
        FROM holiday_requests h
        LEFT JOIN users u ON u.id = h.user_id
        "#,
    );
    if !auth.is_admin() {
        sql.push_str(" WHERE h.user_id = ?");
    }
    sql.push_str(" ORDER BY h.start_date");

    let mut q = sqlx::query_as::<_, LeaveWithUser>(&sql);
    if !auth.is_admin() {
        q = q.bind(auth.user_id);
    }

    let events: Vec<CalendarEvent> = q
        .fetch_all(pool.get_ref())
        .await?
        .into_iter()
        .map(LeaveWithUser::into_event)
        .collect();

    Ok(HttpResponse::Ok().json(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets_never_overflow() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
        assert_eq!(page_offset(0, 20).unwrap(), 0);
        assert!(matches!(page_offset(u64::MAX, 100), Err(AppError::BadRequest(_))));
    }

    fn row(status: &str, leave_type: Option<&str>, user_name: Option<&str>) -> LeaveWithUser {
        LeaveWithUser {
            id: 4,
            user_id: 12,
            user_name: user_name.map(str::to_string),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 30).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            leave_type: leave_type.map(str::to_string),
            reason: None,
            status: status.to_string(),
        }
    }

    #[test]
    fn event_end_is_exclusive() {
        let event = row("APPROVED", Some("Annual"), Some("Asha Rao")).into_event();
        assert_eq!(event.title, "Asha Rao: Annual");
        assert_eq!(event.end, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(event.color, "#5CB85C");
        assert!(event.all_day);
    }

    #[test]
    fn event_falls_back_for_missing_names() {
        let event = row("PENDING", None, None).into_event();
        assert_eq!(event.title, "User 12: Leave");
        assert_eq!(event.extended_props["status"], "PENDING");
        assert_eq!(event.extended_props["reason"], "");
    }

    #[test]
    fn event_serializes_for_calendar_widgets() {
        let value = serde_json::to_value(row("REJECTED", Some("Sick"), Some("Ravi")).into_event()).unwrap();
        assert_eq!(value["allDay"], true);
        assert_eq!(value["start"], "2026-03-30");
        assert_eq!(value["end"], "2026-04-01");
        assert_eq!(value["extendedProps"]["status"], "REJECTED");
    }
}
