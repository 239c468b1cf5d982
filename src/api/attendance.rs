use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::attendance::{Attendance, AttendanceKind},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Default)]
pub struct AttendanceMark {
    #[schema(example = 12.9716)]
    pub lat: Option<f64>,
    #[schema(example = 77.5946)]
    pub lon: Option<f64>,
    #[schema(example = "Client visit, Whitefield")]
    pub note: Option<String>,
}

impl AttendanceMark {
    fn validate(&self) -> AppResult<()> {
        if self.lat.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            return Err(AppError::BadRequest("lat must be between -90 and 90".into()));
        }
        if self.lon.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
            return Err(AppError::BadRequest("lon must be between -180 and 180".into()));
        }
        if self.note.as_deref().is_some_and(|n| n.chars().count() > 255) {
            return Err(AppError::BadRequest("note is limited to 255 characters".into()));
        }
        Ok(())
    }

    /// An empty body marks without location; anything else must be valid JSON.
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid attendance body: {e}")))
    }
}

async fn record(
    auth: &AuthUser,
    pool: &MySqlPool,
    kind: AttendanceKind,
    mark: &AttendanceMark,
) -> AppResult<()> {
    mark.validate()?;

    sqlx::query(
        r#"
        INSERT INTO attendance (user_id, kind, timestamp, lat, lon, note)
        VALUES (?, ?, UTC_TIMESTAMP(), ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(kind.as_ref())
    .bind(mark.lat)
    .bind(mark.lon)
    .bind(mark.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .execute(pool)
    .await
    .inspect_err(|e| tracing::error!(error = %e, user_id = auth.user_id, %kind, "Attendance insert failed"))?;

    Ok(())
}

/// The caller's last 100 attendance records
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Newest first", body = [Attendance]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, kind, timestamp, lat, lon, note
        FROM attendance
        WHERE user_id = ?
        ORDER BY timestamp DESC, id DESC
        LIMIT 100
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = AttendanceMark,
    responses(
        (status = 201, description = "Checked in", body = Object, example = json!({"message": "Checked in"})),
        (status = 400, description = "Malformed body or invalid coordinates"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let mark = AttendanceMark::from_body(&body)?;
    record(&auth, pool.get_ref(), AttendanceKind::CheckIn, &mark).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "message": "Checked in" })))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = AttendanceMark,
    responses(
        (status = 201, description = "Checked out", body = Object, example = json!({"message": "Checked out"})),
        (status = 400, description = "Malformed body or invalid coordinates"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let mark = AttendanceMark::from_body(&body)?;
    record(&auth, pool.get_ref(), AttendanceKind::CheckOut, &mark).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "message": "Checked out" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_range_checked() {
        let ok = AttendanceMark { lat: Some(12.97), lon: Some(77.59), note: None };
        assert!(ok.validate().is_ok());

        let bad_lat = AttendanceMark { lat: Some(91.0), ..Default::default() };
        assert!(bad_lat.validate().is_err());

        let bad_lon = AttendanceMark { lon: Some(-181.0), ..Default::default() };
        assert!(bad_lon.validate().is_err());
    }

    #[test]
    fn missing_location_is_fine() {
        assert!(AttendanceMark::default().validate().is_ok());
    }

    #[test]
    fn empty_body_marks_without_location() {
        for body in [&b""[..], &b"  \n"[..]] {
            let mark = AttendanceMark::from_body(body).unwrap();
            assert_eq!(mark.lat, None);
            assert_eq!(mark.note, None);
        }
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(matches!(AttendanceMark::from_body(br#"{"lat":"12.9"}"#), Err(AppError::BadRequest(_))));
        assert!(AttendanceMark::from_body(b"lat=12.9").is_err());

        let mark = AttendanceMark::from_body(br#"{"lat":12.9,"lon":77.5,"note":"site"}"#).unwrap();
        assert_eq!(mark.lat, Some(12.9));
        assert_eq!(mark.note.as_deref(), Some("site"));
    }
}
