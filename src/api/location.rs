use crate::{auth::auth::AuthUser, error::AppResult, model::location_ping::LocationPing};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// Browser geolocation sample. Trackers send either `accuracy` or `accuracy_m`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PingReq {
    #[schema(example = 12.9716)]
    pub lat: Option<f64>,
    #[schema(example = 77.5946)]
    pub lon: Option<f64>,
    #[schema(example = 18.5)]
    pub accuracy: Option<f64>,
    pub accuracy_m: Option<f64>,
}

impl PingReq {
    fn coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lon) = (self.lat?, self.lon?);
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
    }

    fn accuracy_m(&self) -> Option<f64> {
        self.accuracy.or(self.accuracy_m).filter(|a| a.is_finite() && *a >= 0.0)
    }
}

#[utoipa::path(
    post,
    path = "/api/location/ping",
    request_body = PingReq,
    responses(
        (status = 200, description = "Stored", body = Object, example = json!({"ok": true})),
        (status = 400, description = "Missing coordinates", body = Object, example = json!({
            "ok": false, "error": "lat/lon required"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn ping(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PingReq>,
) -> AppResult<HttpResponse> {
    let Some((lat, lon)) = payload.coordinates() else {
        return Ok(HttpResponse::BadRequest().json(json!({ "ok": false, "error": "lat/lon required" })));
    };

    sqlx::query(
        "INSERT INTO location_pings (user_id, lat, lon, accuracy_m, captured_at) VALUES (?, ?, ?, ?, UTC_TIMESTAMP(3))",
    )
    .bind(auth.user_id)
    .bind(lat)
    .bind(lon)
    .bind(payload.accuracy_m())
    .execute(pool.get_ref())
    .await?;

    tracing::trace!(user_id = auth.user_id, lat, lon, "Location ping");

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[utoipa::path(
    get,
    path = "/api/location",
    responses(
        (status = 200, description = "The caller's last 100 pings", body = [LocationPing]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn my_location(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let pings = sqlx::query_as::<_, LocationPing>(
        r#"
        SELECT id, user_id, lat, lon, accuracy_m, captured_at
        FROM location_pings
        WHERE user_id = ?
        ORDER BY captured_at DESC, id DESC
        LIMIT 100
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(pings))
}

/// Newest ping of every user who ever sent one
#[utoipa::path(
    get,
    path = "/api/location/latest",
    responses(
        (status = 200, description = "One ping per user", body = [LocationPing]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn latest(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    // max(id) breaks ties between pings sharing a timestamp
    let pings = sqlx::query_as::<_, LocationPing>(
        r#"
        SELECT p.id, p.user_id, p.lat, p.lon, p.accuracy_m, p.captured_at
        FROM location_pings p
        JOIN (
            SELECT MAX(l.id) AS id
            FROM location_pings l
            JOIN (
                SELECT user_id, MAX(captured_at) AS mx
                FROM location_pings
                GROUP BY user_id
            ) newest ON newest.user_id = l.user_id AND newest.mx = l.captured_at
            GROUP BY l.user_id
        ) pick ON pick.id = p.id
        ORDER BY p.user_id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(pings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_coordinates_are_required() {
        let ping: PingReq = serde_json::from_value(json!({ "lat": 12.9 })).unwrap();
        assert_eq!(ping.coordinates(), None);

        let ping: PingReq = serde_json::from_value(json!({ "lat": 12.9, "lon": 77.5 })).unwrap();
        assert_eq!(ping.coordinates(), Some((12.9, 77.5)));
    }

    #[test]
    fn out_of_range_coordinates_are_dropped() {
        let ping = PingReq {
            lat: Some(91.0),
            lon: Some(10.0),
            ..Default::default()
        };
        assert_eq!(ping.coordinates(), None);
    }

    #[test]
    fn either_accuracy_key_is_accepted() {
        let ping: PingReq = serde_json::from_value(json!({ "lat": 1.0, "lon": 2.0, "accuracy_m": 30.0 })).unwrap();
        assert_eq!(ping.accuracy_m(), Some(30.0));

        let ping: PingReq =
            serde_json::from_value(json!({ "lat": 1.0, "lon": 2.0, "accuracy": 12.0, "accuracy_m": 30.0 })).unwrap();
        assert_eq!(ping.accuracy_m(), Some(12.0));
    }
}
