use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LocationPing {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = 12.9716)]
    pub lat: f64,
    #[schema(example = 77.5946)]
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    #[schema(value_type = String, format = "date-time")]
    pub captured_at: NaiveDateTime,
}
