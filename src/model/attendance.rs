use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "CHECK_IN")]
    pub kind: String,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub note: Option<String>,
}
