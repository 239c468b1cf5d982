use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HolidayStatus {
    Pending,
    Approved,
    Rejected,
}

impl HolidayStatus {
    /// Calendar colour for a stored status string.
    pub fn calendar_color(status: &str) -> &'static str {
        match status.parse::<HolidayStatus>() {
            Ok(HolidayStatus::Pending) => "#F0AD4E",
            Ok(HolidayStatus::Approved) => "#5CB85C",
            Ok(HolidayStatus::Rejected) => "#D9534F",
            Err(_) => "#6DB9D6",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HolidayRequest {
    #[schema(example = 1)]
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Sick")]
    pub leave_type: Option<String>,
    pub reason: Option<String>,
    #[schema(example = "PENDING")]
    pub status: String,
    pub decided_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_by_status() {
        assert_eq!(HolidayStatus::calendar_color("PENDING"), "#F0AD4E");
        assert_eq!(HolidayStatus::calendar_color("APPROVED"), "#5CB85C");
        assert_eq!(HolidayStatus::calendar_color("REJECTED"), "#D9534F");
        assert_eq!(HolidayStatus::calendar_color("CANCELLED"), "#6DB9D6");
    }
}
