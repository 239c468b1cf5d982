use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ExpenseStatus {
    Submitted,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Expense {
    #[schema(example = 1)]
    pub id: u64,
    pub user_id: u64,
    #[schema(example = 1250.5)]
    pub amount: f64,
    #[schema(example = "INR")]
    pub currency: String,
    pub category: Option<String>,
    pub caption: Option<String>,
    #[schema(example = "uploads/expenses/3f2a.pdf")]
    pub file_path: Option<String>,
    #[schema(example = "SUBMITTED")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub submitted_at: NaiveDateTime,
    pub reviewed_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<NaiveDateTime>,
}
