use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TodoStatus {
    Open,
    InProgress,
    Done,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Priority {
    Low,
    #[default]
    Med,
    High,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Todo {
    #[schema(example = 1)]
    pub id: u64,
    pub owner_id: u64,
    pub assignee_id: u64,
    #[schema(example = "Send GST invoices")]
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub due_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reminder_at: Option<NaiveDateTime>,
    #[schema(example = "MED")]
    pub priority: String,
    #[schema(example = "OPEN")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_from_form_values() {
        assert_eq!("IN_PROGRESS".parse::<TodoStatus>().unwrap(), TodoStatus::InProgress);
        assert_eq!("done".parse::<TodoStatus>().unwrap(), TodoStatus::Done);
        assert!("FINISHED".parse::<TodoStatus>().is_err());
    }

    #[test]
    fn priority_defaults_to_med() {
        assert_eq!(Priority::default().as_ref(), "MED");
    }
}
