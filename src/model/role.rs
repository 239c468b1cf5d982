use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    /// Unknown role strings fall back to the least privileged role.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or(Role::Employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_column_values() {
        assert_eq!(Role::Admin.as_ref(), "ADMIN");
        assert_eq!("EMPLOYEE".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_role_is_employee() {
        assert_eq!(Role::from_db("SUPERUSER"), Role::Employee);
    }
}
