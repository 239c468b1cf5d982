pub mod email_registry;
pub mod sheet_parser;
pub mod uploads;
