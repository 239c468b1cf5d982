pub mod attendance;
pub mod expense;
pub mod holiday_request;
pub mod location_ping;
pub mod product_data;
pub mod quotation;
pub mod role;
pub mod todo;
pub mod user;
