pub mod admin;
pub mod attendance;
pub mod expenses;
pub mod leave;
pub mod location;
pub mod quotations;
pub mod todos;
