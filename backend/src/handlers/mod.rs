pub mod auth;
pub mod timesheets;
pub mod users;
