//! Data models shared across persistence, services and API handlers.

pub mod session_token;
pub mod timesheet;
pub mod user;
