//! Storage-engine agnostic persistence contract plus its PostgreSQL and
//! in-memory implementations.

pub mod error;
pub mod memory;
pub mod session_token;
pub mod timesheet;
pub mod user;

pub use error::StoreError;
pub use memory::{MemoryTimesheetRepository, MemoryTokenRepository, MemoryUserRepository};
pub use session_token::{PgTokenRepository, TokenRepository};
pub use timesheet::{PgTimesheetRepository, TimesheetRepository};
pub use user::{PgUserRepository, UserRepository};

#[cfg(test)]
pub use session_token::MockTokenRepository;
#[cfg(test)]
pub use timesheet::MockTimesheetRepository;
#[cfg(test)]
pub use user::MockUserRepository;
