//! Domain models for the portal.

pub mod report;
pub mod session;
pub mod user;

pub use report::{CareReport, MAX_SUMMARY_LENGTH};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{ClientProfile, User};
