//! Core types for Kindred Care.
//!
//! Type-safe wrappers for IDs, emails, prices, roles, and statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use role::{ResolvedRole, RoleMetadata, RoleState};
pub use status::*;
