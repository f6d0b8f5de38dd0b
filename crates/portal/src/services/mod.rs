//! Business logic services for the portal.
//!
//! - `auth` - Account registration and password sign-in
//! - `roles` - Cached role resolution for guards
//! - `session_events` - Sign-in, sign-out and metadata change notifications
//! - `email` - Contact form messages

pub mod auth;
pub mod email;
pub mod roles;
pub mod session_events;

pub use auth::{AuthError, AuthService, Registration};
pub use email::{ContactMessage, EmailError, EmailService};
pub use roles::RoleService;
pub use session_events::{SessionEvent, SessionEvents, SessionSubscription};
