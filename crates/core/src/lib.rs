//! Kindred Care Core - Shared types and role logic.
//!
//! This crate holds everything the portal needs that does not do I/O:
//! - `portal` - The family and caregiver web portal
//! - `cli` - Operator tools for migrations, staff validation and seeding
//!
//! # Architecture
//!
//! Storage is reached only through the traits in [`ports`], so the role
//! resolver, page guards and booking validation are tested here with
//! in-memory fakes.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, roles and statuses
//! - [`identity`] - Session identity and employee validation records
//! - [`ports`] - Storage traits implemented by the portal
//! - [`resolver`] - Session role resolution with metadata self-healing
//! - [`guard`] - Page access decisions
//! - [`booking`] - Booking form validation and service requests
//! - [`catalog`] - Packages, hourly services and caregiver stats
//! - [`schedule`] - Caregiver schedule with optimistic status changes
//! - [`chat`] - Session-local office chat with canned replies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod catalog;
pub mod chat;
pub mod guard;
pub mod identity;
pub mod ports;
pub mod resolver;
pub mod schedule;
pub mod types;

pub use types::*;
