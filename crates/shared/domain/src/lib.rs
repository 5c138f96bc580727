//! # Domain Models
//!
//! Plain data shared by every RSVP crate: the guest/RSVP records, invitation codes, the
//! registry switch and the static configuration. Depends on `serde` only; no I/O here.

pub mod config;
pub mod constants;
pub mod registry;
pub mod rsvp;
