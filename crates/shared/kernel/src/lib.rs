//! Kernel utilities shared by the RSVP feature slices.
//!
//! * [`config::load_config`] layers `server.toml` with `WED__*` environment overrides.
//! * [`store::RsvpStore`] is the persistence contract for registry, invitation codes, RSVPs and
//!   guests. [`store::SurrealStore`] backs it in production; `store::MemoryStore` (feature
//!   `testing`) backs it in tests and can inject failures.
//! * `server` (feature `server`) holds the shared Axum state and the system routes.

pub mod config;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

pub use wed_domain as domain;
