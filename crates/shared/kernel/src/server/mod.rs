//! Shared Axum state and the routes every deployment exposes.

pub mod health;
pub mod router;
pub mod state;

pub use state::{ApiState, ApiStateBuilder, ApiStateError};
