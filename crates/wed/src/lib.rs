//! Facade crate for the RSVP service features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it composes other crates and holds no business logic.
//!
//! ## Usage
//! - Add `wed` with the `server` feature for the HTTP binary.
//! - Call [`init`] to build the feature slices; [`bootstrap`] wires config to database,
//!   mailer and logger.

pub mod bootstrap;

pub use wed_database::Database;
pub use wed_domain as domain;
pub use wed_kernel as kernel;

use domain::config::ApiConfig;
use domain::registry::InitializedSlice;

/// Feature registry for runtime introspection.
pub mod features {
    pub use wed_confirmation as confirmation;
    pub use wed_rsvp as rsvp;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        "rsvp",
        "confirmation",
        #[cfg(feature = "server")]
        "server",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        pub use wed_kernel::server::router::system_router;
        use wed_kernel::server::ApiState;
        use utoipa_axum::router::OpenApiRouter;

        /// Routes of every feature slice.
        #[must_use]
        pub fn feature_router() -> OpenApiRouter<ApiState> {
            OpenApiRouter::new()
                .merge(crate::features::rsvp::router())
                .merge(crate::features::confirmation::router())
        }
    }
}

/// Builds every feature slice over the shared database.
#[must_use]
pub fn init(config: &ApiConfig, database: &Database) -> Vec<InitializedSlice> {
    let mailer = bootstrap::mail_transport(&config.mail);
    let sender = config.mail.sender_name.as_str();

    vec![
        features::rsvp::init(database, mailer.clone(), sender),
        features::confirmation::init(database, mailer, sender),
    ]
}
