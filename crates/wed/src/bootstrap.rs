//! Turns static configuration into live collaborators.

use std::borrow::Cow;
use std::time::Duration;
use tracing::info;
use wed_database::{Database, DatabaseError};
use wed_domain::config::{DatabaseConfig, LoggingConfig, MailConfig, MailTransportKind};
use wed_domain::rsvp::RegistryConfig;
use wed_kernel::store::{RsvpStore, StoreError};
use wed_logger::{ConsoleTarget, LevelFilter, Logger, LoggerError};
use wed_mailer::{LogMailer, MailTransport, SmtpMailer};

#[wed_derive::wed_error]
pub enum BootstrapError {
    #[error("Database error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Logger error{}: {source}", format_context(.context))]
    Logger { source: LoggerError, context: Option<Cow<'static, str>> },

    #[error("Store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Connects to the configured database and applies pending migrations.
///
/// # Errors
/// Forwards [`DatabaseError`] from the connection bootstrap.
pub async fn connect(config: &DatabaseConfig) -> Result<Database, BootstrapError> {
    let mut builder =
        Database::builder().url(&config.url).session(&config.namespace, &config.database);
    if let Some(credentials) = &config.credentials {
        builder = builder.auth(&credentials.username, &credentials.password);
    }
    builder.init().await.context("Connecting to database")
}

#[must_use]
pub fn mail_transport(config: &MailConfig) -> MailTransport {
    match config.transport {
        MailTransportKind::Smtp => SmtpMailer::new(&config.smtp_host, &config.smtp_username)
            .port(config.smtp_port)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .into(),
        MailTransportKind::Log => LogMailer.into(),
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
/// Fails on an unknown level name or when the logger cannot be installed.
pub fn init_logger(
    name: &str,
    config: &LoggingConfig,
    console: ConsoleTarget,
) -> Result<Logger, BootstrapError> {
    let level: LevelFilter = config.level.parse().map_err(|_| BootstrapError::Config {
        message: format!("unknown log level '{}'", config.level).into(),
        context: Some("logging.level".into()),
    })?;

    let builder = Logger::builder().name(name).level(level).console(console);
    let logger = match &config.directory {
        Some(directory) if config.json => builder.path(directory).json().init(),
        Some(directory) => builder.path(directory).init(),
        None => builder.init(),
    };
    logger.context("Installing logger")
}

/// Writes `seed` as the registry record unless one already exists.
///
/// The registry is owned by whoever administers the wedding; the seed only bootstraps an empty
/// database. Returns `true` when the seed was written.
///
/// # Errors
/// Fails when the store cannot be read or written.
pub async fn seed_registry<S: RsvpStore>(
    store: &S,
    seed: Option<&RegistryConfig>,
) -> Result<bool, BootstrapError> {
    let Some(seed) = seed else {
        return Ok(false);
    };
    if store.registry().await.context("Reading registry")?.is_some() {
        return Ok(false);
    }

    store.put_registry(seed).await.context("Seeding registry")?;
    info!(environment = %seed.environment, enabled = seed.enabled, "Registry seeded from configuration");
    Ok(true)
}
