//! # Database
//!
//! Opens the [SurrealDB](https://surrealdb.com) connection used by the RSVP store and brings the
//! schema up to date.
//!
//! - **Engine agnostic**: `mem://`, `rocksdb://` (feature `storage-rocksdb`), `ws://` and
//!   `http://` through the `any` engine.
//! - **Start-up retries**: health checks back off exponentially while a remote engine boots.
//! - **Migrations**: versioned `.surql` scripts compiled into the binary, applied once and
//!   recorded with a checksum in the `migration` table.
//!
//! ## Example
//!
//! ```rust
//! use wed_database::{Database, DatabaseError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder().url("mem://").session("wedding", "rsvp").init().await?;
//!     let _version = db.version().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};

use migrations::MigrationRunner;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{debug, info, instrument, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    ns: String,
    db: String,
}

/// Cloneable handle to an open, migrated `SurrealDB` session.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.ns
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.inner.db
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// Fluent builder for [`Database`].
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
}

impl DatabaseBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Root credentials; not needed for `mem://`.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Connects, waits for the engine to be healthy, signs in, selects the session and applies
    /// pending migrations.
    ///
    /// Health checks are attempted up to three times, doubling the delay from 500ms.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if URL, namespace or database is missing.
    /// * [`DatabaseError::Connection`] if the engine cannot start or stays unhealthy.
    /// * [`DatabaseError::Auth`] if the credentials are rejected.
    /// * [`DatabaseError::Surreal`] / [`DatabaseError::Migration`] if the session or schema
    ///   setup fails.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = self.url.ok_or(DatabaseError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;
        let (ns, db) = self.ns.zip(self.db).ok_or(DatabaseError::Validation {
            message: "Namespace and database are required".into(),
            context: None,
        })?;

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        wait_until_healthy(&instance, &url).await?;

        if let Some((username, password)) = self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.clone().into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let report = MigrationRunner::new(&instance).run().await?;
        for skipped in &report.skipped {
            debug!(version = %skipped.version, "Migration already applied");
        }
        for applied in &report.applied {
            info!(version = %applied.version, checksum = %applied.checksum, "Applied migration");
        }

        Ok(Database { inner: Arc::new(DatabaseInner { instance, ns, db }) })
    }
}

async fn wait_until_healthy(instance: &Surreal<Any>, url: &str) -> Result<(), DatabaseError> {
    let mut delay = INITIAL_BACKOFF;
    for attempt in 1..=HEALTH_ATTEMPTS {
        if instance.health().await.is_ok() {
            return Ok(());
        }
        if attempt == HEALTH_ATTEMPTS {
            break;
        }
        warn!(attempt, ?delay, "Database not ready, retrying...");
        tokio::time::sleep(delay).await;
        delay *= 2;
    }

    Err(DatabaseError::Connection {
        message: "Unhealthy after retries".into(),
        context: Some(url.to_owned().into()),
    })
}
