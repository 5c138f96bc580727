//! # Runtime
//!
//! Builds the [Tokio](https://tokio.rs) runtime for the workspace binaries from a small set of
//! named profiles, so the server and the maintenance tools start the same way.
//!
//! ## Profiles
//! * **Server**: all cores, long keep-alive, for the HTTP endpoints.
//! * **Maintenance**: two workers, for one-shot jobs such as the confirmation sweep.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[wed_runtime::main(server)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use wed_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Worker count used when hardware detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// Default stack size per worker (3 `MiB`).
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const MAX_WORKER_THREADS: usize = 1024;
const DEFAULT_THREAD_NAME: &str = "wed-worker";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

/// `TOKIO_WORKER_THREADS` when set and sane, otherwise the available parallelism.
fn detected_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= MAX_WORKER_THREADS)
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

fn thread_name_or_default(name: String) -> String {
    if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name }
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Preset for the HTTP server.
    #[must_use = "Use this configuration to boot the server runtime"]
    pub fn server() -> Self {
        Self {
            thread_name: "wed-server".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    /// Preset for short-lived maintenance commands.
    #[must_use = "Use this configuration to boot a maintenance command"]
    pub fn maintenance() -> Self {
        Self {
            worker_threads: detected_worker_threads().min(2),
            stack_size: 2 * 1024 * 1024,
            thread_name: "wed-maint".to_owned(),
            thread_keep_alive: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = thread_name_or_default(name.into());
        self
    }

    fn normalized(&self) -> Self {
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKER_THREADS),
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name: thread_name_or_default(self.thread_name.clone()),
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Creates a multithreaded Tokio runtime with I/O and timers enabled.
///
/// Out-of-range values in `config` are clamped before the runtime is built.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_are_clamped() {
        assert_eq!(RuntimeConfig::default().with_worker_threads(0).worker_threads, 1);
        assert_eq!(RuntimeConfig::default().with_worker_threads(2000).worker_threads, 1024);
    }

    #[test]
    fn test_stack_size_is_clamped() {
        assert_eq!(RuntimeConfig::default().with_stack_size(100).stack_size, MIN_STACK_SIZE);
        assert_eq!(
            RuntimeConfig::default().with_stack_size(100 * 1024 * 1024).stack_size,
            MAX_STACK_SIZE
        );
    }

    #[test]
    fn test_blank_thread_name_falls_back() {
        let config = RuntimeConfig::server().with_thread_name("  ");
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_maintenance_profile_is_small() {
        let config = RuntimeConfig::maintenance();
        assert!(config.worker_threads <= 2);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn test_runtime_runs_futures() {
        let runtime = build_runtime_with_config(&RuntimeConfig::maintenance()).unwrap();
        let value = runtime.block_on(async { tokio::task::spawn(async { 21 * 2 }).await });
        assert_eq!(value.unwrap(), 42);
    }
}
