use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `WED__DATABASE__URL`.
pub const ENV_PREFIX: &str = "WED";
const DEFAULT_CONFIG_FILE: &str = "server";

#[wed_derive::wed_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a config file overlaid by `WED__SECTION__KEY` environment variables.
///
/// Without a path the loader looks for `server.{toml,json,yaml}` in the working directory. A
/// missing default file is not an error, so a deployment can be configured from the
/// environment alone; an explicitly given path must exist.
///
/// # Errors
/// Fails if an explicit file is missing, a source cannot be parsed, or the merged values don't
/// match `T`.
///
/// # Example
/// ```rust,no_run
/// use wed_kernel::config::load_config;
/// use wed_kernel::domain::config::ApiConfig;
///
/// let cfg: ApiConfig = load_config(None::<&str>).unwrap();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    info!(path = %effective_path.display(), required, "Loading configuration");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
