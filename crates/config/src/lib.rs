use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "distributed.toml",
    "config/distributed.toml",
    "../distributed.toml",
    "../config/distributed.toml",
];

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "DISTRIBUTED_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Location of the backend microservices the gateway forwards to.
///
/// ```
/// use distributed_config::ServicesConfig;
///
/// let services = ServicesConfig::default();
/// assert_eq!(services.base_url, "http://127.0.0.1:8080");
/// assert_eq!(services.request_timeout_seconds, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "ServicesConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ServicesConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ServicesConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8080".to_string()
    }

    const fn default_request_timeout() -> u64 {
        10
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use distributed_config::load;
///
/// std::env::remove_var("DISTRIBUTED_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    load_from(std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from))
}

/// Same as [`load`], but with an explicit configuration file taking the place
/// of `DISTRIBUTED_CONFIG` and the search list.
pub fn load_from(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let timeout = i64::try_from(defaults.services.request_timeout_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("services.base_url", defaults.services.base_url.clone())?
        .set_default("services.request_timeout_seconds", timeout)?;

    let environment_overrides = config::Environment::with_prefix("DISTRIBUTED").separator("__");

    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit configuration file");
        builder = builder.add_source(config::File::from(path));
    } else if let Some(path) = std::env::current_dir().ok().and_then(|cwd| {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists())
    }) {
        debug!(path = %path.display(), "loading configuration file");
        builder = builder.add_source(config::File::from(path));
    } else {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    let trimmed = config.services.base_url.trim_end_matches('/').to_string();
    config.services.base_url = trimmed;

    debug!(?config, "loaded gateway configuration");
    Ok(config)
}
