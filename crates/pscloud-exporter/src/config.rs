//! Configuration loading.
//!
//! Sources, highest precedence first: command-line flags, environment
//! variables (both resolved by clap into [`Overrides`]), the TOML config file,
//! built-in defaults. `.env.local` and `.env` are read into the environment
//! before the command line is parsed.

use std::fs;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use pscloud_core::exporter::{DEFAULT_NAMESPACE, DEFAULT_SOURCE_TIMEOUT};
use pscloud_core::source::GraphQlConfig;
use pscloud_core::{ScrapeConfig, SourceKind};

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9116";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Env files in load order. Variables already set are never overwritten, so
/// earlier files win.
const ENV_FILES: [&str; 2] = [".env.local", ".env"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", path.display())]
    MissingConfig { path: PathBuf },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("API token is required (--token, PSCLOUD_TOKEN or `token` in the config file)")]
    MissingToken,
    #[error("invalid listen address '{value}'")]
    InvalidListenAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid duration '{value}'")]
    InvalidDuration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("telemetry path '{0}' must start with '/' and must not be '/' or '/health'")]
    InvalidTelemetryPath(String),
    #[error("unknown source '{0}' in scrape.critical_sources")]
    UnknownSource(String),
    #[error("max_parallel_fetches must be at least 1")]
    NoFetchSlots,
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

// ============================================================
// File format
// ============================================================

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub token: Option<String>,
    pub service_id: Option<String>,
    pub base_url: Option<String>,
    pub web: WebSection,
    pub scrape: ScrapeSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub metrics_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeSection {
    /// Humantime duration, e.g. `"10s"` or `"1m 30s"`.
    pub source_timeout: Option<String>,
    pub max_parallel_fetches: Option<usize>,
    pub critical_sources: Option<Vec<String>>,
    pub project_statuses: Option<Vec<String>>,
    pub invoice_status: Option<String>,
}

/// Values resolved from the command line and the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub token: Option<String>,
    pub service_id: Option<String>,
    pub base_url: Option<String>,
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub metrics_prefix: Option<String>,
    pub source_timeout: Option<Duration>,
    pub max_parallel_fetches: Option<usize>,
}

// ============================================================
// Resolved settings
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSettings {
    pub listen_address: SocketAddr,
    pub telemetry_path: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub graphql: GraphQlConfig,
    pub scrape: ScrapeConfig,
    pub web: WebSettings,
    /// Config file actually read, if any.
    pub config_path: Option<PathBuf>,
}

/// Loads `.env.local` and `.env` from the working directory when present.
/// Returns the files that were read.
pub fn load_env_files() -> Result<Vec<PathBuf>, ConfigError> {
    let mut loaded = Vec::new();
    for name in ENV_FILES {
        let path = PathBuf::from(name);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(path),
            Err(dotenvy::Error::Io(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(loaded)
}

/// Reads the config file. An explicit path must exist; the default
/// `config.toml` is optional.
pub fn load_file(explicit: Option<&Path>) -> Result<Option<(FileConfig, PathBuf)>, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(None);
            }
            default
        }
    };

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let file = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok(Some((file, path)))
}

/// Loads the config file and merges it with `overrides`.
pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Settings, ConfigError> {
    let (file, path) = match load_file(explicit)? {
        Some((file, path)) => (file, Some(path)),
        None => (FileConfig::default(), None),
    };
    let mut settings = resolve(overrides, file)?;
    settings.config_path = path;
    Ok(settings)
}

/// Applies precedence and defaults, and validates the result.
pub fn resolve(cli: Overrides, file: FileConfig) -> Result<Settings, ConfigError> {
    let token = cli
        .token
        .or(file.token)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingToken)?;

    let mut graphql = GraphQlConfig::new(token);
    if let Some(base_url) = cli.base_url.or(file.base_url) {
        graphql.base_url = base_url;
    }
    graphql.service_id = cli
        .service_id
        .or(file.service_id)
        .filter(|id| !id.trim().is_empty());
    if let Some(statuses) = file.scrape.project_statuses {
        graphql.project_statuses = statuses;
    }
    if let Some(status) = file.scrape.invoice_status {
        graphql.invoice_status = status;
    }

    let source_timeout = match (cli.source_timeout, file.scrape.source_timeout) {
        (Some(timeout), _) => timeout,
        (None, Some(raw)) => parse_duration(&raw)?,
        (None, None) => DEFAULT_SOURCE_TIMEOUT,
    };
    let max_parallel_fetches = cli
        .max_parallel_fetches
        .or(file.scrape.max_parallel_fetches)
        .unwrap_or(1);
    if max_parallel_fetches == 0 {
        return Err(ConfigError::NoFetchSlots);
    }
    let critical_sources = match file.scrape.critical_sources {
        Some(names) => names
            .iter()
            .map(|name| {
                SourceKind::from_name(name).ok_or_else(|| ConfigError::UnknownSource(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![SourceKind::Balance],
    };

    let scrape = ScrapeConfig {
        namespace: cli
            .metrics_prefix
            .or(file.web.metrics_prefix)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        source_timeout,
        max_parallel_fetches,
        critical_sources,
        sources: SourceKind::enabled(graphql.service_id.is_some()),
    };

    let listen = cli
        .listen_address
        .or(file.web.listen_address)
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
    let listen_address = listen
        .parse()
        .map_err(|source| ConfigError::InvalidListenAddress {
            value: listen.clone(),
            source,
        })?;
    let telemetry_path = cli
        .telemetry_path
        .or(file.web.telemetry_path)
        .unwrap_or_else(|| DEFAULT_TELEMETRY_PATH.to_string());
    if !telemetry_path.starts_with('/') || telemetry_path == "/" || telemetry_path == "/health" {
        return Err(ConfigError::InvalidTelemetryPath(telemetry_path));
    }

    Ok(Settings {
        graphql,
        scrape,
        web: WebSettings {
            listen_address,
            telemetry_path,
        },
        config_path: None,
    })
}

/// Parses a humantime duration such as `"10s"` or `"1m 30s"`.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|source| ConfigError::InvalidDuration {
        value: raw.to_string(),
        source,
    })
}
