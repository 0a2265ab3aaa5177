//! Configuration management.
//!
//! Configuration is resolved once at startup, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `SIMPLE_MEMORY_CONFIG_PATH`, or
//!    `<config dir>/simple-memory/config.toml`)
//! 3. Environment variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SIMPLE_MEMORY_DB_PATH` | Database file (default `$HOME/simple_memories.db`) |
//! | `DISABLE_SIMPLE_MEMORY_LOGGING` | `true` disables the activity log |
//! | `SIMPLE_MEMORY_ACTIVITY_LOG_PATH` | Activity log file |
//! | `MCP_USE_SSE` | `true` selects the SSE transport |
//! | `MCP_USE_HTTP` | `true` selects the HTTP transport (SSE wins if both are set) |
//! | `PORT` | HTTP/SSE listen port (default 3002) |
//! | `SIMPLE_MEMORY_LOG` | Diagnostic log filter |
//! | `SIMPLE_MEMORY_LOG_FORMAT` | `pretty` or `json` |
//! | `SIMPLE_MEMORY_LOG_FILE` | Write diagnostics to a file instead of stderr |
//! | `SIMPLE_MEMORY_METRICS_ENABLED` | `true` installs the Prometheus exporter |
//! | `SIMPLE_MEMORY_METRICS_PORT` | Prometheus listen port (default 9090) |

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default HTTP/SSE listen port.
pub const DEFAULT_PORT: u16 = 3002;

/// Default database file name, placed in the home directory.
pub const DEFAULT_DB_FILE: &str = "simple_memories.db";

/// Default activity log location.
pub const DEFAULT_ACTIVITY_LOG_PATH: &str = "/tmp/mcp-simple-memory-server.log";

/// Default number of daily activity log files kept.
pub const DEFAULT_ACTIVITY_LOG_FILES: usize = 7;

/// Default Prometheus exporter port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Transport the MCP server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// JSON-RPC over `POST /mcp`.
    Http,
    /// Server-sent events (`GET /sse` + `POST /message`).
    Sse,
}

impl Transport {
    /// Returns the transport name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "sse" => Ok(Self::Sse),
            other => Err(Error::InvalidInput(format!("unknown transport: {other}"))),
        }
    }
}

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogConfig {
    /// Whether mutation notices are written.
    pub enabled: bool,
    /// Log file location. The rotation date is inserted before the
    /// extension.
    pub path: PathBuf,
    /// Number of daily files kept, including the current one.
    pub max_files: usize,
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEFAULT_ACTIVITY_LOG_PATH),
            max_files: DEFAULT_ACTIVITY_LOG_FILES,
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `None` uses `RUST_LOG` or `warn`.
    pub filter: Option<String>,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to write to instead of stderr.
    pub file: Option<PathBuf>,
}

/// Prometheus metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,
    /// Exporter listen port.
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_METRICS_PORT,
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Database file.
    pub db_path: PathBuf,
    /// MCP transport.
    pub transport: Transport,
    /// HTTP/SSE listen port.
    pub port: u16,
    /// Activity log settings.
    pub activity_log: ActivityLogConfig,
    /// Diagnostic logging settings.
    pub logging: LoggingConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            transport: Transport::default(),
            port: DEFAULT_PORT,
            activity_log: ActivityLogConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database file.
    pub db_path: Option<String>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Activity log section.
    pub activity_log: Option<ConfigFileActivityLog>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileServer {
    /// Transport name.
    pub transport: Option<String>,
    /// Listen port.
    pub port: Option<u16>,
}

/// Activity log section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileActivityLog {
    /// Enabled flag.
    pub enabled: Option<bool>,
    /// Log file path.
    pub path: Option<String>,
    /// Daily files kept.
    pub max_files: Option<usize>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileMetrics {
    /// Enabled flag.
    pub enabled: Option<bool>,
    /// Exporter port.
    pub port: Option<u16>,
}

impl MemoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found or it
    /// cannot be read.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs
            .config_dir()
            .join("simple-memory")
            .join("config.toml");
        if !path.exists() {
            return Self::default();
        }

        Self::load_from_file(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
            Self::default()
        })
    }

    /// Loads the full configuration: file, then process environment.
    ///
    /// An explicit `path` must exist and parse; the default location is
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env_string(&process_env, "SIMPLE_MEMORY_CONFIG_PATH").map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.apply_env(process_env);
        Ok(config)
    }

    /// Converts a `ConfigFile` to `MemoryConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(server) = file.server {
            if let Some(transport) = server.transport {
                config.transport = transport.parse()?;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }
        if let Some(activity) = file.activity_log {
            if let Some(enabled) = activity.enabled {
                config.activity_log.enabled = enabled;
            }
            if let Some(path) = activity.path {
                config.activity_log.path = PathBuf::from(path);
            }
            if let Some(files) = activity.max_files {
                config.activity_log.max_files = files;
            }
        }
        if let Some(logging) = file.logging {
            config.logging.filter = logging.level;
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            if let Some(enabled) = metrics.enabled {
                config.metrics.enabled = enabled;
            }
            if let Some(port) = metrics.port {
                config.metrics.port = port;
            }
        }

        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env_string(&lookup, "SIMPLE_MEMORY_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if env_flag(&lookup, "DISABLE_SIMPLE_MEMORY_LOGGING") {
            self.activity_log.enabled = false;
        }
        if let Some(path) = env_string(&lookup, "SIMPLE_MEMORY_ACTIVITY_LOG_PATH") {
            self.activity_log.path = PathBuf::from(path);
        }

        if env_flag(&lookup, "MCP_USE_SSE") {
            self.transport = Transport::Sse;
        } else if env_flag(&lookup, "MCP_USE_HTTP") {
            self.transport = Transport::Http;
        }
        if let Some(port) = env_port(&lookup, "PORT") {
            self.port = port;
        }

        if let Some(filter) = env_string(&lookup, "SIMPLE_MEMORY_LOG") {
            self.logging.filter = Some(filter);
        }
        if let Some(format) = env_string(&lookup, "SIMPLE_MEMORY_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(file) = env_string(&lookup, "SIMPLE_MEMORY_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        if let Some(value) = env_string(&lookup, "SIMPLE_MEMORY_METRICS_ENABLED") {
            self.metrics.enabled = is_true(&value);
        }
        if let Some(port) = env_port(&lookup, "SIMPLE_MEMORY_METRICS_PORT") {
            self.metrics.port = port;
        }
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Sets the transport.
    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

/// Returns `$HOME/simple_memories.db`, or the file name alone if there is
/// no home directory.
#[must_use]
pub fn default_db_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(DEFAULT_DB_FILE),
        |dirs| dirs.home_dir().join(DEFAULT_DB_FILE),
    )
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_string<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn env_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).is_some_and(|value| is_true(&value))
}

fn env_port<F>(lookup: &F, key: &str) -> Option<u16>
where
    F: Fn(&str) -> Option<String>,
{
    let value = env_string(lookup, key)?;
    value.parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %value, "Ignoring invalid port");
            None
        },
        Some,
    )
}
