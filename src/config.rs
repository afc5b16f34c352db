use crate::api::ClientConfig;
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "lookup.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "LOOKUP_CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the lookup API, including any shared path prefix
    #[arg(long, env = "LOOKUP_API_URL")]
    pub api_url: Option<String>,

    /// Credential sent in the Authorization header
    #[arg(long, env = "LOOKUP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Outbound request timeout in milliseconds
    #[arg(long, env = "LOOKUP_API_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, env = "LOOKUP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format (text or json)
    #[arg(long, env = "LOOKUP_LOG_FORMAT")]
    pub log_format: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Identity reported from `initialize`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub auth_scheme: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format. Matched case-insensitively from every config source.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl TryFrom<String> for LogFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Reject a level the log filter would not understand.
    fn validate(&mut self) -> Result<(), config::ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        level.parse::<LevelFilter>().map_err(|e| {
            config::ConfigError::Message(format!("logging.level '{}': {e}", self.level))
        })?;
        self.level = level;
        Ok(())
    }
}

impl ApiConfig {
    /// Build the outbound client settings.
    ///
    /// Returns `Ok(None)` when the base URL or the credential is missing, which
    /// puts the server in demo-data-only mode.
    pub fn client_config(&self) -> Result<Option<ClientConfig>, config::ConfigError> {
        let base_url = self.base_url.as_deref().map(str::trim).unwrap_or_default();
        let api_key = self.api_key.as_deref().map(str::trim).unwrap_or_default();
        if base_url.is_empty() || api_key.is_empty() {
            return Ok(None);
        }

        url::Url::parse(base_url).map_err(|e| {
            config::ConfigError::Message(format!("api.base_url '{base_url}' is not a valid URL: {e}"))
        })?;

        if self.timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "api.timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(Some(ClientConfig {
            base_url: base_url.to_string(),
            credential: api_key.to_string(),
            timeout: Duration::from_millis(self.timeout_ms),
            default_scheme: self.auth_scheme.clone(),
        }))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.name", env!("CARGO_PKG_NAME"))?
            .set_default("server.version", env!("CARGO_PKG_VERSION"))?
            .set_default("api.timeout_ms", 30_000)?
            .set_default("api.auth_scheme", "Bearer")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?;

        // 2. Config file: explicit path must exist, the cwd default is optional
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml));
        }

        // 3. Prefixed environment, e.g. LOOKUP_API__TIMEOUT_MS=5000
        builder = builder.add_source(
            Environment::with_prefix("LOOKUP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their direct env aliases) win
        if let Some(url) = cli.api_url {
            builder = builder.set_override("api.base_url", url)?;
        }
        if let Some(key) = cli.api_key {
            builder = builder.set_override("api.api_key", key)?;
        }
        if let Some(ms) = cli.timeout_ms {
            builder = builder.set_override("api.timeout_ms", ms)?;
        }
        if let Some(level) = cli.log_level {
            builder = builder.set_override("logging.level", level)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format)?;
        }

        let mut loaded: Self = builder.build()?.try_deserialize()?;
        loaded.logging.validate()?;
        Ok(loaded)
    }
}
