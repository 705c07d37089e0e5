//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{builder::BoolishValueParser, Args, Parser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "scorta";
const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_REDIS_URLS: &str = "redis://127.0.0.1:6379";

/// Command-line arguments for the scorta binary.
#[derive(Debug, Parser)]
#[command(name = "scorta", version, about = "Cache-aggregating posts service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SCORTA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener address.
    #[arg(long = "server-addr", value_name = "ADDR")]
    pub server_addr: Option<String>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the redis addresses (comma-separated; several mean a cluster).
    #[arg(long = "redis-urls", value_name = "URLS")]
    pub redis_urls: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid configuration value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    raw_urls: String,
}

impl RedisSettings {
    pub fn new(raw_urls: impl Into<String>) -> Self {
        Self {
            raw_urls: raw_urls.into(),
        }
    }

    /// Configured addresses with whitespace and empty entries stripped.
    pub fn urls(&self) -> Vec<String> {
        self.raw_urls
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Default)]
struct RawSettings {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    redis: RawRedis,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Debug, Deserialize, Default)]
struct RawServer {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RawRedis {
    urls: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLogging {
    level: Option<String>,
    json: Option<bool>,
}

/// Parse CLI arguments and resolve the layered settings.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

pub fn load(cli: &CliArgs) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = match &cli.config_file {
        Some(path) => builder.add_source(File::from(path.as_path())),
        None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
    };
    builder = builder.add_source(Environment::with_prefix("SCORTA").separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    resolve(raw, &cli.overrides)
}

fn resolve(raw: RawSettings, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let addr_text = overrides
        .server_addr
        .clone()
        .or(raw.server.addr)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let addr = SocketAddr::from_str(&addr_text)
        .map_err(|err| ConfigError::invalid("server.addr", err.to_string()))?;

    let max_connections = overrides
        .database_max_connections
        .or(raw.database.max_connections)
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_connections)
        .ok_or_else(|| ConfigError::invalid("database.max_connections", "must be non-zero"))?;

    let database = DatabaseSettings {
        url: overrides.database_url.clone().or(raw.database.url),
        max_connections,
    };

    let redis = RedisSettings::new(
        overrides
            .redis_urls
            .clone()
            .or(raw.redis.urls)
            .unwrap_or_else(|| DEFAULT_REDIS_URLS.to_string()),
    );

    let level_text = overrides
        .log_level
        .clone()
        .or(raw.logging.level)
        .unwrap_or_else(|| "info".to_string());
    let level = LevelFilter::from_str(&level_text)
        .map_err(|err| ConfigError::invalid("logging.level", err.to_string()))?;

    let json = overrides.log_json.or(raw.logging.json).unwrap_or(false);
    let logging = LoggingSettings {
        level,
        format: if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        },
    };

    Ok(Settings {
        server: ServerSettings { addr },
        database,
        redis,
        logging,
    })
}
