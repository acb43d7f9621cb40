//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "agency";
const ENV_PREFIX: &str = "AGENCY";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_VERSION: &str = "2024-01-01";
const DEFAULT_API_HOST: &str = "api.sanity.io";
const DEFAULT_CDN_HOST: &str = "apicdn.sanity.io";
const DEFAULT_IMAGE_HOST: &str = "cdn.sanity.io";
const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for the agency-content binary.
#[derive(Debug, Parser)]
#[command(
    name = "agency-content",
    version,
    about = "Content layer and offline asset cache policy for the agency site"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "AGENCY_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Runtime mode; development disables the asset worker and the CDN path.
    #[arg(long = "mode", value_enum, env = "AGENCY_MODE")]
    pub mode: Option<RunMode>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve page data and the worker cache manifest over HTTP.
    Serve(Box<ServeArgs>),
    /// Write the background worker cache manifest as JSON.
    Manifest(ManifestArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the store project identifier.
    #[arg(long = "store-project-id", value_name = "ID")]
    pub store_project_id: Option<String>,

    /// Override the store dataset name.
    #[arg(long = "store-dataset", value_name = "NAME")]
    pub store_dataset: Option<String>,

    /// Toggle the CDN host for read-only queries.
    #[arg(
        long = "store-use-cdn",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub store_use_cdn: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ManifestArgs {
    /// File to write; stdout when omitted.
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Production,
    Development,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: RunMode,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Document store identity and transport options.
///
/// `project_id` and `dataset` stay optional here so that commands which never
/// touch the store can run; the store client rejects them when missing.
#[derive(Clone)]
pub struct StoreSettings {
    pub project_id: Option<String>,
    pub dataset: Option<String>,
    pub api_version: String,
    pub token: Option<String>,
    pub use_cdn: bool,
    pub api_host: String,
    pub cdn_host: String,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("use_cdn", &self.use_cdn)
            .field("api_host", &self.api_host)
            .field("cdn_host", &self.cdn_host)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub enabled: bool,
    pub image_host: String,
    pub network_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Some(mode) = cli.mode {
        raw.mode = Some(mode);
    }
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Manifest(_)) | None => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    mode: Option<RunMode>,
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
    worker: RawWorkerSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(project_id) = overrides.store_project_id.as_ref() {
            self.store.project_id = Some(project_id.clone());
        }
        if let Some(dataset) = overrides.store_dataset.as_ref() {
            self.store.dataset = Some(dataset.clone());
        }
        if let Some(use_cdn) = overrides.store_use_cdn {
            self.store.use_cdn = Some(use_cdn);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            mode,
            server,
            logging,
            store,
            worker,
        } = raw;

        let mode = mode.unwrap_or_default();
        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let store = build_store_settings(store, mode)?;
        let worker = build_worker_settings(worker, mode)?;

        Ok(Self {
            mode,
            server,
            logging,
            store,
            worker,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings, mode: RunMode) -> Result<StoreSettings, LoadError> {
    let api_version = non_empty(store.api_version).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    let api_version = api_version.trim_start_matches('v').to_string();
    if !api_version.chars().all(|ch| ch.is_ascii_digit() || ch == '-') {
        return Err(LoadError::invalid(
            "store.api_version",
            "expected a date such as 2024-01-01",
        ));
    }

    // The CDN may serve stale documents; development always reads live data.
    let use_cdn = mode == RunMode::Production && store.use_cdn.unwrap_or(true);

    Ok(StoreSettings {
        project_id: non_empty(store.project_id),
        dataset: non_empty(store.dataset),
        api_version,
        token: non_empty(store.token),
        use_cdn,
        api_host: non_empty(store.api_host).unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
        cdn_host: non_empty(store.cdn_host).unwrap_or_else(|| DEFAULT_CDN_HOST.to_string()),
    })
}

fn build_worker_settings(
    worker: RawWorkerSettings,
    mode: RunMode,
) -> Result<WorkerSettings, LoadError> {
    let timeout_secs = worker
        .network_timeout_seconds
        .unwrap_or(DEFAULT_NETWORK_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "worker.network_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let image_host = non_empty(worker.image_host).unwrap_or_else(|| DEFAULT_IMAGE_HOST.to_string());
    if image_host.contains('/') {
        return Err(LoadError::invalid(
            "worker.image_host",
            "expected a bare host name",
        ));
    }

    Ok(WorkerSettings {
        enabled: mode == RunMode::Production && worker.enabled.unwrap_or(true),
        image_host,
        network_timeout: Duration::from_secs(timeout_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    token: Option<String>,
    use_cdn: Option<bool>,
    api_host: Option<String>,
    cdn_host: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkerSettings {
    enabled: Option<bool>,
    image_host: Option<String>,
    network_timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
