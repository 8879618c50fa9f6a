//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tsunagu";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PUBLIC_SITE_URL: &str = "http://localhost:3000/";
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_PUBLIC_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_LOGIN_WINDOW_SECS: u64 = 300;
const DEFAULT_LOGIN_MAX_ATTEMPTS: u64 = 10;
const DEFAULT_STORAGE_DIR: &str = "storage";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_SUMMARY_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SITE_TITLE: &str = "つなぐ 市民活動ディレクトリ";
const DEFAULT_SITE_TIMEZONE: &str = "Asia/Tokyo";

/// Command-line arguments for the Tsunagu binary.
#[derive(Debug, Parser)]
#[command(
    name = "tsunagu",
    version,
    about = "Community organization directory and admin CMS"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TSUNAGU_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public site and admin HTTP service.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

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

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the read-only database URL used by the public site.
    #[arg(long = "database-public-url", value_name = "URL")]
    pub database_public_url: Option<String>,

    /// Override the service database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the public database pool size.
    #[arg(long = "database-public-max-connections", value_name = "COUNT")]
    pub database_public_max_connections: Option<u32>,

    /// Override the storage directory.
    #[arg(long = "storage-directory", value_name = "PATH")]
    pub storage_directory: Option<PathBuf>,

    /// Override the maximum upload size in bytes.
    #[arg(long = "storage-max-upload-bytes", value_name = "BYTES")]
    pub storage_max_upload_bytes: Option<u64>,

    /// Mark the admin session cookie as Secure.
    #[arg(
        long = "auth-secure-cookie",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub auth_secure_cookie: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub summary: SummarySettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub public_site_url: Url,
    pub graceful_shutdown: Duration,
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

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    /// Falls back to `url` when unset.
    pub public_url: Option<String>,
    pub max_connections: NonZeroU32,
    pub public_max_connections: NonZeroU32,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
    pub secure_cookie: bool,
    pub login_window: Duration,
    pub login_max_attempts: NonZeroU32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("admin_password", &self.admin_password.as_ref().map(|_| "***"))
            .field("session_secret", &self.session_secret.as_ref().map(|_| "***"))
            .field("secure_cookie", &self.secure_cookie)
            .field("login_window", &self.login_window)
            .field("login_max_attempts", &self.login_max_attempts)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub directory: PathBuf,
    pub max_upload_bytes: NonZeroU64,
}

#[derive(Clone)]
pub struct SummarySettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: Url,
}

impl std::fmt::Debug for SummarySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarySettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub title: String,
    pub timezone: Tz,
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

    builder = builder.add_source(Environment::with_prefix("TSUNAGU").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    auth: RawAuthSettings,
    storage: RawStorageSettings,
    summary: RawSummarySettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(url) = overrides.database_public_url.as_ref() {
            self.database.public_url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(max) = overrides.database_public_max_connections {
            self.database.public_max_connections = Some(max);
        }
        if let Some(directory) = overrides.storage_directory.as_ref() {
            self.storage.directory = Some(directory.clone());
        }
        if let Some(limit) = overrides.storage_max_upload_bytes {
            self.storage.max_upload_bytes = Some(limit);
        }
        if let Some(secure) = overrides.auth_secure_cookie {
            self.auth.secure_cookie = Some(secure);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            auth,
            storage,
            summary,
            site,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            auth: build_auth_settings(auth)?,
            storage: build_storage_settings(storage)?,
            summary: build_summary_settings(summary)?,
            site: build_site_settings(site)?,
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

    let public_site_url = server
        .public_site_url
        .as_deref()
        .unwrap_or(DEFAULT_PUBLIC_SITE_URL);
    let public_site_url = Url::parse(public_site_url)
        .map_err(|err| LoadError::invalid("server.public_site_url", err.to_string()))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        public_site_url,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
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

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let public_url = non_blank(database.public_url).or_else(|| url.clone());

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let public_max_value = database
        .public_max_connections
        .unwrap_or(DEFAULT_DB_PUBLIC_MAX_CONNECTIONS);

    Ok(DatabaseSettings {
        url,
        public_url,
        max_connections: non_zero_u32(max_value.into(), "database.max_connections")?,
        public_max_connections: non_zero_u32(
            public_max_value.into(),
            "database.public_max_connections",
        )?,
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let window_secs = auth
        .login_window_seconds
        .unwrap_or(DEFAULT_LOGIN_WINDOW_SECS);
    if window_secs == 0 {
        return Err(LoadError::invalid(
            "auth.login_window_seconds",
            "must be greater than zero",
        ));
    }

    let attempts = auth
        .login_max_attempts
        .unwrap_or(DEFAULT_LOGIN_MAX_ATTEMPTS);

    Ok(AuthSettings {
        admin_password: non_blank(auth.admin_password),
        session_secret: non_blank(auth.session_secret),
        secure_cookie: auth.secure_cookie.unwrap_or(false),
        login_window: Duration::from_secs(window_secs),
        login_max_attempts: non_zero_u32(attempts, "auth.login_max_attempts")?,
    })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let directory = storage
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.directory",
            "path must not be empty",
        ));
    }

    let max_value = storage
        .max_upload_bytes
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
    let max_upload_bytes = NonZeroU64::new(max_value)
        .ok_or_else(|| LoadError::invalid("storage.max_upload_bytes", "must be greater than zero"))?;
    usize::try_from(max_value).map_err(|_| {
        LoadError::invalid(
            "storage.max_upload_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(StorageSettings {
        directory,
        max_upload_bytes,
    })
}

fn build_summary_settings(summary: RawSummarySettings) -> Result<SummarySettings, LoadError> {
    let model = non_blank(summary.model).unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string());
    let endpoint = non_blank(summary.endpoint)
        .unwrap_or_else(|| DEFAULT_SUMMARY_ENDPOINT.to_string());
    let endpoint = Url::parse(&endpoint)
        .map_err(|err| LoadError::invalid("summary.endpoint", err.to_string()))?;

    Ok(SummarySettings {
        api_key: non_blank(summary.api_key),
        model,
        endpoint,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let title = non_blank(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string());
    let timezone = site
        .timezone
        .as_deref()
        .unwrap_or(DEFAULT_SITE_TIMEZONE)
        .parse::<Tz>()
        .map_err(|err| LoadError::invalid("site.timezone", err.to_string()))?;

    Ok(SiteSettings { title, timezone })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    public_site_url: Option<String>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    public_url: Option<String>,
    max_connections: Option<u32>,
    public_max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    admin_password: Option<String>,
    session_secret: Option<String>,
    secure_cookie: Option<bool>,
    login_window_seconds: Option<u64>,
    login_max_attempts: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    directory: Option<PathBuf>,
    max_upload_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSummarySettings {
    api_key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    title: Option<String>,
    timezone: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn upload_limit_defaults_to_10_mib() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(
            settings.storage.max_upload_bytes.get(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
    }

    #[test]
    fn upload_limit_can_be_overridden_via_cli() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            storage_max_upload_bytes: Some(1_572_864),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.storage.max_upload_bytes.get(), 1_572_864);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn public_url_falls_back_to_service_url() {
        let mut raw = RawSettings::default();
        raw.database.url = Some("postgres://service".to_string());
        raw.database.public_url = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.database.public_url.as_deref(),
            Some("postgres://service")
        );
    }

    #[test]
    fn blank_admin_password_disables_login() {
        let mut raw = RawSettings::default();
        raw.auth.admin_password = Some(String::new());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.auth.admin_password.is_none());
    }

    #[test]
    fn secrets_are_masked_in_debug_output() {
        let mut raw = RawSettings::default();
        raw.auth.admin_password = Some("hunter2".to_string());
        raw.summary.api_key = Some("AIza-secret".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("AIza-secret"));
    }

    #[test]
    fn site_timezone_defaults_to_tokyo() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.site.timezone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut raw = RawSettings::default();
        raw.site.timezone = Some("Mars/Olympus".to_string());

        let err = Settings::from_raw(raw).expect_err("invalid timezone");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "site.timezone",
                ..
            }
        ));
    }

    #[test]
    fn zero_login_attempts_are_rejected() {
        let mut raw = RawSettings::default();
        raw.auth.login_max_attempts = Some(0);

        let err = Settings::from_raw(raw).expect_err("invalid attempts");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "auth.login_max_attempts",
                ..
            }
        ));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["tsunagu"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_migrate_arguments() {
        let args = CliArgs::parse_from([
            "tsunagu",
            "migrate",
            "--database-url",
            "postgres://example",
        ]);

        match args.command.expect("migrate command") {
            Command::Migrate(migrate) => {
                assert_eq!(
                    migrate.database.database_url.as_deref(),
                    Some("postgres://example")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "tsunagu",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--database-url",
            "postgres://override",
            "--auth-secure-cookie",
            "true",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.database_url.as_deref(),
                    Some("postgres://override")
                );
                assert_eq!(serve.overrides.auth_secure_cookie, Some(true));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
