//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "questionnaire";
const ENV_PREFIX: &str = "QUESTIONNAIRE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
/// 2 cm expressed in PDF points.
const DEFAULT_MIN_SPACE_BEFORE_BREAK: f64 = 56.69;

/// Command-line arguments for the questionnaire binary.
#[derive(Debug, Parser)]
#[command(
    name = "questionnaire",
    version,
    about = "Natural-medicine survey service"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "QUESTIONNAIRE_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
    /// Write every stored response to a CSV file.
    #[command(name = "export-csv")]
    ExportCsv(ExportCsvArgs),
    /// Write the blank questionnaire PDF to a file.
    #[command(name = "render-blank")]
    RenderBlank(RenderBlankArgs),
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

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the space (points) a section title needs before a page break.
    #[arg(long = "documents-min-space-before-break", value_name = "POINTS")]
    pub documents_min_space_before_break: Option<f64>,

    /// Toggle fillable checkboxes in generated PDFs.
    #[arg(
        long = "documents-interactive-checkboxes",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub documents_interactive_checkboxes: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Clone)]
pub struct ExportCsvArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Destination CSV file path.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RenderBlankArgs {
    /// Destination PDF file path.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub documents: DocumentSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
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
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentSettings {
    /// Space a section title needs below the cursor; also the bottom margin
    /// every generated page keeps clear.
    pub min_space_before_break: f64,
    pub interactive_checkboxes: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            min_space_before_break: DEFAULT_MIN_SPACE_BEFORE_BREAK,
            interactive_checkboxes: true,
        }
    }
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
    raw.apply_command(cli.command.as_ref());

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    documents: RawDocumentSettings,
}

impl RawSettings {
    fn apply_command(&mut self, command: Option<&Command>) {
        match command {
            Some(Command::Serve(args)) => self.apply_serve_overrides(&args.overrides),
            Some(Command::Migrate(args)) => self.apply_database_override(&args.database),
            Some(Command::ExportCsv(args)) => self.apply_database_override(&args.database),
            Some(Command::RenderBlank(_)) => {}
            None => self.apply_serve_overrides(&ServeOverrides::default()),
        }
    }

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
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(space) = overrides.documents_min_space_before_break {
            self.documents.min_space_before_break = Some(space);
        }
        if let Some(interactive) = overrides.documents_interactive_checkboxes {
            self.documents.interactive_checkboxes = Some(interactive);
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
            documents,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            documents: build_document_settings(documents)?,
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
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_document_settings(documents: RawDocumentSettings) -> Result<DocumentSettings, LoadError> {
    let defaults = DocumentSettings::default();

    let min_space_before_break = documents
        .min_space_before_break
        .unwrap_or(defaults.min_space_before_break);
    if !min_space_before_break.is_finite() || min_space_before_break < 0.0 {
        return Err(LoadError::invalid(
            "documents.min_space_before_break",
            "must be a finite, non-negative number of points",
        ));
    }

    Ok(DocumentSettings {
        min_space_before_break,
        interactive_checkboxes: documents
            .interactive_checkboxes
            .unwrap_or(defaults.interactive_checkboxes),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
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
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocumentSettings {
    min_space_before_break: Option<f64>,
    interactive_checkboxes: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
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
    fn defaults_resolve_without_any_source() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.server.addr.to_string(), "127.0.0.1:8000");
        assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
        assert!(settings.database.url.is_none());
        assert_eq!(settings.database.max_connections.get(), 8);
        assert_eq!(settings.documents, DocumentSettings::default());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());
        raw.documents.interactive_checkboxes = Some(true);

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            documents_interactive_checkboxes: Some(false),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert!(!settings.documents.interactive_checkboxes);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        raw.apply_serve_overrides(&ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        });

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn blank_database_url_is_treated_as_missing() {
        let mut raw = RawSettings::default();
        raw.database.url = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.database.url.is_none());
    }

    #[test]
    fn invalid_values_name_their_key() {
        let cases: [(fn(&mut RawSettings), &str); 5] = [
            (|raw| raw.server.port = Some(0), "server.port"),
            (|raw| raw.server.host = Some("not a host".into()), "server.addr"),
            (|raw| raw.logging.level = Some("loud".into()), "logging.level"),
            (
                |raw| raw.database.max_connections = Some(0),
                "database.max_connections",
            ),
            (
                |raw| raw.documents.min_space_before_break = Some(-1.0),
                "documents.min_space_before_break",
            ),
        ];

        for (mutate, expected) in cases {
            let mut raw = RawSettings::default();
            mutate(&mut raw);
            match Settings::from_raw(raw) {
                Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected),
                other => panic!("expected invalid `{expected}`, got {other:?}"),
            }
        }
    }

    #[test]
    fn database_override_applies_to_maintenance_commands() {
        let args = CliArgs::parse_from([
            "questionnaire",
            "export-csv",
            "--database-url",
            "postgres://example",
            "/tmp/reponses.csv",
        ]);

        let mut raw = RawSettings::default();
        raw.apply_command(args.command.as_ref());
        assert_eq!(raw.database.url.as_deref(), Some("postgres://example"));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["questionnaire"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "questionnaire",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--database-url",
            "postgres://override",
            "--documents-min-space-before-break",
            "72",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.database_url.as_deref(),
                    Some("postgres://override")
                );
                assert_eq!(serve.overrides.documents_min_space_before_break, Some(72.0));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_render_blank_arguments() {
        let args = CliArgs::parse_from(["questionnaire", "render-blank", "/tmp/blank.pdf"]);

        match args.command.expect("render-blank command") {
            Command::RenderBlank(render) => {
                assert_eq!(render.file, std::path::Path::new("/tmp/blank.pdf"));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_migrate_arguments() {
        let args = CliArgs::parse_from([
            "questionnaire",
            "migrate",
            "--database-url",
            "postgres://example",
        ]);

        match args.command.expect("migrate command") {
            Command::Migrate(migrate) => assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            ),
            _ => panic!("wrong command parsed"),
        }
    }
}
