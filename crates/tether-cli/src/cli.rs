use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tether_core::settings::{DEFAULT_ALPHABET, DEFAULT_LENGTH};
use tether_core::BindingSettings;
use tether_telemetry::LogFormat;

pub const STORAGE_BACKEND_ENV: &str = "TETHER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "TETHER_MYSQL_DSN";
pub const LOG_FORMAT_ENV: &str = "TETHER_LOG_FORMAT";
pub const BASE_URL_ENV: &str = "TETHER_BASE_URL";
pub const ALPHABET_ENV: &str = "TETHER_ALPHABET";
pub const ID_LENGTH_ENV: &str = "TETHER_ID_LENGTH";
pub const TTL_ENV: &str = "TETHER_TTL";
pub const EXPIRE_AT_ENV: &str = "TETHER_EXPIRE_AT";
pub const MAX_ACCESS_ENV: &str = "TETHER_MAX_ACCESS";
pub const EXPIRED_REDIRECT_URL_ENV: &str = "TETHER_EXPIRED_REDIRECT_URL";
pub const EXHAUSTED_REDIRECT_URL_ENV: &str = "TETHER_EXHAUSTED_REDIRECT_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Bind URLs to short ids with expiration dates and usage limits.
///
/// The in-memory backend lives only as long as one invocation; use MySQL
/// to keep bindings across invocations.
#[derive(Debug, Parser)]
#[command(name = "tether", version)]
pub struct Cli {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value = "compact")]
    pub log_format: LogFormatArg,

    /// Prefix printed ids with this base URL.
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Global binding settings.
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Characters generated ids are drawn from.
    #[arg(long, env = ALPHABET_ENV, default_value = DEFAULT_ALPHABET)]
    pub alphabet: String,

    /// Length of generated ids.
    #[arg(long, env = ID_LENGTH_ENV, default_value_t = DEFAULT_LENGTH)]
    pub id_length: usize,

    /// TTL in seconds for bindings without their own expiration.
    #[arg(long, env = TTL_ENV)]
    pub default_ttl: Option<u64>,

    /// Expiration date (RFC 3339) for bindings without their own expiration.
    #[arg(long, env = EXPIRE_AT_ENV)]
    pub default_expire_at: Option<Timestamp>,

    /// Max-access count for bindings without their own limit.
    #[arg(long, env = MAX_ACCESS_ENV)]
    pub default_max_access: Option<u64>,

    #[arg(long, env = EXPIRED_REDIRECT_URL_ENV)]
    pub expired_redirect_url: Option<String>,

    #[arg(long, env = EXHAUSTED_REDIRECT_URL_ENV)]
    pub exhausted_redirect_url: Option<String>,
}

impl SettingsArgs {
    pub fn to_settings(&self) -> BindingSettings {
        BindingSettings {
            alphabet: self.alphabet.clone(),
            length: self.id_length,
            ttl: self.default_ttl,
            expire_at: self.default_expire_at,
            max_access: self.default_max_access,
            expired_redirect_url: self.expired_redirect_url.clone(),
            exhausted_redirect_url: self.exhausted_redirect_url.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bind a URL and print its id.
    Bind {
        url: String,
        /// Use this id instead of generating one.
        #[arg(long)]
        id: Option<String>,
        /// Seconds the binding lives.
        #[arg(long)]
        ttl: Option<u64>,
        /// Expiration date (RFC 3339).
        #[arg(long)]
        expire_at: Option<Timestamp>,
        /// Number of redirects served before the binding is exhausted.
        #[arg(long)]
        max_access: Option<u64>,
        #[arg(long)]
        expired_url: Option<String>,
        #[arg(long)]
        exhausted_url: Option<String>,
        /// Accept ids outside the configured alphabet and length.
        #[arg(long)]
        relaxed: bool,
    },
    /// Resolve an id, counting the access, and print the redirect target.
    Resolve { id: String },
    /// Print a binding without counting the access.
    Peek { id: String },
    /// Remove a binding.
    Unbind { id: String },
    /// Bind every row of a CSV file:
    /// `url,id,max_requests,expire_on,ttl,expired_url,exhausted_url`.
    Import { file: PathBuf },
}
