//! Configuration for both tools.
//!
//! Settings are read from `config/config.toml` (or an explicit path) and
//! environment variables prefixed with `PROCGUARD`, using `__` as the section
//! separator, e.g. `PROCGUARD__USP_TESTER__SCHEMA=dbo`.
//!
//! ```toml
//! [sql_tools]
//! logging_level = "summary"
//!
//! [connection]
//! driver = "{ODBC Driver 17 for SQL Server}"
//! encrypt = "yes"
//!
//! [proc_compare]
//! schema = "dbo"
//! object_types = ["stored_proc", "view"]
//!
//! [[proc_compare.environments]]
//! name = "dev"
//! env_var = "DEV_DB"
//!
//! [usp_tester]
//! schema = "dbo"
//! connection_env = "USP_TEST_DB"
//!
//! [usp_tester.defaults]
//! integer = 1
//! bit = 0
//! decimal = 1.5
//! varchar = "test"
//! start_date = "2024-01-01"
//! start_datetime = "2024-01-01 00:00:00"
//! end_date = "2024-12-31"
//! end_datetime = "2024-12-31 23:59:59"
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "PROCGUARD";

/// Per-procedure console output of the smoke test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggingLevel {
    /// Print each statement before execution and arguments plus timing after
    Verbose,
    /// Print only failures
    ErrorsOnly,
    /// Print nothing per procedure, one summary table at the end
    #[default]
    Summary,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggingLevel::Verbose => "verbose",
            LoggingLevel::ErrorsOnly => "errors_only",
            LoggingLevel::Summary => "summary",
        }
    }
}

impl fmt::Display for LoggingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbose" => Ok(LoggingLevel::Verbose),
            "errors_only" => Ok(LoggingLevel::ErrorsOnly),
            "summary" => Ok(LoggingLevel::Summary),
            other => Err(format!(
                "unknown logging level '{other}' (expected verbose, errors_only or summary)"
            )),
        }
    }
}

/// Driver and encryption values applied to every connection string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default = "default_encrypt")]
    pub encrypt: String,
}

fn default_driver() -> String {
    "{ODBC Driver 17 for SQL Server}".to_string()
}

fn default_encrypt() -> String {
    "yes".to_string()
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            encrypt: default_encrypt(),
        }
    }
}

/// `[sql_tools]`: settings shared by every tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub logging_level: Option<LoggingLevel>,
}

/// One compared environment and the variable holding its connection string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub env_var: String,
}

/// `[proc_compare]`
#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    pub schema: String,
    #[serde(default = "default_object_types")]
    pub object_types: Vec<String>,
    #[serde(default)]
    pub environments: Vec<EnvironmentEntry>,
}

fn default_object_types() -> Vec<String> {
    vec!["stored_proc".to_string()]
}

/// Literal argument values used when calling procedures, by category
///
/// Values are kept as text and substituted verbatim into `EXEC` statements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParameterDefaults {
    pub integer: String,
    #[serde(alias = "boolean")]
    pub bit: String,
    pub decimal: String,
    pub varchar: String,
    pub start_date: String,
    pub start_datetime: String,
    pub end_date: String,
    pub end_datetime: String,
}

impl ParameterDefaults {
    /// Describe date-ish defaults that do not look like dates
    ///
    /// These are warnings only; the database decides what it accepts.
    pub fn date_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (key, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                warnings.push(format!("{key} = '{value}' is not a YYYY-MM-DD date"));
            }
        }
        for (key, value) in [
            ("start_datetime", &self.start_datetime),
            ("end_datetime", &self.end_datetime),
        ] {
            let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"));
            if parsed.is_err() {
                warnings.push(format!("{key} = '{value}' is not a YYYY-MM-DD HH:MM:SS datetime"));
            }
        }
        warnings
    }
}

/// `[usp_tester]`
#[derive(Debug, Clone, Deserialize)]
pub struct SmokeConfig {
    pub schema: String,
    #[serde(default = "default_connection_env")]
    pub connection_env: String,
    #[serde(default)]
    pub logging_level: Option<LoggingLevel>,
    pub defaults: ParameterDefaults,
}

fn default_connection_env() -> String {
    "USP_TEST_DB".to_string()
}

/// The whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub sql_tools: GlobalSettings,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub proc_compare: Option<CompareConfig>,
    #[serde(default)]
    pub usp_tester: Option<SmokeConfig>,
}

impl ToolsConfig {
    /// Load configuration from `path` (or `config/config.toml`) plus the environment
    ///
    /// An explicit `path` must exist. The default file is optional; if it exists
    /// but cannot be read, a warning is logged and only the environment is used.
    /// `DB_DRIVER` and `DB_ENCRYPT` override the `[connection]` section.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = match path {
            Some(path) => Config::builder().add_source(File::from(path).required(true)),
            None => Config::builder()
                .add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false)),
        };
        let builder = with_env_sources(builder)?;

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) if path.is_none() => {
                if Path::new(DEFAULT_CONFIG_PATH).exists() {
                    log::warn!(
                        "Failed to load {}, falling back to environment only: {}",
                        DEFAULT_CONFIG_PATH,
                        err
                    );
                }
                with_env_sources(Config::builder())?.build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {}, \
                         then env-only error: {}",
                        err, env_err
                    ))
                })?
            }
            Err(err) => return Err(err),
        };

        Self::from_config(settings)
    }

    /// Parse configuration from TOML text, without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(settings)
    }

    fn from_config(settings: Config) -> Result<Self, ConfigError> {
        let tools: ToolsConfig = settings.try_deserialize()?;
        if let Some(smoke) = &tools.usp_tester {
            for warning in smoke.defaults.date_warnings() {
                log::warn!("usp_tester.defaults: {}", warning);
            }
        }
        Ok(tools)
    }

    /// The `[proc_compare]` section
    pub fn compare(&self) -> Result<&CompareConfig, ConfigError> {
        self.proc_compare
            .as_ref()
            .ok_or_else(|| ConfigError::NotFound("proc_compare".to_string()))
    }

    /// The `[usp_tester]` section
    pub fn smoke(&self) -> Result<&SmokeConfig, ConfigError> {
        self.usp_tester
            .as_ref()
            .ok_or_else(|| ConfigError::NotFound("usp_tester".to_string()))
    }

    /// Smoke-test verbosity: tool setting, then `[sql_tools]`, then `summary`
    pub fn smoke_logging_level(&self) -> LoggingLevel {
        self.usp_tester
            .as_ref()
            .and_then(|smoke| smoke.logging_level)
            .or(self.sql_tools.logging_level)
            .unwrap_or_default()
    }
}

fn with_env_sources(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .set_override_option("connection.driver", std::env::var("DB_DRIVER").ok())?
        .set_override_option("connection.encrypt", std::env::var("DB_ENCRYPT").ok())
}
