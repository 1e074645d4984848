//! Connection Module
//!
//! A [`Connection`] is an immutable description of one reachable SQL Server
//! database. It holds the raw connection string plus the ODBC driver name and
//! encryption flag, and parses the server and database names once at
//! construction.
//!
//! A `Connection` never holds a live session. Every use opens a fresh ODBC
//! session through [`SessionProvider`](crate::executor::SessionProvider) and
//! releases it when the session value is dropped.

use crate::config::ConnectionSettings;
use crate::error::ConnectionError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// ODBC keywords are case-insensitive and may have spaces around `=`.
static SERVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bServer\s*=\s*([^,;]+)").expect("server pattern is valid")
});
static DATABASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDatabase\s*=\s*([^;]+)").expect("database pattern is valid")
});

/// Connection string as found in the environment, without driver/encryption parts
///
/// Example: `Server=sql01,1433;Database=Sales;UID=tester;PWD=secret`
pub type ConnectionString = String;

/// A database endpoint: connection string plus driver and encryption settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    connection_string: ConnectionString,
    driver: String,
    encrypt: String,
    server: String,
    database: String,
}

impl Connection {
    /// Build a connection, taking `driver`/`encrypt` from `settings` when not given
    pub fn new(
        connection_string: impl Into<String>,
        driver: Option<String>,
        encrypt: Option<String>,
        settings: &ConnectionSettings,
    ) -> Self {
        let connection_string = connection_string.into();
        let server = parse_server(&connection_string);
        let database = parse_database(&connection_string);

        Self {
            driver: driver.unwrap_or_else(|| settings.driver.clone()),
            encrypt: encrypt.unwrap_or_else(|| settings.encrypt.clone()),
            connection_string,
            server,
            database,
        }
    }

    /// Build a connection from the process environment variable `var_name`
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::MissingEnvVar`] if the variable is unset or blank.
    pub fn from_env(
        var_name: &str,
        settings: &ConnectionSettings,
    ) -> Result<Self, ConnectionError> {
        Self::from_lookup(var_name, settings, |name| std::env::var(name).ok())
    }

    /// Same as [`Connection::from_env`] but resolving the variable through `lookup`
    pub fn from_lookup<F>(
        var_name: &str,
        settings: &ConnectionSettings,
        lookup: F,
    ) -> Result<Self, ConnectionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(var_name) {
            Some(value) if !value.trim().is_empty() => Ok(Self::new(value, None, None, settings)),
            _ => Err(ConnectionError::MissingEnvVar(var_name.to_string())),
        }
    }

    /// Raw connection string as configured
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// ODBC driver name, e.g. `{ODBC Driver 17 for SQL Server}`
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Encryption flag passed to the driver (`yes`/`no`/`strict`)
    pub fn encrypt(&self) -> &str {
        &self.encrypt
    }

    /// Server name from `Server=`, without any `,port` suffix; empty if absent
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Database name from `Database=`; empty if absent
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The string handed to the ODBC driver manager
    pub fn full_connection_string(&self) -> String {
        format!(
            "{};Driver={};Encrypt={}",
            self.connection_string.trim_end_matches(';'),
            self.driver,
            self.encrypt
        )
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection to [{}] database: [{}]", self.server, self.database)
    }
}

/// Extract the server name from a connection string
///
/// Matches `Server=<value>` up to the first comma or semicolon, ignoring
/// keyword case and surrounding spaces. Returns an empty string when there is
/// no match.
pub fn parse_server(connection_string: &str) -> String {
    capture(&SERVER_RE, connection_string)
}

/// Extract the database name from a connection string
///
/// Matches `Database=<value>` up to the first semicolon, with the same
/// leniency as [`parse_server`]. Returns an empty string when there is no match.
pub fn parse_database(connection_string: &str) -> String {
    capture(&DATABASE_RE, connection_string)
}

fn capture(pattern: &Regex, connection_string: &str) -> String {
    pattern
        .captures(connection_string)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Validates a connection string before it is handed to the driver
///
/// ODBC connection strings are `key=value` pairs separated by semicolons, so
/// anything without an `=` cannot be one.
pub fn validate_connection_string(connection_string: &str) -> Result<(), ConnectionError> {
    if connection_string.trim().is_empty() {
        return Err(ConnectionError::InvalidConnectionString(
            "Connection string cannot be empty".to_string(),
        ));
    }

    if !connection_string.contains('=') {
        return Err(ConnectionError::InvalidConnectionString(
            "Connection string must be in key=value format (Server=...;Database=...)".to_string(),
        ));
    }

    Ok(())
}
