//! Error types shared by the connection primitive and both pipelines.

use thiserror::Error;

/// Failure to describe or open a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The environment variable naming a connection string is unset or blank
    #[error("Environment variable '{0}' not found or empty")]
    MissingEnvVar(String),
    /// Invalid connection string format
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),
    /// The ODBC driver manager refused the connection
    #[error("ODBC connection error: {0}")]
    Odbc(#[from] odbc_api::Error),
}

/// Query and statement execution error
#[derive(Debug, Error)]
pub enum DbError {
    /// Error reported by the ODBC driver while running a statement
    #[error("ODBC error: {0}")]
    Odbc(#[from] odbc_api::Error),
    /// A session could not be opened
    #[error("{0}")]
    Connection(#[from] ConnectionError),
    /// Query execution error that did not come from the driver
    #[error("Query error: {0}")]
    QueryError(String),
}
