//! # procguard
//!
//! Administration checks for SQL Server schemas:
//!
//! - [`compare`]: checksum object definitions in several environments and
//!   report the ones that differ or are missing.
//! - [`smoke`]: call every stored procedure in a schema with default
//!   arguments and report which ones fail.
//!
//! Both pipelines work against the [`SessionProvider`] trait. [`Connection`]
//! implements it over ODBC.

pub mod compare;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod odbc;
pub mod smoke;
pub mod table;
#[cfg(feature = "tracing")]
mod tracing_helpers;

pub use config::{ConnectionSettings, LoggingLevel, ParameterDefaults, ToolsConfig};
pub use connection::Connection;
pub use error::{ConnectionError, DbError};
pub use executor::{Row, SessionProvider, SqlExecutor};
pub use odbc::OdbcSession;
