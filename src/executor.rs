//! Executor Module
//!
//! Two traits separate "a live session" from "something that can open one":
//!
//! - [`SqlExecutor`] runs statements on an open session.
//! - [`SessionProvider`] opens a scoped session on demand. Dropping the session
//!   releases it, on success and on error alike.
//!
//! Both pipelines are written against these traits, so they run unchanged on
//! the ODBC backend and on in-memory fakes.

use crate::error::DbError;

/// One fetched row; every column is read as text, `None` for SQL `NULL`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Option<String>>,
}

impl Row {
    /// Create a row from its column values
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Text value of column `index`, `None` for `NULL` or out of range
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for Row {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|v| v.map(Into::into)).collect())
    }
}

/// Trait for executing statements on an open session
pub trait SqlExecutor {
    /// Run a query and return all rows
    ///
    /// `params` are bound positionally to `?` markers in `query`.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    fn query_all(&self, query: &str, params: &[&str]) -> Result<Vec<Row>, DbError>;

    /// Execute a statement verbatim, without parameter binding
    ///
    /// Any result set the statement produces is discarded.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the statement fails.
    fn execute(&self, statement: &str) -> Result<(), DbError>;
}

/// Something that can open scoped database sessions
pub trait SessionProvider {
    /// Session type; released when dropped
    type Session: SqlExecutor;

    /// Open a new session
    ///
    /// # Errors
    ///
    /// Returns `DbError` if no session can be established.
    fn open_session(&self) -> Result<Self::Session, DbError>;

    /// Open a session, run one query, release the session
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the session cannot be opened or the query fails.
    fn run_query(&self, query: &str, params: &[&str]) -> Result<Vec<Row>, DbError> {
        let session = self.open_session()?;
        session.query_all(query, params)
    }
}
