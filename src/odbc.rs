//! ODBC backend
//!
//! Implements [`SessionProvider`] for [`Connection`] on top of `odbc-api`.
//! One ODBC environment is created per process and shared; each session is a
//! separate driver connection that is closed when [`OdbcSession`] is dropped.

use crate::connection::{validate_connection_string, Connection};
use crate::error::{ConnectionError, DbError};
use crate::executor::{Row, SessionProvider, SqlExecutor};
use odbc_api::{ConnectionOptions, Cursor, Environment, IntoParameter, ResultSetMetadata};
use once_cell::sync::OnceCell;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

static ODBC_ENV: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment, odbc_api::Error> {
    ODBC_ENV.get_or_try_init(Environment::new)
}

/// Step through every remaining result of a statement
///
/// SQL Server reports errors raised after the first result set or row count
/// only when the client moves on to the next result, so a call has not
/// finished until this returns.
fn drain_results<C, E, F>(first: Option<C>, mut next: F) -> Result<(), E>
where
    F: FnMut(C) -> Result<Option<C>, E>,
{
    let mut current = first;
    while let Some(cursor) = current {
        current = next(cursor)?;
    }
    Ok(())
}

/// A live ODBC session; dropping it closes the driver connection
pub struct OdbcSession {
    conn: odbc_api::Connection<'static>,
}

impl OdbcSession {
    /// Connect using the full connection string of `connection`
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the string is malformed or the driver refuses.
    pub fn connect(connection: &Connection) -> Result<Self, ConnectionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::open_session_span(connection.server(), connection.database())
            .entered();

        validate_connection_string(connection.connection_string())?;

        let env = environment()?;
        let conn = env.connect_with_connection_string(
            &connection.full_connection_string(),
            ConnectionOptions::default(),
        )?;
        log::debug!("Opened session to {}", connection);

        Ok(Self { conn })
    }
}

impl SqlExecutor for OdbcSession {
    /// Columns are read row by row in chunks, so `nvarchar(max)` definitions
    /// come back whole instead of being cut at a buffer size.
    fn query_all(&self, query: &str, params: &[&str]) -> Result<Vec<Row>, DbError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::query_span(query).entered();

        let params: Vec<_> = params.iter().map(|&p| p.into_parameter()).collect();
        let mut rows = Vec::new();

        let Some(mut cursor) = self.conn.execute(query, params.as_slice())? else {
            return Ok(rows);
        };

        let num_cols = u16::try_from(cursor.num_result_cols()?).unwrap_or(0);
        let mut buf = Vec::new();
        while let Some(mut cursor_row) = cursor.next_row()? {
            let mut values = Vec::with_capacity(usize::from(num_cols));
            for col in 1..=num_cols {
                let value = if cursor_row.get_text(col, &mut buf)? {
                    Some(String::from_utf8_lossy(&buf).into_owned())
                } else {
                    None
                };
                values.push(value);
            }
            rows.push(Row::new(values));
        }

        Ok(rows)
    }

    fn execute(&self, statement: &str) -> Result<(), DbError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_span(statement).entered();

        // Rows are not inspected, but every result is visited for its errors.
        let cursor = self.conn.execute(statement, ())?;
        drain_results(cursor, |current| current.more_results())?;
        Ok(())
    }
}

impl SessionProvider for Connection {
    type Session = OdbcSession;

    fn open_session(&self) -> Result<Self::Session, DbError> {
        Ok(OdbcSession::connect(self)?)
    }
}
