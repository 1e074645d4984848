//! Span constructors for session and statement work.
//!
//! Built with the `log` bridge enabled, so with no `tracing` subscriber
//! installed the span enter/exit events still reach the `log` logger.

use tracing::{info_span, Span};

/// Statements longer than this are cut in span fields
const MAX_STATEMENT_FIELD: usize = 120;

fn shorten(statement: &str) -> &str {
    match statement.char_indices().nth(MAX_STATEMENT_FIELD) {
        Some((idx, _)) => &statement[..idx],
        None => statement,
    }
}

pub fn open_session_span(server: &str, database: &str) -> Span {
    info_span!("open_session", server = server, database = database)
}

pub fn query_span(query: &str) -> Span {
    info_span!("query", sql = shorten(query.trim()))
}

pub fn execute_span(statement: &str) -> Span {
    info_span!("execute", sql = shorten(statement.trim()))
}
