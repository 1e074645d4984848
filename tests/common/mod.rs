//! In-memory stand-in for a SQL Server database
//!
//! Answers the metadata queries both pipelines issue, records every statement
//! executed and every session opened/closed, and can be told to fail.

#![allow(dead_code)]

use procguard::smoke::{LIST_PROCEDURES_SQL, PROCEDURE_PARAMETERS_SQL};
use procguard::{ConnectionError, DbError, ParameterDefaults, Row, SessionProvider, SqlExecutor};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct State {
    pub unreachable: bool,
    /// 1-based session attempts that are refused
    pub failing_sessions: Vec<usize>,
    pub session_attempts: usize,
    pub failing_metadata: bool,
    pub definitions: Vec<(String, Option<String>)>,
    pub procedures: Vec<String>,
    pub parameters: HashMap<String, Vec<(String, String)>>,
    pub failing_parameters: Vec<String>,
    pub failing_procs: HashMap<String, String>,
    pub queries: Vec<(String, Vec<String>)>,
    pub executed: Vec<String>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
}

#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub state: Rc<RefCell<State>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definitions returned for any definition query
    pub fn with_definitions(self, defs: &[(&str, Option<&str>)]) -> Self {
        self.state.borrow_mut().definitions = defs
            .iter()
            .map(|(n, d)| (n.to_string(), d.map(str::to_string)))
            .collect();
        self
    }

    /// Register a procedure with its `(name, type)` parameters
    pub fn with_procedure(self, name: &str, params: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.procedures.push(name.to_string());
            state.parameters.insert(
                name.to_string(),
                params.iter().map(|(n, t)| (n.to_string(), t.to_string())).collect(),
            );
        }
        self
    }

    /// Make `EXEC` of `name` raise `message`
    pub fn failing_procedure(self, name: &str, message: &str) -> Self {
        self.state
            .borrow_mut()
            .failing_procs
            .insert(name.to_string(), message.to_string());
        self
    }

    /// Make the parameter lookup of `name` fail
    pub fn failing_parameters(self, name: &str) -> Self {
        self.state.borrow_mut().failing_parameters.push(name.to_string());
        self
    }

    /// Refuse every session
    pub fn unreachable(self) -> Self {
        self.state.borrow_mut().unreachable = true;
        self
    }

    /// Refuse only the `nth` session opened (1-based, counting refusals)
    pub fn failing_session(self, nth: usize) -> Self {
        self.state.borrow_mut().failing_sessions.push(nth);
        self
    }

    /// Fail definition and procedure-list queries
    pub fn failing_metadata(self) -> Self {
        self.state.borrow_mut().failing_metadata = true;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.borrow().executed.clone()
    }

    pub fn queries(&self) -> Vec<(String, Vec<String>)> {
        self.state.borrow().queries.clone()
    }

    pub fn sessions(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.sessions_opened, state.sessions_closed)
    }
}

pub struct FakeSession {
    state: Rc<RefCell<State>>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.borrow_mut().sessions_closed += 1;
    }
}

fn rows(values: Vec<Vec<Option<String>>>) -> Vec<Row> {
    values.into_iter().map(Row::new).collect()
}

impl SqlExecutor for FakeSession {
    fn query_all(&self, query: &str, params: &[&str]) -> Result<Vec<Row>, DbError> {
        let mut state = self.state.borrow_mut();
        state
            .queries
            .push((query.to_string(), params.iter().map(|p| p.to_string()).collect()));

        if query == PROCEDURE_PARAMETERS_SQL {
            let proc_name = params.get(1).copied().unwrap_or_default();
            if state.failing_parameters.iter().any(|p| p == proc_name) {
                return Err(DbError::QueryError(format!("permission denied on {proc_name}")));
            }
            let params = state.parameters.get(proc_name).cloned().unwrap_or_default();
            return Ok(rows(
                params
                    .into_iter()
                    .map(|(n, t)| vec![Some(n), Some(t)])
                    .collect(),
            ));
        }

        if state.failing_metadata {
            return Err(DbError::QueryError("Invalid object name".to_string()));
        }

        if query == LIST_PROCEDURES_SQL {
            let mut names = state.procedures.clone();
            names.sort();
            return Ok(rows(names.into_iter().map(|n| vec![Some(n)]).collect()));
        }

        Ok(rows(
            state
                .definitions
                .iter()
                .map(|(n, d)| vec![Some(n.clone()), d.clone()])
                .collect(),
        ))
    }

    fn execute(&self, statement: &str) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        state.executed.push(statement.to_string());

        let proc_name = statement
            .split("].[")
            .nth(1)
            .and_then(|rest| rest.split(']').next())
            .unwrap_or_default()
            .to_string();
        match state.failing_procs.get(&proc_name) {
            Some(message) => Err(DbError::QueryError(message.clone())),
            None => Ok(()),
        }
    }
}

impl SessionProvider for FakeDatabase {
    type Session = FakeSession;

    fn open_session(&self) -> Result<Self::Session, DbError> {
        let mut state = self.state.borrow_mut();
        state.session_attempts += 1;
        if state.unreachable || state.failing_sessions.contains(&state.session_attempts) {
            return Err(
                ConnectionError::InvalidConnectionString("host unreachable".to_string()).into(),
            );
        }
        state.sessions_opened += 1;
        Ok(FakeSession {
            state: Rc::clone(&self.state),
        })
    }
}

pub fn defaults() -> ParameterDefaults {
    ParameterDefaults {
        integer: "1".to_string(),
        bit: "0".to_string(),
        decimal: "1.5".to_string(),
        varchar: "test".to_string(),
        start_date: "2024-01-01".to_string(),
        start_datetime: "2024-01-01 00:00:00".to_string(),
        end_date: "2024-12-31".to_string(),
        end_datetime: "2024-12-31 23:59:59".to_string(),
    }
}
