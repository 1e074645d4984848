//! Procedure enumeration and execution

use crate::config::{LoggingLevel, ParameterDefaults, SmokeConfig};
use crate::error::DbError;
use crate::executor::{SessionProvider, SqlExecutor};
use crate::smoke::defaults::{
    build_exec_statement, format_arguments, synthesize_arguments, ArgValue, ProcedureParameter,
};
use crate::smoke::report::{ExecutionResult, SmokeReport};
use std::io::{self, Write};
use std::time::Instant;

pub const LIST_PROCEDURES_SQL: &str = "\
SELECT SPECIFIC_NAME
FROM INFORMATION_SCHEMA.ROUTINES
WHERE ROUTINE_TYPE = 'PROCEDURE' AND ROUTINE_SCHEMA = ?
ORDER BY SPECIFIC_NAME";

/// Rows are in declaration order, which is positional call order.
pub const PROCEDURE_PARAMETERS_SQL: &str = "\
SELECT PARAMETER_NAME, DATA_TYPE
FROM INFORMATION_SCHEMA.PARAMETERS
WHERE SPECIFIC_SCHEMA = ? AND SPECIFIC_NAME = ?
ORDER BY ORDINAL_POSITION";

/// What to run and how loudly
#[derive(Debug, Clone)]
pub struct SmokeOptions {
    pub schema: String,
    pub defaults: ParameterDefaults,
    pub logging_level: LoggingLevel,
    /// Print the generated statements instead of executing them
    pub dry_run: bool,
    /// Restrict the run to these procedures; empty means all
    pub only: Vec<String>,
}

impl SmokeOptions {
    pub fn new(
        schema: impl Into<String>,
        defaults: ParameterDefaults,
        logging_level: LoggingLevel,
    ) -> Self {
        Self {
            schema: schema.into(),
            defaults,
            logging_level,
            dry_run: false,
            only: Vec::new(),
        }
    }

    pub fn from_config(config: &SmokeConfig, logging_level: LoggingLevel) -> Self {
        Self::new(config.schema.clone(), config.defaults.clone(), logging_level)
    }

    fn verbose(&self) -> bool {
        self.logging_level == LoggingLevel::Verbose
    }

    fn prints_errors(&self) -> bool {
        matches!(self.logging_level, LoggingLevel::Verbose | LoggingLevel::ErrorsOnly)
    }
}

/// Names of all procedures in `schema`, sorted by specific name
pub fn list_procedures<P: SessionProvider>(
    provider: &P,
    schema: &str,
) -> Result<Vec<String>, DbError> {
    let rows = provider.run_query(LIST_PROCEDURES_SQL, &[schema])?;
    Ok(rows
        .iter()
        .filter_map(|row| row.get(0).map(str::to_string))
        .collect())
}

/// Declared parameters of one procedure, in server order
pub fn fetch_parameters<E: SqlExecutor + ?Sized>(
    session: &E,
    schema: &str,
    proc_name: &str,
) -> Result<Vec<ProcedureParameter>, DbError> {
    let rows = session.query_all(PROCEDURE_PARAMETERS_SQL, &[schema, proc_name])?;
    Ok(rows
        .iter()
        .map(|row| {
            ProcedureParameter::new(row.get(0).unwrap_or_default(), row.get(1).unwrap_or_default())
        })
        .collect())
}

/// Look up parameters and build the call statement on an open session
pub fn prepare_call<E: SqlExecutor + ?Sized>(
    session: &E,
    schema: &str,
    proc_name: &str,
    defaults: &ParameterDefaults,
) -> Result<(Vec<ArgValue>, String), DbError> {
    let params = fetch_parameters(session, schema, proc_name)?;
    let args = synthesize_arguments(&params, defaults);
    let statement = build_exec_statement(schema, proc_name, &args);
    Ok((args, statement))
}

fn failed<W: Write + ?Sized>(
    out: &mut W,
    options: &SmokeOptions,
    proc_name: &str,
    error: DbError,
) -> io::Result<ExecutionResult> {
    if options.prints_errors() {
        writeln!(out, "Error executing {}: {}", proc_name, error)?;
    }
    Ok(ExecutionResult::fail(proc_name, error.to_string()))
}

/// Run one procedure with synthesized arguments in a single session
///
/// Never fails because the procedure failed; only writing to `out` can fail.
/// Only the `EXEC` itself is timed.
pub fn execute_procedure<P, W>(
    provider: &P,
    proc_name: &str,
    options: &SmokeOptions,
    out: &mut W,
) -> io::Result<ExecutionResult>
where
    P: SessionProvider,
    W: Write + ?Sized,
{
    let session = match provider.open_session() {
        Ok(session) => session,
        Err(e) => {
            log::error!("Could not open a session for {}: {}", proc_name, e);
            return failed(out, options, proc_name, e);
        }
    };

    let prepared = prepare_call(&session, &options.schema, proc_name, &options.defaults);
    let (args, statement) = match prepared {
        Ok(call) => call,
        Err(e) => {
            log::error!(
                "Error fetching parameters of [{}].[{}]: {}",
                options.schema,
                proc_name,
                e
            );
            return failed(out, options, proc_name, e);
        }
    };

    if options.verbose() {
        writeln!(out, "Running: {}", statement)?;
    }

    let start = Instant::now();
    match session.execute(&statement) {
        Ok(()) => {
            let elapsed = start.elapsed();
            if options.verbose() {
                writeln!(
                    out,
                    "Executed with arguments: {} in {:.2} seconds",
                    format_arguments(&args),
                    elapsed.as_secs_f64()
                )?;
            }
            Ok(ExecutionResult::success(proc_name, elapsed))
        }
        Err(e) => {
            log::debug!("{} failed: {}", statement, e);
            failed(out, options, proc_name, e)
        }
    }
}

/// Enumerate the procedures to run, honoring `options.only`
fn selected_procedures<P: SessionProvider>(provider: &P, options: &SmokeOptions) -> Vec<String> {
    let procedures = match list_procedures(provider, &options.schema) {
        Ok(procedures) => procedures,
        Err(e) => {
            log::error!(
                "Error fetching stored procedures for schema '{}': {}",
                options.schema,
                e
            );
            Vec::new()
        }
    };

    if options.only.is_empty() {
        return procedures;
    }
    for name in &options.only {
        if !procedures.contains(name) {
            log::warn!("Procedure '{}' not found in schema '{}'", name, options.schema);
        }
    }
    procedures
        .into_iter()
        .filter(|p| options.only.contains(p))
        .collect()
}

/// Run every procedure in the schema once, in enumeration order
///
/// Per-procedure output follows `options.logging_level`; with `summary`, a
/// single table is written after the last procedure. With `dry_run`, the
/// statements are written and nothing is executed.
pub fn run_smoke_test<P, W>(
    provider: &P,
    options: &SmokeOptions,
    out: &mut W,
) -> io::Result<SmokeReport>
where
    P: SessionProvider,
    W: Write + ?Sized,
{
    let procedures = selected_procedures(provider, options);
    let mut report = SmokeReport {
        schema: options.schema.clone(),
        results: Vec::with_capacity(procedures.len()),
    };

    if options.dry_run {
        for proc_name in &procedures {
            let prepared = provider.open_session().and_then(|session| {
                prepare_call(&session, &options.schema, proc_name, &options.defaults)
            });
            match prepared {
                Ok((_, statement)) => writeln!(out, "{}", statement)?,
                Err(e) => writeln!(out, "-- {}: {}", proc_name, e)?,
            }
        }
        return Ok(report);
    }

    for proc_name in &procedures {
        if options.verbose() {
            writeln!(out, "Executing stored procedure: [{}]", proc_name)?;
        }

        let result = execute_procedure(provider, proc_name, options, out)?;
        report.results.push(result);

        if options.verbose() {
            writeln!(out)?;
        }
    }

    if options.logging_level == LoggingLevel::Summary {
        report.write_summary(out)?;
    }

    log::info!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}
