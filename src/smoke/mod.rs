//! Exec smoke test
//!
//! Calls every stored procedure in a schema once with synthesized default
//! arguments and records whether it ran and how long it took. A failing
//! procedure is recorded and the run moves on.
//!
//! Each procedure gets its own session, used for both the parameter lookup and
//! the `EXEC`. Procedures run strictly one after another.
//!
//! The generated calls may modify data. Point this at a non-production
//! database.

pub mod defaults;
pub mod report;
pub mod runner;

pub use defaults::{
    build_exec_statement, date_default, default_for, is_date_type, synthesize_arguments, ArgValue,
    ProcedureParameter,
};
pub use report::{ExecutionResult, ExecutionStatus, SmokeReport};
pub use runner::{
    execute_procedure, fetch_parameters, list_procedures, prepare_call, run_smoke_test,
    SmokeOptions, LIST_PROCEDURES_SQL, PROCEDURE_PARAMETERS_SQL,
};
