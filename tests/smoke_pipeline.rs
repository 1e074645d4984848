//! End-to-end tests for the exec smoke test
//!
//! The database is an in-memory fake; see `common/mod.rs`.

mod common;

use common::{defaults, FakeDatabase};
use procguard::smoke::{
    run_smoke_test, ExecutionStatus, SmokeOptions, LIST_PROCEDURES_SQL, PROCEDURE_PARAMETERS_SQL,
};
use procguard::LoggingLevel;

fn options(level: LoggingLevel) -> SmokeOptions {
    SmokeOptions::new("dbo", defaults(), level)
}

fn run(db: &FakeDatabase, options: &SmokeOptions) -> (procguard::smoke::SmokeReport, String) {
    let mut out = Vec::new();
    let report = run_smoke_test(db, options, &mut out).unwrap();
    (report, String::from_utf8(out).unwrap())
}

/// Three procedures, the middle one raising on execution
fn three_procs() -> FakeDatabase {
    FakeDatabase::new()
        .with_procedure("usp_a", &[("@id", "int")])
        .with_procedure("usp_b", &[("@name", "varchar"), ("@flag", "bit")])
        .with_procedure("usp_c", &[])
        .failing_procedure("usp_b", "Invalid column name 'x'")
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_one_failure_does_not_stop_the_run() {
    let db = three_procs();
    let (report, _) = run(&db, &options(LoggingLevel::Summary));

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let failed: Vec<&str> = report.failures().map(|r| r.proc_name.as_str()).collect();
    assert_eq!(failed, vec!["usp_b"]);
    assert_eq!(report.results[1].status, ExecutionStatus::Fail);
    assert_eq!(
        report.results[1].error_message.as_deref(),
        Some("Query error: Invalid column name 'x'")
    );
    assert_eq!(report.results[1].elapsed, None);
    assert!(report.results[2].elapsed.is_some());
}

#[test]
fn test_statements_use_synthesized_defaults() {
    let db = three_procs();
    run(&db, &options(LoggingLevel::Summary));

    assert_eq!(
        db.executed(),
        vec![
            "EXEC [dbo].[usp_a] '1'".to_string(),
            "EXEC [dbo].[usp_b] 'test', '0'".to_string(),
            "EXEC [dbo].[usp_c]".to_string(),
        ]
    );
}

#[test]
fn test_unknown_and_date_types() {
    let db = FakeDatabase::new().with_procedure(
        "usp_report",
        &[
            ("@StartDate", "date"),
            ("@EndDateTime", "datetime"),
            ("@payload", "xml"),
        ],
    );
    run(&db, &options(LoggingLevel::Summary));

    assert_eq!(
        db.executed(),
        vec!["EXEC [dbo].[usp_report] '2024-01-01', '2024-12-31 23:59:59', NULL".to_string()]
    );
}

#[test]
fn test_one_session_per_procedure_all_released() {
    let db = three_procs();
    run(&db, &options(LoggingLevel::Summary));

    // one for the listing, one per procedure
    assert_eq!(db.sessions(), (4, 4));
}

#[test]
fn test_metadata_queries_bind_schema_and_name() {
    let db = FakeDatabase::new().with_procedure("usp_a", &[]);
    run(&db, &options(LoggingLevel::Summary));

    let queries = db.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].1, vec!["dbo".to_string()]);
    assert_eq!(queries[1].1, vec!["dbo".to_string(), "usp_a".to_string()]);
}

#[test]
fn test_metadata_queries_have_deterministic_order() {
    let db = FakeDatabase::new().with_procedure("usp_a", &[("@id", "int")]);
    run(&db, &options(LoggingLevel::Summary));

    let queries = db.queries();
    assert_eq!(queries[0].0, LIST_PROCEDURES_SQL);
    assert!(queries[0].0.trim_end().ends_with("ORDER BY SPECIFIC_NAME"));
    assert_eq!(queries[1].0, PROCEDURE_PARAMETERS_SQL);
    assert!(queries[1].0.trim_end().ends_with("ORDER BY ORDINAL_POSITION"));
}

// ============================================================================
// Failure tolerance
// ============================================================================

#[test]
fn test_parameter_lookup_failure_is_recorded_as_fail() {
    let db = FakeDatabase::new()
        .with_procedure("usp_a", &[])
        .with_procedure("usp_secret", &[("@id", "int")])
        .failing_parameters("usp_secret");
    let (report, _) = run(&db, &options(LoggingLevel::Summary));

    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].is_success());
    assert!(!report.results[1].is_success());
    assert_eq!(db.executed(), vec!["EXEC [dbo].[usp_a]".to_string()]);
}

#[test]
fn test_session_failure_for_one_procedure_is_recorded_and_run_continues() {
    // session 1 lists procedures, 2 is usp_a, 3 is usp_b, 4 is usp_c
    let db = FakeDatabase::new()
        .with_procedure("usp_a", &[])
        .with_procedure("usp_b", &[])
        .with_procedure("usp_c", &[])
        .failing_session(3);
    let (report, out) = run(&db, &options(LoggingLevel::ErrorsOnly));

    let statuses: Vec<ExecutionStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![ExecutionStatus::Success, ExecutionStatus::Fail, ExecutionStatus::Success]
    );
    assert_eq!(
        report.results[1].error_message.as_deref(),
        Some("Invalid connection string: host unreachable")
    );
    assert_eq!(report.results[1].elapsed, None);
    assert_eq!(
        db.executed(),
        vec!["EXEC [dbo].[usp_a]".to_string(), "EXEC [dbo].[usp_c]".to_string()]
    );
    assert_eq!(out, "Error executing usp_b: Invalid connection string: host unreachable\n");
    assert_eq!(db.sessions(), (3, 3));
}

#[test]
fn test_empty_schema_runs_nothing() {
    let db = FakeDatabase::new();
    let (report, out) = run(&db, &options(LoggingLevel::Summary));

    assert!(report.results.is_empty());
    assert!(db.executed().is_empty());
    assert!(out.starts_with("Execution Summary:\n"));
    assert_eq!(out.lines().count(), 3);
}

#[test]
fn test_failed_listing_yields_empty_run() {
    let db = FakeDatabase::new().with_procedure("usp_a", &[]).failing_metadata();
    let (report, _) = run(&db, &options(LoggingLevel::ErrorsOnly));

    assert!(report.results.is_empty());
    assert!(db.executed().is_empty());
}

#[test]
fn test_unreachable_database_yields_empty_run() {
    let db = FakeDatabase::new().with_procedure("usp_a", &[]).unreachable();
    let (report, out) = run(&db, &options(LoggingLevel::Verbose));

    assert!(report.results.is_empty());
    assert!(out.is_empty());
    assert_eq!(db.sessions(), (0, 0));
}

// ============================================================================
// Output levels
// ============================================================================

#[test]
fn test_summary_prints_only_the_table_in_order() {
    let db = three_procs();
    let (_, out) = run(&db, &options(LoggingLevel::Summary));

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "Execution Summary:");
    assert!(lines[1].starts_with("Procedure Name"));
    assert_eq!(lines[2], "-".repeat(76));
    assert!(lines[3].starts_with("usp_a "));
    assert!(lines[4].starts_with("usp_b "));
    assert!(lines[5].starts_with("usp_c "));
    assert!(lines[4].contains(" fail ") && lines[4].trim_end().ends_with("N/A"));
    assert!(!out.contains("Error executing"));
    assert!(!out.contains("Running:"));
}

#[test]
fn test_errors_only_prints_just_the_failure() {
    let db = three_procs();
    let (_, out) = run(&db, &options(LoggingLevel::ErrorsOnly));

    assert_eq!(out, "Error executing usp_b: Query error: Invalid column name 'x'\n");
}

#[test]
fn test_verbose_prints_every_step() {
    let db = FakeDatabase::new()
        .with_procedure("usp_a", &[("@id", "int"), ("@x", "uniqueidentifier")])
        .with_procedure("usp_b", &[])
        .failing_procedure("usp_b", "boom");
    let (_, out) = run(&db, &options(LoggingLevel::Verbose));

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Executing stored procedure: [usp_a]");
    assert_eq!(lines[1], "Running: EXEC [dbo].[usp_a] '1', NULL");
    assert!(lines[2].starts_with("Executed with arguments: ['1', NULL] in "));
    assert!(lines[2].ends_with(" seconds"));
    assert_eq!(lines[3], "");
    assert_eq!(lines[4], "Executing stored procedure: [usp_b]");
    assert_eq!(lines[5], "Running: EXEC [dbo].[usp_b]");
    assert_eq!(lines[6], "Error executing usp_b: Query error: boom");
    assert_eq!(lines[7], "");
    assert_eq!(lines.len(), 8);
    assert!(!out.contains("Execution Summary:"));
}

// ============================================================================
// Selection and dry run
// ============================================================================

#[test]
fn test_only_restricts_the_run() {
    let db = three_procs();
    let mut opts = options(LoggingLevel::Summary);
    opts.only = vec!["usp_c".to_string(), "usp_missing".to_string()];
    let (report, _) = run(&db, &opts);

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].proc_name, "usp_c");
    assert_eq!(db.executed(), vec!["EXEC [dbo].[usp_c]".to_string()]);
}

#[test]
fn test_dry_run_prints_without_executing() {
    let db = three_procs().failing_parameters("usp_c");
    let mut opts = options(LoggingLevel::Verbose);
    opts.dry_run = true;
    let (report, out) = run(&db, &opts);

    assert!(db.executed().is_empty());
    assert!(report.results.is_empty());
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "EXEC [dbo].[usp_a] '1'");
    assert_eq!(lines[1], "EXEC [dbo].[usp_b] 'test', '0'");
    assert!(lines[2].starts_with("-- usp_c: "));
    assert_eq!(db.sessions(), (4, 4));
}

#[test]
fn test_json_result_shape() {
    let db = three_procs();
    let (report, _) = run(&db, &options(LoggingLevel::Summary));
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["schema"], "dbo");
    assert_eq!(value["results"][0]["status"], "success");
    assert!(value["results"][0]["elapsed_seconds"].is_number());
    assert_eq!(value["results"][1]["status"], "fail");
    assert!(value["results"][1]["elapsed_seconds"].is_null());
}
