//! Command handlers
//!
//! Each handler resolves configuration into connections and options, runs one
//! library pipeline and writes the report to `out`. Whether findings turn into
//! a non-zero exit status is decided by the caller.

use crate::cli::{CompareArgs, SmokeArgs};
use anyhow::{bail, Context, Result};
use procguard::compare::{compare_definitions, parse_object_kinds, DiffReport, ObjectKind};
use procguard::config::EnvironmentEntry;
use procguard::smoke::{run_smoke_test, SmokeOptions, SmokeReport};
use procguard::{Connection, ConnectionSettings, SessionProvider, ToolsConfig};
use std::io::{self, Write};

/// What a finished command found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No differences, or every procedure succeeded
    Clean,
    /// Differences or failed procedures were reported
    Findings,
}

/// How reports are written
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub color: bool,
}

/// Build a connection for every configured environment whose variable is set
///
/// Each usable environment is announced on `out`; the others are warned about
/// and skipped. Order follows the configuration.
pub fn resolve_environments<F, W>(
    entries: &[EnvironmentEntry],
    settings: &ConnectionSettings,
    lookup: F,
    out: &mut W,
) -> io::Result<Vec<(String, Connection)>>
where
    F: Fn(&str) -> Option<String>,
    W: Write + ?Sized,
{
    let mut environments = Vec::with_capacity(entries.len());
    for entry in entries {
        match Connection::from_lookup(&entry.env_var, settings, &lookup) {
            Ok(connection) => {
                writeln!(out, "{}: {}", entry.name, connection)?;
                environments.push((entry.name.clone(), connection));
            }
            Err(e) => log::warn!("Skipping environment '{}': {}", entry.name, e),
        }
    }
    Ok(environments)
}

/// Compare each object kind across `environments` and write the reports
pub fn run_compare<P, W>(
    environments: &[(String, P)],
    schema: &str,
    kinds: &[ObjectKind],
    output: OutputOptions,
    out: &mut W,
) -> Result<Outcome>
where
    P: SessionProvider,
    W: Write + ?Sized,
{
    let reports: Vec<DiffReport> = kinds
        .iter()
        .map(|&kind| compare_definitions(environments, schema, kind))
        .collect();

    if output.json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            report.write_to(out, output.color)?;
        }
    }

    if reports.iter().any(DiffReport::has_differences) {
        Ok(Outcome::Findings)
    } else {
        Ok(Outcome::Clean)
    }
}

/// `procguard compare`
pub fn handle_compare<W: Write + ?Sized>(
    config: &ToolsConfig,
    args: &CompareArgs,
    output: OutputOptions,
    out: &mut W,
) -> Result<Outcome> {
    let compare = config.compare().context("Missing [proc_compare] configuration")?;
    let schema = args.schema.as_deref().unwrap_or(&compare.schema);

    let kinds = if args.object_types.is_empty() {
        parse_object_kinds(&compare.object_types)
    } else {
        args.object_types.clone()
    };
    if kinds.is_empty() {
        bail!("No valid object types to compare");
    }

    let environments = resolve_environments(
        &compare.environments,
        &config.connection,
        |name| std::env::var(name).ok(),
        out,
    )?;
    if environments.is_empty() {
        bail!("No environment has a usable connection string");
    }

    run_compare(&environments, schema, &kinds, output, out)
}

/// Run the smoke test against `provider` and write the report
pub fn run_smoke<P, W>(
    provider: &P,
    options: &SmokeOptions,
    output: OutputOptions,
    out: &mut W,
) -> Result<Outcome>
where
    P: SessionProvider,
    W: Write + ?Sized,
{
    let report: SmokeReport = if output.json {
        let report = run_smoke_test(provider, options, &mut io::sink())?;
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        report
    } else {
        run_smoke_test(provider, options, out)?
    };

    if report.failed() > 0 {
        Ok(Outcome::Findings)
    } else {
        Ok(Outcome::Clean)
    }
}

/// `procguard smoke`
pub fn handle_smoke<W: Write + ?Sized>(
    config: &ToolsConfig,
    args: &SmokeArgs,
    output: OutputOptions,
    out: &mut W,
) -> Result<Outcome> {
    let smoke = config.smoke().context("Missing [usp_tester] configuration")?;
    let connection = Connection::from_env(&smoke.connection_env, &config.connection)
        .context("No connection for the smoke test")?;

    let level = args.logging_level.unwrap_or_else(|| config.smoke_logging_level());
    let mut options = SmokeOptions::from_config(smoke, level);
    if let Some(schema) = &args.schema {
        options.schema = schema.clone();
    }
    options.only = args.only.clone();
    options.dry_run = args.dry_run;

    if !output.json {
        writeln!(
            out,
            "Executing script on server: [{}] in database: [{}]",
            connection.server(),
            connection.database()
        )?;
        writeln!(out, "Using logging_level: {}\n", level)?;
    }

    run_smoke(&connection, &options, output, out)
}
