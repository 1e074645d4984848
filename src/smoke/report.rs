//! Execution results and the summary table

use serde::{Serialize, Serializer};
use std::io::{self, Write};
use std::time::Duration;

/// Outcome of one procedure call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Fail,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Fail => "fail",
        }
    }
}

/// One procedure call
///
/// `elapsed` is only recorded for successful calls; `error_message` only for
/// failed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub proc_name: String,
    pub status: ExecutionStatus,
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_seconds")]
    pub elapsed: Option<Duration>,
    pub error_message: Option<String>,
}

fn serialize_seconds<S: Serializer>(elapsed: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match elapsed {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

impl ExecutionResult {
    pub fn success(proc_name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            proc_name: proc_name.into(),
            status: ExecutionStatus::Success,
            elapsed: Some(elapsed),
            error_message: None,
        }
    }

    pub fn fail(proc_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            proc_name: proc_name.into(),
            status: ExecutionStatus::Fail,
            elapsed: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Elapsed seconds to two decimals, or `N/A`
    pub fn elapsed_display(&self) -> String {
        match self.elapsed {
            Some(d) => format!("{:.2}", d.as_secs_f64()),
            None => "N/A".to_string(),
        }
    }
}

/// All results of one run, in enumeration order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SmokeReport {
    pub schema: String,
    pub results: Vec<ExecutionResult>,
}

impl SmokeReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Fixed-width summary: name (50), status (10), elapsed (15)
    pub fn write_summary<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Execution Summary:")?;
        writeln!(out, "{:<50} {:<10} {:<15}", "Procedure Name", "Status", "Execution Time")?;
        writeln!(out, "{}", "-".repeat(76))?;
        for result in &self.results {
            writeln!(
                out,
                "{:<50} {:<10} {:<15}",
                result.proc_name,
                result.status.as_str(),
                result.elapsed_display()
            )?;
        }
        Ok(())
    }
}
