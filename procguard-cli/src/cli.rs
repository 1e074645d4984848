//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use procguard::compare::ObjectKind;
use procguard::LoggingLevel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "procguard")]
#[command(about = "Definition diffing and exec smoke tests for SQL Server schemas")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Configuration file (default: config/config.toml, optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit a JSON report instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare object definitions across the configured environments
    Compare(CompareArgs),

    /// Call every stored procedure in a schema with default arguments
    Smoke(SmokeArgs),
}

#[derive(Args, Debug, Default)]
pub struct CompareArgs {
    /// Schema to compare (overrides proc_compare.schema)
    #[arg(long)]
    pub schema: Option<String>,

    /// Object type to compare; repeatable (overrides proc_compare.object_types)
    #[arg(long = "object-type")]
    pub object_types: Vec<ObjectKind>,

    /// Exit with status 2 when any definition differs
    #[arg(long)]
    pub fail_on_diff: bool,
}

#[derive(Args, Debug, Default)]
pub struct SmokeArgs {
    /// Schema to test (overrides usp_tester.schema)
    #[arg(long)]
    pub schema: Option<String>,

    /// verbose, errors_only or summary (overrides configuration)
    #[arg(long)]
    pub logging_level: Option<LoggingLevel>,

    /// Only run this procedure; repeatable
    #[arg(long)]
    pub only: Vec<String>,

    /// Print the generated EXEC statements without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when any procedure fails
    #[arg(long)]
    pub fail_on_error: bool,
}

impl Cli {
    /// Default `env_logger` filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
