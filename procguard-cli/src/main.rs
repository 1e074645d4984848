//! procguard CLI
//!
//! Compares object definitions across environments and smoke-tests stored
//! procedures. Exit status is 0 on success, 1 on fatal errors, and 2 when
//! `--fail-on-diff` / `--fail-on-error` is given and findings were reported.

use clap::Parser;
use colored::Colorize;
use procguard::ToolsConfig;
use procguard_cli::cli::{Cli, Commands};
use procguard_cli::commands::{handle_compare, handle_smoke, Outcome, OutputOptions};
use std::io::{self, IsTerminal, Write};
use std::process;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let color = !cli.no_color && io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }
    let output = OutputOptions {
        json: cli.json,
        color,
    };

    let config = match ToolsConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load configuration: {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let (result, fail_on_findings) = match &cli.command {
        Commands::Compare(args) => (
            handle_compare(&config, args, output, &mut out),
            args.fail_on_diff,
        ),
        Commands::Smoke(args) => (
            handle_smoke(&config, args, output, &mut out),
            args.fail_on_error,
        ),
    };
    let _ = out.flush();

    match result {
        Ok(Outcome::Findings) if fail_on_findings => process::exit(2),
        Ok(_) => process::exit(0),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            process::exit(1);
        }
    }
}
