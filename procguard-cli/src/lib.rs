//! procguard command-line front end
//!
//! The binary (main.rs) parses arguments and sets up logging; the handlers
//! here do the work and return an [`commands::Outcome`] for the exit status.

pub mod cli;
pub mod commands;
