//! Output helpers shared by all subcommands.
//!
//! Text output goes to stdout with colored status prefixes; JSON output is a
//! single pretty-printed document per command.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result as JSON.
///
/// In text mode commands render their own output, so this does nothing.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: failed to serialize result: {}", "Error".red().bold(), e),
        }
    }
}

/// Print a success line in text mode.
pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Text = format {
        println!("{} {}", "✓".green().bold(), message);
    }
}

/// Print a progress note in text mode.
pub fn info(message: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Text = format {
        println!("{} {}", "→".blue().bold(), message);
    }
}

/// Print a warning in text mode.
pub fn warn(message: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Text = format {
        eprintln!("{} {}", "!".yellow().bold(), message);
    }
}
