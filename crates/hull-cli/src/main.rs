//! hull: command-line visual-hull reconstruction.
//!
//! Turns a directory of turntable images into a voxel model
//! (`<prefix>.xyz` and `<prefix>.stl`).
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=visual_hull=info` - Stage summaries
//! - `RUST_LOG=visual_hull=debug` - Per-cut voxel counts and offsets
//! - `RUST_LOG=visual_hull::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Carve with the default 4 px step and 5 degree turntable increments
//! hull carve scans/rock -o scans/rock/points
//!
//! # Inspect the views before a long run
//! RUST_LOG=visual_hull=debug hull info scans/rock --step 2
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{ParamArgs, carve, info};

/// hull - Reconstruct voxel models from turntable silhouettes.
///
/// Carves a visual hull out of a voxel lattice using one image per turntable
/// position.
#[derive(Parser)]
#[command(name = "hull")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Carve a voxel model from a directory of views
    Carve {
        /// Directory containing the view images
        input: PathBuf,

        /// Output path prefix; `.xyz` and `.stl` are appended
        /// [default: <INPUT>/points]
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Show the views found in a directory and the lattice they imply
    Info {
        /// Directory containing the view images
        input: PathBuf,

        /// List every view
        #[arg(long)]
        detailed: bool,

        #[command(flatten)]
        params: ParamArgs,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "visual_hull=info,hull=info",
            2 => "visual_hull=debug,hull=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Carve {
            input,
            output,
            params,
        } => carve::run(input, output.as_deref(), params, &cli),
        Commands::Info {
            input,
            detailed,
            params,
        } => info::run(input, *detailed, params, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(hull_err) = e.downcast_ref::<visual_hull::HullError>() {
                eprintln!("{}: {}", "Error".red().bold(), hull_err);
                let root = hull_err.root_cause();
                if !std::ptr::eq(root, hull_err) {
                    eprintln!("  {}: {}", "Caused by".yellow(), root);
                }
                eprintln!("  {}: {}", "Code".cyan(), hull_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    hull_err.recovery_suggestion()
                );
                if let Some(location) = hull_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
