//! hull carve command - reconstruct a model from a directory of views.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use visual_hull::{CarveReport, SilhouetteCarver, ThresholdExtractor, run_directory};

use super::ParamArgs;
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct CarveResult {
    input: String,
    step: i32,
    angle_step: f64,
    #[serde(flatten)]
    report: CarveReport,
}

/// Default output prefix: `<input>/points`.
fn default_prefix(input: &Path) -> PathBuf {
    input.join("points")
}

pub fn run(input: &Path, output_prefix: Option<&Path>, args: &ParamArgs, cli: &Cli) -> Result<()> {
    let params = args.to_params()?;
    let prefix = output_prefix
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_prefix(input));

    let carver = SilhouetteCarver::new(params.clone())?;
    let extractor = ThresholdExtractor::from_params(&params);

    output::info(
        &format!(
            "Carving {} (step {} px, {}° per view, {} cuts)...",
            input.display(),
            params.step,
            params.angle_step,
            params.sweep_iterations()
        ),
        cli.format,
        cli.quiet,
    );

    let report = run_directory(input, &prefix, &params, &carver, &extractor)?;

    if report.output_voxels == 0 {
        output::warn(
            "Carving removed every voxel; the written model is empty",
            cli.format,
            cli.quiet,
        );
    }

    let result = CarveResult {
        input: input.display().to_string(),
        step: params.step,
        angle_step: params.angle_step,
        report,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let report = &result.report;
                output::success(
                    &format!("Carved {} views from {}", report.views, result.input),
                    cli.format,
                    cli.quiet,
                );
                println!(
                    "  {}: {} x {} x {} px",
                    "Lattice".cyan(),
                    report.min_width,
                    report.y_size,
                    report.max_width
                );
                println!("  {}: view {}", "Reference".cyan(), report.reference);
                println!(
                    "  {}: {} → {} → {}",
                    "Voxels".cyan(),
                    report.initial_voxels,
                    report.after_reference_cut,
                    report.after_rotational_cuts
                );
                println!(
                    "  {}: {} ({} exported)",
                    "Surface".cyan(),
                    report.surface_voxels,
                    report.output_voxels
                );
                if let Some(path) = &report.xyz_path {
                    println!("  {}: {}", "Point cloud".cyan(), path.display());
                }
                if let Some(path) = &report.stl_path {
                    println!("  {}: {}", "STL".cyan(), path.display());
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        assert_eq!(
            default_prefix(Path::new("/scans/rock")),
            PathBuf::from("/scans/rock/points")
        );
    }
}
