//! hull info command - summarize the views in a directory.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use visual_hull::carve::estimated_voxel_count;
use visual_hull::{
    HullResult, SilhouetteSet, Stage, ThresholdExtractor, list_view_files, load_view,
    select_extremes,
};

use super::ParamArgs;
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ViewInfo {
    file: String,
    serial: u32,
    slices: usize,
    first_row: i32,
    last_row: i32,
    widest_span: i32,
}

#[derive(Serialize)]
struct DirectoryInfo {
    path: String,
    views: usize,
    reference: usize,
    min_width: i32,
    max_width: i32,
    y_size: i32,
    estimated_voxels: u64,
    rotational_cuts: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<ViewInfo>,
}

pub fn run(input: &Path, detailed: bool, args: &ParamArgs, cli: &Cli) -> Result<()> {
    let params = args.to_params()?;
    let extractor = ThresholdExtractor::from_params(&params);

    let files = list_view_files(input, &params.extension)
        .map_err(|e| e.in_stage(Stage::LoadViews, None))?;

    let mut details = Vec::with_capacity(files.len());
    let mut silhouettes = Vec::with_capacity(files.len());
    for path in &files {
        let view = load_view(path, &params.extension, &extractor).map_err(|e| {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            e.in_stage(Stage::LoadViews, name)
        })?;
        let s = &view.silhouette;
        details.push(ViewInfo {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            serial: view.serial,
            slices: s.len(),
            first_row: s.first_row().unwrap_or_default(),
            last_row: s.last_row().unwrap_or_default(),
            widest_span: s.widest_span().unwrap_or_default(),
        });
        silhouettes.push(view.silhouette);
    }

    let mut normalized = silhouettes
        .into_iter()
        .map(SilhouetteSet::normalized)
        .collect::<HullResult<Vec<_>>>()?;
    let extremes = select_extremes(&mut normalized, &params)?;

    let info = DirectoryInfo {
        path: input.display().to_string(),
        views: files.len(),
        reference: extremes.reference,
        min_width: extremes.min_width,
        max_width: extremes.max_width,
        y_size: extremes.y_size,
        estimated_voxels: estimated_voxel_count(
            extremes.y_size,
            extremes.min_width,
            extremes.max_width,
            params.step,
        ),
        rotational_cuts: params.sweep_iterations(),
        details: if detailed { details } else { Vec::new() },
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "View Set".bold().underline());
                println!("  {}: {}", "Directory".cyan(), info.path);
                println!("  {}: {}", "Views".cyan(), info.views);
                println!("  {}: view {}", "Reference".cyan(), info.reference);
                println!(
                    "  {}: {} x {} x {} px",
                    "Lattice".cyan(),
                    info.min_width,
                    info.y_size,
                    info.max_width
                );
                println!("  {}: {}", "Initial voxels".cyan(), info.estimated_voxels);
                println!("  {}: {}", "Rotational cuts".cyan(), info.rotational_cuts);

                if !info.details.is_empty() {
                    println!();
                    for v in &info.details {
                        println!(
                            "  {} #{:03}: {} slices, rows {}..={}, widest {} px",
                            v.file.dimmed(),
                            v.serial,
                            v.slices,
                            v.first_row,
                            v.last_row,
                            v.widest_span
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
