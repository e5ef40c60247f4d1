//! Subcommand implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use visual_hull::{CarveParams, SpanMode, SweepCoverage};

pub mod carve;
pub mod info;

/// Run parameters shared by all subcommands.
///
/// Values come from `--config` when given, then individual flags override.
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// TOML file with carving parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pixel sampling step, also the voxel size [default: 4]
    #[arg(long, short = 's')]
    pub step: Option<i32>,

    /// Turntable rotation between consecutive images, in degrees [default: 5]
    #[arg(long, short = 'a')]
    pub angle_step: Option<f64>,

    /// Intensity threshold on r + g + b [default: 90]
    #[arg(long)]
    pub threshold: Option<u32>,

    /// Only scan rows above this index [default: 750]
    #[arg(long, conflicts_with = "no_row_cap")]
    pub row_cap: Option<u32>,

    /// Scan every image row
    #[arg(long)]
    pub no_row_cap: bool,

    /// Widen the rotational containment test by this many pixels [default: 0]
    #[arg(long)]
    pub tolerance: Option<i32>,

    /// Sweep a full turn instead of the first 100 degrees
    #[arg(long)]
    pub full_turn: bool,

    /// Collapse each slice to its left boundary when measuring view widths
    #[arg(long)]
    pub collapse_right_spans: bool,

    /// Refuse to start from a lattice larger than this
    #[arg(long)]
    pub max_voxels: Option<u64>,

    /// View image filename suffix [default: .bmp]
    #[arg(long)]
    pub extension: Option<String>,
}

impl ParamArgs {
    /// Resolve the effective parameters.
    pub fn to_params(&self) -> Result<CarveParams> {
        let mut params = match &self.config {
            Some(path) => CarveParams::from_toml_file(path)
                .with_context(|| format!("Failed to load parameters from {:?}", path))?,
            None => CarveParams::default(),
        };

        if let Some(step) = self.step {
            params.step = step;
        }
        if let Some(angle_step) = self.angle_step {
            params.angle_step = angle_step;
        }
        if let Some(threshold) = self.threshold {
            params.threshold = threshold;
        }
        if self.no_row_cap {
            params.row_cap = None;
        } else if let Some(cap) = self.row_cap {
            params.row_cap = Some(cap);
        }
        if let Some(tolerance) = self.tolerance {
            params.tolerance = tolerance;
        }
        if self.full_turn {
            params.sweep = SweepCoverage::Full;
        }
        if self.collapse_right_spans {
            params.span_mode = SpanMode::CollapseRight;
        }
        if let Some(limit) = self.max_voxels {
            params.max_voxels = Some(limit);
        }
        if let Some(ext) = &self.extension {
            params.extension = ext.clone();
        }

        params.validate()?;
        debug!(
            config = ?self.config,
            step = params.step,
            angle_step = params.angle_step,
            threshold = params.threshold,
            row_cap = ?params.row_cap,
            tolerance = params.tolerance,
            sweep = ?params.sweep,
            span_mode = ?params.span_mode,
            "Resolved parameters"
        );
        Ok(params)
    }
}
