//! Run parameters for silhouette carving.
//!
//! Parameters are fixed for the lifetime of a run. They can be built in code,
//! or loaded from TOML / JSON:
//!
//! ```toml
//! step = 4
//! angle_step = 5.0
//! threshold = 90
//! row_cap = 750
//! sweep = "partial"
//! span_mode = "preserve"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HullError, HullResult};

/// Degrees covered by the default rotational sweep.
pub const PARTIAL_SWEEP_DEGREES: f64 = 100.0;

/// Degrees covered by a full-turn sweep.
pub const FULL_SWEEP_DEGREES: f64 = 360.0;

/// How many rotational cuts the orchestrator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepCoverage {
    /// `100 / angle_step` cuts, the established behaviour.
    #[default]
    Partial,
    /// `360 / angle_step` cuts.
    Full,
}

impl SweepCoverage {
    /// Degrees covered by this sweep.
    pub fn degrees(self) -> f64 {
        match self {
            SweepCoverage::Partial => PARTIAL_SWEEP_DEGREES,
            SweepCoverage::Full => FULL_SWEEP_DEGREES,
        }
    }
}

/// How the per-view widest span is computed when selecting extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanMode {
    /// `max(right - left)`, leaving the silhouette untouched.
    #[default]
    Preserve,
    /// Destructive selector: reading a view's width writes `right = left`
    /// into every slice and the span is `max(left)`. The views stay
    /// collapsed afterwards, so every cut comes out empty.
    CollapseRight,
}

/// Parameters for a carving run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveParams {
    /// Pixel sampling stride, also the voxel edge length.
    pub step: i32,

    /// Degrees of turntable rotation between consecutive images.
    pub angle_step: f64,

    /// A pixel is silhouette when `r + g + b` exceeds this value.
    pub threshold: u32,

    /// Only rows above this limit are scanned. `None` scans the whole image.
    pub row_cap: Option<u32>,

    /// Widening of the rotational containment test, in pixels. 0 is strict.
    pub tolerance: i32,

    /// Rotational sweep coverage.
    pub sweep: SweepCoverage,

    /// Span summary used by extreme selection.
    pub span_mode: SpanMode,

    /// Refuse to build an initial lattice larger than this many voxels.
    pub max_voxels: Option<u64>,

    /// Filename suffix of view images, including the dot.
    pub extension: String,
}

impl Default for CarveParams {
    fn default() -> Self {
        Self {
            step: 4,
            angle_step: 5.0,
            threshold: 90,
            row_cap: Some(750),
            tolerance: 0,
            sweep: SweepCoverage::Partial,
            span_mode: SpanMode::Preserve,
            max_voxels: None,
            extension: ".bmp".to_string(),
        }
    }
}

impl CarveParams {
    /// Default parameters with the given step and angle step.
    pub fn new(step: i32, angle_step: f64) -> Self {
        Self {
            step,
            angle_step,
            ..Self::default()
        }
    }

    /// Parameters that sweep a full turn instead of the partial sweep.
    pub fn full_turn(step: i32, angle_step: f64) -> Self {
        Self {
            sweep: SweepCoverage::Full,
            ..Self::new(step, angle_step)
        }
    }

    /// Number of rotational cuts to perform.
    pub fn sweep_iterations(&self) -> usize {
        (self.sweep.degrees() / self.angle_step).floor() as usize
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> HullResult<()> {
        if self.step <= 0 {
            return Err(HullError::invalid_config(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if !self.angle_step.is_finite() || self.angle_step <= 0.0 {
            return Err(HullError::invalid_config(format!(
                "angle_step must be a positive number, got {}",
                self.angle_step
            )));
        }
        if self.tolerance < 0 {
            return Err(HullError::invalid_config(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }
        if self.extension.is_empty() {
            return Err(HullError::invalid_config("extension must not be empty"));
        }
        Ok(())
    }

    /// Load parameters from a TOML string. Missing keys take default values.
    pub fn from_toml(toml_str: &str) -> HullResult<Self> {
        toml::from_str(toml_str).map_err(|e| HullError::invalid_config(e.to_string()))
    }

    /// Load parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> HullResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| HullError::io_read(path, e))?;
        Self::from_toml(&contents)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load parameters from a JSON string.
    pub fn from_json(json_str: &str) -> HullResult<Self> {
        serde_json::from_str(json_str).map_err(|e| HullError::invalid_config(e.to_string()))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
