//! Tracing extensions for carving runs.
//!
//! Structured logging and timing for the pipeline. Targets:
//!
//! - `visual_hull::timing`: stage durations ([`OperationTimer`])
//! - `visual_hull::cloud_state`: voxel counts and extents between stages
//! - `visual_hull::views`: per-view silhouette summaries
//! - `visual_hull::io`: file reads and writes
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=visual_hull=debug for per-cut output
//! ```
//!
//! # Log Levels
//!
//! - **INFO**: run summaries, stage timing, saved files
//! - **DEBUG**: voxel counts after each cut, centering offsets
//! - **TRACE**: per-view silhouette detail

use std::time::Instant;
use tracing::{Span, debug, info, trace, warn};

use crate::types::{View, VoxelCloud};

/// A timer that logs its duration on drop.
///
/// ```rust,ignore
/// use visual_hull::tracing_ext::OperationTimer;
///
/// fn expensive_stage() {
///     let _timer = OperationTimer::new("rotational_cuts");
///     // ...
/// } // logs elapsed_ms here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start a timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("hull_operation", operation = name);
        debug!(target: "visual_hull::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Start a timer that also records the input voxel count.
    pub fn with_voxels(name: &'static str, voxels: usize) -> Self {
        let span = tracing::info_span!("hull_operation", operation = name, voxels);
        debug!(
            target: "visual_hull::timing",
            operation = name,
            voxels,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Span for the operation. Enter it to nest the operation's events.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "visual_hull::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log voxel count and lattice extents of a cloud.
pub fn log_cloud_stats(cloud: &VoxelCloud, context: &str) {
    match cloud.bounds() {
        Some((min, max)) => {
            let dims = max - min;
            debug!(
                target: "visual_hull::cloud_state",
                context,
                voxels = cloud.len(),
                dimensions = format!("{} x {} x {}", dims.x, dims.y, dims.z),
                "Cloud state"
            );
        }
        None => {
            warn!(
                target: "visual_hull::cloud_state",
                context,
                "Cloud is empty"
            );
        }
    }
}

/// Log the silhouette summary of a loaded view.
pub fn log_view_stats(view: &View) {
    let silhouette = &view.silhouette;
    trace!(
        target: "visual_hull::views",
        serial = view.serial,
        path = %view.path.display(),
        slices = silhouette.len(),
        first_row = silhouette.first_row().unwrap_or_default(),
        last_row = silhouette.last_row().unwrap_or_default(),
        widest_span = silhouette.widest_span().unwrap_or_default(),
        "View loaded"
    );
}

/// Log a file I/O operation.
pub fn log_io_operation(
    operation: &str,
    path: &std::path::Path,
    format: Option<&str>,
    success: bool,
) {
    if success {
        info!(
            target: "visual_hull::io",
            operation,
            path = path.display().to_string(),
            format = format.unwrap_or("auto"),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "visual_hull::io",
            operation,
            path = path.display().to_string(),
            format = format.unwrap_or("auto"),
            "I/O operation failed"
        );
    }
}

/// Log sweep progress.
pub fn log_progress(operation: &str, current: usize, total: usize) {
    let percent = if total > 0 {
        (current as f64 / total as f64 * 100.0) as u32
    } else {
        0
    };

    debug!(
        target: "visual_hull::progress",
        operation,
        current,
        total,
        percent,
        "Progress update"
    );
}
