//! Carving orchestration.
//!
//! A run walks a fixed sequence of stages:
//!
//! ```text
//! LoadViews -> Normalize -> SelectExtremes -> BuildCloud -> ReferenceCut
//!     -> RotationalCuts -> ExtractSurface -> Reduce -> Export
//! ```
//!
//! No stage is revisited. The first failure aborts the run and is reported as
//! [`HullError::Stage`] naming the stage and, where there is one, the input
//! that caused it. Nothing is written unless every stage before export
//! succeeded.
//!
//! # Example
//!
//! ```no_run
//! use visual_hull::{run_directory, CarveParams, SilhouetteCarver, ThresholdExtractor};
//!
//! let params = CarveParams::new(4, 5.0);
//! let carver = SilhouetteCarver::new(params.clone()).unwrap();
//! let extractor = ThresholdExtractor::from_params(&params);
//!
//! let report = run_directory("scans/rock", "scans/rock/points", &params, &carver, &extractor)
//!     .unwrap();
//! println!("{} surface voxels", report.output_voxels);
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::carve::{build_cloud, estimated_voxel_count, reference_cut, rotational_cut};
use crate::config::{CarveParams, SpanMode};
use crate::error::{HullError, HullResult};
use crate::io::{list_view_files, load_view, save_model};
use crate::reduce::reduce_resolution;
use crate::silhouette::SilhouetteExtractor;
use crate::surface::extract_surface;
use crate::tracing_ext::{OperationTimer, log_cloud_stats, log_progress, log_view_stats};
use crate::types::{SilhouetteSet, VoxelCloud};

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LoadViews,
    Normalize,
    SelectExtremes,
    BuildCloud,
    ReferenceCut,
    RotationalCuts,
    ExtractSurface,
    Reduce,
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::LoadViews => "load views",
            Stage::Normalize => "normalize",
            Stage::SelectExtremes => "select extremes",
            Stage::BuildCloud => "build cloud",
            Stage::ReferenceCut => "reference cut",
            Stage::RotationalCuts => "rotational cuts",
            Stage::ExtractSurface => "extract surface",
            Stage::Reduce => "reduce",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Lattice dimensions chosen from the view set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extremes {
    /// Index of the first view with the narrowest span.
    pub reference: usize,
    /// Narrowest per-view span; the lattice's x extent.
    pub min_width: i32,
    /// Widest per-view span; the lattice's z extent.
    pub max_width: i32,
    /// Vertical extent of the lattice.
    pub y_size: i32,
    /// Span summary of every view.
    pub spans: Vec<i32>,
}

/// Pick the reference view and the lattice extents.
///
/// The per-view span is `max(right - left)` under [`SpanMode::Preserve`].
/// Under [`SpanMode::CollapseRight`] every slice's right boundary is first
/// overwritten with its left boundary and the span is `max(left)`; the views
/// are modified in place.
///
/// The vertical extent is `max(last_row - first_row) + step`, so the last
/// sampled row falls inside the lattice.
///
/// # Errors
///
/// Returns [`HullError::EmptyInput`] if there are no views or a view has no
/// slices.
pub fn select_extremes(views: &mut [SilhouetteSet], params: &CarveParams) -> HullResult<Extremes> {
    if views.is_empty() {
        return Err(HullError::empty_input("no views to carve"));
    }

    let mut spans = Vec::with_capacity(views.len());
    let mut row_extent = 0;
    for (i, view) in views.iter_mut().enumerate() {
        let span = match params.span_mode {
            SpanMode::Preserve => view.widest_span(),
            SpanMode::CollapseRight => view.collapse_right(),
        };
        let (Some(span), Some(extent)) = (span, view.row_extent()) else {
            return Err(HullError::empty_input(format!("view {} has no slices", i)));
        };
        spans.push(span);
        row_extent = row_extent.max(extent);
    }

    let mut reference = 0;
    for (i, &span) in spans.iter().enumerate() {
        if span < spans[reference] {
            reference = i;
        }
    }

    let min_width = spans[reference];
    let max_width = spans.iter().copied().max().unwrap_or(min_width);

    Ok(Extremes {
        reference,
        min_width,
        max_width,
        y_size: row_extent + params.step,
        spans,
    })
}

/// Turntable angle of the view at `index`, measured from the reference view.
///
/// `angle_step * ((index - reference) mod views)`, so a sweep that wraps past
/// the last view carves each view again at its own angle.
pub fn view_angle(angle_step: f64, index: usize, reference: usize, views: usize) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let position = (index % views + views - reference % views) % views;
    angle_step * position as f64
}

/// Summary of a carving run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CarveReport {
    /// Strategy that produced the cloud.
    pub strategy: String,
    /// Number of views carved against.
    pub views: usize,
    /// Index of the reference view.
    pub reference: usize,
    /// Lattice x extent.
    pub min_width: i32,
    /// Lattice z extent.
    pub max_width: i32,
    /// Lattice y extent.
    pub y_size: i32,
    /// Voxels in the initial lattice.
    pub initial_voxels: usize,
    /// Voxels after the reference cut.
    pub after_reference_cut: usize,
    /// Rotational cuts performed.
    pub rotational_cuts: usize,
    /// Voxels after all rotational cuts.
    pub after_rotational_cuts: usize,
    /// Surface voxels, duplicates included.
    pub surface_voxels: usize,
    /// Voxels in the exported model.
    pub output_voxels: usize,
    /// Written point cloud, if exported.
    pub xyz_path: Option<PathBuf>,
    /// Written STL, if exported.
    pub stl_path: Option<PathBuf>,
}

/// Reconstructed cloud plus its run summary.
#[derive(Debug, Clone)]
pub struct CarveOutcome {
    pub cloud: VoxelCloud,
    pub report: CarveReport,
}

/// A way of turning silhouette sets into a voxel model.
///
/// [`SilhouetteCarver`] is the only implementation.
pub trait ReconstructionStrategy {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Reconstruct a model from one silhouette set per turntable position.
    fn reconstruct(&self, views: Vec<SilhouetteSet>) -> HullResult<CarveOutcome>;
}

/// Visual-hull reconstruction by silhouette carving.
#[derive(Debug, Clone)]
pub struct SilhouetteCarver {
    params: CarveParams,
}

impl SilhouetteCarver {
    /// Create a carver.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::InvalidConfig`] if the parameters are invalid.
    pub fn new(params: CarveParams) -> HullResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Run parameters.
    pub fn params(&self) -> &CarveParams {
        &self.params
    }

    /// Carve a model from silhouette sets ordered by turntable position.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::Stage`] wrapping the first failure.
    pub fn carve(&self, views: Vec<SilhouetteSet>) -> HullResult<CarveOutcome> {
        let params = &self.params;
        let step = params.step;

        let mut views = views
            .into_iter()
            .enumerate()
            .map(|(i, view)| {
                view.normalized()
                    .map_err(|e| e.in_stage(Stage::Normalize, Some(format!("view {}", i))))
            })
            .collect::<HullResult<Vec<_>>>()?;

        let extremes = select_extremes(&mut views, params)
            .map_err(|e| e.in_stage(Stage::SelectExtremes, None))?;
        info!(
            views = views.len(),
            reference = extremes.reference,
            min_width = extremes.min_width,
            max_width = extremes.max_width,
            y_size = extremes.y_size,
            "Selected extremes"
        );

        let estimated =
            estimated_voxel_count(extremes.y_size, extremes.min_width, extremes.max_width, step);
        if let Some(limit) = params.max_voxels {
            if estimated > limit {
                return Err(HullError::CloudTooLarge {
                    voxels: estimated,
                    limit,
                }
                .in_stage(Stage::BuildCloud, None));
            }
        }

        let cloud = {
            let _timer = OperationTimer::new("build_cloud");
            build_cloud(extremes.y_size, extremes.min_width, extremes.max_width, step)
                .map_err(|e| e.in_stage(Stage::BuildCloud, None))?
        };
        let initial_voxels = cloud.len();

        let reference = &views[extremes.reference];
        let mut cloud = {
            let _timer = OperationTimer::with_voxels("reference_cut", cloud.len());
            reference_cut(cloud, reference)
        };
        let after_reference_cut = cloud.len();
        log_cloud_stats(&cloud, "after reference cut");

        let cuts = params.sweep_iterations();
        {
            let timer = OperationTimer::with_voxels("rotational_cuts", cloud.len());
            let _entered = timer.span().enter();
            for i in 0..cuts {
                let index = (extremes.reference + i) % views.len();
                let angle = view_angle(params.angle_step, index, extremes.reference, views.len());
                let result = rotational_cut(cloud, &views[index], angle, step, params.tolerance);
                debug!(
                    cut = i,
                    view = index,
                    angle,
                    offset = ?result.offset,
                    voxels = result.cloud.len(),
                    "Applied rotational cut"
                );
                cloud = result.cloud;
                log_progress("rotational_cuts", i + 1, cuts);
            }
        }
        let after_rotational_cuts = cloud.len();
        log_cloud_stats(&cloud, "after rotational cuts");

        let surface = {
            let _timer = OperationTimer::with_voxels("extract_surface", cloud.len());
            extract_surface(cloud)
        };
        let surface_voxels = surface.len();

        let reduced = reduce_resolution(surface, step);
        log_cloud_stats(&reduced, "reduced");

        let report = CarveReport {
            strategy: self.name().to_string(),
            views: views.len(),
            reference: extremes.reference,
            min_width: extremes.min_width,
            max_width: extremes.max_width,
            y_size: extremes.y_size,
            initial_voxels,
            after_reference_cut,
            rotational_cuts: cuts,
            after_rotational_cuts,
            surface_voxels,
            output_voxels: reduced.len(),
            xyz_path: None,
            stl_path: None,
        };

        Ok(CarveOutcome {
            cloud: reduced,
            report,
        })
    }
}

impl ReconstructionStrategy for SilhouetteCarver {
    fn name(&self) -> &'static str {
        "silhouette_carving"
    }

    fn reconstruct(&self, views: Vec<SilhouetteSet>) -> HullResult<CarveOutcome> {
        self.carve(views)
    }
}

/// Load every view in `dir`, reconstruct, and save `<prefix>.xyz` / `<prefix>.stl`.
///
/// # Errors
///
/// Returns [`HullError::Stage`] wrapping the first failure. A failure before
/// export leaves no output files behind.
pub fn run_directory(
    dir: impl AsRef<Path>,
    prefix: impl AsRef<Path>,
    params: &CarveParams,
    strategy: &dyn ReconstructionStrategy,
    extractor: &dyn SilhouetteExtractor,
) -> HullResult<CarveReport> {
    let dir = dir.as_ref();
    let prefix = prefix.as_ref();
    let timer = OperationTimer::new("run_directory");
    let _entered = timer.span().enter();

    info!(
        dir = %dir.display(),
        strategy = strategy.name(),
        step = params.step,
        angle_step = params.angle_step,
        "Starting reconstruction"
    );

    let files = list_view_files(dir, &params.extension)
        .map_err(|e| e.in_stage(Stage::LoadViews, None))?;

    let mut silhouettes = Vec::with_capacity(files.len());
    for path in &files {
        let view = load_view(path, &params.extension, extractor).map_err(|e| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            e.in_stage(Stage::LoadViews, name)
        })?;
        log_view_stats(&view);
        silhouettes.push(view.silhouette);
    }
    info!(views = silhouettes.len(), "Loaded views");

    let CarveOutcome { cloud, mut report } = strategy.reconstruct(silhouettes)?;

    let paths = save_model(&cloud, prefix).map_err(|e| e.in_stage(Stage::Export, None))?;
    report.xyz_path = Some(paths.xyz);
    report.stl_path = Some(paths.stl);

    info!(
        output_voxels = report.output_voxels,
        surface_voxels = report.surface_voxels,
        "Reconstruction complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{Slice, Voxel};
    use std::collections::BTreeSet;

    fn single_row(left: i32, right: i32) -> SilhouetteSet {
        SilhouetteSet::new(vec![Slice::new(0, left, right)])
    }

    /// Rotational sweep rebuilt from the carving primitives, with view `i`
    /// of the sweep turned by `angle_step * (i mod views)`.
    fn swept_voxels(views: &[SilhouetteSet], params: &CarveParams) -> usize {
        let mut views: Vec<_> = views
            .iter()
            .cloned()
            .map(|v| v.normalized().unwrap())
            .collect();
        let extremes = select_extremes(&mut views, params).unwrap();
        let cloud = build_cloud(
            extremes.y_size,
            extremes.min_width,
            extremes.max_width,
            params.step,
        )
        .unwrap();
        let mut cloud = reference_cut(cloud, &views[extremes.reference]);
        let n = views.len();
        for i in 0..params.sweep_iterations() {
            let index = (extremes.reference + i) % n;
            let angle = params.angle_step * (i % n) as f64;
            cloud = rotational_cut(cloud, &views[index], angle, params.step, params.tolerance)
                .cloud;
        }
        cloud.len()
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::LoadViews.to_string(), "load views");
        assert_eq!(Stage::RotationalCuts.to_string(), "rotational cuts");
    }

    #[test]
    fn test_select_extremes() {
        let mut views = vec![
            SilhouetteSet::new(vec![Slice::new(0, 0, 6), Slice::new(2, 1, 3)]),
            SilhouetteSet::new(vec![Slice::new(0, 0, 4), Slice::new(2, 0, 2), Slice::new(4, 0, 1)]),
            single_row(0, 4),
            single_row(0, 8),
        ];
        let extremes = select_extremes(&mut views, &CarveParams::new(2, 5.0)).unwrap();
        assert_eq!(extremes.spans, vec![6, 4, 4, 8]);
        assert_eq!(extremes.reference, 1);
        assert_eq!(extremes.min_width, 4);
        assert_eq!(extremes.max_width, 8);
        assert_eq!(extremes.y_size, 4 + 2);
        // non-destructive
        assert_eq!(views[0].slices[0], Slice::new(0, 0, 6));
    }

    #[test]
    fn test_select_extremes_collapse_right() {
        let mut views = vec![SilhouetteSet::new(vec![
            Slice::new(0, 0, 6),
            Slice::new(2, 3, 9),
        ])];
        let params = CarveParams {
            span_mode: SpanMode::CollapseRight,
            ..CarveParams::new(2, 5.0)
        };
        let extremes = select_extremes(&mut views, &params).unwrap();
        assert_eq!(extremes.spans, vec![3]);
        assert!(views[0].iter().all(|s| s.left == s.right));
    }

    #[test]
    fn test_select_extremes_empty() {
        let err = select_extremes(&mut [], &CarveParams::default()).unwrap_err();
        assert!(matches!(err, HullError::EmptyInput { .. }));
    }

    #[test]
    fn test_minimal_two_view_scenario() {
        let carver = SilhouetteCarver::new(CarveParams::new(2, 50.0)).unwrap();
        let outcome = carver
            .carve(vec![single_row(0, 4), single_row(0, 4)])
            .unwrap();
        let report = &outcome.report;

        assert_eq!(report.initial_voxels, 4);
        assert_eq!(report.after_reference_cut, 2);
        assert_eq!(report.rotational_cuts, 2);
        assert_eq!(report.after_rotational_cuts, 2);
        // each voxel is extremal once per grouping
        assert_eq!(report.surface_voxels, 6);

        let unique: BTreeSet<Voxel> = outcome.cloud.iter().copied().collect();
        assert_eq!(
            unique,
            BTreeSet::from([Voxel::new(2, 0, 0), Voxel::new(2, 0, 2)])
        );
    }

    #[test]
    fn test_view_angle_is_relative_to_reference() {
        assert_eq!(view_angle(10.0, 1, 1, 3), 0.0);
        assert_eq!(view_angle(10.0, 2, 1, 3), 10.0);
        assert_eq!(view_angle(10.0, 0, 1, 3), 20.0);
        assert_eq!(view_angle(12.5, 7, 0, 8), 87.5);
        assert_eq!(view_angle(10.0, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_sweep_wrapping_past_last_view() {
        let views = vec![
            SilhouetteSet::new(vec![
                Slice::new(0, 0, 9),
                Slice::new(1, 1, 10),
                Slice::new(2, 2, 8),
                Slice::new(3, 0, 6),
            ]),
            SilhouetteSet::new(vec![
                Slice::new(0, 0, 7),
                Slice::new(1, 0, 8),
                Slice::new(2, 1, 6),
                Slice::new(3, 2, 5),
            ]),
            SilhouetteSet::new(vec![
                Slice::new(0, 0, 12),
                Slice::new(1, 2, 11),
                Slice::new(2, 0, 9),
                Slice::new(3, 3, 8),
            ]),
        ];
        let params = CarveParams::new(1, 10.0);
        assert!(params.sweep_iterations() > views.len());

        let carver = SilhouetteCarver::new(params.clone()).unwrap();
        let report = carver.carve(views.clone()).unwrap().report;

        assert_eq!(report.reference, 1);
        assert_eq!(report.rotational_cuts, 10);
        assert_eq!(report.initial_voxels, 4 * 8 * 12);
        assert_eq!(report.after_rotational_cuts, swept_voxels(&views, &params));
        assert_eq!(report.after_rotational_cuts, 206);
    }

    #[test]
    fn test_cylinder_scenario_through_carver() {
        // Eight identical width-10 silhouettes, 12.5 degrees apart.
        let view: SilhouetteSet = (0..10).map(|row| Slice::new(row, 0, 10)).collect();
        let views = vec![view; 8];
        let params = CarveParams::new(1, 12.5);

        let carver = SilhouetteCarver::new(params.clone()).unwrap();
        let report = carver.carve(views.clone()).unwrap().report;

        assert_eq!(report.initial_voxels, 1000);
        assert_eq!(report.after_reference_cut, 900);
        assert_eq!(report.rotational_cuts, 8);
        assert_eq!(report.after_rotational_cuts, swept_voxels(&views, &params));
        assert_eq!(report.after_rotational_cuts, 690);
    }

    #[test]
    fn test_carve_normalizes_views() {
        let carver = SilhouetteCarver::new(CarveParams::new(2, 50.0)).unwrap();
        let shifted = SilhouetteSet::new(vec![Slice::new(10, 7, 11)]);
        let outcome = carver.carve(vec![shifted.clone(), shifted]).unwrap();
        assert_eq!(outcome.report.after_rotational_cuts, 2);
    }

    #[test]
    fn test_collapse_right_empties_cloud() {
        let params = CarveParams {
            span_mode: SpanMode::CollapseRight,
            ..CarveParams::new(1, 25.0)
        };
        let carver = SilhouetteCarver::new(params).unwrap();
        let view = SilhouetteSet::new(vec![
            Slice::new(0, 0, 6),
            Slice::new(1, 2, 8),
            Slice::new(2, 4, 6),
        ]);
        let outcome = carver.carve(vec![view.clone(), view]).unwrap();
        assert!(outcome.report.initial_voxels > 0);
        assert_eq!(outcome.report.after_reference_cut, 0);
        assert!(outcome.cloud.is_empty());
    }

    #[test]
    fn test_empty_view_reports_stage() {
        let carver = SilhouetteCarver::new(CarveParams::new(2, 50.0)).unwrap();
        let err = carver
            .carve(vec![single_row(0, 4), SilhouetteSet::default()])
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::EmptyInput);
        match err {
            HullError::Stage { stage, input, .. } => {
                assert_eq!(stage, Stage::Normalize);
                assert_eq!(input.as_deref(), Some("view 1"));
            }
            other => panic!("Expected stage error, got {:?}", other),
        }
    }

    #[test]
    fn test_voxel_limit() {
        let params = CarveParams {
            max_voxels: Some(3),
            ..CarveParams::new(2, 50.0)
        };
        let carver = SilhouetteCarver::new(params).unwrap();
        let err = carver
            .carve(vec![single_row(0, 4), single_row(0, 4)])
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CloudTooLarge);
        assert!(matches!(
            err,
            HullError::Stage {
                stage: Stage::BuildCloud,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(SilhouetteCarver::new(CarveParams::new(0, 5.0)).is_err());
        assert!(SilhouetteCarver::new(CarveParams::new(2, 0.0)).is_err());
    }

    #[test]
    fn test_strategy_name() {
        let carver = SilhouetteCarver::new(CarveParams::default()).unwrap();
        let strategy: &dyn ReconstructionStrategy = &carver;
        assert_eq!(strategy.name(), "silhouette_carving");
    }
}
