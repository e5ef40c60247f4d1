//! Visual-hull reconstruction from turntable silhouettes.
//!
//! This crate rebuilds a voxel model of a physical object from a series of
//! images taken while the object turns on a turntable in front of a fixed
//! camera. Each image contributes a silhouette; the model is the set of voxels
//! whose projection falls inside every silhouette (shape from silhouette).
//!
//! # Features
//!
//! - **Silhouette extraction**: intensity-threshold scan of decoded images
//! - **Carving**: dense lattice, reference cut, rotational cuts around the
//!   vertical axis
//! - **Surface extraction**: extremal voxels along every axis-aligned line
//! - **Export**: `.xyz` point cloud and ASCII `.stl` voxel cubes
//!
//! # Units and Coordinates
//!
//! Everything is measured in image pixels:
//! - Y: image row, the turntable axis
//! - X: image column of the reference view
//! - Z: depth
//!
//! The sampling step is also the voxel edge length. Exported coordinates are
//! divided by `ceil(step / 2)`.
//!
//! # Quick Start
//!
//! ```no_run
//! use visual_hull::{CarveParams, SilhouetteCarver, ThresholdExtractor, run_directory};
//!
//! let params = CarveParams::new(4, 5.0);
//! let carver = SilhouetteCarver::new(params.clone()).unwrap();
//! let extractor = ThresholdExtractor::from_params(&params);
//!
//! let report = run_directory("scans/rock", "scans/rock/points", &params, &carver, &extractor)
//!     .unwrap();
//! println!("wrote {:?}", report.stl_path);
//! ```
//!
//! # Carving Silhouettes Directly
//!
//! ```
//! use visual_hull::{CarveParams, SilhouetteCarver, SilhouetteSet, Slice};
//!
//! let view = SilhouetteSet::new(vec![Slice::new(0, 0, 4)]);
//! let carver = SilhouetteCarver::new(CarveParams::new(2, 50.0)).unwrap();
//! let outcome = carver.carve(vec![view.clone(), view]).unwrap();
//! assert!(!outcome.cloud.is_empty());
//! ```
//!
//! # Performance
//!
//! The initial lattice holds `y_size * min_width * max_width / step^3`
//! voxels. Set [`CarveParams::max_voxels`] to refuse oversized runs.

mod error;
mod pipeline;
pub mod tracing_ext;
mod types;

pub mod carve;
pub mod config;
pub mod io;
pub mod reduce;
pub mod silhouette;
pub mod surface;

// Re-export core types at crate root
pub use error::{ErrorCode, ErrorLocation, HullError, HullResult, RecoverySuggestion};
pub use types::{SilhouetteSet, Slice, View, Voxel, VoxelCloud};

pub use carve::{RotationalCut, build_cloud, reference_cut, rotational_cut};
pub use config::{CarveParams, SpanMode, SweepCoverage};
pub use io::{ModelPaths, list_view_files, load_view, parse_serial, save_model};
pub use pipeline::{
    CarveOutcome, CarveReport, Extremes, ReconstructionStrategy, SilhouetteCarver, Stage,
    run_directory, select_extremes, view_angle,
};
pub use reduce::reduce_resolution;
pub use silhouette::{SilhouetteExtractor, ThresholdExtractor};
pub use surface::extract_surface;
