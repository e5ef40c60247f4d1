//! Error types for silhouette carving with rich diagnostics.
//!
//! This module provides:
//! - Machine-readable error codes for programmatic handling
//! - Context about which input and which pipeline stage failed
//! - Recovery suggestions for common issues
//! - Terminal display via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `HULL-XXXX`:
//! - `HULL-1xxx`: I/O errors (reading views, writing models)
//! - `HULL-2xxx`: Input data errors (decoding, naming, empty silhouettes)
//! - `HULL-3xxx`: Carving errors (lattice size)
//! - `HULL-4xxx`: Configuration errors
//!
//! # Example
//!
//! ```rust,ignore
//! use visual_hull::{HullError, ErrorCode};
//!
//! let err = HullError::empty_view_set("/scans/rock", ".bmp");
//! println!("Error code: {}", err.code()); // HULL-2004
//! println!("Recovery: {}", err.recovery_suggestion());
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for carving operations.
pub type HullResult<T> = Result<T, HullError>;

/// Machine-readable error codes for carving operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// HULL-1001: Failed to read the input directory
    IoRead = 1001,
    /// HULL-1002: Failed to write a model file
    IoWrite = 1002,

    // Input data errors (2xxx)
    /// HULL-2001: Image could not be decoded
    Decode = 2001,
    /// HULL-2002: Serial number in a filename is not numeric
    Parse = 2002,
    /// HULL-2003: Image contains no silhouette pixels
    EmptySilhouette = 2003,
    /// HULL-2004: No view images found
    EmptyViewSet = 2004,
    /// HULL-2005: Silhouette set has no slices
    EmptyInput = 2005,

    // Carving errors (3xxx)
    /// HULL-3001: Initial lattice exceeds the configured voxel limit
    CloudTooLarge = 3001,

    // Configuration errors (4xxx)
    /// HULL-4001: Invalid run parameters
    InvalidConfig = 4001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `HULL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "HULL-1001",
            ErrorCode::IoWrite => "HULL-1002",
            ErrorCode::Decode => "HULL-2001",
            ErrorCode::Parse => "HULL-2002",
            ErrorCode::EmptySilhouette => "HULL-2003",
            ErrorCode::EmptyViewSet => "HULL-2004",
            ErrorCode::EmptyInput => "HULL-2005",
            ErrorCode::CloudTooLarge => "HULL-3001",
            ErrorCode::InvalidConfig => "HULL-4001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for carving errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Check the input images or directory.
    CheckInput { checks: Vec<String> },
    /// Re-capture or re-export the images.
    ReexportImages { format: Option<String> },
    /// Adjust run parameters.
    AdjustParameters { parameters: Vec<(String, String)> },
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::CheckInput { checks } => {
                write!(f, "Check the input for: {}", checks.join(", "))
            }
            RecoverySuggestion::ReexportImages { format } => {
                if let Some(fmt) = format {
                    write!(f, "Try re-exporting the images as {}", fmt)
                } else {
                    write!(f, "Try re-exporting the images")
                }
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
        }
    }
}

/// Location information for carving errors.
#[derive(Debug, Clone)]
pub enum ErrorLocation {
    /// Error tied to an input or output file.
    File { path: PathBuf },
    /// Error raised inside a pipeline stage.
    Stage { stage: Stage, input: Option<String> },
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::File { path } => write!(f, "{}", path.display()),
            ErrorLocation::Stage { stage, input } => match input {
                Some(input) => write!(f, "stage {} ({})", stage, input),
                None => write!(f, "stage {}", stage),
            },
        }
    }
}

/// Errors that can occur while loading views, carving and exporting.
#[derive(Debug, Error, Diagnostic)]
pub enum HullError {
    /// Error reading the input directory.
    #[error("failed to read views from {path}")]
    #[diagnostic(
        code(hull::io::read),
        help("Check that the directory exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a model file.
    #[error("failed to write model to {path}")]
    #[diagnostic(
        code(hull::io::write),
        help("Check that the output directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image could not be decoded.
    #[error("failed to decode image {path}")]
    #[diagnostic(
        code(hull::input::decode),
        help("The file may be corrupted or not a raster image. Try re-exporting it as BMP.")
    )]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Serial number embedded in a filename is not numeric.
    #[error("invalid serial number in {path}: {details}")]
    #[diagnostic(
        code(hull::input::parse),
        help("View files must end with a 3-digit serial number, e.g. `rock_007.bmp`")
    )]
    Parse { path: PathBuf, details: String },

    /// Image yielded no silhouette slices.
    #[error("no silhouette found in {path} (no pixel above intensity {threshold})")]
    #[diagnostic(
        code(hull::input::empty_silhouette),
        help("Check the lighting and background, or lower the intensity threshold")
    )]
    EmptySilhouette { path: PathBuf, threshold: u32 },

    /// No input files match the naming pattern.
    #[error("no view images ending in {extension:?} found in {path}")]
    #[diagnostic(
        code(hull::input::empty_view_set),
        help("Check the input directory and the file extension setting")
    )]
    EmptyViewSet { path: PathBuf, extension: String },

    /// Silhouette set has no slices.
    #[error("silhouette set is empty: {details}")]
    #[diagnostic(
        code(hull::input::empty),
        help("Every view must contain at least one silhouette slice")
    )]
    EmptyInput { details: String },

    /// Initial voxel lattice is larger than allowed.
    #[error("initial lattice of {voxels} voxels exceeds the limit of {limit}")]
    #[diagnostic(
        code(hull::carve::too_large),
        help("Increase the step size or raise the voxel limit")
    )]
    CloudTooLarge { voxels: u64, limit: u64 },

    /// Invalid run parameters.
    #[error("invalid configuration: {details}")]
    #[diagnostic(code(hull::config::invalid))]
    InvalidConfig { details: String },

    /// A pipeline stage failed.
    #[error("{stage} failed{}", describe_input(.input))]
    #[diagnostic(code(hull::pipeline::stage))]
    Stage {
        stage: Stage,
        input: Option<String>,
        #[source]
        source: Box<HullError>,
    },
}

impl HullError {
    /// Returns the machine-readable error code.
    ///
    /// Stage failures report the code of the underlying error.
    pub fn code(&self) -> ErrorCode {
        match self {
            HullError::IoRead { .. } => ErrorCode::IoRead,
            HullError::IoWrite { .. } => ErrorCode::IoWrite,
            HullError::Decode { .. } => ErrorCode::Decode,
            HullError::Parse { .. } => ErrorCode::Parse,
            HullError::EmptySilhouette { .. } => ErrorCode::EmptySilhouette,
            HullError::EmptyViewSet { .. } => ErrorCode::EmptyViewSet,
            HullError::EmptyInput { .. } => ErrorCode::EmptyInput,
            HullError::CloudTooLarge { .. } => ErrorCode::CloudTooLarge,
            HullError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            HullError::Stage { source, .. } => source.code(),
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            HullError::IoRead { .. } => RecoverySuggestion::CheckInput {
                checks: vec!["directory exists".into(), "read permissions".into()],
            },
            HullError::IoWrite { .. } => RecoverySuggestion::CheckInput {
                checks: vec!["output directory exists".into(), "write permissions".into()],
            },
            HullError::Decode { .. } => RecoverySuggestion::ReexportImages {
                format: Some("BMP".into()),
            },
            HullError::Parse { .. } => RecoverySuggestion::CheckInput {
                checks: vec!["3-digit serial before the extension".into()],
            },
            HullError::EmptySilhouette { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("threshold".into(), "try a lower value".into())],
            },
            HullError::EmptyViewSet { .. } => RecoverySuggestion::CheckInput {
                checks: vec!["input directory".into(), "file extension".into()],
            },
            HullError::EmptyInput { .. } => RecoverySuggestion::CheckInput {
                checks: vec!["silhouette extraction output".into()],
            },
            HullError::CloudTooLarge { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("step".into(), "try a larger value".into()),
                    ("max_voxels".into(), "try a higher limit".into()),
                ],
            },
            HullError::InvalidConfig { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("step / angle_step".into(), "must be positive".into())],
            },
            HullError::Stage { source, .. } => source.recovery_suggestion(),
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            HullError::IoRead { path, .. }
            | HullError::IoWrite { path, .. }
            | HullError::Decode { path, .. }
            | HullError::Parse { path, .. }
            | HullError::EmptySilhouette { path, .. }
            | HullError::EmptyViewSet { path, .. } => {
                Some(ErrorLocation::File { path: path.clone() })
            }
            HullError::Stage { stage, input, .. } => Some(ErrorLocation::Stage {
                stage: *stage,
                input: input.clone(),
            }),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through stage wrappers.
    pub fn root_cause(&self) -> &HullError {
        match self {
            HullError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Wrap this error with the pipeline stage (and optional input) it came from.
    pub fn in_stage(self, stage: Stage, input: Option<String>) -> Self {
        HullError::Stage {
            stage,
            input,
            source: Box::new(self),
        }
    }

    // Constructor helpers for common error patterns

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HullError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HullError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a Parse error.
    pub fn parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        HullError::Parse {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an EmptyViewSet error.
    pub fn empty_view_set(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        HullError::EmptyViewSet {
            path: path.into(),
            extension: extension.into(),
        }
    }

    /// Create an EmptyInput error.
    pub fn empty_input(details: impl Into<String>) -> Self {
        HullError::EmptyInput {
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        HullError::InvalidConfig {
            details: details.into(),
        }
    }
}

fn describe_input(input: &Option<String>) -> String {
    input
        .as_ref()
        .map(|i| format!(" for {}", i))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = HullError::empty_view_set("/scans", ".bmp");
        assert_eq!(err.code(), ErrorCode::EmptyViewSet);
        assert_eq!(err.code().as_str(), "HULL-2004");
    }

    #[test]
    fn test_stage_reports_inner_code() {
        let err = HullError::parse("/scans/rock_x1.bmp", "not a number")
            .in_stage(Stage::LoadViews, Some("rock_x1.bmp".into()));
        assert_eq!(err.code(), ErrorCode::Parse);
        assert!(matches!(err.root_cause(), HullError::Parse { .. }));

        match err.location() {
            Some(ErrorLocation::Stage { stage, input }) => {
                assert_eq!(stage, Stage::LoadViews);
                assert_eq!(input.as_deref(), Some("rock_x1.bmp"));
            }
            _ => panic!("Expected Stage location"),
        }
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = HullError::CloudTooLarge {
            voxels: 10,
            limit: 5,
        };
        match err.recovery_suggestion() {
            RecoverySuggestion::AdjustParameters { parameters } => {
                assert!(parameters.iter().any(|(k, _)| k == "step"));
            }
            _ => panic!("Expected AdjustParameters suggestion"),
        }
    }

    #[test]
    fn test_stage_error_suggests_inner_recovery() {
        let inner = HullError::parse("/scans/rock_x1.bmp", "not a number");
        let expected = inner.recovery_suggestion();
        let err = inner.in_stage(Stage::LoadViews, Some("rock_x1.bmp".into()));

        assert_eq!(err.recovery_suggestion(), expected);
        assert_eq!(
            err.recovery_suggestion().to_string(),
            "Check the input for: 3-digit serial before the extension"
        );
    }

    #[test]
    fn test_error_display() {
        let err = HullError::empty_input("view 3")
            .in_stage(Stage::Normalize, Some("view 3".into()));
        let display = format!("{}", err);
        assert!(display.contains("normalize"));
        assert!(display.contains("view 3"));
    }
}
