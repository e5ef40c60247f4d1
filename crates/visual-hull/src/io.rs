//! View loading and model export.
//!
//! # Input
//!
//! A directory of images, one per turntable position. A file is a view when
//! its name ends with the configured extension (default `.bmp`); the three
//! characters right before the extension are its serial number, e.g.
//! `stone_017.bmp` has serial 17. Views are ordered by filename.
//!
//! # Output
//!
//! Two files sharing a path prefix:
//! - `<prefix>.xyz`: one `X Y Z` line per voxel
//! - `<prefix>.stl`: ASCII STL, one unit cube (12 facets) per voxel

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::error::{HullError, HullResult};
use crate::silhouette::SilhouetteExtractor;
use crate::tracing_ext::log_io_operation;
use crate::types::{View, VoxelCloud};

/// Number of characters in a view serial number.
pub const SERIAL_DIGITS: usize = 3;

/// Parse the serial number preceding `extension` in a view filename.
///
/// # Errors
///
/// Returns [`HullError::Parse`] if the name is too short or the serial is not
/// a number.
pub fn parse_serial(path: &Path, extension: &str) -> HullResult<u32> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| HullError::parse(path, "filename is not valid UTF-8"))?;

    let stem = name
        .strip_suffix(extension)
        .ok_or_else(|| HullError::parse(path, format!("name does not end with {}", extension)))?;

    let start = stem
        .char_indices()
        .rev()
        .nth(SERIAL_DIGITS - 1)
        .map(|(i, _)| i)
        .ok_or_else(|| {
            HullError::parse(
                path,
                format!("name needs {} serial characters", SERIAL_DIGITS),
            )
        })?;

    let serial = &stem[start..];
    serial
        .parse()
        .map_err(|_| HullError::parse(path, format!("{:?} is not a number", serial)))
}

/// List view images in `dir`, sorted by filename.
///
/// # Errors
///
/// - [`HullError::IoRead`] if the directory cannot be read
/// - [`HullError::EmptyViewSet`] if no file ends with `extension`
pub fn list_view_files(dir: &Path, extension: &str) -> HullResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| HullError::io_read(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HullError::io_read(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(HullError::empty_view_set(dir, extension));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(count = files.len(), dir = %dir.display(), "Found view images");
    Ok(files)
}

/// Decode one image and extract its silhouette.
///
/// # Errors
///
/// - [`HullError::Parse`] for a bad serial number
/// - [`HullError::Decode`] if the image cannot be decoded
/// - [`HullError::EmptySilhouette`] if no pixel passes the threshold
pub fn load_view(
    path: &Path,
    extension: &str,
    extractor: &dyn SilhouetteExtractor,
) -> HullResult<View> {
    let serial = parse_serial(path, extension)?;

    let image = image::open(path)
        .map_err(|e| HullError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8();

    let silhouette = extractor.extract(&image);
    if silhouette.is_empty() {
        return Err(HullError::EmptySilhouette {
            path: path.to_path_buf(),
            threshold: extractor.threshold(),
        });
    }

    Ok(View {
        path: path.to_path_buf(),
        serial,
        silhouette,
    })
}

/// Append `.ext` to a path prefix without replacing any existing extension.
pub fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Write the cloud as ASCII `X Y Z` lines.
pub fn write_xyz<W: Write>(cloud: &VoxelCloud, writer: &mut W) -> std::io::Result<()> {
    for v in cloud {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    Ok(())
}

/// Corner offsets of the 12 triangles drawn around each voxel.
const CUBE_FACETS: [[[i32; 3]; 3]; 12] = [
    [[-1, -1, -1], [1, 1, -1], [1, -1, -1]],
    [[1, 1, 1], [1, -1, -1], [1, 1, -1]],
    [[1, 1, 1], [1, 1, -1], [-1, 1, 1]],
    [[1, -1, 1], [1, -1, -1], [1, 1, 1]],
    [[1, -1, 1], [1, 1, 1], [-1, 1, 1]],
    [[1, -1, 1], [-1, -1, -1], [1, -1, -1]],
    [[-1, -1, 1], [-1, 1, 1], [-1, -1, -1]],
    [[-1, -1, 1], [-1, -1, -1], [1, -1, 1]],
    [[-1, -1, 1], [1, -1, 1], [-1, 1, 1]],
    [[-1, 1, -1], [-1, -1, -1], [-1, 1, 1]],
    [[-1, 1, -1], [-1, 1, 1], [1, 1, -1]],
    [[-1, 1, -1], [1, 1, -1], [-1, -1, -1]],
];

/// Write the cloud as ASCII STL with one independent cube per voxel.
///
/// Facet normals are written as `0 0 0`; readers recompute them.
pub fn write_stl<W: Write>(cloud: &VoxelCloud, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "solid model")?;
    for v in cloud {
        let centre = v.position();
        for facet in &CUBE_FACETS {
            writeln!(writer, "  facet normal 0 0 0")?;
            writeln!(writer, "    outer loop")?;
            for corner in facet {
                let p = centre + Vector3::from(*corner);
                writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
            }
            writeln!(writer, "    endloop")?;
            writeln!(writer, "  endfacet")?;
        }
    }
    writeln!(writer, "endsolid model")?;
    Ok(())
}

fn render(cloud: &VoxelCloud, f: fn(&VoxelCloud, &mut Vec<u8>) -> std::io::Result<()>) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = f(cloud, &mut buf);
    buf
}

fn write_file(path: &Path, bytes: &[u8]) -> HullResult<()> {
    let file = File::create(path).map_err(|e| HullError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| HullError::io_write(path, e))
}

/// Paths of an exported model.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelPaths {
    pub xyz: PathBuf,
    pub stl: PathBuf,
}

/// Save `<prefix>.xyz` and `<prefix>.stl`.
///
/// Both files are rendered before anything is written. If the second write
/// fails the first file is removed again.
///
/// # Errors
///
/// Returns [`HullError::IoWrite`] if either file cannot be written.
pub fn save_model(cloud: &VoxelCloud, prefix: &Path) -> HullResult<ModelPaths> {
    let paths = ModelPaths {
        xyz: with_suffix(prefix, "xyz"),
        stl: with_suffix(prefix, "stl"),
    };

    let xyz = render(cloud, |c, w| write_xyz(c, w));
    let stl = render(cloud, |c, w| write_stl(c, w));

    write_file(&paths.xyz, &xyz)?;
    log_io_operation("save_xyz", &paths.xyz, Some("xyz"), true);

    if let Err(e) = write_file(&paths.stl, &stl) {
        log_io_operation("save_stl", &paths.stl, Some("stl"), false);
        let _ = std::fs::remove_file(&paths.xyz);
        return Err(e);
    }
    log_io_operation("save_stl", &paths.stl, Some("stl"), true);

    info!(
        voxels = cloud.len(),
        xyz = %paths.xyz.display(),
        stl = %paths.stl.display(),
        "Saved model"
    );
    Ok(paths)
}
