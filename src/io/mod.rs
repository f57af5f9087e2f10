//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | PLY | `.ply` | ✓ | ✓ | Polygon faces kept as-is, ASCII output |
//!
//! # Usage
//!
//! ```no_run
//! use edgeflow::io::{load, save};
//! use edgeflow::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("model.ply").unwrap();
//! save(&mesh, "output.ply").unwrap();
//! ```

pub mod ply;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file, choosing the format by extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Ply => ply::load(path),
    }
}

/// Save a mesh to a file, choosing the format by extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Ply => ply::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_extension("PLY"), Some(Format::Ply));
        assert_eq!(Format::from_path("a/b/mesh.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("mesh.obj"), None);
        assert_eq!(Format::from_path("mesh"), None);
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let result: Result<HalfEdgeMesh> = load("mesh.stl");
        assert!(matches!(
            result,
            Err(MeshError::UnsupportedFormat { extension }) if extension == "stl"
        ));

        let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
        assert!(matches!(
            save(&mesh, "mesh"),
            Err(MeshError::UnsupportedFormat { .. })
        ));
    }
}
