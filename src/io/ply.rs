//! PLY (Stanford polygon) format support.
//!
//! Faces are loaded with their full vertex lists, so quads and n-gons keep
//! the topology the edge-loop tools rely on. Meshes are saved as ASCII with
//! double precision coordinates.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex_polygons, HalfEdgeMesh, MeshIndex};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use edgeflow::io::ply;
/// use edgeflow::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    read(&mut reader).map_err(|e| match e {
        MeshError::LoadError { message, .. } => MeshError::LoadError {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Read a PLY mesh from a buffered reader.
///
/// Load errors carry an empty path; [`load`] fills it in.
pub fn read<R: BufRead, I: MeshIndex>(reader: &mut R) -> Result<HalfEdgeMesh<I>> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(reader).map_err(|e| load_error(e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| load_error(format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;
        faces.push(indices);
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    log::debug!(
        "read PLY with {} vertices and {} faces",
        vertices.len(),
        faces.len()
    );
    build_from_polygons(&vertices, &faces)
}

fn load_error(message: impl Into<String>) -> MeshError {
    MeshError::LoadError {
        path: Default::default(),
        message: message.into(),
    }
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let save_error = |e: std::io::Error| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::create(path).map_err(save_error)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer).map_err(|e| match e {
        MeshError::Io(e) => save_error(e),
        other => other,
    })?;
    writer.flush().map_err(save_error)?;
    Ok(())
}

/// Write a mesh as ASCII PLY.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex_polygons(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by edgeflow")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        write!(writer, "{}", f.len())?;
        for i in f {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD_STRIP: &str = "ply
format ascii 1.0
element vertex 6
property float x
property float y
property float z
element face 2
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
2 0 0
0 1 0
1 1 0.5
2 1 0
4 0 1 4 3
4 1 2 5 4
";

    #[test]
    fn test_read_keeps_quads() {
        let mut reader = Cursor::new(QUAD_STRIP.as_bytes());
        let mesh: HalfEdgeMesh = read(&mut reader).unwrap();

        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.face_ids().all(|f| mesh.face_degree(f) == 4));
        assert_eq!(mesh.num_edges(), 7);
    }

    #[test]
    fn test_write_then_read() {
        let mut reader = Cursor::new(QUAD_STRIP.as_bytes());
        let mut mesh: HalfEdgeMesh = read(&mut reader).unwrap();
        let moved = Point3::new(1.0, 1.0, 0.123456789012345);
        mesh.set_position(crate::mesh::VertexId::new(4), moved);

        let mut buffer = Vec::new();
        write(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("element face 2"));
        assert!(text.lines().any(|l| l.starts_with("4 ")));

        let again: HalfEdgeMesh = read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(again.num_faces(), 2);
        assert_eq!(*again.position(crate::mesh::VertexId::new(4)), moved);
    }

    #[test]
    fn test_missing_faces() {
        let text = "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        let result: Result<HalfEdgeMesh> = read(&mut Cursor::new(text.as_bytes()));
        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let mesh: HalfEdgeMesh = read(&mut Cursor::new(QUAD_STRIP.as_bytes())).unwrap();
        let path = std::env::temp_dir()
            .join("edgeflow-no-such-directory")
            .join("out.ply");

        match save(&mesh, &path) {
            Err(MeshError::SaveError { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a save error, got {:?}", other),
        }
    }
}
