//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists as found in
//! mesh file formats. Faces may have any number of sides.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygon faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of faces, each a counter-clockwise list of vertex indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid or non-manifold.
///
/// # Example
/// ```
/// use edgeflow::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_edges(), 4);
/// ```
pub fn build_from_polygons<I: MeshIndex, F: AsRef<[usize]>>(
    vertices: &[Point3<f64>],
    faces: &[F],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    validate_faces(vertices.len(), faces)?;

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Undirected edge (min, max) -> half-edge running from min to max
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();

    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        let face_id = FaceId::<I>::new(mesh.num_faces());

        let mut corners = Vec::with_capacity(n);
        for k in 0..n {
            let a = face[k];
            let b = face[(k + 1) % n];
            let key = (a.min(b), a.max(b));

            let forward = match edge_map.get(&key) {
                Some(&he) => he,
                None => {
                    let he = HalfEdgeId::<I>::new(mesh.num_halfedges());
                    let mut h0 = HalfEdge::new();
                    h0.origin = vertex_ids[key.0];
                    let mut h1 = HalfEdge::new();
                    h1.origin = vertex_ids[key.1];
                    mesh.halfedges.push(h0);
                    mesh.halfedges.push(h1);
                    edge_map.insert(key, he);
                    he
                }
            };

            let corner = if a == key.0 { forward } else { forward.twin() };
            if !mesh.is_boundary_halfedge(corner) {
                // Directed edge already owned by another face.
                return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
            }
            mesh.halfedge_mut(corner).face = face_id;
            corners.push(corner);
        }

        for k in 0..n {
            let he = corners[k];
            let next = corners[(k + 1) % n];
            let prev = corners[(k + n - 1) % n];
            let h = mesh.halfedge_mut(he);
            h.next = next;
            h.prev = prev;
            mesh.vertex_mut(vertex_ids[face[k]]).halfedge = he;
        }

        mesh.faces.push(Face {
            halfedge: corners[0],
            degree: n,
        });
    }

    link_boundary_loops(&mut mesh)?;
    fix_boundary_vertex_halfedges(&mut mesh);

    log::debug!(
        "built mesh: {} vertices, {} edges, {} faces",
        mesh.num_vertices(),
        mesh.num_edges(),
        mesh.num_faces()
    );

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and quad faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of quad faces, each as [v0, v1, v2, v3] indices (counter-clockwise)
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

fn validate_faces<F: AsRef<[usize]>>(num_vertices: usize, faces: &[F]) -> Result<()> {
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for &vi in face {
            if vi >= num_vertices {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        for (k, &vi) in face.iter().enumerate() {
            if face[k + 1..].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }
    Ok(())
}

/// Link boundary half-edges into cycles.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = (0..mesh.num_halfedges())
        .map(HalfEdgeId::new)
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::new();
    for &he in &boundary_hes {
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} has more than one boundary fan", origin),
            });
        }
    }

    for &he in &boundary_hes {
        let dest = mesh.dest(he).index();
        if let Some(&next_he) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }

    Ok(())
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for vid in mesh.vertex_ids().collect::<Vec<_>>() {
        if let Some(he) = mesh
            .vertex_halfedges(vid)
            .find(|&he| mesh.is_boundary_halfedge(he))
        {
            mesh.vertex_mut(vid).halfedge = he;
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns (vertices, faces) tuple with one index list per face.
pub fn to_face_vertex_polygons<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (vertices, faces)
}
