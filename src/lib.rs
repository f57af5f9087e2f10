//! # Edgeflow
//!
//! Edge-loop extraction and curvature fitting for polygon meshes.
//!
//! Edgeflow walks ordered edge loops out of an edge selection, finds the
//! rings of edges crossing them, and reshapes the loops so they follow the
//! curvature of the surrounding surface. Picked vertices can be bent onto
//! arcs and splines along the shortest path that joins them.
//!
//! ## Features
//!
//! - **Half-edge data structure**: polygon faces, O(1) corner navigation, type-safe indices
//! - **Loop operators**: flow, whole-loop curve, linear, straighten and ring curve
//! - **Vertex curves**: half circles, three-point arcs and Hermite splines
//! - **Edit sessions**: re-apply with new parameters or a mix factor without drift
//! - **PLY I/O**: quads and n-gons are kept as-is
//!
//! ## Quick Start
//!
//! ```no_run
//! use edgeflow::prelude::*;
//!
//! let mut mesh: HalfEdgeMesh = edgeflow::io::load("model.ply").unwrap();
//! let selection = Selection::from_vertex_pairs(&mesh, &[(10, 11), (11, 12), (12, 13)]).unwrap();
//!
//! let mut session = EdgeSession::begin(&mesh, &selection).unwrap();
//! let report = session
//!     .apply(&mut mesh, &EdgeOperation::Flow(FlowOptions::default()), 1.0)
//!     .unwrap();
//! println!("skipped {} elements", report.skipped);
//!
//! edgeflow::io::save(&mesh, "output.ply").unwrap();
//! ```
//!
//! ## Straightening a Loop
//!
//! ```
//! use edgeflow::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.3),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 4, 3], [1, 2, 5, 4]];
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//!
//! let selection = Selection::from_vertex_pairs(&mesh, &[(0, 1), (1, 2)]).unwrap();
//! let loops = build_loops(&mesh, selection.edges()).unwrap();
//! loops.apply_linear(&mut mesh, &LinearOptions::default());
//!
//! assert!(mesh.position(VertexId::new(1)).z.abs() < 1e-12);
//! ```
//!
//! ## Curves Through Picked Vertices
//!
//! ```
//! use edgeflow::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(2.0, 0.0, 0.0),
//! #     Point3::new(0.0, 1.0, 0.0),
//! #     Point3::new(1.0, 1.0, 0.0),
//! #     Point3::new(2.0, 1.0, 0.0),
//! # ];
//! # let mut mesh: HalfEdgeMesh =
//! #     build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
//! let selection = Selection::from_picks([VertexId::new(0), VertexId::new(2)]);
//! let options = VertexCurveOptions::default();
//!
//! let mut session = VertexCurveSession::begin(&mesh, &selection, &options).unwrap();
//! session.apply(&mut mesh, &options, 1.0).unwrap();
//!
//! // The middle vertex is lifted onto a half circle over the chord.
//! assert!((mesh.position(VertexId::new(1)).z - 1.0).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

pub use error::{MeshError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use edgeflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::edgeloop::{
        build_loops, Blend, BlendType, CurveOptions, EdgeLoop, FitReport, FlowOptions,
        LinearOptions, LoopSet, Rails,
    };
    pub use crate::algo::path::DistanceMode;
    pub use crate::algo::session::{EdgeOperation, EdgeSession, VertexCurveSession};
    pub use crate::algo::vertex_curve::{VertexChain, VertexCurveOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, to_face_vertex_polygons, EdgeId, FaceId,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, Selection, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_cube_of_quads() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 3, 2, 1], // bottom
            [4, 5, 6, 7], // top
            [0, 1, 5, 4], // front
            [1, 2, 6, 5], // right
            [2, 3, 7, 6], // back
            [3, 0, 4, 7], // left
        ];

        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_edges(), 12);
        assert_eq!(mesh.num_halfedges(), 24);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
            assert_eq!(mesh.valence(v), 3);
        }
    }

    #[test]
    fn test_loop_around_cylinder_is_cyclic() {
        // Open cylinder: 3 rings of 4 vertices, the middle ring has valence 4
        let segments = 4;
        let mut vertices = Vec::new();
        for r in 0..3 {
            for s in 0..segments {
                let angle = s as f64 / segments as f64 * std::f64::consts::TAU;
                vertices.push(Point3::new(angle.cos(), angle.sin(), r as f64));
            }
        }
        let mut faces = Vec::new();
        for r in 0..2 {
            for s in 0..segments {
                let s1 = (s + 1) % segments;
                faces.push([
                    r * segments + s,
                    r * segments + s1,
                    (r + 1) * segments + s1,
                    (r + 1) * segments + s,
                ]);
            }
        }
        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();

        let selection =
            Selection::from_vertex_pairs(&mesh, &[(4, 5), (5, 6), (6, 7), (7, 4)]).unwrap();
        let loops = build_loops(&mesh, selection.edges()).unwrap();

        assert_eq!(loops.len(), 1);
        let edge_loop = &loops.loops()[0];
        assert!(edge_loop.is_cyclic());
        assert_eq!(edge_loop.len(), 4);
        assert_eq!(edge_loop.verts().len(), 4);
    }
}
