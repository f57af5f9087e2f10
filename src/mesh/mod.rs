//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation used by the
//! edge-loop tools, together with the selection state they operate on.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], a polygon mesh stored as a
//! half-edge (doubly-connected edge list) arena. Faces can have any number
//! of sides. Every half-edge with a face is a face corner, and corners are
//! navigated with `next`, `prev` and `radial`.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge (face corner)
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies a full edge
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use edgeflow::mesh::{HalfEdgeMesh, build_from_quads};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2, 3]];
//!
//! let mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//! ```

mod builder;
mod halfedge;
mod index;
mod selection;

pub use builder::{build_from_polygons, build_from_quads, to_face_vertex_polygons};
pub use halfedge::{
    Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter,
};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use selection::Selection;
