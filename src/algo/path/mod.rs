//! Shortest paths along mesh edges.
//!
//! The vertex-curve tool connects consecutive picked vertices with the
//! shortest edge path between them. Distances are measured either as
//! Euclidean edge length or as hop count.
//!
//! # Example
//!
//! ```
//! use edgeflow::prelude::*;
//! use edgeflow::algo::path::{find_path, DistanceMode, PathOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//!
//! let options = PathOptions::default()
//!     .with_mode(DistanceMode::Topology)
//!     .with_target(2);
//! let result = find_path(&mesh, VertexId::new(0), &options);
//! assert_eq!(result.distance(VertexId::new(2)), 2.0);
//! assert_eq!(result.path_to(VertexId::new(2)).unwrap().len(), 3);
//! ```

mod dijkstra;

pub use dijkstra::{find_path, DistanceMode, PathOptions};

use crate::mesh::{EdgeId, MeshIndex, VertexId};

/// Result of a shortest-path query.
///
/// Holds the distance to every vertex settled by the search and the edge
/// (and neighbour) through which each vertex was reached.
#[derive(Debug, Clone)]
pub struct PathResult<I: MeshIndex = u32> {
    /// Distance from the source to each vertex.
    /// `f64::INFINITY` if the vertex was not reached.
    distances: Vec<f64>,

    /// Edge and previous vertex on each vertex's shortest path.
    predecessors: Vec<Option<(EdgeId<I>, VertexId<I>)>>,

    source: VertexId<I>,
}

impl<I: MeshIndex> PathResult<I> {
    pub(crate) fn new(
        distances: Vec<f64>,
        predecessors: Vec<Option<(EdgeId<I>, VertexId<I>)>>,
        source: VertexId<I>,
    ) -> Self {
        Self {
            distances,
            predecessors,
            source,
        }
    }

    /// The source vertex of the query.
    #[inline]
    pub fn source(&self) -> VertexId<I> {
        self.source
    }

    /// Get the distance to a vertex.
    ///
    /// Returns `f64::INFINITY` if the vertex was not reached.
    #[inline]
    pub fn distance(&self, v: VertexId<I>) -> f64 {
        self.distances[v.index()]
    }

    /// Check if a vertex was reached.
    #[inline]
    pub fn is_reachable(&self, v: VertexId<I>) -> bool {
        self.distances[v.index()].is_finite()
    }

    /// Reconstruct the edges of the shortest path from the source to `target`.
    ///
    /// Returns `None` if the target was not reached. The path to the source
    /// itself is empty.
    pub fn edges_to(&self, target: VertexId<I>) -> Option<Vec<EdgeId<I>>> {
        let mut edges: Vec<EdgeId<I>> = self.walk_back(target)?.map(|(e, _)| e).collect();
        edges.reverse();
        Some(edges)
    }

    /// Reconstruct the vertices of the shortest path, source and target included.
    pub fn path_to(&self, target: VertexId<I>) -> Option<Vec<VertexId<I>>> {
        let mut path = vec![target];
        path.extend(self.walk_back(target)?.map(|(_, v)| v));
        path.reverse();
        Some(path)
    }

    fn walk_back(
        &self,
        target: VertexId<I>,
    ) -> Option<impl Iterator<Item = (EdgeId<I>, VertexId<I>)> + '_> {
        if !self.is_reachable(target) {
            return None;
        }
        let mut current = target;
        // Bounded by vertex count in case of a corrupted predecessor table.
        Some(
            std::iter::from_fn(move || {
                let step = self.predecessors[current.index()]?;
                current = step.1;
                Some(step)
            })
            .take(self.distances.len()),
        )
    }
}
