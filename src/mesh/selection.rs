//! Edge and vertex selection state.

use std::collections::BTreeSet;

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Selected edges and vertices, plus the order in which vertices were picked.
///
/// Selecting an edge selects both of its vertices. The pick history keeps
/// every vertex selected through [`Selection::pick_vertex`]; vertices that
/// are deselected later stay in the history but are filtered out by
/// [`Selection::picked_vertices`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection<I: MeshIndex = u32> {
    edges: BTreeSet<EdgeId<I>>,
    vertices: BTreeSet<VertexId<I>>,
    history: Vec<VertexId<I>>,
}

impl<I: MeshIndex> Selection<I> {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self {
            edges: BTreeSet::new(),
            vertices: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    /// Select a set of edges (and their vertices).
    pub fn from_edges<T>(mesh: &HalfEdgeMesh<I>, edges: T) -> Self
    where
        T: IntoIterator<Item = EdgeId<I>>,
    {
        let mut selection = Self::new();
        for e in edges {
            selection.select_edge(mesh, e);
        }
        selection
    }

    /// Select edges given as vertex pairs.
    ///
    /// Fails if a pair is not connected by an edge.
    pub fn from_vertex_pairs(mesh: &HalfEdgeMesh<I>, pairs: &[(usize, usize)]) -> Result<Self> {
        let mut selection = Self::new();
        for &(a, b) in pairs {
            if a >= mesh.num_vertices() || b >= mesh.num_vertices() {
                return Err(MeshError::InvalidSelection(format!(
                    "vertex pair {}-{} is out of range",
                    a, b
                )));
            }
            let e = mesh
                .find_edge(VertexId::new(a), VertexId::new(b))
                .ok_or_else(|| {
                    MeshError::InvalidSelection(format!("vertices {} and {} share no edge", a, b))
                })?;
            selection.select_edge(mesh, e);
        }
        Ok(selection)
    }

    /// Pick vertices in the given order.
    pub fn from_picks<T>(picks: T) -> Self
    where
        T: IntoIterator<Item = VertexId<I>>,
    {
        let mut selection = Self::new();
        for v in picks {
            selection.pick_vertex(v);
        }
        selection
    }

    /// Select an edge and both its vertices.
    pub fn select_edge(&mut self, mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) {
        self.edges.insert(e);
        for v in mesh.edge_vertices(e) {
            self.vertices.insert(v);
        }
    }

    /// Select a vertex and append it to the pick history.
    pub fn pick_vertex(&mut self, v: VertexId<I>) {
        self.vertices.insert(v);
        self.history.push(v);
    }

    /// Deselect a vertex. It stays in the history.
    pub fn deselect_vertex(&mut self, v: VertexId<I>) {
        self.vertices.remove(&v);
    }

    /// Selected edges.
    pub fn edges(&self) -> &BTreeSet<EdgeId<I>> {
        &self.edges
    }

    /// Selected vertices.
    pub fn vertices(&self) -> &BTreeSet<VertexId<I>> {
        &self.vertices
    }

    /// Check if an edge is selected.
    pub fn is_edge_selected(&self, e: EdgeId<I>) -> bool {
        self.edges.contains(&e)
    }

    /// Pick history filtered to vertices that are still selected.
    pub fn picked_vertices(&self) -> Vec<VertexId<I>> {
        self.history
            .iter()
            .copied()
            .filter(|v| self.vertices.contains(v))
            .collect()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;
    use nalgebra::Point3;

    fn strip() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap()
    }

    #[test]
    fn test_from_vertex_pairs() {
        let mesh = strip();
        let selection = Selection::from_vertex_pairs(&mesh, &[(0, 1), (1, 2)]).unwrap();
        assert_eq!(selection.edges().len(), 2);
        assert_eq!(selection.vertices().len(), 3);

        let err = Selection::from_vertex_pairs(&mesh, &[(0, 2)]);
        assert!(matches!(err, Err(MeshError::InvalidSelection(_))));
    }

    #[test]
    fn test_picked_vertices_filters_deselected() {
        let mut selection: Selection = Selection::from_picks([5, 0, 3].map(VertexId::new));
        selection.deselect_vertex(VertexId::new(0));
        let picked: Vec<usize> = selection.picked_vertices().iter().map(|v| v.index()).collect();
        assert_eq!(picked, vec![5, 3]);
    }
}
