//! Half-edge mesh data structure for polygon meshes.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite
//!   directions. Half-edges are allocated in pairs, so the twin of half-edge
//!   `h` is `h ^ 1` and its edge is `h / 2`.
//! - A half-edge that belongs to a face is a **corner** of that face: its
//!   origin is the corner vertex and it runs to the next vertex of the face.
//! - Faces may have any number of sides (triangles, quads, n-gons).
//!
//! # Corner navigation
//!
//! Edge-loop walking is expressed in terms of corners: [`HalfEdgeMesh::next`]
//! and [`HalfEdgeMesh::prev`] move around a face, [`HalfEdgeMesh::radial`]
//! jumps to the corner of the same edge in the neighbouring face (and
//! returns `None` on a boundary edge).
//!
//! # Boundary handling
//!
//! Boundary half-edges have an invalid face ID and are linked into boundary
//! cycles through `next`/`prev`, so walking around a vertex with
//! `next(twin(h))` visits every incident edge exactly once.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The next half-edge around the face (or boundary cycle).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (or boundary cycle).
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to. Invalid for boundary half-edges.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new uninitialized half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A polygonal face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One corner of this face.
    pub halfedge: HalfEdgeId<I>,

    /// Number of vertices (and corners) of the face.
    pub degree: usize,
}

/// A half-edge mesh for arbitrary polygon meshes.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Quad-dominant meshes have roughly two edges per face.
        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_faces * 4 + num_faces / 2),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of full edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
    }

    // ==================== Corner navigation ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        he.twin()
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// The corner of the same edge in the neighbouring face.
    ///
    /// Returns `None` when the edge is a boundary edge.
    #[inline]
    pub fn radial(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        let twin = he.twin();
        if self.is_boundary_halfedge(twin) {
            None
        } else {
            Some(twin)
        }
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(he.twin())
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Number of sides of the face a corner belongs to (0 for boundary half-edges).
    #[inline]
    pub fn corner_degree(&self, he: HalfEdgeId<I>) -> usize {
        let f = self.face_of(he);
        if f.is_valid() {
            self.face(f).degree
        } else {
            0
        }
    }

    /// Number of sides of a face.
    #[inline]
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face(f).degree
    }

    /// Check if a half-edge is on the boundary (has no face).
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    // ==================== Edges ====================

    /// The two vertices of an edge.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let [h0, h1] = e.halfedges();
        [self.origin(h0), self.origin(h1)]
    }

    /// The vertex of `e` that is not `v`.
    #[inline]
    pub fn other_vertex(&self, e: EdgeId<I>, v: VertexId<I>) -> VertexId<I> {
        let [a, b] = self.edge_vertices(e);
        if a == v {
            b
        } else {
            a
        }
    }

    /// Check if an edge touches the given vertex.
    #[inline]
    pub fn edge_has_vertex(&self, e: EdgeId<I>, v: VertexId<I>) -> bool {
        let [a, b] = self.edge_vertices(e);
        a == v || b == v
    }

    /// Check if an edge is on the boundary (has fewer than two faces).
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        let [h0, h1] = e.halfedges();
        self.is_boundary_halfedge(h0) || self.is_boundary_halfedge(h1)
    }

    /// The face corners of an edge (one for boundary edges, two otherwise).
    pub fn edge_corners(&self, e: EdgeId<I>) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        e.halfedges()
            .into_iter()
            .filter(move |&he| !self.is_boundary_halfedge(he))
    }

    /// The corner of `e` that originates at `v`, if that side has a face.
    pub fn corner_from(&self, e: EdgeId<I>, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.edge_corners(e).find(|&he| self.origin(he) == v)
    }

    /// Find the edge connecting two vertices.
    pub fn find_edge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<EdgeId<I>> {
        self.vertex_halfedges(a)
            .find(|&he| self.dest(he) == b)
            .map(|he| he.edge())
    }

    /// Length of an edge.
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        let [a, b] = self.edge_vertices(e);
        (self.position(b) - self.position(a)).norm()
    }

    // ==================== Vertices ====================

    /// Number of edges incident to a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Check if a vertex is on the boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        !start.is_valid() || self.vertex_halfedges(v).any(|he| self.is_boundary_halfedge(he))
    }

    /// Iterate over outgoing half-edges around a vertex.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over the edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| he.edge())
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over the face corners located at a vertex.
    pub fn vertex_corners(&self, v: VertexId<I>) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.vertex_halfedges(v)
            .filter(|&he| !self.is_boundary_halfedge(he))
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.num_edges()).map(EdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over the corners of a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over the vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Iterate over the edges of a face.
    pub fn face_edges(&self, f: FaceId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.face_halfedges(f).map(|he| he.edge())
    }

    // ==================== Geometry ====================

    /// Face normal using Newell's method (valid for non-planar polygons).
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        for he in self.face_halfedges(f) {
            let p = self.position(self.origin(he));
            let q = self.position(self.dest(he));
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Average of the normals of the faces around a vertex.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for he in self.vertex_corners(v) {
            normal += self.face_normal(self.face_of(he));
        }
        normal
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = first.position;
        let mut max = first.position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.halfedge(v.halfedge).origin.index() != i {
                return false;
            }
        }

        for (i, he) in self.halfedges.iter().enumerate() {
            let id = HalfEdgeId::new(i);
            if !he.next.is_valid() || !he.prev.is_valid() {
                return false;
            }
            if self.halfedge(he.next).prev != id || self.halfedge(he.prev).next != id {
                return false;
            }
            if self.dest(id) != self.halfedge(he.next).origin {
                return false;
            }
        }

        self.faces
            .iter()
            .all(|f| f.halfedge.is_valid() && f.degree >= 3)
    }
}

/// Iterator over outgoing half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // twin(he) arrives at v, the half-edge after it leaves v again.
        self.current = self.mesh.next(self.current.twin());

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over the corners of a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
