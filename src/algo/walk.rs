//! Topology walking: growing an ordered edge chain from a single edge.
//!
//! Three walks are supported, chosen once per start edge by [`classify`]:
//!
//! - **Quad loop**: step straight across valence-4 vertices.
//! - **N-gon fan**: follow the corners of an adjacent n-gon while the
//!   vertices along it have fewer than four edges.
//! - **Boundary**: collect connected boundary edges and order them.
//!
//! All walks accept an optional set of allowed edges. A direction stops as
//! soon as it would step onto an edge outside the set.

use std::collections::{BTreeSet, VecDeque};

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Which walk a start edge is followed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkKind {
    /// Around the rim of an adjacent n-gon.
    NgonFan,
    /// Along the mesh boundary.
    Boundary,
    /// Straight through regular quad topology.
    QuadLoop,
}

/// Local topology class of a vertex, by edge count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexValence {
    /// Corner of an open patch.
    Two,
    /// Regular boundary vertex, or a pole with three edges.
    Three,
    /// Regular interior quad vertex.
    Four,
    /// Any other valence.
    Other(usize),
}

impl VertexValence {
    /// Classify an edge count.
    pub fn from_count(count: usize) -> Self {
        match count {
            2 => VertexValence::Two,
            3 => VertexValence::Three,
            4 => VertexValence::Four,
            n => VertexValence::Other(n),
        }
    }

    /// Classify a mesh vertex.
    pub fn of<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        Self::from_count(mesh.valence(v))
    }
}

/// The vertex that continues the line `from -> v` on the other side of `v`.
///
/// At a valence-4 vertex this is the topologically opposite neighbour.
/// Elsewhere (and when the quad step hits a boundary) it is the neighbour
/// whose direction is most anti-parallel to `from`, provided the cosine is
/// below `-0.5`. Returns `None` when no neighbour qualifies.
pub fn continuation<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    from: VertexId<I>,
) -> Option<VertexId<I>> {
    match VertexValence::of(mesh, v) {
        VertexValence::Four => opposite_across(mesh, v, from)
            .or_else(|| straightest_neighbour(mesh, v, from)),
        VertexValence::Two | VertexValence::Three | VertexValence::Other(_) => {
            straightest_neighbour(mesh, v, from)
        }
    }
}

/// Step across a valence-4 vertex through its face corners.
fn opposite_across<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    from: VertexId<I>,
) -> Option<VertexId<I>> {
    let e = mesh.find_edge(v, from)?;

    if let Some(corner) = mesh.corner_from(e, v) {
        let across = mesh.radial(mesh.prev(corner))?;
        return Some(mesh.origin(mesh.prev(across)));
    }

    let corner = mesh.corner_from(e, from)?;
    let across = mesh.radial(mesh.next(corner))?;
    Some(mesh.dest(mesh.next(across)))
}

fn straightest_neighbour<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    from: VertexId<I>,
) -> Option<VertexId<I>> {
    let center = mesh.position(v);
    let incoming = (mesh.position(from) - center).try_normalize(f64::EPSILON)?;

    mesh.vertex_neighbors(v)
        .filter(|&n| n != from)
        .filter_map(|n| {
            let dir = (mesh.position(n) - center).try_normalize(f64::EPSILON)?;
            Some((n, dir.dot(&incoming)))
        })
        .filter(|&(_, cos)| cos < -0.5)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
}

/// Decide which walk to use for a start edge.
pub fn classify<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, start: EdgeId<I>) -> WalkKind {
    let is_ngon = mesh.edge_corners(start).any(|c| mesh.corner_degree(c) > 4);

    let [a, b] = mesh.edge_vertices(start);
    let va = mesh.valence(a);
    let vb = mesh.valence(b);
    let quad_flow = va == 4 && vb == 4;
    let loop_end = (va > 4 && vb == 4) || (va == 4 && vb > 4);

    if is_ngon && !quad_flow && !loop_end {
        WalkKind::NgonFan
    } else if mesh.is_boundary_edge(start) {
        WalkKind::Boundary
    } else {
        WalkKind::QuadLoop
    }
}

/// Walk from `start` and return the ordered edge chain containing it.
///
/// # Errors
///
/// Returns [`MeshError::UnsupportedTopology`] when the boundary edges
/// reachable from `start` cannot be ordered into a single chain.
pub fn walk<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    start: EdgeId<I>,
    allowed: Option<&BTreeSet<EdgeId<I>>>,
) -> Result<Vec<EdgeId<I>>> {
    let kind = classify(mesh, start);
    log::debug!("walking {:?} as {:?}", start, kind);

    let is_allowed = |e: EdgeId<I>| allowed.map_or(true, |set| set.contains(&e));

    match kind {
        WalkKind::NgonFan => Ok(walk_ngon(mesh, start, is_allowed)),
        WalkKind::Boundary => walk_boundary(mesh, start, is_allowed),
        WalkKind::QuadLoop => Ok(walk_quad_loop(mesh, start, is_allowed)),
    }
}

fn walk_quad_loop<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    start: EdgeId<I>,
    is_allowed: impl Fn(EdgeId<I>) -> bool,
) -> Vec<EdgeId<I>> {
    let mut chain = VecDeque::from([start]);
    let mut seen = BTreeSet::from([start]);

    for (side, corner) in mesh.edge_corners(start).enumerate() {
        let start_valence = mesh.valence(mesh.origin(corner));
        if start_valence > 4 {
            continue;
        }

        let mut l = corner;
        while mesh.valence(mesh.origin(l)) == 4 && start_valence == 4 {
            let across = match mesh.radial(mesh.prev(l)) {
                Some(across) => across,
                None => break,
            };
            l = mesh.prev(across);

            let e = l.edge();
            if !is_allowed(e) || !seen.insert(e) {
                break;
            }
            if side == 0 {
                chain.push_back(e);
            } else {
                chain.push_front(e);
            }
        }
    }

    chain.into()
}

fn walk_ngon<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    start: EdgeId<I>,
    is_allowed: impl Fn(EdgeId<I>) -> bool,
) -> Vec<EdgeId<I>> {
    let mut chain = VecDeque::from([start]);
    let mut seen = BTreeSet::from([start]);

    // The corner in the largest adjacent n-gon; the first one wins a tie.
    let mut best: Option<HalfEdgeId<I>> = None;
    for c in mesh.edge_corners(start) {
        let degree = mesh.corner_degree(c);
        if degree > 4 && best.map_or(true, |b| degree > mesh.corner_degree(b)) {
            best = Some(c);
        }
    }
    let start_corner = match best {
        Some(c) => c,
        None => return chain.into(),
    };

    let mut l = mesh.next(start_corner);
    while mesh.valence(mesh.origin(l)) < 4 {
        let e = l.edge();
        if !is_allowed(e) || !seen.insert(e) {
            break;
        }
        chain.push_back(e);
        l = mesh.next(l);
    }

    let mut l = mesh.prev(start_corner);
    while mesh.valence(mesh.dest(l)) < 4 {
        let e = l.edge();
        if !is_allowed(e) || !seen.insert(e) {
            break;
        }
        chain.push_front(e);
        l = mesh.prev(l);
    }

    chain.into()
}

fn walk_boundary<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    start: EdgeId<I>,
    is_allowed: impl Fn(EdgeId<I>) -> bool,
) -> Result<Vec<EdgeId<I>>> {
    // Collect connected boundary edges. Valence-2 vertices block the search.
    let mut collected = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(candidate) = queue.pop_front() {
        for v in mesh.edge_vertices(candidate) {
            if mesh.valence(v) <= 2 {
                continue;
            }
            for e in mesh.vertex_edges(v) {
                if mesh.is_boundary_edge(e) && is_allowed(e) && collected.insert(e) {
                    queue.push_back(e);
                }
            }
        }
    }

    let total = collected.len();
    let mut remaining = collected;
    remaining.remove(&start);

    let mut chain = VecDeque::from([start]);
    for (side, mut p) in mesh.edge_vertices(start).into_iter().enumerate() {
        while let Some(e) = remaining
            .iter()
            .copied()
            .find(|&e| mesh.edge_has_vertex(e, p))
        {
            remaining.remove(&e);
            p = mesh.other_vertex(e, p);
            if side == 0 {
                chain.push_back(e);
            } else {
                chain.push_front(e);
            }
        }
    }

    if chain.len() != total {
        log::warn!(
            "boundary at {:?} branches: ordered {} of {} edges",
            start,
            chain.len(),
            total
        );
        return Err(MeshError::UnsupportedTopology(format!(
            "boundary edges around {:?} do not form a single chain",
            start
        )));
    }

    Ok(chain.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;
    use crate::mesh::build_from_quads;
    use nalgebra::Point3;

    /// `n` x `n` quads on the unit grid; vertex (i, j) has index j * (n + 1) + i.
    fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                faces.push([v00, v00 + 1, v00 + n + 2, v00 + n + 1]);
            }
        }
        build_from_quads(&vertices, &faces).unwrap()
    }

    /// Open cylinder: `segments` around, `rings` quads tall.
    fn create_cylinder(segments: usize, rings: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..=rings {
            for i in 0..segments {
                let angle = i as f64 / segments as f64 * std::f64::consts::TAU;
                vertices.push(Point3::new(angle.cos(), angle.sin(), j as f64));
            }
        }
        let mut faces = Vec::new();
        for j in 0..rings {
            for i in 0..segments {
                let a = j * segments + i;
                let b = j * segments + (i + 1) % segments;
                faces.push([a, b, b + segments, a + segments]);
            }
        }
        build_from_quads(&vertices, &faces).unwrap()
    }

    fn edge(mesh: &HalfEdgeMesh, a: usize, b: usize) -> EdgeId {
        mesh.find_edge(VertexId::new(a), VertexId::new(b)).unwrap()
    }

    fn chain_vertices(mesh: &HalfEdgeMesh, edges: &[EdgeId]) -> BTreeSet<usize> {
        edges
            .iter()
            .flat_map(|&e| mesh.edge_vertices(e))
            .map(|v| v.index())
            .collect()
    }

    #[test]
    fn test_classify() {
        let mesh = create_grid_mesh(4);
        assert_eq!(classify(&mesh, edge(&mesh, 6, 7)), WalkKind::QuadLoop);
        assert_eq!(classify(&mesh, edge(&mesh, 1, 2)), WalkKind::Boundary);
    }

    #[test]
    fn test_quad_loop_stops_at_boundary() {
        // Interior row y = 2 of a 4x4 grid.
        let mesh = create_grid_mesh(4);
        let start = edge(&mesh, 11, 12);
        let chain = walk(&mesh, start, None).unwrap();

        // Walks through the valence-4 vertices 11..=13 and stops at the
        // valence-3 boundary vertices 10 and 14.
        assert_eq!(chain.len(), 4);
        assert_eq!(
            chain_vertices(&mesh, &chain),
            BTreeSet::from([10, 11, 12, 13, 14])
        );
        let distinct: BTreeSet<_> = chain.iter().collect();
        assert_eq!(distinct.len(), chain.len());
    }

    #[test]
    fn test_quad_loop_is_ordered() {
        let mesh = create_grid_mesh(4);
        let chain = walk(&mesh, edge(&mesh, 12, 13), None).unwrap();
        for w in chain.windows(2) {
            let [a, b] = mesh.edge_vertices(w[0]);
            assert!(mesh.edge_has_vertex(w[1], a) || mesh.edge_has_vertex(w[1], b));
        }
    }

    #[test]
    fn test_allowed_truncates() {
        let mesh = create_grid_mesh(4);
        let allowed = BTreeSet::from([edge(&mesh, 11, 12), edge(&mesh, 12, 13)]);
        let chain = walk(&mesh, edge(&mesh, 12, 13), Some(&allowed)).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain_vertices(&mesh, &chain), BTreeSet::from([11, 12, 13]));
    }

    #[test]
    fn test_cylinder_ring_is_cyclic() {
        let mesh = create_cylinder(6, 2);
        // Middle ring: vertices 6..12, all valence 4.
        let chain = walk(&mesh, edge(&mesh, 6, 7), None).unwrap();
        assert_eq!(chain.len(), 6);
        assert_eq!(
            chain_vertices(&mesh, &chain),
            (6..12).collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_boundary_walk() {
        let mesh = create_grid_mesh(3);
        // Bottom side: 0-1-2-3. Corners 0 and 3 have valence 2.
        let chain = walk(&mesh, edge(&mesh, 1, 2), None).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain_vertices(&mesh, &chain), BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn test_boundary_rim_of_cylinder() {
        let mesh = create_cylinder(5, 1);
        let chain = walk(&mesh, edge(&mesh, 0, 1), None).unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain_vertices(&mesh, &chain), (0..5).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_ngon_fan() {
        // A hexagon bordered by one quad on its bottom edge.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.5, 0.8, 0.0),
            Point3::new(1.0, 1.6, 0.0),
            Point3::new(0.0, 1.6, 0.0),
            Point3::new(-0.5, 0.8, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3, 4, 5], vec![6, 7, 1, 0]];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        let start = edge(&mesh, 2, 3);
        assert_eq!(classify(&mesh, start), WalkKind::NgonFan);

        // All hexagon vertices have fewer than four edges: the whole rim.
        let chain = walk(&mesh, start, None).unwrap();
        assert_eq!(chain.len(), 6);
        for w in chain.windows(2) {
            let [a, b] = mesh.edge_vertices(w[0]);
            assert!(mesh.edge_has_vertex(w[1], a) || mesh.edge_has_vertex(w[1], b));
        }
    }

    #[test]
    fn test_vertex_valence_classes() {
        let mesh = create_grid_mesh(2);
        assert_eq!(VertexValence::of(&mesh, VertexId::new(0)), VertexValence::Two);
        assert_eq!(VertexValence::of(&mesh, VertexId::new(1)), VertexValence::Three);
        assert_eq!(VertexValence::of(&mesh, VertexId::new(4)), VertexValence::Four);
        assert_eq!(VertexValence::from_count(6), VertexValence::Other(6));
    }

    #[test]
    fn test_continuation() {
        let mesh = create_grid_mesh(3);
        // Across interior vertex 5 from 4 lands on 6.
        let next = continuation(&mesh, VertexId::new(5), VertexId::new(4)).unwrap();
        assert_eq!(next.index(), 6);
        // Along the boundary through valence-3 vertex 1.
        let next = continuation(&mesh, VertexId::new(1), VertexId::new(0)).unwrap();
        assert_eq!(next.index(), 2);
        // A corner has no straight continuation.
        assert!(continuation(&mesh, VertexId::new(0), VertexId::new(1)).is_none());
    }
}
