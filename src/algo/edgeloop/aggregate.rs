//! Grouping selected edges into loops and linking them across edge rings.

use std::collections::{BTreeSet, VecDeque};

use nalgebra::Point3;

use super::{CurveOptions, EdgeLoop, FitReport, FlowOptions, LinearOptions};
use crate::algo::interpolate::hermite_3d;
use crate::algo::walk::walk;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// One selected edge of a ring, seen through a face corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCorner<I: MeshIndex = u32> {
    /// Corner on the ring edge.
    pub corner: HalfEdgeId<I>,
    /// Endpoint on the ring's "A" side. All entries of a ring agree on
    /// which side is A.
    pub side_a: VertexId<I>,
}

impl<I: MeshIndex> RingCorner<I> {
    /// The ring edge.
    pub fn edge(&self) -> EdgeId<I> {
        self.corner.edge()
    }

    /// Endpoint on the "B" side.
    pub fn side_b(&self, mesh: &HalfEdgeMesh<I>) -> VertexId<I> {
        mesh.other_vertex(self.edge(), self.side_a)
    }
}

/// A chain of selected edges lying across consecutive quads.
#[derive(Debug, Clone)]
pub struct EdgeRing<I: MeshIndex = u32> {
    corners: Vec<RingCorner<I>>,
    ends: Vec<HalfEdgeId<I>>,
    cyclic: bool,
}

impl<I: MeshIndex> EdgeRing<I> {
    /// Ring entries, ordered across the ring.
    pub fn corners(&self) -> &[RingCorner<I>] {
        &self.corners
    }

    /// Corners where the ring terminates: the first unselected edge or a
    /// boundary edge on each side. Two ends come in ring order, the end
    /// past the last entry first.
    pub fn ends(&self) -> &[HalfEdgeId<I>] {
        &self.ends
    }

    /// Check if the ring wraps around onto itself.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// Check if the ring has no entries.
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

/// The loops built from one selection, with ring bookkeeping.
///
/// Loops are ordered by descending [`EdgeLoop::max_valence`], so the loops
/// crossed by the most other loops are processed first.
#[derive(Debug, Clone)]
pub struct LoopSet<I: MeshIndex = u32> {
    loops: Vec<EdgeLoop<I>>,
    /// (loop, position) of each mesh edge, indexed by edge index.
    slots: Vec<Option<(usize, usize)>>,
    rings: Vec<EdgeRing<I>>,
}

/// Partition a set of selected edges into loops.
///
/// Edges are taken in index order; each one not yet claimed starts a walk
/// restricted to the unclaimed edges. The loops are then linked across
/// their edge rings and ranked by valence.
///
/// # Errors
///
/// - [`MeshError::InvalidSelection`] if `edges` is empty or names an edge
///   outside the mesh.
/// - [`MeshError::UnsupportedTopology`] if a selected boundary branches.
pub fn build_loops<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    edges: &BTreeSet<EdgeId<I>>,
) -> Result<LoopSet<I>> {
    if edges.is_empty() {
        return Err(MeshError::InvalidSelection("no edges selected".into()));
    }
    if let Some(bad) = edges.iter().find(|e| e.index() >= mesh.num_edges()) {
        return Err(MeshError::InvalidSelection(format!(
            "{:?} is not an edge of the mesh",
            bad
        )));
    }

    let mut remaining = edges.clone();
    let mut loops = Vec::new();
    while let Some(start) = remaining.pop_first() {
        let chain = walk(mesh, start, Some(&remaining))?;
        for e in &chain {
            remaining.remove(e);
        }
        loops.push(EdgeLoop::new(mesh, chain)?);
    }

    let mut set = LoopSet {
        loops,
        slots: Vec::new(),
        rings: Vec::new(),
    };
    set.index_slots(mesh.num_edges());
    set.find_ring_neighbours(mesh, edges);
    set.find_rings(mesh, edges);
    set.compute_valences();

    // Stable: equal valences keep their discovery order.
    set.loops.sort_by(|a, b| b.max_valence.cmp(&a.max_valence));
    set.index_slots(mesh.num_edges());

    log::debug!(
        "built {} loops and {} rings from {} edges",
        set.loops.len(),
        set.rings.len(),
        edges.len()
    );
    Ok(set)
}

impl<I: MeshIndex> LoopSet<I> {
    fn index_slots(&mut self, num_edges: usize) {
        self.slots = vec![None; num_edges];
        for (li, edge_loop) in self.loops.iter().enumerate() {
            for (pos, e) in edge_loop.edges.iter().enumerate() {
                self.slots[e.index()] = Some((li, pos));
            }
        }
    }

    fn slot(&self, e: EdgeId<I>) -> Option<(usize, usize)> {
        self.slots.get(e.index()).copied().flatten()
    }

    /// Selected edges across the quads on either side of each loop edge.
    fn find_ring_neighbours(&mut self, mesh: &HalfEdgeMesh<I>, selected: &BTreeSet<EdgeId<I>>) {
        for edge_loop in &mut self.loops {
            for (pos, &e) in edge_loop.edges.iter().enumerate() {
                let mut neighbours = Vec::with_capacity(2);
                for corner in mesh.edge_corners(e) {
                    if mesh.corner_degree(corner) != 4 {
                        continue;
                    }
                    let opposite = mesh.next(mesh.next(corner)).edge();
                    if selected.contains(&opposite) && !neighbours.contains(&opposite) {
                        neighbours.push(opposite);
                    }
                }
                edge_loop.ring_neighbours[pos] = neighbours;
            }
        }
    }

    fn find_rings(&mut self, mesh: &HalfEdgeMesh<I>, selected: &BTreeSet<EdgeId<I>>) {
        for li in 0..self.loops.len() {
            for pos in 0..self.loops[li].edges.len() {
                if self.loops[li].rings[pos].is_some() {
                    continue;
                }
                let e = self.loops[li].edges[pos];
                let ring = match trace_ring(mesh, e, selected) {
                    Some(ring) => ring,
                    None => continue,
                };

                let index = self.rings.len();
                for entry in &ring.corners {
                    if let Some((l, p)) = self.slot(entry.edge()) {
                        self.loops[l].rings[p] = Some(index);
                    }
                }
                self.rings.push(ring);
            }
        }
    }

    fn compute_valences(&mut self) {
        let valences: Vec<Vec<usize>> = self
            .loops
            .iter()
            .enumerate()
            .map(|(li, edge_loop)| {
                edge_loop
                    .edges
                    .iter()
                    .map(|&e| self.reachable_loops(e, li))
                    .collect()
            })
            .collect();

        for (edge_loop, valences) in self.loops.iter_mut().zip(valences) {
            edge_loop.max_valence = valences.iter().copied().max().unwrap_or(0);
            edge_loop.valences = valences;
        }
    }

    /// Count the loops other than `own` reached by flooding ring neighbours from `start`.
    fn reachable_loops(&self, start: EdgeId<I>, own: usize) -> usize {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut found = BTreeSet::new();

        while let Some(e) = queue.pop_front() {
            let (li, pos) = match self.slot(e) {
                Some(slot) => slot,
                None => continue,
            };
            if li != own {
                found.insert(li);
            }
            for &n in &self.loops[li].ring_neighbours[pos] {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        found.len()
    }

    // ==================== Queries ====================

    /// The loops, highest valence first.
    pub fn loops(&self) -> &[EdgeLoop<I>] {
        &self.loops
    }

    /// Number of loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Check if there are no loops.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// All edge rings.
    pub fn rings(&self) -> &[EdgeRing<I>] {
        &self.rings
    }

    /// The loop containing `edge`.
    pub fn loop_of(&self, edge: EdgeId<I>) -> Option<&EdgeLoop<I>> {
        self.slot(edge).map(|(li, _)| &self.loops[li])
    }

    /// The ring crossing `edge`.
    pub fn ring(&self, edge: EdgeId<I>) -> Option<&EdgeRing<I>> {
        let (li, pos) = self.slot(edge)?;
        self.loops[li].rings[pos].map(|r| &self.rings[r])
    }

    /// Termination corners of the ring crossing `edge`.
    pub fn ring_ends(&self, edge: EdgeId<I>) -> Option<&[HalfEdgeId<I>]> {
        self.ring(edge).map(EdgeRing::ends)
    }

    /// Every vertex on any loop, sorted.
    pub fn affected_vertices(&self) -> Vec<VertexId<I>> {
        let set: BTreeSet<VertexId<I>> = self
            .loops
            .iter()
            .flat_map(|l| l.verts.iter().copied())
            .collect();
        set.into_iter().collect()
    }

    /// Restore every loop vertex to its position when the set was built.
    pub fn revert(&self, mesh: &mut HalfEdgeMesh<I>) {
        for edge_loop in &self.loops {
            edge_loop.revert(mesh);
        }
    }

    // ==================== Operators ====================

    /// Run [`EdgeLoop::set_flow`] over all loops, then blend their ends.
    pub fn apply_flow(&self, mesh: &mut HalfEdgeMesh<I>, options: &FlowOptions) -> FitReport {
        let mut report = FitReport::default();
        let min_angle = options.min_angle.to_radians();

        for _ in 0..options.iterations.max(1) {
            for edge_loop in &self.loops {
                report.merge(edge_loop.set_flow(mesh, options.tension, min_angle));
            }
        }
        for edge_loop in &self.loops {
            edge_loop.blend_start_end(mesh, &options.blend);
        }

        report
    }

    /// Run [`EdgeLoop::set_curve_flow`] over all loops, then blend their ends.
    pub fn apply_curve(&self, mesh: &mut HalfEdgeMesh<I>, options: &CurveOptions) -> FitReport {
        let mut report = FitReport::default();
        for edge_loop in &self.loops {
            report.merge(edge_loop.set_curve_flow(mesh, options.tension, options.rails));
            edge_loop.blend_start_end(mesh, &options.blend);
        }
        report
    }

    /// Run [`EdgeLoop::set_linear`] over all loops.
    pub fn apply_linear(&self, mesh: &mut HalfEdgeMesh<I>, options: &LinearOptions) -> FitReport {
        let mut report = FitReport::default();
        for edge_loop in &self.loops {
            report.merge(edge_loop.set_linear(mesh, options.space_evenly));
        }
        report
    }

    /// Run [`EdgeLoop::straighten`] over all single-edge loops.
    pub fn apply_straighten(&self, mesh: &mut HalfEdgeMesh<I>, distance: f64) -> FitReport {
        let mut report = FitReport::default();
        for edge_loop in self.loops.iter().filter(|l| l.len() == 1) {
            report.merge(edge_loop.straighten(mesh, distance));
        }
        report
    }

    /// Refit the selected edges of every ring on two Hermite rails.
    ///
    /// Each rail runs along one side of the ring, through the vertices of
    /// the two end edges and one more vertex beyond each end. Entry `i` of
    /// `count` is placed at `µ = (i + 1) / (count + 1)` on both rails.
    /// Rings without two interior ends are skipped.
    pub fn set_ring_curve(&self, mesh: &mut HalfEdgeMesh<I>, tension: f64) -> FitReport {
        let mut report = FitReport::default();

        for (index, ring) in self.rings.iter().enumerate() {
            let (a, b) = match ring.ends.as_slice() {
                [a, b] => (*a, *b),
                _ => {
                    report.skip(format!("ring {} is not bounded by two end edges", index));
                    continue;
                }
            };
            let (across_a, across_b) = match (mesh.radial(a), mesh.radial(b)) {
                (Some(across_a), Some(across_b)) => (across_a, across_b),
                _ => {
                    report.skip(format!("ring {} ends on the mesh boundary", index));
                    continue;
                }
            };

            let rail_a = [
                mesh.origin(mesh.prev(mesh.prev(across_b))),
                mesh.origin(b),
                mesh.dest(a),
                mesh.origin(mesh.prev(across_a)),
            ]
            .map(|v| *mesh.position(v));
            let rail_b = [
                mesh.origin(mesh.prev(across_b)),
                mesh.dest(b),
                mesh.origin(a),
                mesh.origin(mesh.next(mesh.next(across_a))),
            ]
            .map(|v| *mesh.position(v));

            let count = ring.corners.len() as f64;
            let updates: Vec<(VertexId<I>, Point3<f64>)> = ring
                .corners
                .iter()
                .enumerate()
                .flat_map(|(i, entry)| {
                    let mu = (i + 1) as f64 / (count + 1.0);
                    [
                        (entry.side_a, rail_point(&rail_a, mu, tension)),
                        (entry.side_b(mesh), rail_point(&rail_b, mu, tension)),
                    ]
                })
                .collect();

            for (v, p) in updates {
                mesh.set_position(v, p);
            }
        }

        report
    }
}

fn rail_point(rail: &[Point3<f64>; 4], mu: f64, tension: f64) -> Point3<f64> {
    hermite_3d(&rail[0], &rail[1], &rail[2], &rail[3], mu, -tension, 0.0)
}

/// Walk across quads from `start` in both directions while the crossed
/// edges stay selected.
fn trace_ring<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    start: EdgeId<I>,
    selected: &BTreeSet<EdgeId<I>>,
) -> Option<EdgeRing<I>> {
    let first = mesh.edge_corners(start).next()?;

    let mut corners = VecDeque::from([RingCorner {
        corner: first,
        side_a: mesh.origin(first),
    }]);
    let mut seen = BTreeSet::from([start]);
    let mut ends = Vec::with_capacity(2);
    let mut cyclic = false;

    for forward in [true, false] {
        let mut next = if forward {
            Some(first)
        } else {
            match mesh.radial(first) {
                Some(across) => Some(across),
                None => {
                    ends.push(first);
                    None
                }
            }
        };

        while let Some(corner) = next {
            if mesh.corner_degree(corner) != 4 {
                break;
            }
            let opposite = mesh.prev(mesh.prev(corner));
            let e = opposite.edge();
            if !selected.contains(&e) {
                ends.push(opposite);
                break;
            }
            if !seen.insert(e) {
                cyclic = true;
                break;
            }

            if forward {
                corners.push_back(RingCorner {
                    corner: opposite,
                    side_a: mesh.dest(opposite),
                });
            } else {
                corners.push_front(RingCorner {
                    corner: opposite,
                    side_a: mesh.origin(opposite),
                });
            }

            next = mesh.radial(opposite);
            if next.is_none() {
                ends.push(opposite);
            }
        }

        if cyclic {
            ends.clear();
            break;
        }
    }

    Some(EdgeRing {
        corners: corners.into(),
        ends,
        cyclic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, Selection};
    use nalgebra::Vector3;

    /// `n` x `n` flat quads; vertex (i, j) has index j * (n + 1) + i.
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

    fn vid(n: usize, i: usize, j: usize) -> usize {
        j * (n + 1) + i
    }

    /// Horizontal edges of row `j`, columns `from..to`.
    fn row(n: usize, j: usize, from: usize, to: usize) -> Vec<(usize, usize)> {
        (from..to).map(|i| (vid(n, i, j), vid(n, i + 1, j))).collect()
    }

    /// Vertical edges between rows `j` and `j + 1`, columns `from..to`.
    fn rungs(n: usize, j: usize, from: usize, to: usize) -> Vec<(usize, usize)> {
        (from..to).map(|i| (vid(n, i, j), vid(n, i, j + 1))).collect()
    }

    #[test]
    fn test_build_loops_partitions_selection() {
        let n = 6;
        let mesh = create_grid_mesh(n);
        let mut pairs = row(n, 2, 0, n);
        pairs.extend(row(n, 3, 0, n));
        let selection = Selection::from_vertex_pairs(&mesh, &pairs).unwrap();

        let set = build_loops(&mesh, selection.edges()).unwrap();
        assert_eq!(set.len(), 2);

        let total: usize = set.loops().iter().map(|l| l.len()).sum();
        assert_eq!(total, selection.edges().len());
        for e in selection.edges() {
            let owner = set.loop_of(*e).unwrap();
            assert!(owner.edges().contains(e));
        }
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let mesh = create_grid_mesh(2);
        assert!(matches!(
            build_loops(&mesh, &BTreeSet::new()),
            Err(MeshError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_ring_neighbours_and_valence_ranking() {
        let n = 6;
        let mesh = create_grid_mesh(n);
        // An isolated short loop first in index order, then two parallel rows.
        let mut pairs = row(n, 0, 0, 2);
        pairs.extend(row(n, 3, 0, n));
        pairs.extend(row(n, 4, 0, n));
        let selection = Selection::from_vertex_pairs(&mesh, &pairs).unwrap();

        let set = build_loops(&mesh, selection.edges()).unwrap();
        assert_eq!(set.len(), 3);

        let valences: Vec<usize> = set.loops().iter().map(|l| l.max_valence()).collect();
        assert_eq!(valences, vec![1, 1, 0]);
        assert_eq!(set.loops()[2].len(), 2);

        let first = &set.loops()[0];
        for pos in 0..first.len() {
            assert_eq!(first.ring_neighbours(pos).len(), 1);
            assert_eq!(first.valences()[pos], 1);
        }
        assert!(set.loops()[2].ring_neighbours(0).is_empty());
    }

    #[test]
    fn test_ring_and_ends() {
        let n = 6;
        let mesh = create_grid_mesh(n);
        let mut pairs = row(n, 2, 0, n);
        pairs.extend(row(n, 3, 0, n));
        let selection = Selection::from_vertex_pairs(&mesh, &pairs).unwrap();
        let set = build_loops(&mesh, selection.edges()).unwrap();

        let e = mesh
            .find_edge(VertexId::new(vid(n, 2, 2)), VertexId::new(vid(n, 3, 2)))
            .unwrap();
        let ring = set.ring(e).unwrap();
        assert_eq!(ring.len(), 2);
        assert!(!ring.is_cyclic());

        let ends = set.ring_ends(e).unwrap();
        assert_eq!(ends.len(), 2);
        let end_edges: BTreeSet<EdgeId> = ends.iter().map(|h| h.edge()).collect();
        let below = mesh
            .find_edge(VertexId::new(vid(n, 2, 1)), VertexId::new(vid(n, 3, 1)))
            .unwrap();
        let above = mesh
            .find_edge(VertexId::new(vid(n, 2, 4)), VertexId::new(vid(n, 3, 4)))
            .unwrap();
        assert_eq!(end_edges, BTreeSet::from([below, above]));

        // The parallel edge in the other loop shares the ring.
        let partner = mesh
            .find_edge(VertexId::new(vid(n, 2, 3)), VertexId::new(vid(n, 3, 3)))
            .unwrap();
        assert!(std::ptr::eq(ring, set.ring(partner).unwrap()));
    }

    #[test]
    fn test_ring_curve_restores_flat_patch() {
        let n = 6;
        let mut mesh = create_grid_mesh(n);
        let pairs = rungs(n, 2, 2, 5);
        let selection = Selection::from_vertex_pairs(&mesh, &pairs).unwrap();
        let set = build_loops(&mesh, selection.edges()).unwrap();
        assert_eq!(set.rings().len(), 1);
        assert_eq!(set.rings()[0].len(), 3);

        // Push the selected vertices off the plane and sideways.
        for v in set.affected_vertices() {
            let p = *mesh.position(v);
            mesh.set_position(v, p + Vector3::new(0.0, 0.1, 0.7));
        }

        let report = set.set_ring_curve(&mut mesh, 1.0);
        assert!(report.is_clean());

        let mut xs = Vec::new();
        for (i, j) in [(2, 2), (3, 2), (4, 2), (2, 3), (3, 3), (4, 3)] {
            let p = mesh.position(VertexId::new(vid(n, i, j)));
            assert!(p.z.abs() < 1e-12);
            assert!((p.y - j as f64).abs() < 1e-12);
            if j == 2 {
                xs.push(p.x);
            }
        }
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(xs.iter().all(|&x| x > 1.0 && x < 5.0));
    }

    #[test]
    fn test_ring_curve_skips_boundary_ends() {
        let n = 4;
        let mut mesh = create_grid_mesh(n);
        let selection = Selection::from_vertex_pairs(&mesh, &rungs(n, 1, 1, 4)).unwrap();
        let set = build_loops(&mesh, selection.edges()).unwrap();

        let before: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
        let report = set.set_ring_curve(&mut mesh, 1.0);
        assert_eq!(report.skipped, 1);
        for v in mesh.vertex_ids() {
            assert_eq!(*mesh.position(v), before[v.index()]);
        }
    }

    #[test]
    fn test_apply_flow_and_revert() {
        let n = 4;
        let mut mesh = create_grid_mesh(n);
        for i in 0..=n {
            for j in [1, 3] {
                let v = VertexId::new(vid(n, i, j));
                let p = *mesh.position(v);
                mesh.set_position(v, p + Vector3::new(0.0, 0.0, 0.2));
            }
        }
        let selection = Selection::from_vertex_pairs(&mesh, &row(n, 2, 0, n)).unwrap();
        let set = build_loops(&mesh, selection.edges()).unwrap();

        set.apply_flow(&mut mesh, &FlowOptions::default().with_tension(1.0));
        let lifted = mesh.position(VertexId::new(vid(n, 2, 2))).z;
        assert!(lifted > 1e-3);

        set.revert(&mut mesh);
        assert_eq!(mesh.position(VertexId::new(vid(n, 2, 2))).z, 0.0);
    }
}
