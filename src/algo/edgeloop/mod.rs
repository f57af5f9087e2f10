//! Edge loops and the operators that reshape them.
//!
//! An [`EdgeLoop`] is an ordered chain of edges together with the vertices
//! it passes through. Loops only hold indices into the mesh; every operator
//! takes the mesh explicitly and writes new vertex positions into it.
//!
//! Loops are normally created in groups by [`build_loops`], which also
//! discovers how the loops of a selection are linked across their edge
//! rings.
//!
//! # Example
//!
//! ```
//! use edgeflow::prelude::*;
//! use edgeflow::algo::edgeloop::build_loops;
//! use nalgebra::Point3;
//!
//! // A 3x1 strip of quads, bent upwards in the middle.
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.3),
//!     Point3::new(2.0, 0.0, 0.3),
//!     Point3::new(3.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.3),
//!     Point3::new(2.0, 1.0, 0.3),
//!     Point3::new(3.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 5, 4], [1, 2, 6, 5], [2, 3, 7, 6]];
//! let mut mesh: HalfEdgeMesh = build_from_quads(&vertices, &faces).unwrap();
//!
//! let selection = Selection::from_vertex_pairs(&mesh, &[(0, 1), (1, 2), (2, 3)]).unwrap();
//! let loops = build_loops(&mesh, selection.edges()).unwrap();
//! for edge_loop in loops.loops() {
//!     edge_loop.set_linear(&mut mesh, true);
//! }
//! assert!(mesh.position(VertexId::new(1)).z.abs() < 1e-12);
//! ```

mod aggregate;
mod options;

pub use aggregate::{build_loops, EdgeRing, LoopSet, RingCorner};
pub use options::{Blend, BlendType, CurveOptions, FlowOptions, LinearOptions, Rails};

use std::cmp::Ordering;
use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use super::interpolate::{
    hermite_3d, lerp, resample_by_arc_length, sample_bezier, smoothstep, CURVE_SAMPLES,
};
use super::walk::continuation;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Outcome of an operator run that completed.
///
/// Degenerate elements are skipped rather than failing the whole run; each
/// skip is counted and described here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    /// Number of vertices, rings or segments left untouched.
    pub skipped: usize,
    /// Human readable notes, one per skip or notable condition.
    pub messages: Vec<String>,
}

impl FitReport {
    /// Record a skipped element.
    pub fn skip(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.skipped += 1;
        self.messages.push(message);
    }

    /// Record a note without counting a skip.
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{}", message);
        self.messages.push(message);
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: FitReport) {
        self.skipped += other.skipped;
        self.messages.extend(other.messages);
    }

    /// Check if nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// An ordered chain of edges and the vertices along it.
///
/// Invariants:
/// - `edges[i]` joins `verts[i]` and `verts[i + 1]` (wrapping for cyclic loops);
/// - `verts.len() == edges.len()` for cyclic loops, `edges.len() + 1` otherwise;
/// - the direction is canonical: the same edge set always yields the same
///   ordering, whichever way round it was given.
#[derive(Debug, Clone)]
pub struct EdgeLoop<I: MeshIndex = u32> {
    edges: Vec<EdgeId<I>>,
    verts: Vec<VertexId<I>>,
    cyclic: bool,
    initial_positions: Vec<Point3<f64>>,

    // Per-edge data, indexed like `edges`. Filled in by the aggregator.
    pub(crate) ring_neighbours: Vec<Vec<EdgeId<I>>>,
    pub(crate) valences: Vec<usize>,
    pub(crate) max_valence: usize,
    pub(crate) rings: Vec<Option<usize>>,
}

impl<I: MeshIndex> EdgeLoop<I> {
    /// Build a loop from edges given in chain order (either direction).
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidSelection`] for an empty list and
    /// [`MeshError::BrokenChain`] if consecutive edges do not share a vertex
    /// or an edge repeats.
    pub fn new(mesh: &HalfEdgeMesh<I>, edges: Vec<EdgeId<I>>) -> Result<Self> {
        if edges.is_empty() {
            return Err(MeshError::InvalidSelection("edge loop has no edges".into()));
        }

        let (verts, cyclic) = chain_vertices(mesh, &edges)?;
        let n = edges.len();
        let mut edge_loop = Self {
            edges,
            verts,
            cyclic,
            initial_positions: Vec::new(),
            ring_neighbours: vec![Vec::new(); n],
            valences: vec![0; n],
            max_valence: 0,
            rings: vec![None; n],
        };
        edge_loop.normalize_direction(mesh);
        edge_loop.initial_positions = edge_loop
            .verts
            .iter()
            .map(|&v| *mesh.position(v))
            .collect();

        Ok(edge_loop)
    }

    /// Pick the canonical start vertex and direction.
    fn normalize_direction(&mut self, mesh: &HalfEdgeMesh<I>) {
        let cmp = |a: VertexId<I>, b: VertexId<I>| vertex_order(mesh, a, b);

        if !self.cyclic {
            let last = self.verts.len() - 1;
            if cmp(self.verts[last], self.verts[0]) == Ordering::Less {
                self.verts.reverse();
                self.edges.reverse();
            }
            return;
        }

        let first = (0..self.verts.len())
            .min_by(|&i, &j| cmp(self.verts[i], self.verts[j]))
            .unwrap_or(0);
        self.verts.rotate_left(first);
        self.edges.rotate_left(first);

        let last = self.verts.len() - 1;
        if cmp(self.verts[last], self.verts[1]) == Ordering::Less {
            self.verts.reverse();
            self.verts.rotate_right(1);
            self.edges.reverse();
        }
    }

    // ==================== Accessors ====================

    /// Edges in loop order.
    pub fn edges(&self) -> &[EdgeId<I>] {
        &self.edges
    }

    /// Vertices in loop order.
    pub fn verts(&self) -> &[VertexId<I>] {
        &self.verts
    }

    /// Check if the loop closes on itself.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Always false: a loop has at least one edge.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Vertex positions captured when the loop was built.
    pub fn initial_positions(&self) -> &[Point3<f64>] {
        &self.initial_positions
    }

    /// Number of other loops reachable across the rings of each edge.
    pub fn valences(&self) -> &[usize] {
        &self.valences
    }

    /// Largest entry of [`valences`](Self::valences).
    pub fn max_valence(&self) -> usize {
        self.max_valence
    }

    /// Selected edges parallel to the edge at `position` (at most two).
    pub fn ring_neighbours(&self, position: usize) -> &[EdgeId<I>] {
        &self.ring_neighbours[position]
    }

    /// Position of an edge in this loop.
    pub fn position_of(&self, edge: EdgeId<I>) -> Option<usize> {
        self.edges.iter().position(|&e| e == edge)
    }

    /// Mean edge length at the current vertex positions.
    pub fn average_edge_length(&self, mesh: &HalfEdgeMesh<I>) -> f64 {
        let total: f64 = self.edges.iter().map(|&e| mesh.edge_length(e)).sum();
        total / self.edges.len() as f64
    }

    /// Restore the positions captured at construction.
    pub fn revert(&self, mesh: &mut HalfEdgeMesh<I>) {
        for (&v, &p) in self.verts.iter().zip(&self.initial_positions) {
            mesh.set_position(v, p);
        }
    }

    fn end_vertices(&self) -> Option<[VertexId<I>; 2]> {
        match (self.cyclic, self.verts.first(), self.verts.last()) {
            (false, Some(&first), Some(&last)) => Some([first, last]),
            _ => None,
        }
    }

    // ==================== Operators ====================

    /// Bend every loop vertex to follow the curvature of the edge rings
    /// crossing it.
    ///
    /// For each interior edge and each of its two face corners, four control
    /// points are gathered along the ring through the corner's far vertex:
    /// the two ring neighbours of the vertex and one more vertex outward on
    /// each side. Ring turns sharper than `min_angle` (radians) and mesh
    /// boundaries are replaced by straight extrapolation. The vertex moves to
    /// the midpoint of the Hermite curve through those points.
    ///
    /// The end vertices of an open loop never move. Vertices whose control
    /// points coincide are skipped.
    pub fn set_flow(&self, mesh: &mut HalfEdgeMesh<I>, tension: f64, min_angle: f64) -> FitReport {
        let mut report = FitReport::default();
        let fixed = self.end_vertices();

        for &edge in &self.edges {
            if mesh.is_boundary_edge(edge) {
                continue;
            }

            let mut targets = Vec::with_capacity(2);
            for corner in mesh.edge_corners(edge) {
                let center = mesh.dest(corner);
                if fixed.map_or(false, |ends| ends.contains(&center)) {
                    continue;
                }
                match flow_control_points(mesh, corner, min_angle) {
                    Some(points) => targets.push((center, points)),
                    None => report.skip(format!(
                        "{:?}: ring through {:?} is not made of quads",
                        center, edge
                    )),
                }
            }

            for (center, [p1, p2, p3, p4]) in targets {
                if coincident(&p1, &p2) || coincident(&p3, &p4) {
                    report.skip(format!("{:?}: two control points are identical", center));
                    continue;
                }

                // Equalise the outer spans so long neighbour edges don't skew the curve.
                let d = (p2 - p3).norm() * 0.5;
                let p1 = p2 + (p1 - p2).normalize() * d;
                let p4 = p3 + (p4 - p3).normalize() * d;

                mesh.set_position(center, hermite_3d(&p1, &p2, &p3, &p4, 0.5, -tension, 0.0));
            }
        }

        report
    }

    /// Fit one cubic curve through the whole open loop and space the
    /// vertices evenly along it.
    ///
    /// Tangents at the ends follow the first and last loop edge, or with a
    /// rail the mesh edge continuing past the end vertex. Handles are
    /// `tension * |end - start| / 2` long. Cyclic loops and loops with fewer
    /// than two edges are left alone.
    pub fn set_curve_flow(
        &self,
        mesh: &mut HalfEdgeMesh<I>,
        tension: f64,
        rails: Rails,
    ) -> FitReport {
        let mut report = FitReport::default();
        if self.cyclic || self.edges.len() < 2 {
            report.note("curve fit needs an open loop with at least two edges");
            return report;
        }

        let last = self.verts.len() - 1;
        let start = *mesh.position(self.verts[0]);
        let end = *mesh.position(self.verts[last]);

        let start_dir = end_tangent(mesh, self.verts[0], self.verts[1], rails.start);
        let end_dir = end_tangent(mesh, self.verts[last], self.verts[last - 1], rails.end);
        let handle = 0.5 * (end - start).norm() * tension;

        let samples = sample_bezier(
            &start,
            &(start + start_dir * handle),
            &(end + end_dir * handle),
            &end,
            CURVE_SAMPLES,
        );
        let positions = resample_by_arc_length(&samples, self.verts.len());

        for (&v, &p) in self.verts[1..last].iter().zip(&positions[1..last]) {
            mesh.set_position(v, p);
        }

        report
    }

    /// Put the interior vertices of an open loop on the segment between its
    /// end vertices.
    ///
    /// With `space_evenly` the vertices are placed at equal steps, otherwise
    /// each is projected orthogonally onto the line.
    pub fn set_linear(&self, mesh: &mut HalfEdgeMesh<I>, space_evenly: bool) -> FitReport {
        let mut report = FitReport::default();
        let count = self.edges.len();
        if count < 2 || self.cyclic {
            return report;
        }

        let p1 = *mesh.position(self.verts[0]);
        let p2 = *mesh.position(self.verts[count]);
        let step = (p2 - p1) / count as f64;
        let dir = match step.try_normalize(f64::EPSILON) {
            Some(dir) => dir,
            None => {
                report.skip("loop ends coincide, no line to project onto");
                return report;
            }
        };

        for (i, &v) in self.verts[1..count].iter().enumerate() {
            let p = if space_evenly {
                p1 + step * (i + 1) as f64
            } else {
                p1 + dir * (mesh.position(v) - p1).dot(&dir)
            };
            mesh.set_position(v, p);
        }

        report
    }

    /// Place a single-edge loop on the line between its outer neighbours.
    ///
    /// Each endpoint's neighbour is the average of the vertices it links to
    /// outside the edge's adjacent quads. The endpoints end up `distance`
    /// from their neighbours, clamped to half the neighbour span. Both
    /// endpoints need at least four edges.
    pub fn straighten(&self, mesh: &mut HalfEdgeMesh<I>, distance: f64) -> FitReport {
        let mut report = FitReport::default();
        if self.edges.len() != 1 {
            report.note("straighten only applies to single-edge loops");
            return report;
        }

        let edge = self.edges[0];
        let [a1, a2] = mesh.edge_vertices(edge);
        if mesh.valence(a1) <= 3 || mesh.valence(a2) <= 3 {
            report.skip(format!("{:?}: endpoints need at least four edges", edge));
            return report;
        }

        let (b1, b2) = match (
            outer_neighbour(mesh, edge, a1),
            outer_neighbour(mesh, edge, a2),
        ) {
            (Some(b1), Some(b2)) => (b1, b2),
            _ => {
                report.skip(format!("{:?}: no neighbours outside the adjacent quads", edge));
                return report;
            }
        };

        let span = b2 - b1;
        let max_distance = span.norm();
        let dir = match span.try_normalize(f64::EPSILON) {
            Some(dir) => dir,
            None => {
                report.skip(format!("{:?}: neighbour averages coincide", edge));
                return report;
            }
        };
        let distance = if distance * 2.0 > max_distance {
            max_distance * 0.5
        } else {
            distance
        };

        mesh.set_position(a1, b1 + dir * distance);
        mesh.set_position(a2, b2 - dir * distance);
        report
    }

    /// Fade the change near the ends of an open loop back to the initial
    /// positions.
    ///
    /// The first `blend.start` and last `blend.end` vertices are pulled from
    /// their current position toward their initial position, weighted by
    /// the initial arc length from the loop end over the blend zone length.
    /// Zones that would overlap are shrunk proportionally.
    pub fn blend_start_end(&self, mesh: &mut HalfEdgeMesh<I>, blend: &Blend) {
        if self.cyclic || blend.is_none() {
            return;
        }

        let n = self.verts.len();
        let (start, end) = if blend.start + blend.end > n {
            let start = blend.start * n / (blend.start + blend.end);
            (start, n - start)
        } else {
            (blend.start, blend.end)
        };

        let forward: Vec<usize> = (0..n).collect();
        let backward: Vec<usize> = (0..n).rev().collect();
        self.blend_zone(mesh, &forward, start, blend.kind);
        self.blend_zone(mesh, &backward, end, blend.kind);
    }

    /// Blend the first `count` vertices of `order` (indices into `verts`).
    fn blend_zone(
        &self,
        mesh: &mut HalfEdgeMesh<I>,
        order: &[usize],
        count: usize,
        kind: BlendType,
    ) {
        if count == 0 {
            return;
        }

        // Cumulative initial arc length along `order`, up to the first vertex past the zone.
        let reach = count.min(order.len() - 1);
        let mut cumulative = vec![0.0; reach + 1];
        for k in 1..=reach {
            let a = self.initial_positions[order[k - 1]];
            let b = self.initial_positions[order[k]];
            cumulative[k] = cumulative[k - 1] + (b - a).norm();
        }
        let zone_length = cumulative[reach];

        for k in 0..count.min(order.len()) {
            let linear = if zone_length > 0.0 {
                cumulative[k.min(reach)] / zone_length
            } else {
                k as f64 / count as f64
            };
            let weight = match kind {
                BlendType::Linear => linear,
                BlendType::Smooth => smoothstep(linear),
            };

            let i = order[k];
            let v = self.verts[i];
            let current = *mesh.position(v);
            mesh.set_position(v, lerp(&self.initial_positions[i], &current, weight));
        }
    }
}

/// Order vertices along a chain of edges.
fn chain_vertices<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    edges: &[EdgeId<I>],
) -> Result<(Vec<VertexId<I>>, bool)> {
    let mut seen = HashSet::with_capacity(edges.len());
    for (position, &e) in edges.iter().enumerate() {
        if !seen.insert(e) {
            return Err(MeshError::BrokenChain {
                edge: e.index(),
                position,
            });
        }
    }

    let [a, b] = mesh.edge_vertices(edges[0]);
    if edges.len() == 1 {
        return Ok((vec![a, b], false));
    }

    let first = if mesh.edge_has_vertex(edges[1], b) {
        a
    } else if mesh.edge_has_vertex(edges[1], a) {
        b
    } else {
        return Err(MeshError::BrokenChain {
            edge: edges[1].index(),
            position: 1,
        });
    };

    let mut verts = Vec::with_capacity(edges.len() + 1);
    let mut current = first;
    for (position, &e) in edges.iter().enumerate() {
        if !mesh.edge_has_vertex(e, current) {
            return Err(MeshError::BrokenChain {
                edge: e.index(),
                position,
            });
        }
        verts.push(current);
        current = mesh.other_vertex(e, current);
    }

    let cyclic = edges.len() >= 3 && current == verts[0];
    if !cyclic {
        verts.push(current);
    }
    Ok((verts, cyclic))
}

/// Total order on vertices: coordinate sum, then x, y, z, then index.
fn vertex_order<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, a: VertexId<I>, b: VertexId<I>) -> Ordering {
    let pa = mesh.position(a);
    let pb = mesh.position(b);
    (pa.x + pa.y + pa.z)
        .total_cmp(&(pb.x + pb.y + pb.z))
        .then_with(|| pa.x.total_cmp(&pb.x))
        .then_with(|| pa.y.total_cmp(&pb.y))
        .then_with(|| pa.z.total_cmp(&pb.z))
        .then_with(|| a.cmp(&b))
}

fn coincident(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a - b).norm_squared() < f64::EPSILON * f64::EPSILON
}

/// Angle between two directions, `None` if either is zero.
fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let a = a.try_normalize(f64::EPSILON)?;
    let b = b.try_normalize(f64::EPSILON)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

/// Control points of the ring crossing the far vertex of `corner`.
///
/// Both faces of the corner's edge must be quads.
fn flow_control_points<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    corner: HalfEdgeId<I>,
    min_angle: f64,
) -> Option<[Point3<f64>; 4]> {
    let radial = mesh.radial(corner)?;
    if mesh.corner_degree(corner) != 4 || mesh.corner_degree(radial) != 4 {
        return None;
    }

    let center = *mesh.position(mesh.dest(corner));
    let ring1 = mesh.next(mesh.next(corner));
    let ring2 = mesh.prev(mesh.prev(radial));

    let v2 = mesh.origin(ring1);
    let v3 = mesh.dest(ring2);
    let p2 = *mesh.position(v2);
    let p3 = *mesh.position(v3);

    let p1 = match mesh.radial(ring1) {
        Some(across) => {
            let far = mesh.other_vertex(mesh.next(across).edge(), v2);
            let p = *mesh.position(far);
            if angle_between(&(p - p2), &(center - p2)).map_or(false, |a| a < min_angle) {
                p2 - (p3 - p2) * 0.5
            } else {
                p
            }
        }
        None => p2 - (p3 - p2),
    };

    let p4 = match mesh.radial(ring2) {
        Some(across) => {
            let far = mesh.other_vertex(mesh.prev(across).edge(), v3);
            let p = *mesh.position(far);
            if angle_between(&(p - p3), &(center - p3)).map_or(false, |a| a < min_angle) {
                p3 - (p2 - p3) * 0.5
            } else {
                p
            }
        }
        None => p3 - (p2 - p3),
    };

    Some([p1, p2, p3, p4])
}

/// Unit tangent at a loop end, pointing into the loop.
fn end_tangent<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    tip: VertexId<I>,
    inner: VertexId<I>,
    rail: bool,
) -> Vector3<f64> {
    let tip_pos = mesh.position(tip);
    let along_loop = mesh.position(inner) - tip_pos;

    let dir = if rail {
        match continuation(mesh, tip, inner) {
            Some(outer) => tip_pos - mesh.position(outer),
            None => along_loop,
        }
    } else {
        along_loop
    };

    dir.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Average of the vertices linked to `p` outside the quads adjacent to `edge`.
fn outer_neighbour<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    edge: EdgeId<I>,
    p: VertexId<I>,
) -> Option<Point3<f64>> {
    let mut excluded: HashSet<EdgeId<I>> = HashSet::from([edge]);
    for corner in mesh.edge_corners(edge) {
        if mesh.corner_degree(corner) == 4 {
            excluded.extend(mesh.face_edges(mesh.face_of(corner)));
        }
    }

    let mut sum = Vector3::zeros();
    let mut count = 0;
    for e in mesh.vertex_edges(p) {
        if excluded.contains(&e) {
            continue;
        }
        sum += mesh.position(mesh.other_vertex(e, p)).coords;
        count += 1;
    }

    (count > 0).then(|| Point3::from(sum / count as f64))
}
