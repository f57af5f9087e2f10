//! Curves through picked vertices.
//!
//! The picked vertices are connected, in pick order, by shortest edge paths.
//! The resulting chain is then bent onto a curve chosen by the number of
//! picks:
//!
//! - **2 picks**: a half circle between them, raised along the first
//!   vertex's normal (or turned into the surface with `rotate`);
//! - **3 picks**: the circular arc through all three;
//! - **4+ picks**: a Hermite spline through every pick.
//!
//! The chain vertices are redistributed by arc length along the fitted
//! curve.

use nalgebra::{Point3, Vector3};

use super::edgeloop::FitReport;
use super::interpolate::{
    intersect_line_line, resample_by_arc_length, sample_hermite, slerp, CURVE_SAMPLES,
};
use super::path::{find_path, DistanceMode, PathOptions};
use super::walk::continuation;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Tension at which a three point arc degenerates to a straight line.
pub const FLAT_ARC_TENSION: f64 = -1.0;

/// Samples per chain vertex when discretising circles.
const CIRCLE_SAMPLES_PER_VERTEX: usize = 100;

/// Options for [`VertexChain::fit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexCurveOptions {
    /// Curve tension.
    ///
    /// For two picks the arc height is `(1 + tension)` times the radius, so
    /// `-1` gives a straight line. For three picks the middle point is
    /// pushed `tension` units away from the chord, with
    /// [`FLAT_ARC_TENSION`] giving a straight line. For splines it is the
    /// Hermite tension.
    pub tension: f64,

    /// Edge weighting for the paths between picks.
    pub distance_mode: DistanceMode,

    /// Mirror the two point half circle.
    pub flip: bool,

    /// Turn the two point half circle by 90 degrees about the chord.
    pub rotate: bool,

    /// Space the whole chain evenly instead of segment by segment.
    pub space_evenly: bool,
}

impl VertexCurveOptions {
    /// Set the tension.
    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }

    /// Set the distance mode for path search.
    pub fn with_distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }

    /// Mirror the half circle.
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    /// Rotate the half circle.
    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// Enable even spacing over the whole chain.
    pub fn with_space_evenly(mut self, space_evenly: bool) -> Self {
        self.space_evenly = space_evenly;
        self
    }
}

/// Picked vertices and the edge path connecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexChain<I: MeshIndex = u32> {
    picks: Vec<VertexId<I>>,
    vertices: Vec<VertexId<I>>,
}

impl<I: MeshIndex> VertexChain<I> {
    /// Connect `picks` in order with shortest edge paths.
    ///
    /// Vertices already on the chain are not repeated.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidSelection`] for fewer than two picks, an out of
    /// range pick, or picks with no edge path between them.
    pub fn build(
        mesh: &HalfEdgeMesh<I>,
        picks: &[VertexId<I>],
        mode: DistanceMode,
    ) -> Result<Self> {
        if picks.len() < 2 {
            return Err(MeshError::InvalidSelection(format!(
                "vertex curve needs at least 2 picked vertices, got {}",
                picks.len()
            )));
        }
        if let Some(bad) = picks.iter().find(|v| v.index() >= mesh.num_vertices()) {
            return Err(MeshError::InvalidSelection(format!(
                "{:?} is not a vertex of the mesh",
                bad
            )));
        }

        let mut vertices = vec![picks[0]];
        for pair in picks.windows(2) {
            let options = PathOptions::default()
                .with_mode(mode)
                .with_target(pair[1].index());
            let path = find_path(mesh, pair[0], &options)
                .path_to(pair[1])
                .ok_or_else(|| {
                    MeshError::InvalidSelection(format!(
                        "no edge path between {:?} and {:?}",
                        pair[0], pair[1]
                    ))
                })?;

            for v in path {
                if !vertices.contains(&v) {
                    vertices.push(v);
                }
            }
        }

        log::debug!(
            "vertex chain of {} vertices through {} picks",
            vertices.len(),
            picks.len()
        );
        Ok(Self {
            picks: picks.to_vec(),
            vertices,
        })
    }

    /// The picked vertices, in pick order.
    pub fn picks(&self) -> &[VertexId<I>] {
        &self.picks
    }

    /// Every vertex of the chain, in order.
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// Split the chain at the picks.
    ///
    /// Returns the picks met along the chain (the knots) and the segments
    /// between consecutive knots; neighbouring segments share their knot.
    pub fn segments(&self) -> (Vec<VertexId<I>>, Vec<Vec<VertexId<I>>>) {
        let mut knots = Vec::with_capacity(self.picks.len());
        let mut segments = vec![Vec::new()];

        for &v in &self.vertices {
            let is_knot = self.picks.get(knots.len()) == Some(&v);
            if let Some(current) = segments.last_mut() {
                current.push(v);
            }
            if is_knot {
                knots.push(v);
                if knots.len() > 1 && knots.len() < self.picks.len() {
                    segments.push(vec![v]);
                }
            }
        }

        (knots, segments)
    }

    /// Bend the chain onto the curve selected by the number of picks.
    ///
    /// Degenerate input (parallel circle construction, missing knots) is
    /// reported and leaves the mesh unchanged.
    pub fn fit(&self, mesh: &mut HalfEdgeMesh<I>, options: &VertexCurveOptions) -> FitReport {
        match self.picks.len() {
            2 => self.half_circle(mesh, options),
            3 => self.three_point_arc(mesh, options),
            _ => self.spline(mesh, options),
        }
    }

    fn half_circle(&self, mesh: &mut HalfEdgeMesh<I>, options: &VertexCurveOptions) -> FitReport {
        let mut report = FitReport::default();
        let height = options.tension + 1.0;
        let a = *mesh.position(self.picks[0]);
        let c = *mesh.position(self.picks[1]);

        if height == 0.0 {
            self.place_on(mesh, &self.vertices, &[a, c]);
            return report;
        }

        let chord = c - a;
        let normal = mesh.vertex_normal(self.picks[0]);
        let side = match normal.cross(&chord).try_normalize(f64::EPSILON) {
            Some(side) => side,
            None => {
                report.skip("vertex normal is parallel to the chord, no circle plane");
                return report;
            }
        };
        let mut up = if options.rotate {
            side
        } else {
            side.cross(&(a - c)).normalize()
        };
        if options.flip {
            up = -up;
        }

        let radius = chord.norm() * 0.5;
        let b = Point3::from((a.coords + c.coords) * 0.5) + up * radius * height;

        match arc_samples(&a, &b, &c, self.vertices.len() * CIRCLE_SAMPLES_PER_VERTEX) {
            Some(samples) => self.place_on(mesh, &self.vertices, &samples),
            None => report.skip("found no circle through the picked vertices"),
        }
        report
    }

    fn three_point_arc(
        &self,
        mesh: &mut HalfEdgeMesh<I>,
        options: &VertexCurveOptions,
    ) -> FitReport {
        let mut report = FitReport::default();
        let (knots, segments) = self.segments();
        if knots.len() != 3 {
            report.skip("picked vertices are not met in order along the path");
            return report;
        }

        let a = *mesh.position(knots[0]);
        let b = *mesh.position(knots[1]);
        let c = *mesh.position(knots[2]);

        if options.tension == FLAT_ARC_TENSION {
            self.place_on(mesh, &self.vertices, &[a, c]);
            return report;
        }

        let mid = Point3::from((a.coords + c.coords) * 0.5);
        let b = match (b - mid).try_normalize(f64::EPSILON) {
            Some(dir) => b + dir * options.tension,
            None => b,
        };

        let center = match circle_center(&a, &b, &c) {
            Some(center) => center,
            None => {
                report.skip("found no circle through the picked vertices");
                return report;
            }
        };

        if options.space_evenly {
            let count = self.vertices.len() * CIRCLE_SAMPLES_PER_VERTEX;
            let samples = arc_around(&center, &a, &b, &c, count);
            self.place_on(mesh, &self.vertices, &samples);
            return report;
        }

        let radius = (a - center).norm();
        let spokes = [a - center, b - center, c - center];
        for (segment, span) in segments.iter().zip(spokes.windows(2)) {
            let last = segment.len().saturating_sub(1).max(1) as f64;
            for (i, &v) in segment.iter().enumerate() {
                let dir = slerp(&span[0], &span[1], i as f64 / last);
                mesh.set_position(v, center + on_radius(dir, radius));
            }
        }
        report
    }

    fn spline(&self, mesh: &mut HalfEdgeMesh<I>, options: &VertexCurveOptions) -> FitReport {
        let mut report = FitReport::default();
        let (knots, segments) = self.segments();
        if knots.len() < self.picks.len() {
            report.skip("path found is too short, try another distance mode");
            return report;
        }

        let k: Vec<Point3<f64>> = knots.iter().map(|&v| *mesh.position(v)).collect();
        let last = segments.len() - 1;
        let mut curves = Vec::with_capacity(segments.len());

        for (s, segment) in segments.iter().enumerate() {
            let (p0, p1, p2, p3) = if s == 0 {
                let (p1, p2) = (k[0], k[1]);
                let p3 = p2 - unit(&(p2 - k[2])) * (p1 - p2).norm();
                let p0 = outer_control(mesh, knots[0], segment.get(1).copied(), &p1, &p2);
                (p0, p1, p2, p3)
            } else if s == last {
                let (p1, p2) = (k[s], k[s + 1]);
                let p0 = p1 - unit(&(p1 - k[s - 1])) * (p2 - p1).norm();
                let inner = segment.len().checked_sub(2).map(|i| segment[i]);
                let p3 = outer_control(mesh, knots[s + 1], inner, &p2, &p1);
                (p0, p1, p2, p3)
            } else {
                (k[s - 1], k[s], k[s + 1], k[s + 2])
            };

            curves.push(sample_hermite(&p0, &p1, &p2, &p3, -options.tension, CURVE_SAMPLES));
        }

        if options.space_evenly {
            let joined: Vec<Point3<f64>> = curves.concat();
            self.place_on(mesh, &self.vertices, &joined);
        } else {
            for (segment, samples) in segments.iter().zip(&curves) {
                self.place_on(mesh, segment, samples);
            }
        }
        report
    }

    /// Spread the interior of `targets` evenly along `samples`.
    fn place_on(
        &self,
        mesh: &mut HalfEdgeMesh<I>,
        targets: &[VertexId<I>],
        samples: &[Point3<f64>],
    ) {
        if targets.len() < 3 {
            return;
        }
        let positions = resample_by_arc_length(samples, targets.len());
        let last = targets.len() - 1;
        for (&v, &p) in targets[1..last].iter().zip(&positions[1..last]) {
            mesh.set_position(v, p);
        }
    }
}

/// Outer Hermite control point past the chain end `tip`.
///
/// Continues the mesh line arriving at `tip` from `inner`; without one, the
/// span `tip - toward` is mirrored past `tip`.
fn outer_control<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    tip: VertexId<I>,
    inner: Option<VertexId<I>>,
    tip_pos: &Point3<f64>,
    toward: &Point3<f64>,
) -> Point3<f64> {
    inner
        .and_then(|inner| continuation(mesh, tip, inner))
        .map(|v| *mesh.position(v))
        .unwrap_or_else(|| tip_pos + (tip_pos - toward))
}

/// Center of the circle through three points.
fn circle_center(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Point3<f64>> {
    let ab = b - a;
    let bc = c - b;
    let up = ab.cross(&bc).try_normalize(f64::EPSILON)?;

    let m1 = a + ab * 0.5;
    let m2 = b + bc * 0.5;
    let d1 = ab.cross(&up).try_normalize(f64::EPSILON)?;
    let d2 = bc.cross(&up).try_normalize(f64::EPSILON)?;

    intersect_line_line(&m1, &(m1 + d1), &m2, &(m2 + d2)).map(|(p, _)| p)
}

/// Sample the arc from `a` over `b` to `c`.
fn arc_samples(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    samples: usize,
) -> Option<Vec<Point3<f64>>> {
    let center = circle_center(a, b, c)?;
    Some(arc_around(&center, a, b, c, samples))
}

/// Sample the arc around `center`: the first half of the parameter range
/// turns from `a` to `b`, the second from `b` to `c`.
fn arc_around(
    center: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    samples: usize,
) -> Vec<Point3<f64>> {
    let start = a - center;
    let middle = b - center;
    let end = c - center;
    let radius = start.norm();
    let samples = samples.max(2);

    (0..=samples)
        .map(|i| {
            let mu = i as f64 / samples as f64;
            let dir = if mu <= 0.5 {
                slerp(&start, &middle, mu * 2.0)
            } else {
                slerp(&middle, &end, (mu - 0.5) * 2.0)
            };
            center + on_radius(dir, radius)
        })
        .collect()
}

fn unit(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}

fn on_radius(dir: Vector3<f64>, radius: f64) -> Vector3<f64> {
    dir.try_normalize(f64::EPSILON)
        .map_or(dir, |unit| unit * radius)
}
