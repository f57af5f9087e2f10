//! Edit sessions for repeated, interactive application of an operator.
//!
//! A session is created from one selection. Each call to `apply` starts
//! from the positions captured when the session began, recomputes the
//! operator only if its parameters changed, and blends the result into the
//! mesh by a mix factor. Changing only the mix reuses the cached result.
//!
//! ```
//! use edgeflow::prelude::*;
//! use edgeflow::algo::session::{EdgeOperation, EdgeSession};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.4),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.4),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh =
//!     build_from_quads(&vertices, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
//! let selection = Selection::from_vertex_pairs(&mesh, &[(0, 1), (1, 2)]).unwrap();
//!
//! let mut session = EdgeSession::begin(&mesh, &selection).unwrap();
//! let linear = EdgeOperation::Linear(LinearOptions::default());
//! session.apply(&mut mesh, &linear, 0.5).unwrap();
//! assert!((mesh.position(VertexId::new(1)).z - 0.2).abs() < 1e-12);
//! ```

use nalgebra::Point3;

use super::edgeloop::{
    build_loops, CurveOptions, FitReport, FlowOptions, LinearOptions, LoopSet,
};
use super::path::DistanceMode;
use super::vertex_curve::{VertexChain, VertexCurveOptions};
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, Selection, VertexId};

/// Initial and computed positions of the vertices a session touches.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCache<I: MeshIndex = u32> {
    vertices: Vec<VertexId<I>>,
    initial: Vec<Point3<f64>>,
    computed: Option<Vec<Point3<f64>>>,
}

impl<I: MeshIndex> PositionCache<I> {
    /// Snapshot the current positions of `vertices`.
    pub fn capture(mesh: &HalfEdgeMesh<I>, vertices: Vec<VertexId<I>>) -> Self {
        let initial = vertices.iter().map(|&v| *mesh.position(v)).collect();
        Self {
            vertices,
            initial,
            computed: None,
        }
    }

    /// The cached vertices.
    pub fn vertices(&self) -> &[VertexId<I>] {
        &self.vertices
    }

    /// Positions at capture time.
    pub fn initial(&self) -> &[Point3<f64>] {
        &self.initial
    }

    /// Positions stored by the last computation.
    pub fn computed(&self) -> Option<&[Point3<f64>]> {
        self.computed.as_deref()
    }

    /// Write the initial positions back.
    pub fn revert(&self, mesh: &mut HalfEdgeMesh<I>) {
        for (&v, &p) in self.vertices.iter().zip(&self.initial) {
            mesh.set_position(v, p);
        }
    }

    /// Remember the current positions as the computed result.
    pub fn store_computed(&mut self, mesh: &HalfEdgeMesh<I>) {
        self.computed = Some(self.vertices.iter().map(|&v| *mesh.position(v)).collect());
    }

    /// Write `initial + (computed - initial) * mix` for every vertex.
    ///
    /// Without a computed result the initial positions are written.
    pub fn apply_mix(&self, mesh: &mut HalfEdgeMesh<I>, mix: f64) {
        let computed = match &self.computed {
            Some(computed) => computed,
            None => return self.revert(mesh),
        };
        for ((&v, a), b) in self.vertices.iter().zip(&self.initial).zip(computed) {
            mesh.set_position(v, a + (b - a) * mix);
        }
    }
}

/// An operator over the loops of an edge selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeOperation {
    /// Follow the curvature of the crossing edge rings.
    Flow(FlowOptions),
    /// Fit one curve over each open loop.
    Curve(CurveOptions),
    /// Straighten each open loop between its ends.
    Linear(LinearOptions),
    /// Place single-edge loops between their outer neighbours.
    Straighten {
        /// Distance of each endpoint from its neighbour.
        distance: f64,
    },
    /// Refit the selected edges across each ring.
    RingCurve {
        /// Rail tension.
        tension: f64,
    },
}

impl EdgeOperation {
    fn validate(&self) -> Result<()> {
        match self {
            EdgeOperation::Flow(options) => {
                finite("tension", options.tension)?;
                if !(0.0..=180.0).contains(&options.min_angle) {
                    return Err(MeshError::invalid_param(
                        "min_angle",
                        options.min_angle,
                        "must be within [0, 180] degrees",
                    ));
                }
                if options.iterations == 0 {
                    return Err(MeshError::invalid_param("iterations", 0.0, "must be at least 1"));
                }
                Ok(())
            }
            EdgeOperation::Curve(options) => finite("tension", options.tension),
            EdgeOperation::Linear(_) => Ok(()),
            EdgeOperation::Straighten { distance } => {
                finite("distance", *distance)?;
                if *distance < 0.0 {
                    return Err(MeshError::invalid_param(
                        "distance",
                        *distance,
                        "must not be negative",
                    ));
                }
                Ok(())
            }
            EdgeOperation::RingCurve { tension } => finite("tension", *tension),
        }
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MeshError::invalid_param(name, value, "must be finite"))
    }
}

fn check_mix(mix: f64) -> Result<()> {
    if (0.0..=1.0).contains(&mix) {
        Ok(())
    } else {
        Err(MeshError::invalid_param("mix", mix, "must be within [0, 1]"))
    }
}

/// Session for the edge-loop operators.
#[derive(Debug, Clone)]
pub struct EdgeSession<I: MeshIndex = u32> {
    selection: Selection<I>,
    loops: LoopSet<I>,
    cache: PositionCache<I>,
    last: Option<(EdgeOperation, FitReport)>,
}

impl<I: MeshIndex> EdgeSession<I> {
    /// Build the loops of `selection` and snapshot their vertices.
    ///
    /// # Errors
    ///
    /// Fails like [`build_loops`]; the mesh is never touched.
    pub fn begin(mesh: &HalfEdgeMesh<I>, selection: &Selection<I>) -> Result<Self> {
        let loops = build_loops(mesh, selection.edges())?;
        let cache = PositionCache::capture(mesh, loops.affected_vertices());
        Ok(Self {
            selection: selection.clone(),
            loops,
            cache,
            last: None,
        })
    }

    /// Check if this session was built from `selection`.
    pub fn matches(&self, selection: &Selection<I>) -> bool {
        self.selection.edges() == selection.edges()
    }

    /// The loops being edited.
    pub fn loops(&self) -> &LoopSet<I> {
        &self.loops
    }

    /// Positions cached by the session.
    pub fn cache(&self) -> &PositionCache<I> {
        &self.cache
    }

    /// Apply `operation` and blend the result into the mesh by `mix`.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidParameter`] for a mix outside `[0, 1]` or out of
    /// range operator parameters. The mesh is left at its initial positions.
    pub fn apply(
        &mut self,
        mesh: &mut HalfEdgeMesh<I>,
        operation: &EdgeOperation,
        mix: f64,
    ) -> Result<FitReport> {
        self.cache.revert(mesh);
        if let Err(err) = check_mix(mix).and_then(|_| operation.validate()) {
            log::warn!("edge operation aborted: {}", err);
            return Err(err);
        }

        let cached = match &self.last {
            Some((last, report)) if last == operation && self.cache.computed().is_some() => {
                Some(report.clone())
            }
            _ => None,
        };
        let report = match cached {
            Some(report) => report,
            None => {
                let report = self.compute(mesh, operation);
                self.cache.store_computed(mesh);
                self.last = Some((operation.clone(), report.clone()));
                report
            }
        };

        self.cache.apply_mix(mesh, mix);
        Ok(report)
    }

    fn compute(&self, mesh: &mut HalfEdgeMesh<I>, operation: &EdgeOperation) -> FitReport {
        log::debug!("computing {:?} on {} loops", operation, self.loops.len());
        match operation {
            EdgeOperation::Flow(options) => self.loops.apply_flow(mesh, options),
            EdgeOperation::Curve(options) => self.loops.apply_curve(mesh, options),
            EdgeOperation::Linear(options) => self.loops.apply_linear(mesh, options),
            EdgeOperation::Straighten { distance } => self.loops.apply_straighten(mesh, *distance),
            EdgeOperation::RingCurve { tension } => self.loops.set_ring_curve(mesh, *tension),
        }
    }

    /// Restore the initial positions.
    pub fn revert(&self, mesh: &mut HalfEdgeMesh<I>) {
        self.cache.revert(mesh);
    }
}

/// Session for the vertex-chain curve.
#[derive(Debug, Clone)]
pub struct VertexCurveSession<I: MeshIndex = u32> {
    selection: Selection<I>,
    chain: VertexChain<I>,
    mode: DistanceMode,
    cache: PositionCache<I>,
    last: Option<(VertexCurveOptions, FitReport)>,
}

impl<I: MeshIndex> VertexCurveSession<I> {
    /// Connect the picked vertices of `selection` and snapshot the chain.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidSelection`] when fewer than two vertices are
    /// picked or they are not connected.
    pub fn begin(
        mesh: &HalfEdgeMesh<I>,
        selection: &Selection<I>,
        options: &VertexCurveOptions,
    ) -> Result<Self> {
        let chain = VertexChain::build(mesh, &selection.picked_vertices(), options.distance_mode)?;
        let cache = PositionCache::capture(mesh, chain.vertices().to_vec());
        Ok(Self {
            selection: selection.clone(),
            chain,
            mode: options.distance_mode,
            cache,
            last: None,
        })
    }

    /// Check if this session was built from `selection`.
    pub fn matches(&self, selection: &Selection<I>) -> bool {
        self.selection.picked_vertices() == selection.picked_vertices()
    }

    /// The vertex chain being edited.
    pub fn chain(&self) -> &VertexChain<I> {
        &self.chain
    }

    /// Positions cached by the session.
    pub fn cache(&self) -> &PositionCache<I> {
        &self.cache
    }

    /// Fit the chain with `options` and blend the result in by `mix`.
    ///
    /// A changed distance mode rebuilds the chain from the initial
    /// positions.
    ///
    /// # Errors
    ///
    /// Invalid parameters, or a chain that can no longer be built. The mesh
    /// is left at its initial positions.
    pub fn apply(
        &mut self,
        mesh: &mut HalfEdgeMesh<I>,
        options: &VertexCurveOptions,
        mix: f64,
    ) -> Result<FitReport> {
        self.cache.revert(mesh);
        if let Err(err) = check_mix(mix).and_then(|_| finite("tension", options.tension)) {
            log::warn!("vertex curve aborted: {}", err);
            return Err(err);
        }

        let cached = match &self.last {
            Some((last, report)) if last == options && self.cache.computed().is_some() => {
                Some(report.clone())
            }
            _ => None,
        };
        let report = match cached {
            Some(report) => report,
            None => {
                if options.distance_mode != self.mode {
                    self.chain =
                        VertexChain::build(mesh, self.chain.picks(), options.distance_mode)?;
                    self.mode = options.distance_mode;
                    self.cache = PositionCache::capture(mesh, self.chain.vertices().to_vec());
                }
                let report = self.chain.fit(mesh, options);
                self.cache.store_computed(mesh);
                self.last = Some((options.clone(), report.clone()));
                report
            }
        };

        self.cache.apply_mix(mesh, mix);
        Ok(report)
    }

    /// Restore the initial positions.
    pub fn revert(&self, mesh: &mut HalfEdgeMesh<I>) {
        self.cache.revert(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;

    /// `n` x `n` quads with a ridge along row `j == 1` and `j == 3`.
    fn create_ridged_grid(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                let z = if j == 1 || j == 3 { 0.2 } else { 0.0 };
                vertices.push(Point3::new(i as f64, j as f64, z));
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

    fn row_selection(mesh: &HalfEdgeMesh, n: usize, j: usize) -> Selection {
        let pairs: Vec<(usize, usize)> = (0..n)
            .map(|i| (j * (n + 1) + i, j * (n + 1) + i + 1))
            .collect();
        Selection::from_vertex_pairs(mesh, &pairs).unwrap()
    }

    fn positions(mesh: &HalfEdgeMesh) -> Vec<Point3<f64>> {
        mesh.vertex_ids().map(|v| *mesh.position(v)).collect()
    }

    #[test]
    fn test_mix_zero_and_one() {
        let n = 4;
        let mut mesh = create_ridged_grid(n);
        let original = positions(&mesh);
        let selection = row_selection(&mesh, n, 2);
        let mut session = EdgeSession::begin(&mesh, &selection).unwrap();
        let flow = EdgeOperation::Flow(FlowOptions::default().with_tension(1.0));

        session.apply(&mut mesh, &flow, 1.0).unwrap();
        let full = positions(&mesh);
        assert_ne!(full, original);
        assert_eq!(session.cache().computed().unwrap().len(), session.cache().vertices().len());

        session.apply(&mut mesh, &flow, 0.0).unwrap();
        for (p, q) in positions(&mesh).iter().zip(&original) {
            assert!((p - q).norm() < 1e-12);
        }

        session.apply(&mut mesh, &flow, 1.0).unwrap();
        for (p, q) in positions(&mesh).iter().zip(&full) {
            assert!((p - q).norm() < 1e-12);
        }
    }

    #[test]
    fn test_mix_interpolates_cached_result() {
        let n = 4;
        let mut mesh = create_ridged_grid(n);
        let selection = row_selection(&mesh, n, 2);
        let mut session = EdgeSession::begin(&mesh, &selection).unwrap();
        let flow = EdgeOperation::Flow(FlowOptions::default().with_tension(1.0));

        session.apply(&mut mesh, &flow, 1.0).unwrap();
        let center = VertexId::new(2 * (n + 1) + 2);
        let full_z = mesh.position(center).z;

        session.apply(&mut mesh, &flow, 0.5).unwrap();
        assert!((mesh.position(center).z - full_z * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_changed_parameters_recompute_from_initial() {
        let n = 4;
        let mut mesh = create_ridged_grid(n);
        let selection = row_selection(&mesh, n, 2);
        let mut session = EdgeSession::begin(&mesh, &selection).unwrap();
        let center = VertexId::new(2 * (n + 1) + 2);

        let once = EdgeOperation::Flow(FlowOptions::default().with_tension(1.0));
        session.apply(&mut mesh, &once, 1.0).unwrap();
        let z_once = mesh.position(center).z;

        // Applying again does not compound: the session restarts from the snapshot.
        session.apply(&mut mesh, &once, 1.0).unwrap();
        assert!((mesh.position(center).z - z_once).abs() < 1e-12);

        let stronger = EdgeOperation::Flow(FlowOptions::default().with_tension(2.0));
        session.apply(&mut mesh, &stronger, 1.0).unwrap();
        assert!(mesh.position(center).z > z_once);
    }

    #[test]
    fn test_invalid_parameters_revert() {
        let n = 4;
        let mut mesh = create_ridged_grid(n);
        let original = positions(&mesh);
        let selection = row_selection(&mesh, n, 2);
        let mut session = EdgeSession::begin(&mesh, &selection).unwrap();

        let linear = EdgeOperation::Linear(LinearOptions::default());
        session.apply(&mut mesh, &linear, 1.0).unwrap();

        let result = session.apply(&mut mesh, &linear, 1.5);
        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
        assert_eq!(positions(&mesh), original);

        let bad = EdgeOperation::Straighten { distance: -1.0 };
        assert!(session.apply(&mut mesh, &bad, 1.0).is_err());
        assert_eq!(positions(&mesh), original);
    }

    #[test]
    fn test_session_matches_selection() {
        let n = 4;
        let mesh = create_ridged_grid(n);
        let selection = row_selection(&mesh, n, 2);
        let session = EdgeSession::begin(&mesh, &selection).unwrap();

        assert!(session.matches(&selection));
        assert!(!session.matches(&row_selection(&mesh, n, 1)));
        assert!(EdgeSession::begin(&mesh, &Selection::new()).is_err());
    }

    #[test]
    fn test_vertex_curve_session() {
        let n = 4;
        let mut mesh = create_ridged_grid(n);
        let original = positions(&mesh);
        let picks = [VertexId::new(10), VertexId::new(14)];
        let selection = Selection::from_picks(picks);

        let options = VertexCurveOptions::default();
        let mut session = VertexCurveSession::begin(&mesh, &selection, &options).unwrap();
        assert!(session.matches(&selection));
        assert_eq!(session.chain().vertices().len(), 5);

        session.apply(&mut mesh, &options, 1.0).unwrap();
        assert!(mesh.position(VertexId::new(12)).z > 1.9);

        session.apply(&mut mesh, &options, 0.0).unwrap();
        assert_eq!(positions(&mesh), original);

        let topology = options.clone().with_distance_mode(DistanceMode::Topology);
        session.apply(&mut mesh, &topology, 1.0).unwrap();
        assert_eq!(*session.chain().vertices().last().unwrap(), picks[1]);
    }

    #[test]
    fn test_vertex_curve_session_needs_two_picks() {
        let mesh = create_ridged_grid(2);
        let selection = Selection::from_picks([VertexId::new(0)]);
        assert!(matches!(
            VertexCurveSession::begin(&mesh, &selection, &VertexCurveOptions::default()),
            Err(MeshError::InvalidSelection(_))
        ));
    }
}
