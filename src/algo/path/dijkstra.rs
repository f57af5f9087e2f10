//! Dijkstra's algorithm over the mesh edge graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::PathResult;

/// How edge weights are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMode {
    /// Euclidean length of each edge.
    #[default]
    EdgeLength,
    /// Every edge counts as one step.
    Topology,
}

/// Options for the shortest-path search.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    /// Edge weighting.
    pub mode: DistanceMode,

    /// Target vertex for early termination.
    /// If set, the search stops once this vertex is settled.
    pub target: Option<usize>,
}

impl PathOptions {
    /// Set the distance mode.
    pub fn with_mode(mut self, mode: DistanceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set target vertex for early termination.
    pub fn with_target(mut self, target: usize) -> Self {
        self.target = Some(target);
        self
    }
}

/// Entry in the priority queue.
#[derive(Debug, Clone)]
struct QueueEntry {
    vertex: usize,
    distance: f64,
    /// Discovery order, breaks ties between equal distances.
    sequence: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Compute shortest edge paths from `source` to every vertex.
///
/// Each edge is relaxed at most once, from whichever endpoint is settled
/// first. Vertices at equal distance are settled in discovery order, so the
/// result is deterministic for a given mesh.
pub fn find_path<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    source: VertexId<I>,
    options: &PathOptions,
) -> PathResult<I> {
    let n = mesh.num_vertices();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<(EdgeId<I>, VertexId<I>)>> = vec![None; n];

    if source.index() >= n {
        return PathResult::new(distances, predecessors, source);
    }

    let mut edge_visited = vec![false; mesh.num_edges()];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut sequence = 0;

    distances[source.index()] = 0.0;
    heap.push(QueueEntry {
        vertex: source.index(),
        distance: 0.0,
        sequence,
    });

    while let Some(entry) = heap.pop() {
        let u = entry.vertex;
        if settled[u] || entry.distance > distances[u] {
            continue;
        }
        settled[u] = true;

        if options.target == Some(u) {
            break;
        }

        let u_vertex: VertexId<I> = VertexId::new(u);
        for he in mesh.vertex_halfedges(u_vertex) {
            let e = he.edge();
            if edge_visited[e.index()] {
                continue;
            }
            edge_visited[e.index()] = true;

            let weight = match options.mode {
                DistanceMode::EdgeLength => mesh.edge_length(e),
                DistanceMode::Topology => 1.0,
            };
            let v = mesh.dest(he).index();
            let new_dist = entry.distance + weight;

            if new_dist < distances[v] {
                distances[v] = new_dist;
                predecessors[v] = Some((e, u_vertex));
                sequence += 1;
                heap.push(QueueEntry {
                    vertex: v,
                    distance: new_dist,
                    sequence,
                });
            }
        }
    }

    PathResult::new(distances, predecessors, source)
}
