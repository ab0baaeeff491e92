//! Single-source shortest paths and the critical (longest) path on a DAG.
//!
//! # Overview
//!
//! Both passes relax edges vertex by vertex in a precomputed topological
//! order. Every predecessor of a vertex has been finalized by the time the
//! vertex is reached, so one forward pass is enough and edge weights may be
//! negative. The graph must be acyclic; run these on the condensation from
//! [`crate::scc::compute`], ordered by [`crate::topo::sort`].
//!
//! | Pass            | Initial distance                        | Improves when |
//! |-----------------|-----------------------------------------|---------------|
//! | shortest        | `+∞`, source `0`                        | `d[v] + w < d[w]` |
//! | longest (critical) | `-∞`, every zero in-degree vertex `0` | `d[v] + w > d[w]` |
//!
//! Vertices still at their pass's initial infinity when reached are skipped:
//! they have nothing to propagate. An opposite infinity produced by overflow
//! is an ordinary distance and keeps propagating.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::metrics::Metrics;

pub const COUNTER_RELAXATIONS: &str = "dag.relaxations";
pub const TIMER_SHORTEST: &str = "dag.shortest";
pub const TIMER_LONGEST: &str = "dag.longest";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Distances and predecessors from a fixed source vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPaths {
    source: usize,
    #[serde(serialize_with = "serialize_distances")]
    distances: Vec<f64>,
    predecessors: Vec<Option<usize>>,
}

impl ShortestPaths {
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Raw distance table; unreachable vertices hold `f64::INFINITY`.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    #[must_use]
    pub fn predecessors(&self) -> &[Option<usize>] {
        &self.predecessors
    }

    /// Distance to `vertex`, or `None` if it is unreachable or out of range.
    #[must_use]
    pub fn distance(&self, vertex: usize) -> Option<f64> {
        self.distances
            .get(vertex)
            .copied()
            .filter(|d| *d != f64::INFINITY)
    }

    #[must_use]
    pub fn predecessor(&self, vertex: usize) -> Option<usize> {
        self.predecessors.get(vertex).copied().flatten()
    }

    #[must_use]
    pub fn is_reachable(&self, vertex: usize) -> bool {
        self.distance(vertex).is_some()
    }

    /// Shortest path from the source to `target`, source first.
    ///
    /// Empty when `target` is unreachable or out of range.
    #[must_use]
    pub fn build_path(&self, target: usize) -> Vec<usize> {
        if !self.is_reachable(target) {
            return Vec::new();
        }

        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            match self.predecessor(current) {
                Some(prev) => {
                    current = prev;
                    path.push(current);
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}

/// The maximum-weight path across a whole DAG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPath {
    /// Sum of edge weights along `path`.
    pub length: f64,
    /// Vertices from a zero in-degree start to the terminal, in order.
    pub path: Vec<usize>,
}

impl CriticalPath {
    #[must_use]
    pub fn start(&self) -> Option<usize> {
        self.path.first().copied()
    }

    #[must_use]
    pub fn terminal(&self) -> Option<usize> {
        self.path.last().copied()
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Shortest distances from `source` over `dag`, relaxing in `order`.
///
/// Counts each improving relaxation under [`COUNTER_RELAXATIONS`] and the
/// elapsed time under [`TIMER_SHORTEST`].
///
/// # Errors
///
/// Returns [`GraphError::OutOfRange`] if `source` or any entry of `order`
/// is not a vertex of `dag`.
#[instrument(skip(dag, order, metrics), fields(vertices = dag.vertex_count()))]
pub fn shortest_paths(
    dag: &Graph,
    source: usize,
    order: &[usize],
    metrics: &Metrics,
) -> Result<ShortestPaths, GraphError> {
    dag.check_vertex(source)?;
    check_order(dag, order)?;

    let n = dag.vertex_count();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors = vec![None; n];
    distances[source] = 0.0;

    {
        let _timer = metrics.time(TIMER_SHORTEST);
        let relaxations = relax(
            dag,
            order,
            &mut distances,
            &mut predecessors,
            f64::INFINITY,
            |candidate, best| candidate < best,
        );
        metrics.add_to_counter(COUNTER_RELAXATIONS, relaxations);
    }

    debug!(
        reachable = distances.iter().filter(|d| **d != f64::INFINITY).count(),
        "shortest paths computed"
    );

    Ok(ShortestPaths {
        source,
        distances,
        predecessors,
    })
}

/// Longest path over the whole of `dag`, relaxing in `order`.
///
/// Every zero in-degree vertex starts at distance `0`. The terminal is the
/// lowest-id vertex holding the maximum distance; the path is recovered by
/// following predecessors back to a vertex that has none.
///
/// Returns `Ok(None)` for an empty DAG. Counts improving relaxations under
/// [`COUNTER_RELAXATIONS`] and elapsed time under [`TIMER_LONGEST`].
///
/// # Errors
///
/// Returns [`GraphError::OutOfRange`] if any entry of `order` is not a
/// vertex of `dag`.
#[instrument(skip_all, fields(vertices = dag.vertex_count()))]
pub fn longest_path(
    dag: &Graph,
    order: &[usize],
    metrics: &Metrics,
) -> Result<Option<CriticalPath>, GraphError> {
    check_order(dag, order)?;

    let n = dag.vertex_count();
    let mut distances = vec![f64::NEG_INFINITY; n];
    let mut predecessors = vec![None; n];
    for (v, degree) in dag.in_degrees().into_iter().enumerate() {
        if degree == 0 {
            distances[v] = 0.0;
        }
    }

    {
        let _timer = metrics.time(TIMER_LONGEST);
        let relaxations = relax(
            dag,
            order,
            &mut distances,
            &mut predecessors,
            f64::NEG_INFINITY,
            |candidate, best| candidate > best,
        );
        metrics.add_to_counter(COUNTER_RELAXATIONS, relaxations);
    }

    let mut terminal: Option<usize> = None;
    let mut best = f64::NEG_INFINITY;
    for (v, &d) in distances.iter().enumerate() {
        if d > best {
            best = d;
            terminal = Some(v);
        }
    }

    let Some(terminal) = terminal else {
        debug!("no critical path: DAG has no reachable vertices");
        return Ok(None);
    };

    let mut path = vec![terminal];
    let mut current = terminal;
    while let Some(prev) = predecessors[current] {
        current = prev;
        path.push(current);
    }
    path.reverse();

    debug!(length = best, vertices = path.len(), "critical path computed");
    Ok(Some(CriticalPath { length: best, path }))
}

/// One forward relaxation pass; returns the number of improving relaxations.
///
/// Vertices whose distance equals `unreached` are skipped.
#[allow(clippy::float_cmp)]
fn relax(
    dag: &Graph,
    order: &[usize],
    distances: &mut [f64],
    predecessors: &mut [Option<usize>],
    unreached: f64,
    improves: impl Fn(f64, f64) -> bool,
) -> u64 {
    let mut relaxations = 0;
    for &v in order {
        let dv = distances[v];
        if dv == unreached {
            continue;
        }
        for edge in dag.out_edges(v) {
            let candidate = dv + edge.weight;
            if improves(candidate, distances[edge.to]) {
                distances[edge.to] = candidate;
                predecessors[edge.to] = Some(v);
                relaxations += 1;
            }
        }
    }
    relaxations
}

fn check_order(dag: &Graph, order: &[usize]) -> Result<(), GraphError> {
    order.iter().try_for_each(|&v| dag.check_vertex(v))
}

#[allow(clippy::ptr_arg)]
fn serialize_distances<S: serde::Serializer>(
    distances: &Vec<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    // JSON has no infinity; unreachable vertices serialize as null.
    serializer.collect_seq(distances.iter().map(|d| d.is_finite().then_some(*d)))
}
