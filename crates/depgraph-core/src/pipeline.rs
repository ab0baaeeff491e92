//! End-to-end analysis of one graph.
//!
//! ```text
//! Graph
//!   ↓  scc::compute
//! SccResult (components, component_of, condensation)
//!   ↓  topo::sort(condensation)
//! component order ──→ topo::expand_order → vertex order
//!   ↓  paths::shortest_paths(condensation, component_of[source])
//!   ↓  paths::longest_path(condensation)
//! Analysis
//! ```
//!
//! All stages share one [`Metrics`]. Distances and paths are expressed in
//! condensation (component) ids.

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::metrics::Metrics;
use crate::paths::{self, CriticalPath, ShortestPaths};
use crate::scc::{self, SccResult};
use crate::topo;

/// Everything computed for one graph and source vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub scc: SccResult,
    /// Topological order of the condensation.
    pub component_order: Vec<usize>,
    /// Original vertices, grouped by component in `component_order`.
    pub vertex_order: Vec<usize>,
    pub source: usize,
    pub source_component: usize,
    /// Shortest paths on the condensation from `source_component`.
    pub shortest: ShortestPaths,
    /// Critical path on the condensation. Always `Some` here: a valid source
    /// means the condensation has at least one component.
    pub critical: Option<CriticalPath>,
}

impl Analysis {
    /// Last component in topological order, if any.
    #[must_use]
    pub fn last_component(&self) -> Option<usize> {
        self.component_order.last().copied()
    }

    /// Shortest path from the source component to the last component.
    #[must_use]
    pub fn path_to_last_component(&self) -> Vec<usize> {
        self.last_component()
            .map(|c| self.shortest.build_path(c))
            .unwrap_or_default()
    }

    /// Serializable view for reporting layers.
    #[must_use]
    pub fn report(&self) -> AnalysisReport<'_> {
        AnalysisReport {
            summary: self.scc.summary(),
            components: &self.scc.components,
            component_of: &self.scc.component_of,
            component_order: &self.component_order,
            vertex_order: &self.vertex_order,
            source: self.source,
            source_component: self.source_component,
            shortest: &self.shortest,
            path_to_last_component: self.path_to_last_component(),
            critical: self.critical.as_ref(),
        }
    }
}

/// Borrowed, serializable projection of an [`Analysis`].
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub summary: scc::SccSummary,
    pub components: &'a [Vec<usize>],
    pub component_of: &'a [usize],
    pub component_order: &'a [usize],
    pub vertex_order: &'a [usize],
    pub source: usize,
    pub source_component: usize,
    pub shortest: &'a ShortestPaths,
    pub path_to_last_component: Vec<usize>,
    pub critical: Option<&'a CriticalPath>,
}

/// Run every stage on `graph` with shortest paths from `source`.
///
/// # Errors
///
/// - [`GraphError::OutOfRange`] if `source` is not a vertex of `graph`.
///   An empty graph has no valid source and always fails here.
/// - [`GraphError::CycleDetected`] if the condensation is not acyclic,
///   which indicates a defect in the SCC stage and aborts the run.
#[instrument(skip(graph, metrics), fields(vertices = graph.vertex_count()))]
pub fn analyze(graph: &Graph, source: usize, metrics: &Metrics) -> Result<Analysis, GraphError> {
    graph.check_vertex(source)?;

    let scc = scc::compute(graph, metrics);
    let component_order = topo::sort(&scc.condensation, metrics)?;
    let vertex_order = topo::expand_order(&component_order, &scc.components);

    let source_component = scc.component_of[source];
    let shortest =
        paths::shortest_paths(&scc.condensation, source_component, &component_order, metrics)?;
    let critical = paths::longest_path(&scc.condensation, &component_order, metrics)?;

    info!(
        components = scc.component_count(),
        source_component,
        critical_length = critical.as_ref().map(|c| c.length),
        "analysis complete"
    );

    Ok(Analysis {
        scc,
        component_order,
        vertex_order,
        source,
        source_component,
        shortest,
        critical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_with_tail() -> Graph {
        let mut g = Graph::new(5);
        for (from, to) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)] {
            g.add_edge(from, to, 1.0).expect("valid");
        }
        g
    }

    #[test]
    fn analyze_cycle_with_tail() {
        let metrics = Metrics::new();
        let analysis = analyze(&cycle_with_tail(), 0, &metrics).expect("analysis");

        assert_eq!(analysis.scc.component_count(), 3);
        assert_eq!(analysis.component_order.len(), 3);
        assert_eq!(analysis.vertex_order, vec![2, 1, 0, 3, 4]);
        assert_eq!(analysis.source_component, 2);

        // cycle -> {3} -> {4}, unit weights.
        let last = analysis.last_component().expect("non-empty");
        assert_eq!(analysis.shortest.distance(last), Some(2.0));
        assert_eq!(analysis.path_to_last_component(), vec![2, 1, 0]);

        let critical = analysis.critical.as_ref().expect("non-empty DAG");
        assert_eq!(critical.path, vec![2, 1, 0]);
        assert!((critical.length - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn analyze_records_every_stage() {
        let metrics = Metrics::new();
        analyze(&cycle_with_tail(), 0, &metrics).expect("analysis");
        let timings = metrics.timings();
        for timer in [
            scc::TIMER_SCC,
            topo::TIMER_TOPO_SORT,
            paths::TIMER_SHORTEST,
            paths::TIMER_LONGEST,
        ] {
            assert!(timings.contains_key(timer), "missing timer {timer}");
        }
        assert_eq!(metrics.counter(scc::COUNTER_DFS_VISITS), 5);
        assert_eq!(metrics.counter(topo::COUNTER_QUEUE_POP), 3);
    }

    #[test]
    fn analyze_rejects_out_of_range_source() {
        let err = analyze(&cycle_with_tail(), 5, &Metrics::new()).expect_err("bad source");
        assert!(matches!(err, GraphError::OutOfRange { vertex: 5, .. }));
    }

    #[test]
    fn analyze_rejects_empty_graph() {
        let err = analyze(&Graph::new(0), 0, &Metrics::new()).expect_err("no vertices");
        assert!(matches!(
            err,
            GraphError::OutOfRange {
                vertex: 0,
                vertex_count: 0
            }
        ));
        assert_eq!(err.code().code(), "E1002");
    }

    #[test]
    fn report_serializes_unreachable_as_null() {
        // 0 -> 1 and an isolated vertex 2.
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 4.0).expect("valid");
        let analysis = analyze(&g, 0, &Metrics::new()).expect("analysis");
        let json = serde_json::to_value(analysis.report()).expect("serializable");

        let distances = json["shortest"]["distances"].as_array().expect("array");
        assert_eq!(distances.len(), 3);
        assert_eq!(distances.iter().filter(|d| d.is_null()).count(), 1);
        assert_eq!(json["summary"]["component_count"], 3);
        assert_eq!(json["critical"]["length"], 4.0);
    }
}
