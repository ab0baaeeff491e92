//! Strongly connected components (Tarjan) and the condensation DAG.
//!
//! # Algorithm
//!
//! Vertices are visited in ascending id order. Each newly entered vertex gets
//! a discovery index and an initial low-link equal to it, and is pushed onto
//! the active stack. An edge to an unvisited vertex descends; an edge to a
//! vertex still on the active stack lowers the low-link to that vertex's
//! discovery index. When a vertex finishes with `low == index` it roots a
//! component: the active stack is popped down to and including it.
//!
//! The depth-first walk keeps its own frame stack of
//! `(vertex, next edge position)` pairs instead of recursing, so a path of
//! `n` vertices needs `O(n)` heap and constant call stack.
//!
//! # Ordering
//!
//! Components are numbered in the order they close. That is a *reverse*
//! topological order of the condensation, so callers must sort the
//! condensation rather than rely on component numbering.

#![allow(clippy::module_name_repetitions)]

use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::Graph;
use crate::metrics::Metrics;

pub const COUNTER_DFS_VISITS: &str = "scc.dfs_visits";
pub const COUNTER_DFS_EDGES: &str = "scc.dfs_edges";
pub const TIMER_SCC: &str = "scc.total";

const UNVISITED: usize = usize::MAX;

/// Output of [`compute`].
#[derive(Debug, Clone, PartialEq)]
pub struct SccResult {
    /// Member vertices of each component, in pop order.
    pub components: Vec<Vec<usize>>,
    /// `component_of[v]` is the index of the component containing `v`.
    pub component_of: Vec<usize>,
    /// One vertex per component; one edge per original inter-component edge.
    pub condensation: Graph,
}

impl SccResult {
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Component containing `vertex`, or `None` if it is out of range.
    #[must_use]
    pub fn component_of(&self, vertex: usize) -> Option<usize> {
        self.component_of.get(vertex).copied()
    }

    /// Indices of components with more than one member.
    #[must_use]
    pub fn cyclic_components(&self) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, members)| members.len() > 1)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Summary view for reporting.
    #[must_use]
    pub fn summary(&self) -> SccSummary {
        SccSummary {
            component_count: self.component_count(),
            cyclic_component_count: self.cyclic_components().len(),
            condensation_edge_count: self.condensation.edge_count(),
            largest_component: self.components.iter().map(Vec::len).max().unwrap_or(0),
        }
    }
}

/// Headline numbers for an [`SccResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SccSummary {
    pub component_count: usize,
    pub cyclic_component_count: usize,
    pub condensation_edge_count: usize,
    pub largest_component: usize,
}

/// Partition `graph` into strongly connected components and build its
/// condensation.
///
/// Records [`COUNTER_DFS_VISITS`] once per vertex entered,
/// [`COUNTER_DFS_EDGES`] once per edge examined, and the elapsed time of
/// the depth-first search under [`TIMER_SCC`]. Building the condensation
/// is not timed.
#[must_use]
#[instrument(skip_all, fields(vertices = graph.vertex_count(), edges = graph.edge_count()))]
pub fn compute(graph: &Graph, metrics: &Metrics) -> SccResult {
    let tarjan = search(graph, metrics);

    metrics.add_to_counter(COUNTER_DFS_VISITS, tarjan.visits);
    metrics.add_to_counter(COUNTER_DFS_EDGES, tarjan.edges_examined);

    let condensation = build_condensation(graph, &tarjan.component_of, tarjan.components.len());
    debug!(
        components = tarjan.components.len(),
        condensation_edges = condensation.edge_count(),
        "strongly connected components computed"
    );

    SccResult {
        components: tarjan.components,
        component_of: tarjan.component_of,
        condensation,
    }
}

/// Timed depth-first search over every root in ascending id order.
fn search<'g>(graph: &'g Graph, metrics: &Metrics) -> Tarjan<'g> {
    let _timer = metrics.time(TIMER_SCC);
    let mut tarjan = Tarjan::new(graph);
    for root in 0..graph.vertex_count() {
        if tarjan.index[root] == UNVISITED {
            tarjan.strong_connect(root);
        }
    }
    tarjan
}

struct Tarjan<'g> {
    graph: &'g Graph,
    next_index: usize,
    index: Vec<usize>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    component_of: Vec<usize>,
    components: Vec<Vec<usize>>,
    visits: u64,
    edges_examined: u64,
}

impl<'g> Tarjan<'g> {
    fn new(graph: &'g Graph) -> Self {
        let n = graph.vertex_count();
        Self {
            graph,
            next_index: 0,
            index: vec![UNVISITED; n],
            low_link: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            component_of: vec![UNVISITED; n],
            components: Vec::new(),
            visits: 0,
            edges_examined: 0,
        }
    }

    fn enter(&mut self, v: usize) {
        self.visits += 1;
        self.index[v] = self.next_index;
        self.low_link[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn strong_connect(&mut self, root: usize) {
        let graph = self.graph;
        // Each frame is (vertex, position of the next outgoing edge to examine).
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        self.enter(root);

        while let Some(frame) = frames.last_mut() {
            let (v, pos) = *frame;
            let edges = graph.out_edges(v);

            if let Some(edge) = edges.get(pos) {
                frame.1 += 1;
                self.edges_examined += 1;
                let w = edge.to;
                if self.index[w] == UNVISITED {
                    self.enter(w);
                    frames.push((w, 0));
                } else if self.on_stack[w] {
                    self.low_link[v] = self.low_link[v].min(self.index[w]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                self.low_link[parent] = self.low_link[parent].min(self.low_link[v]);
            }
            if self.low_link[v] == self.index[v] {
                self.close_component(v);
            }
        }
    }

    fn close_component(&mut self, root: usize) {
        let id = self.components.len();
        let mut members = Vec::new();
        while let Some(w) = self.stack.pop() {
            self.on_stack[w] = false;
            self.component_of[w] = id;
            members.push(w);
            if w == root {
                break;
            }
        }
        self.components.push(members);
    }
}

fn build_condensation(graph: &Graph, component_of: &[usize], component_count: usize) -> Graph {
    let mut condensation = Graph::new(component_count);
    for edge in graph.edges() {
        let from = component_of[edge.from];
        let to = component_of[edge.to];
        if from != to {
            // Both ends are valid component ids and the weight was already
            // validated by the source graph.
            condensation.push_unchecked(from, to, edge.weight);
        }
    }
    condensation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize, edges: &[(usize, usize)]) -> Graph {
        let mut g = Graph::new(n);
        for &(from, to) in edges {
            g.add_edge(from, to, 1.0).expect("valid edge");
        }
        g
    }

    fn sorted_components(result: &SccResult) -> Vec<Vec<usize>> {
        let mut components: Vec<Vec<usize>> = result
            .components
            .iter()
            .map(|c| {
                let mut c = c.clone();
                c.sort_unstable();
                c
            })
            .collect();
        components.sort();
        components
    }

    #[test]
    fn empty_graph_has_no_components() {
        let result = compute(&Graph::new(0), &Metrics::new());
        assert!(result.components.is_empty());
        assert_eq!(result.condensation.vertex_count(), 0);
    }

    #[test]
    fn cycle_with_tail_yields_three_components() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
        let result = compute(&g, &Metrics::new());

        assert_eq!(result.component_count(), 3);
        assert_eq!(result.condensation.vertex_count(), 3);
        assert_eq!(sorted_components(&result), vec![vec![0, 1, 2], vec![3], vec![4]]);
        assert_eq!(result.cyclic_components().len(), 1);
    }

    #[test]
    fn components_close_in_reverse_topological_order() {
        // 0 -> 1 -> 2: the sink closes first.
        let g = graph(3, &[(0, 1), (1, 2)]);
        let result = compute(&g, &Metrics::new());
        assert_eq!(result.components, vec![vec![2], vec![1], vec![0]]);
        assert_eq!(result.component_of, vec![2, 1, 0]);
    }

    #[test]
    fn members_are_in_pop_order() {
        let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        let result = compute(&g, &Metrics::new());
        assert_eq!(result.components, vec![vec![2, 1, 0]]);
    }

    #[test]
    fn condensation_keeps_parallel_edges_and_weights() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1.0).expect("valid");
        g.add_edge(1, 0, 1.0).expect("valid");
        g.add_edge(0, 2, 4.0).expect("valid");
        g.add_edge(1, 2, 7.0).expect("valid");
        g.add_edge(2, 3, 2.5).expect("valid");

        let result = compute(&g, &Metrics::new());
        let cycle = result.component_of[0];
        let two = result.component_of[2];
        let weights: Vec<f64> = result
            .condensation
            .edges_from(cycle)
            .expect("component in range")
            .iter()
            .filter(|e| e.to == two)
            .map(|e| e.weight)
            .collect();

        assert_eq!(weights, vec![4.0, 7.0]);
        assert_eq!(result.condensation.edge_count(), 3);
    }

    #[test]
    fn self_loop_is_single_vertex_component_without_condensation_edge() {
        let g = graph(2, &[(0, 0), (0, 1)]);
        let result = compute(&g, &Metrics::new());
        assert_eq!(result.component_count(), 2);
        assert_eq!(result.condensation.edge_count(), 1);
        assert!(result.cyclic_components().is_empty());
    }

    #[test]
    fn counters_match_hand_trace() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
        let metrics = Metrics::new();
        let _ = compute(&g, &metrics);

        assert_eq!(metrics.counter(COUNTER_DFS_VISITS), 5);
        assert_eq!(metrics.counter(COUNTER_DFS_EDGES), 5);
        assert!(metrics.timings().contains_key(TIMER_SCC));
    }

    #[test]
    fn timer_stops_before_condensation_is_built() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
        let metrics = Metrics::new();
        let tarjan = search(&g, &metrics);
        let searched = metrics.time_of(TIMER_SCC);
        assert!(metrics.timings().contains_key(TIMER_SCC));

        let condensation = build_condensation(&g, &tarjan.component_of, tarjan.components.len());
        assert_eq!(condensation.vertex_count(), 3);
        assert_eq!(metrics.time_of(TIMER_SCC), searched);
        assert_eq!(metrics.timings().len(), 1);
    }

    #[test]
    fn summary_reports_largest_component() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 0), (3, 4)]);
        let summary = compute(&g, &Metrics::new()).summary();
        assert_eq!(summary.component_count, 3);
        assert_eq!(summary.cyclic_component_count, 1);
        assert_eq!(summary.largest_component, 3);
        assert_eq!(summary.condensation_edge_count, 1);
    }

    #[test]
    fn deep_path_does_not_overflow_the_stack() {
        let n = 200_000;
        let mut g = Graph::new(n);
        for v in 0..n - 1 {
            g.add_edge(v, v + 1, 1.0).expect("valid");
        }
        g.add_edge(n - 1, 0, 1.0).expect("valid");

        let result = compute(&g, &Metrics::new());
        assert_eq!(result.component_count(), 1);
        assert_eq!(result.components[0].len(), n);
    }
}
