//! Kahn's topological sort and component-order expansion.

use std::collections::VecDeque;

use tracing::{debug, instrument, warn};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::metrics::Metrics;

pub const COUNTER_QUEUE_PUSH: &str = "topo.queue_push";
pub const COUNTER_QUEUE_POP: &str = "topo.queue_pop";
pub const TIMER_TOPO_SORT: &str = "topo.total";

/// Order the vertices of `dag` so every edge points forward.
///
/// The FIFO queue is seeded with zero in-degree vertices in ascending id
/// order; vertices released later are enqueued in edge insertion order, so
/// the result is deterministic for a given graph.
///
/// Records [`COUNTER_QUEUE_PUSH`] per enqueue, [`COUNTER_QUEUE_POP`] per
/// dequeue, and elapsed time under [`TIMER_TOPO_SORT`].
///
/// # Errors
///
/// Returns [`GraphError::CycleDetected`] if `dag` contains a cycle. A partial
/// order is never returned.
#[instrument(skip_all, fields(vertices = dag.vertex_count()))]
pub fn sort(dag: &Graph, metrics: &Metrics) -> Result<Vec<usize>, GraphError> {
    let _timer = metrics.time(TIMER_TOPO_SORT);

    let n = dag.vertex_count();
    let mut indegree = dag.in_degrees();
    let mut pushes: u64 = 0;
    let mut pops: u64 = 0;

    let mut queue: VecDeque<usize> = VecDeque::new();
    for (v, &degree) in indegree.iter().enumerate() {
        if degree == 0 {
            queue.push_back(v);
            pushes += 1;
        }
    }

    let mut order = Vec::with_capacity(n);
    while let Some(v) = queue.pop_front() {
        pops += 1;
        order.push(v);
        for edge in dag.out_edges(v) {
            indegree[edge.to] -= 1;
            if indegree[edge.to] == 0 {
                queue.push_back(edge.to);
                pushes += 1;
            }
        }
    }

    metrics.add_to_counter(COUNTER_QUEUE_PUSH, pushes);
    metrics.add_to_counter(COUNTER_QUEUE_POP, pops);

    if order.len() != n {
        warn!(sorted = order.len(), total = n, "cycle detected during topological sort");
        return Err(GraphError::CycleDetected {
            sorted: order.len(),
            total: n,
        });
    }

    debug!(len = order.len(), "topological order computed");
    Ok(order)
}

/// Concatenate each component's members, visiting components in
/// `component_order`.
///
/// Component ids in `component_order` that have no entry in `components`
/// contribute nothing.
#[must_use]
pub fn expand_order(component_order: &[usize], components: &[Vec<usize>]) -> Vec<usize> {
    component_order
        .iter()
        .filter_map(|&idx| components.get(idx))
        .flatten()
        .copied()
        .collect()
}

/// Position of every vertex within `order`; `None` for vertices absent from it.
#[must_use]
pub fn positions(order: &[usize], vertex_count: usize) -> Vec<Option<usize>> {
    let mut position = vec![None; vertex_count];
    for (idx, &v) in order.iter().enumerate() {
        if let Some(slot) = position.get_mut(v) {
            *slot = Some(idx);
        }
    }
    position
}

/// Return `true` if `order` lists every vertex of `graph` exactly once and
/// every edge points forward in it.
#[must_use]
pub fn is_topological_order(graph: &Graph, order: &[usize]) -> bool {
    if order.len() != graph.vertex_count() {
        return false;
    }
    let position = positions(order, graph.vertex_count());
    if position.iter().any(Option::is_none) {
        return false;
    }
    graph
        .edges()
        .all(|edge| position[edge.from] < position[edge.to])
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

    #[test]
    fn diamond_order_is_valid() {
        let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let order = sort(&g, &Metrics::new()).expect("acyclic");
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(is_topological_order(&g, &order));
    }

    #[test]
    fn seeds_are_ascending_and_releases_follow_edge_order() {
        // Sources 1 and 3; 3 releases 2 before 0 by insertion order.
        let g = graph(4, &[(3, 2), (3, 0), (1, 0)]);
        let order = sort(&g, &Metrics::new()).expect("acyclic");
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn two_cycle_is_rejected() {
        let g = graph(2, &[(0, 1), (1, 0)]);
        let err = sort(&g, &Metrics::new()).expect_err("cycle must fail");
        assert_eq!(err, GraphError::CycleDetected { sorted: 0, total: 2 });
    }

    #[test]
    fn cycle_behind_valid_prefix_is_still_rejected() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        assert!(matches!(
            sort(&g, &Metrics::new()),
            Err(GraphError::CycleDetected { sorted: 1, total: 4 })
        ));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let g = graph(1, &[(0, 0)]);
        assert!(sort(&g, &Metrics::new()).is_err());
    }

    #[test]
    fn empty_graph_sorts_to_empty_order() {
        let order = sort(&Graph::new(0), &Metrics::new()).expect("trivially acyclic");
        assert!(order.is_empty());
    }

    #[test]
    fn parallel_edges_release_target_once() {
        let g = graph(2, &[(0, 1), (0, 1)]);
        let metrics = Metrics::new();
        let order = sort(&g, &metrics).expect("acyclic");
        assert_eq!(order, vec![0, 1]);
        assert_eq!(metrics.counter(COUNTER_QUEUE_PUSH), 2);
    }

    #[test]
    fn queue_counters_match_hand_trace() {
        let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let metrics = Metrics::new();
        sort(&g, &metrics).expect("acyclic");

        assert_eq!(metrics.counter(COUNTER_QUEUE_PUSH), 4);
        assert_eq!(metrics.counter(COUNTER_QUEUE_POP), 4);
        assert!(metrics.timings().contains_key(TIMER_TOPO_SORT));
    }

    #[test]
    fn counters_recorded_even_when_cycle_found() {
        let g = graph(3, &[(0, 1), (1, 2), (2, 1)]);
        let metrics = Metrics::new();
        assert!(sort(&g, &metrics).is_err());
        assert_eq!(metrics.counter(COUNTER_QUEUE_PUSH), 1);
        assert_eq!(metrics.counter(COUNTER_QUEUE_POP), 1);
        assert!(metrics.timings().contains_key(TIMER_TOPO_SORT));
    }

    #[test]
    fn expand_order_concatenates_members() {
        let components = vec![vec![4], vec![3], vec![2, 1, 0]];
        assert_eq!(expand_order(&[2, 1, 0], &components), vec![2, 1, 0, 3, 4]);
        assert!(expand_order(&[], &components).is_empty());
    }

    #[test]
    fn is_topological_order_rejects_backward_edges_and_missing_vertices() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        assert!(is_topological_order(&g, &[0, 1, 2]));
        assert!(!is_topological_order(&g, &[1, 0, 2]));
        assert!(!is_topological_order(&g, &[0, 1]));
        assert!(!is_topological_order(&g, &[0, 0, 2]));
    }

    #[test]
    fn positions_ignore_out_of_range_entries() {
        assert_eq!(positions(&[2, 0, 9], 3), vec![Some(1), None, Some(0)]);
    }
}
