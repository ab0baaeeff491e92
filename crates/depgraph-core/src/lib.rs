#![forbid(unsafe_code)]
//! depgraph-core library.
//!
//! Strongly connected components, condensation DAGs, topological ordering
//! and DAG shortest/longest paths over a weighted directed graph.
//!
//! # Conventions
//!
//! - **Errors**: library stages return [`GraphError`]; config loading uses
//!   `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Instrumentation**: every stage records counters and timings into a
//!   caller-supplied [`Metrics`].
//!
//! # Typical Usage
//!
//! ```rust
//! use depgraph_core::{Graph, Metrics, paths, scc, topo};
//!
//! let mut graph = Graph::new(4);
//! graph.add_edge(0, 1, 1.0)?;
//! graph.add_edge(0, 2, 2.0)?;
//! graph.add_edge(1, 3, 3.0)?;
//! graph.add_edge(2, 3, 1.0)?;
//!
//! let metrics = Metrics::new();
//! let sccs = scc::compute(&graph, &metrics);
//! let order = topo::sort(&sccs.condensation, &metrics)?;
//! let critical = paths::longest_path(&sccs.condensation, &order, &metrics)?;
//! assert_eq!(critical.map(|c| c.length), Some(4.0));
//! # Ok::<(), depgraph_core::GraphError>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod paths;
pub mod pipeline;
pub mod scc;
pub mod topo;

pub use error::{ErrorCode, GraphError};
pub use graph::{Edge, Graph};
pub use loader::{GraphData, LoadError, discover_datasets};
pub use metrics::{Metrics, MetricsSnapshot, TimerGuard};
pub use paths::{CriticalPath, ShortestPaths};
pub use pipeline::{Analysis, analyze};
pub use scc::SccResult;
