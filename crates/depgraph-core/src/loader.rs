//! JSON dataset loading and dataset discovery.
//!
//! # Format
//!
//! ```json
//! {
//!   "n": 5,
//!   "edges": [{"u": 0, "v": 1, "w": 2.5}, {"u": 1, "v": 2}],
//!   "source": 0,
//!   "weight_model": "edge"
//! }
//! ```
//!
//! `w` defaults to `1.0`, `source` to `0` and `weight_model` to `"edge"`.
//! Vertex ids are read as signed integers so that negative values surface as
//! graph range errors instead of JSON type errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{ErrorCode, GraphError};
use crate::graph::{Edge, Graph};

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid graph: {0}")]
    Graph(#[from] GraphError),
}

impl LoadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::DatasetUnreadable,
            Self::Json(_) => ErrorCode::DatasetMalformed,
            Self::Graph(err) => err.code(),
        }
    }
}

/// A parsed dataset: the graph plus its run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphData {
    pub graph: Graph,
    /// Vertex shortest paths are computed from (validated at analysis time).
    pub source: i64,
    /// Free-form description of how weights were assigned.
    pub weight_model: String,
    /// Edges in file order.
    pub edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    n: i64,
    #[serde(default)]
    edges: Vec<RawEdge>,
    #[serde(default)]
    source: i64,
    #[serde(default = "default_weight_model")]
    weight_model: String,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    u: i64,
    v: i64,
    #[serde(default = "default_weight")]
    w: f64,
}

fn default_weight_model() -> String {
    "edge".to_string()
}

const fn default_weight() -> f64 {
    1.0
}

impl GraphData {
    /// Parse a dataset from JSON text.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Json`] if the text is not a valid dataset document.
    /// - [`LoadError::Graph`] if `n` is negative or an edge endpoint is
    ///   outside `[0, n)`.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        let raw: RawDataset = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Read and parse a dataset file.
    ///
    /// # Errors
    ///
    /// [`LoadError::Io`] if the file cannot be read, otherwise as
    /// [`GraphData::from_json_str`].
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data = Self::from_json_str(&text)?;
        debug!(
            vertices = data.graph.vertex_count(),
            edges = data.edges.len(),
            "dataset loaded"
        );
        Ok(data)
    }

    fn from_raw(raw: RawDataset) -> Result<Self, LoadError> {
        let mut graph = Graph::try_new(raw.n)?;
        let n = graph.vertex_count();
        let mut edges = Vec::with_capacity(raw.edges.len());

        for edge in raw.edges {
            let from = vertex_id(edge.u, n)?;
            let to = vertex_id(edge.v, n)?;
            graph.add_edge(from, to, edge.w)?;
            edges.push(Edge {
                from,
                to,
                weight: edge.w,
            });
        }

        Ok(Self {
            graph,
            source: raw.source,
            weight_model: raw.weight_model,
            edges,
        })
    }

    /// The source as a vertex id of this graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::OutOfRange`] if the source is not a vertex.
    pub fn source_vertex(&self) -> Result<usize, GraphError> {
        vertex_id(self.source, self.graph.vertex_count())
    }
}

fn vertex_id(raw: i64, vertex_count: usize) -> Result<usize, GraphError> {
    usize::try_from(raw)
        .ok()
        .filter(|&v| v < vertex_count)
        .ok_or(GraphError::OutOfRange {
            vertex: raw,
            vertex_count,
        })
}

/// List the `.json` datasets directly inside `dir`, sorted by file name.
///
/// The extension match is case-insensitive; directories and other entries
/// that are not regular files are skipped.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if `dir` cannot be listed.
pub fn discover_datasets(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut datasets = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.to_ascii_lowercase().ends_with(".json"));
        if is_json {
            datasets.push(path);
        }
    }

    datasets.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let data = GraphData::from_json_str(
            r#"{"n": 3, "edges": [{"u": 0, "v": 1, "w": 2.5}, {"u": 1, "v": 2, "w": -1}],
                "source": 1, "weight_model": "node"}"#,
        )
        .expect("valid dataset");

        assert_eq!(data.graph.vertex_count(), 3);
        assert_eq!(data.graph.edge_count(), 2);
        assert_eq!(data.source, 1);
        assert_eq!(data.source_vertex(), Ok(1));
        assert_eq!(data.weight_model, "node");
        assert_eq!(
            data.edges[1],
            Edge {
                from: 1,
                to: 2,
                weight: -1.0
            }
        );
    }

    #[test]
    fn applies_defaults() {
        let data = GraphData::from_json_str(r#"{"n": 2, "edges": [{"u": 0, "v": 1}]}"#)
            .expect("valid dataset");
        assert_eq!(data.source, 0);
        assert_eq!(data.weight_model, "edge");
        assert!((data.edges[0].weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_edges_means_isolated_vertices() {
        let data = GraphData::from_json_str(r#"{"n": 4}"#).expect("valid dataset");
        assert_eq!(data.graph.vertex_count(), 4);
        assert!(data.edges.is_empty());
    }

    #[test]
    fn rejects_negative_vertex_count() {
        let err = GraphData::from_json_str(r#"{"n": -2, "edges": []}"#).expect_err("must fail");
        assert!(matches!(err, LoadError::Graph(GraphError::InvalidArgument(_))));
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn rejects_out_of_range_endpoints() {
        let err = GraphData::from_json_str(r#"{"n": 2, "edges": [{"u": 0, "v": 2}]}"#)
            .expect_err("must fail");
        assert!(matches!(
            err,
            LoadError::Graph(GraphError::OutOfRange { vertex: 2, vertex_count: 2 })
        ));

        let err = GraphData::from_json_str(r#"{"n": 2, "edges": [{"u": -1, "v": 0}]}"#)
            .expect_err("must fail");
        assert!(matches!(
            err,
            LoadError::Graph(GraphError::OutOfRange { vertex: -1, .. })
        ));
    }

    #[test]
    fn out_of_range_source_is_reported_lazily() {
        let data = GraphData::from_json_str(r#"{"n": 2, "source": 5}"#).expect("parses");
        assert!(matches!(
            data.source_vertex(),
            Err(GraphError::OutOfRange { vertex: 5, .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = GraphData::from_json_str(r#"{"edges": []}"#).expect_err("n is required");
        assert!(matches!(err, LoadError::Json(_)));
        assert_eq!(err.code(), ErrorCode::DatasetMalformed);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GraphData::load(Path::new("/definitely/not/here.json")).expect_err("missing");
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.code(), ErrorCode::DatasetUnreadable);
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.json"), "{}").expect("write");
        fs::write(dir.path().join("A.JSON"), "{}").expect("write");
        fs::write(dir.path().join("notes.txt"), "").expect("write");
        fs::create_dir(dir.path().join("nested.json")).expect("mkdir");

        let found = discover_datasets(dir.path()).expect("listable");
        let names: Vec<String> = found
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(names, vec!["A.JSON".to_string(), "b.json".to_string()]);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.json");
        fs::write(&path, r#"{"n": 2, "edges": [{"u": 1, "v": 0, "w": 3}]}"#).expect("write");

        let data = GraphData::load(&path).expect("loads");
        assert_eq!(data.graph.edges_from(1).expect("in range").len(), 1);
    }
}
