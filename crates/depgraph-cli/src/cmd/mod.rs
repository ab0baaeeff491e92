pub mod analyze;
pub mod paths;
pub mod scc;
pub mod topo;

use std::path::Path;

use anyhow::Context as _;
use depgraph_core::{GraphData, Metrics};

use crate::output::OutputMode;

/// Settings every command handler needs after flags and config are merged.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub output: OutputMode,
    /// Print each dataset's metrics table to stderr.
    pub timing: bool,
}

impl Context {
    /// Emit the timing report for one dataset to stderr when enabled.
    pub fn report_timing(&self, label: &str, metrics: &Metrics) -> anyhow::Result<()> {
        if !self.timing {
            return Ok(());
        }
        let snapshot = metrics.snapshot();
        if snapshot.is_empty() {
            eprintln!("timing report ({label}): no samples recorded");
        } else {
            eprintln!("timing report ({label}):");
            eprintln!("{}", snapshot.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&snapshot.to_json())?);
        }
        Ok(())
    }
}

/// Load a dataset file, attaching the path to any failure.
pub fn load_dataset(path: &Path) -> anyhow::Result<GraphData> {
    GraphData::load(path).with_context(|| format!("failed to load dataset {}", path.display()))
}

/// File name of `path` for report headers, falling back to the full path.
pub fn dataset_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
