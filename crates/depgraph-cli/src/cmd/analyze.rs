//! `dg analyze`: run the full pipeline over one or more datasets.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use depgraph_core::pipeline::AnalysisReport;
use depgraph_core::{Analysis, GraphData, Metrics, MetricsSnapshot, analyze, discover_datasets};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::cmd::{Context, dataset_label, load_dataset};
use crate::output::{
    format_distance, format_ids, join_ids, pretty_kv, pretty_rule, pretty_section, render_mode,
};

/// Arguments for `dg analyze`.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Dataset files to analyze. Defaults to every `.json` file in the data directory.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Directory to discover datasets in (overrides `DEPGRAPH_DATA_DIR` and config).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// One analyzed dataset with everything needed to report it.
#[derive(Debug)]
struct DatasetRun {
    path: PathBuf,
    data: GraphData,
    analysis: Analysis,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct DatasetReport<'a> {
    dataset: String,
    path: String,
    vertices: usize,
    edges: usize,
    weight_model: &'a str,
    analysis: AnalysisReport<'a>,
    #[serde(serialize_with = "serialize_metrics")]
    metrics: &'a MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput<'a> {
    datasets: Vec<DatasetReport<'a>>,
}

fn serialize_metrics<S: Serializer>(
    metrics: &&MetricsSnapshot,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    metrics.to_json().serialize(serializer)
}

impl DatasetRun {
    fn report(&self) -> DatasetReport<'_> {
        DatasetReport {
            dataset: dataset_label(&self.path),
            path: self.path.display().to_string(),
            vertices: self.data.graph.vertex_count(),
            edges: self.data.edges.len(),
            weight_model: &self.data.weight_model,
            analysis: self.analysis.report(),
            metrics: &self.metrics,
        }
    }
}

/// Execute `dg analyze`.
///
/// `default_data_dir` is the configured data directory, used when neither
/// files nor `--data-dir` are given.
pub fn run_analyze(args: &AnalyzeArgs, ctx: Context, default_data_dir: &Path) -> anyhow::Result<()> {
    let datasets = if args.files.is_empty() {
        let dir = args.data_dir.as_deref().unwrap_or(default_data_dir);
        discover(dir)?
    } else {
        args.files.clone()
    };

    let mut runs = Vec::with_capacity(datasets.len());
    for path in datasets {
        let metrics = Metrics::new();
        let run = run_dataset(path, &metrics)?;
        ctx.report_timing(&dataset_label(&run.path), &metrics)?;
        runs.push(run);
    }

    let output = AnalyzeOutput {
        datasets: runs.iter().map(DatasetRun::report).collect(),
    };
    render_mode(ctx.output, &output, render_text, render_pretty)
}

fn discover(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("data directory not found: {}", dir.display());
    }
    let datasets = discover_datasets(dir)?;
    if datasets.is_empty() {
        anyhow::bail!("no datasets found in {}", dir.display());
    }
    debug!(count = datasets.len(), dir = %dir.display(), "datasets discovered");
    Ok(datasets)
}

fn run_dataset(path: PathBuf, metrics: &Metrics) -> anyhow::Result<DatasetRun> {
    let data = load_dataset(&path)?;
    let source = data.source_vertex()?;
    let analysis = analyze(&data.graph, source, metrics)?;
    info!(dataset = %path.display(), "dataset analyzed");
    Ok(DatasetRun {
        path,
        data,
        analysis,
        metrics: metrics.snapshot(),
    })
}

fn render_pretty(output: &AnalyzeOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for (idx, dataset) in output.datasets.iter().enumerate() {
        if idx > 0 {
            writeln!(w)?;
        }
        render_dataset_pretty(dataset, w)?;
    }
    Ok(())
}

fn render_dataset_pretty(dataset: &DatasetReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    let report = &dataset.analysis;

    pretty_rule(w)?;
    pretty_kv(w, "Dataset", &dataset.dataset)?;
    pretty_kv(w, "Path", &dataset.path)?;
    pretty_rule(w)?;
    pretty_kv(w, "Vertices", dataset.vertices.to_string())?;
    pretty_kv(w, "Edges", dataset.edges.to_string())?;
    pretty_kv(w, "Source", report.source.to_string())?;
    pretty_kv(w, "Weight model", dataset.weight_model)?;

    writeln!(w)?;
    pretty_section(
        w,
        &format!("Strongly connected components ({})", report.components.len()),
    )?;
    for (idx, members) in report.components.iter().enumerate() {
        writeln!(
            w,
            "Component {idx} (size={}): {}",
            members.len(),
            format_ids(members)
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Topological order")?;
    pretty_kv(w, "Components", format_ids(report.component_order))?;
    pretty_kv(w, "Vertices", format_ids(report.vertex_order))?;

    writeln!(w)?;
    pretty_section(
        w,
        &format!(
            "Shortest distances from component {}",
            report.source_component
        ),
    )?;
    for (component, &distance) in report.shortest.distances().iter().enumerate() {
        writeln!(w, "  to component {component} = {}", format_distance(distance))?;
    }
    pretty_kv(
        w,
        "Path to last",
        format_ids(&report.path_to_last_component),
    )?;

    writeln!(w)?;
    pretty_section(w, "Critical path")?;
    if let Some(critical) = report.critical {
        pretty_kv(w, "Length", format!("{:.2}", critical.length))?;
        pretty_kv(w, "Path", format_ids(&critical.path))?;
    }

    writeln!(w)?;
    pretty_section(w, "Metrics summary")?;
    write!(w, "{}", dataset.metrics.display_table())?;
    if dataset.metrics.is_empty() {
        writeln!(w)?;
    }
    Ok(())
}

fn render_text(output: &AnalyzeOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for (idx, dataset) in output.datasets.iter().enumerate() {
        if idx > 0 {
            writeln!(w)?;
        }
        render_dataset_text(dataset, w)?;
    }
    Ok(())
}

fn render_dataset_text(dataset: &DatasetReport<'_>, w: &mut dyn Write) -> io::Result<()> {
    let report = &dataset.analysis;

    writeln!(w, "dataset {}", dataset.dataset)?;
    writeln!(w, "vertices {}", dataset.vertices)?;
    writeln!(w, "edges {}", dataset.edges)?;
    writeln!(w, "source {}", report.source)?;
    writeln!(w, "weight_model {}", dataset.weight_model)?;
    writeln!(w, "components {}", report.components.len())?;
    for (idx, members) in report.components.iter().enumerate() {
        writeln!(w, "component {idx} {}", join_ids(members))?;
    }
    writeln!(w, "component_order {}", join_ids(report.component_order))?;
    writeln!(w, "vertex_order {}", join_ids(report.vertex_order))?;
    writeln!(w, "source_component {}", report.source_component)?;
    for (component, &distance) in report.shortest.distances().iter().enumerate() {
        writeln!(w, "distance {component} {}", format_distance(distance))?;
    }
    writeln!(w, "path_to_last {}", join_ids(&report.path_to_last_component))?;
    if let Some(critical) = report.critical {
        writeln!(w, "critical_length {:.2}", critical.length)?;
        writeln!(w, "critical_path {}", join_ids(&critical.path))?;
    }
    for (name, value) in &dataset.metrics.counters {
        writeln!(w, "counter {name} {value}")?;
    }
    for (name, elapsed) in &dataset.metrics.timings {
        writeln!(w, "timing_ns {name} {}", elapsed.as_nanos())?;
    }
    Ok(())
}
