//! `dg scc`: list strongly connected components and the condensation.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use depgraph_core::scc::{self, SccSummary};
use depgraph_core::{Edge, Metrics};
use serde::Serialize;

use crate::cmd::{Context, dataset_label, load_dataset};
use crate::output::{format_ids, join_ids, pretty_kv, pretty_section, render_mode};

/// Arguments for `dg scc`.
#[derive(Args, Debug)]
pub struct SccArgs {
    /// Dataset file to analyze.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct SccOutput {
    dataset: String,
    vertices: usize,
    summary: SccSummary,
    components: Vec<Vec<usize>>,
    component_of: Vec<usize>,
    condensation_edges: Vec<Edge>,
}

/// Execute `dg scc`.
pub fn run_scc(args: &SccArgs, ctx: Context) -> anyhow::Result<()> {
    let data = load_dataset(&args.file)?;
    let metrics = Metrics::new();
    let result = scc::compute(&data.graph, &metrics);
    ctx.report_timing(&dataset_label(&args.file), &metrics)?;

    let payload = SccOutput {
        dataset: dataset_label(&args.file),
        vertices: data.graph.vertex_count(),
        summary: result.summary(),
        condensation_edges: result.condensation.edges().copied().collect(),
        components: result.components,
        component_of: result.component_of,
    };
    render_mode(ctx.output, &payload, render_scc_text, render_scc_pretty)
}

fn render_scc_pretty(payload: &SccOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "Strongly connected components ({})",
            payload.summary.component_count
        ),
    )?;
    pretty_kv(w, "Dataset", &payload.dataset)?;
    pretty_kv(w, "Vertices", payload.vertices.to_string())?;
    pretty_kv(w, "Cyclic", payload.summary.cyclic_component_count.to_string())?;
    pretty_kv(w, "Largest", payload.summary.largest_component.to_string())?;
    pretty_kv(
        w,
        "DAG edges",
        payload.summary.condensation_edge_count.to_string(),
    )?;

    writeln!(w)?;
    for (idx, members) in payload.components.iter().enumerate() {
        let marker = if members.len() > 1 { " (cycle)" } else { "" };
        writeln!(
            w,
            "Component {idx} (size={}){marker}: {}",
            members.len(),
            format_ids(members)
        )?;
    }
    Ok(())
}

fn render_scc_text(payload: &SccOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "components {}", payload.summary.component_count)?;
    writeln!(w, "cyclic {}", payload.summary.cyclic_component_count)?;
    writeln!(
        w,
        "condensation_edges {}",
        payload.summary.condensation_edge_count
    )?;
    for (idx, members) in payload.components.iter().enumerate() {
        writeln!(w, "component {idx} {}", join_ids(members))?;
    }
    Ok(())
}
