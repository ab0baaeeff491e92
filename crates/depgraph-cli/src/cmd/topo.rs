//! `dg topo`: topological order of the condensation and the expanded vertex order.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use depgraph_core::{Graph, Metrics, scc, topo};
use serde::Serialize;

use crate::cmd::{Context, dataset_label, load_dataset};
use crate::output::{format_ids, join_ids, pretty_kv, pretty_section, render_mode};

/// Arguments for `dg topo`.
#[derive(Args, Debug)]
pub struct TopoArgs {
    /// Dataset file to analyze.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct TopoOutput {
    dataset: String,
    component_order: Vec<usize>,
    vertex_order: Vec<usize>,
}

/// Execute `dg topo`.
pub fn run_topo(args: &TopoArgs, ctx: Context) -> anyhow::Result<()> {
    let data = load_dataset(&args.file)?;
    let metrics = Metrics::new();
    let payload = order_dataset(&data.graph, dataset_label(&args.file), &metrics)?;
    ctx.report_timing(&payload.dataset, &metrics)?;
    render_mode(ctx.output, &payload, render_topo_text, render_topo_pretty)
}

fn order_dataset(
    graph: &Graph,
    dataset: String,
    metrics: &Metrics,
) -> anyhow::Result<TopoOutput> {
    let result = scc::compute(graph, metrics);
    let component_order = topo::sort(&result.condensation, metrics)?;
    let vertex_order = topo::expand_order(&component_order, &result.components);
    Ok(TopoOutput {
        dataset,
        component_order,
        vertex_order,
    })
}

fn render_topo_pretty(payload: &TopoOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Topological order")?;
    pretty_kv(w, "Dataset", &payload.dataset)?;
    pretty_kv(w, "Components", format_ids(&payload.component_order))?;
    pretty_kv(w, "Vertices", format_ids(&payload.vertex_order))
}

fn render_topo_text(payload: &TopoOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "component_order {}", join_ids(&payload.component_order))?;
    writeln!(w, "vertex_order {}", join_ids(&payload.vertex_order))
}
