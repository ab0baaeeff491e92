//! `dg paths`: shortest distances and a path on the condensation DAG.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use depgraph_core::{GraphData, GraphError, Metrics, ShortestPaths, analyze};
use serde::Serialize;

use crate::cmd::{Context, dataset_label, load_dataset};
use crate::output::{format_distance, format_ids, join_ids, pretty_kv, pretty_section, render_mode};

/// Arguments for `dg paths`.
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Dataset file to analyze.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Source vertex (overrides the dataset's `source`).
    #[arg(long, allow_negative_numbers = true)]
    pub source: Option<i64>,

    /// Target component (default: last component in topological order).
    #[arg(long, allow_negative_numbers = true)]
    pub target: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PathsOutput {
    dataset: String,
    source: usize,
    source_component: usize,
    target_component: usize,
    /// `None` when the target component is unreachable.
    distance: Option<f64>,
    path: Vec<usize>,
    shortest: ShortestPaths,
}

/// Execute `dg paths`.
pub fn run_paths(args: &PathsArgs, ctx: Context) -> anyhow::Result<()> {
    let mut data = load_dataset(&args.file)?;
    let metrics = Metrics::new();
    let payload = solve(&mut data, args, dataset_label(&args.file), &metrics)?;
    ctx.report_timing(&payload.dataset, &metrics)?;
    render_mode(ctx.output, &payload, render_paths_text, render_paths_pretty)
}

fn solve(
    data: &mut GraphData,
    args: &PathsArgs,
    dataset: String,
    metrics: &Metrics,
) -> anyhow::Result<PathsOutput> {
    if let Some(source) = args.source {
        data.source = source;
    }
    let source = data.source_vertex()?;
    let analysis = analyze(&data.graph, source, metrics)?;

    let component_count = analysis.scc.component_count();
    let target_component = match args.target {
        Some(raw) => usize::try_from(raw)
            .ok()
            .filter(|&c| c < component_count)
            .ok_or(GraphError::OutOfRange {
                vertex: raw,
                vertex_count: component_count,
            })?,
        // A valid source guarantees at least one component.
        None => analysis.last_component().unwrap_or(analysis.source_component),
    };

    Ok(PathsOutput {
        dataset,
        source,
        source_component: analysis.source_component,
        target_component,
        distance: analysis.shortest.distance(target_component),
        path: analysis.shortest.build_path(target_component),
        shortest: analysis.shortest,
    })
}

fn render_paths_pretty(payload: &PathsOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Shortest paths on condensation")?;
    pretty_kv(w, "Dataset", &payload.dataset)?;
    pretty_kv(w, "Source", payload.source.to_string())?;
    pretty_kv(w, "Source comp.", payload.source_component.to_string())?;
    writeln!(w)?;
    for (component, &distance) in payload.shortest.distances().iter().enumerate() {
        writeln!(w, "  to component {component} = {}", format_distance(distance))?;
    }
    writeln!(w)?;
    pretty_kv(w, "Target comp.", payload.target_component.to_string())?;
    match payload.distance {
        Some(distance) => {
            pretty_kv(w, "Distance", format!("{distance:.2}"))?;
            pretty_kv(w, "Path", format_ids(&payload.path))
        }
        None => writeln!(w, "Target component is unreachable from the source."),
    }
}

fn render_paths_text(payload: &PathsOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "source {}", payload.source)?;
    writeln!(w, "source_component {}", payload.source_component)?;
    for (component, &distance) in payload.shortest.distances().iter().enumerate() {
        writeln!(w, "distance {component} {}", format_distance(distance))?;
    }
    writeln!(w, "target_component {}", payload.target_component)?;
    writeln!(w, "path {}", join_ids(&payload.path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> GraphData {
        // {0,1} -> 2 -> 3, and 4 -> 3 unreachable from 0.
        GraphData::from_json_str(
            r#"{"n": 5, "edges": [
                {"u": 0, "v": 1, "w": 1},
                {"u": 1, "v": 0, "w": 1},
                {"u": 1, "v": 2, "w": 2},
                {"u": 2, "v": 3, "w": 3},
                {"u": 4, "v": 3, "w": 1}
            ]}"#,
        )
        .expect("valid dataset")
    }

    fn args(source: Option<i64>, target: Option<i64>) -> PathsArgs {
        PathsArgs {
            file: PathBuf::from("fixture.json"),
            source,
            target,
        }
    }

    fn solve_fixture(source: Option<i64>, target: Option<i64>) -> anyhow::Result<PathsOutput> {
        solve(
            &mut fixture(),
            &args(source, target),
            "fixture.json".to_string(),
            &Metrics::new(),
        )
    }

    #[test]
    fn defaults_to_last_component_in_topological_order() {
        // Components close as {3}=0, {2}=1, {1,0}=2, {4}=3.
        // Kahn seeds [2, 3]; order [2, 3, 1, 0], so the last is {3}.
        let payload = solve_fixture(None, None).expect("solve");
        assert_eq!(payload.source_component, 2);
        assert_eq!(payload.target_component, 0);
        assert_eq!(payload.distance, Some(5.0));
        assert_eq!(payload.path, vec![2, 1, 0]);
    }

    #[test]
    fn unreachable_target_has_no_distance_or_path() {
        let payload = solve_fixture(None, Some(3)).expect("solve");
        assert_eq!(payload.distance, None);
        assert!(payload.path.is_empty());
    }

    #[test]
    fn source_flag_overrides_dataset() {
        let payload = solve_fixture(Some(4), Some(0)).expect("solve");
        assert_eq!(payload.source, 4);
        assert_eq!(payload.source_component, 3);
        assert_eq!(payload.distance, Some(1.0));
    }

    #[test]
    fn out_of_range_source_and_target_are_errors() {
        let err = solve_fixture(Some(9), None).expect_err("bad source");
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::OutOfRange { vertex: 9, .. })
        ));

        let err = solve_fixture(None, Some(-1)).expect_err("bad target");
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::OutOfRange { vertex: -1, vertex_count: 4 })
        ));
    }

    #[test]
    fn text_output_lists_distances_and_path() {
        let payload = solve_fixture(None, None).expect("solve");
        let mut out = Vec::new();
        render_paths_text(&payload, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("distance 3 INF\n"));
        assert!(rendered.contains("target_component 0\n"));
        assert!(rendered.ends_with("path 2 1 0\n"));
    }

    #[test]
    fn pretty_output_reports_unreachable_target() {
        let payload = solve_fixture(None, Some(3)).expect("solve");
        let mut out = Vec::new();
        render_paths_pretty(&payload, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("unreachable"));
    }
}
