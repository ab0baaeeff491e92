#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use depgraph_core::ErrorCode;
use depgraph_core::config::{self, EffectiveConfig};
use output::{CliError, OutputMode};
use std::env;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "dg: strongly connected components, condensation and DAG path analysis",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit per-dataset metrics report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode from flags, falling back to the configured format.
    fn output_mode(&self, configured: Option<&str>) -> OutputMode {
        output::resolve_output_mode(self.format, self.json, configured)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Analyze datasets end to end",
        long_about = "Run SCC condensation, topological ordering, shortest paths and the critical path over each dataset.",
        after_help = "EXAMPLES:\n    # Analyze every dataset in ./data (or the configured data_dir)\n    dg analyze\n\n    # Analyze specific files\n    dg analyze data/tasks.json data/small.json\n\n    # Emit machine-readable output\n    dg analyze --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "List strongly connected components",
        long_about = "List strongly connected components and the size of the condensation DAG.",
        after_help = "EXAMPLES:\n    # Components of one dataset\n    dg scc data/tasks.json\n\n    # Emit machine-readable output\n    dg scc data/tasks.json --json"
    )]
    Scc(cmd::scc::SccArgs),

    #[command(
        about = "Topological order of components",
        long_about = "Topologically sort the condensation DAG and expand it to a vertex order.",
        after_help = "EXAMPLES:\n    # Component and vertex order\n    dg topo data/tasks.json"
    )]
    Topo(cmd::topo::TopoArgs),

    #[command(
        about = "Shortest paths on the condensation",
        long_about = "Compute shortest distances on the condensation DAG from the source's component.",
        after_help = "EXAMPLES:\n    # Use the dataset's source vertex\n    dg paths data/tasks.json\n\n    # Override the source and pick a target component\n    dg paths data/tasks.json --source 3 --target 0"
    )]
    Paths(cmd::paths::PathsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DEPGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "depgraph=debug,info"
        } else {
            "depgraph=info,warn"
        })
    });

    let format = env::var("DEPGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, config: &EffectiveConfig, ctx: cmd::Context) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, ctx, &config.data_dir),
        Commands::Scc(args) => cmd::scc::run_scc(args, ctx),
        Commands::Topo(args) => cmd::topo::run_topo(args, ctx),
        Commands::Paths(args) => cmd::paths::run_paths(args, ctx),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            let error = CliError::new(format!("cannot determine working directory: {err}"));
            return report_failure(cli.output_mode(None), &error);
        }
    };

    let config = match config::resolve_config(&project_root) {
        Ok(config) => config,
        Err(err) => {
            let error = CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError);
            return report_failure(cli.output_mode(None), &error);
        }
    };
    debug!(?config, "configuration resolved");

    let ctx = cmd::Context {
        output: cli.output_mode(config.format.as_deref()),
        timing: cli.timing || config.timing,
    };

    match run(&cli, &config, ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(ctx.output, &CliError::from(&err)),
    }
}

fn report_failure(mode: OutputMode, error: &CliError) -> ExitCode {
    if let Err(render_err) = output::render_error(mode, error) {
        eprintln!("error: {} ({render_err})", error.message);
    }
    ExitCode::FAILURE
}
