use clap::{Parser, Subcommand, ValueEnum};
use regexsched_core::{load_nodes, load_pod};
use regexsched_scheduler::config::{self, FrameworkConfig};
use regexsched_scheduler::{FilterReport, Framework, Registry, TracingKlog};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Exit status when no node is feasible
const EXIT_UNSCHEDULABLE: u8 = 1;
/// Exit status when a filter reported an internal error
const EXIT_FILTER_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "regexsched", about = "Regex node filter for pod scheduling")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "REGEXSCHED_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the filter stage for one pod against a set of nodes
    Filter {
        /// Pod manifest (YAML or JSON)
        #[arg(long)]
        pod: PathBuf,
        /// Node manifest: one node, a list of nodes, or a NodeList
        #[arg(long)]
        nodes: PathBuf,
        /// Framework config; defaults to RegexScheduling only
        #[arg(long, env = "REGEXSCHED_CONFIG")]
        config: Option<PathBuf>,
        /// Verdict output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// List registered plugins
    Plugins,
    /// Validate a framework config and construct its plugins
    CheckConfig {
        /// Framework config file
        #[arg(long, env = "REGEXSCHED_CONFIG")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so verdicts on stdout stay clean
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    match cli.command {
        Commands::Filter {
            pod,
            nodes,
            config,
            output,
        } => run_filter(&pod, &nodes, config.as_deref(), output).await,
        Commands::Plugins => {
            for name in Registry::default().names() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckConfig { config } => {
            build_framework(Some(config.as_path()))?;
            println!("{}: ok", config.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the framework config and construct every plugin; failure here is fatal
fn build_framework(config_path: Option<&Path>) -> miette::Result<Framework> {
    let config = match config_path {
        Some(path) => {
            info!("Loading framework config from {}", path.display());
            config::load_from_file(path)?
        }
        None => FrameworkConfig::default(),
    };

    Framework::new(&Registry::default(), &config, Arc::new(TracingKlog::new())).map_err(|e| {
        error!("Failed to construct framework: {}", e);
        e.into()
    })
}

async fn run_filter(
    pod_path: &Path,
    nodes_path: &Path,
    config_path: Option<&Path>,
    output: OutputFormat,
) -> miette::Result<ExitCode> {
    let framework = build_framework(config_path)?;

    let pod = load_pod(pod_path)?;
    let nodes = load_nodes(nodes_path)?;

    let report = framework.find_feasible_nodes(&pod, nodes).await?;

    match output {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", regexsched_core::to_json_pretty(&report)?),
    }

    for verdict in report.errors() {
        warn!(
            "Filter error on node {}: {}",
            verdict.node_name,
            verdict.status.reason().unwrap_or_default()
        );
    }
    if let Some(diagnosis) = report.diagnosis() {
        info!("Pod {} is unschedulable: {}", report.pod_name, diagnosis);
    }

    Ok(ExitCode::from(exit_status(&report)))
}

/// 0 when some node fits, 2 when any filter errored, 1 otherwise
fn exit_status(report: &FilterReport) -> u8 {
    if !report.errors().is_empty() {
        EXIT_FILTER_ERROR
    } else if report.is_schedulable() {
        0
    } else {
        EXIT_UNSCHEDULABLE
    }
}

fn render_text(report: &FilterReport) -> String {
    let width = report
        .verdicts
        .iter()
        .map(|v| v.node_name.len())
        .chain(std::iter::once("NODE".len()))
        .max()
        .unwrap_or_default();

    let mut out = format!("{:<width$}  {:<13}  {:<16}  REASON\n", "NODE", "STATUS", "PLUGIN");
    for verdict in &report.verdicts {
        let line = format!(
            "{:<width$}  {:<13}  {:<16}  {}",
            verdict.node_name,
            verdict.status.code().to_string(),
            verdict.plugin.as_deref().unwrap_or("-"),
            // Multi-line engine messages are flattened to keep one row per node
            verdict
                .status
                .reason()
                .unwrap_or_default()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if let Some(diagnosis) = report.diagnosis() {
        out.push_str(&diagnosis);
        out.push('\n');
    }
    out
}
