use clap::{Parser, ValueEnum};
use mcp_toolchain::application::stdio;
use mcp_toolchain::infrastructure::SimulatedServers;
use mcp_toolchain::{
    AppConfig, Orchestrator, OrchestratorOptions, QuerySignals, RenderMode, Strategy, ToolRef,
    render,
};
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-toolchain",
    version,
    about = "Tool-chain orchestration engine for multi-server MCP tool catalogs"
)]
struct Cli {
    /// Path to a TOML catalog/rules/mappings file (defaults to the built-in demo catalog).
    #[arg(long)]
    config: Option<String>,
    /// Target tools implied by the query, as SERVER/tool pairs.
    #[arg(long = "target")]
    targets: Vec<String>,
    /// Classification signal: the query content is not in English.
    #[arg(long)]
    non_english: bool,
    /// Structured input fields, as name=value pairs.
    #[arg(long = "field")]
    fields: Vec<String>,
    #[arg(long, value_enum, default_value_t = StrategyArg::Planning)]
    strategy: StrategyArg,
    /// Render the sealed trace in the given view after the JSON records.
    #[arg(long, value_enum)]
    render: Option<RenderArg>,
    /// Per-query wall-clock budget across all steps.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long, value_enum, default_value_t = RunMode::Run)]
    mode: RunMode,
    query: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Run,
    Stdio,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Planning,
    Reactive,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Planning => Strategy::Planning,
            StrategyArg::Reactive => Strategy::Reactive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RenderArg {
    Graph,
    Timeline,
    Grouped,
    Grid,
    Tabs,
    Chat,
}

impl From<RenderArg> for RenderMode {
    fn from(value: RenderArg) -> Self {
        match value {
            RenderArg::Graph => RenderMode::GraphDiagram,
            RenderArg::Timeline => RenderMode::Timeline,
            RenderArg::Grouped => RenderMode::GroupedPanels,
            RenderArg::Grid => RenderMode::Grid,
            RenderArg::Tabs => RenderMode::TabbedPanels,
            RenderArg::Chat => RenderMode::Conversational,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting mcp-toolchain");
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, strategy = ?cli.strategy, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = Arc::new(AppConfig::load(config_path)?);
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or built-in demo catalog");
    }

    let bridge = Arc::new(SimulatedServers::new(config.catalog.clone()));
    let orchestrator = Arc::new(Orchestrator::new(config, bridge));

    match cli.mode {
        RunMode::Run => {
            let query = cli.query.join(" ").trim().to_string();
            if query.is_empty() {
                return Err("a query is required in run mode".into());
            }
            let targets = parse_targets(&cli.targets)?;
            let mut signals = QuerySignals::new(query, targets);
            signals.non_english = cli.non_english;
            for field in &cli.fields {
                let (name, value) = parse_field(field)?;
                signals.fields.insert(name, value);
            }

            let options = OrchestratorOptions {
                strategy: cli.strategy.into(),
                timeout: cli.timeout_secs.map(Duration::from_secs),
                cancel: None,
            };
            info!("Dispatching query through the orchestrator");
            let trace = orchestrator.run(signals, options).await?;

            println!("{}", serde_json::to_string_pretty(&trace.to_records())?);
            if let Some(mode) = cli.render {
                println!("\n{}", render(&trace, mode.into()));
            }
        }
        RunMode::Stdio => {
            stdio::run(orchestrator).await?;
        }
    }
    info!("Run finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn parse_targets(raw: &[String]) -> Result<Vec<ToolRef>, Box<dyn Error>> {
    if raw.is_empty() {
        return Err("at least one --target SERVER/tool is required in run mode".into());
    }
    raw.iter()
        .map(|entry| {
            entry
                .split_once('/')
                .map(|(server, tool)| ToolRef::new(server, tool))
                .ok_or_else(|| format!("invalid target '{entry}': expected SERVER/tool").into())
        })
        .collect()
}

fn parse_field(raw: &str) -> Result<(String, Value), Box<dyn Error>> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid field '{raw}': expected name=value"))?;
    Ok((name.to_string(), Value::String(value.to_string())))
}
