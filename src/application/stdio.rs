use super::planner::{Orchestrator, OrchestratorOptions};
use crate::domain::{QuerySignals, Strategy, ToolRef, TraceRecord};
use crate::render::{self, RenderMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stdio response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct StdioQueryRequest {
    query: String,
    #[serde(default)]
    non_english: bool,
    targets: Vec<ToolRef>,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    strategy: Option<Strategy>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    render: Option<RenderMode>,
}

#[derive(Debug, Serialize)]
struct StdioQueryResponse {
    trace_id: Option<String>,
    trace: Vec<TraceRecord>,
    rendered: Option<String>,
    error: Option<String>,
}

impl StdioQueryResponse {
    fn success(trace_id: String, trace: Vec<TraceRecord>, rendered: Option<String>) -> Self {
        Self {
            trace_id: Some(trace_id),
            trace,
            rendered,
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            trace_id: None,
            trace: Vec::new(),
            rendered: None,
            error: Some(message.into()),
        }
    }
}

/// JSON-lines mode: one query request per stdin line, one response object
/// per stdout line. Used by UI collaborators that embed the engine as a
/// subprocess.
pub async fn run(orchestrator: Arc<Orchestrator>) -> Result<(), StdioError> {
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut lines = stdin.lines();

    info!("STDIO mode ready; awaiting JSON line input");
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!(length = trimmed.len(), "Received stdio request line");

        let response = match serde_json::from_str::<StdioQueryRequest>(trimmed) {
            Ok(request) => handle_request(&orchestrator, request).await,
            Err(err) => {
                error!(%err, "Failed to parse stdio request");
                StdioQueryResponse::error(format!("invalid request: {err}"))
            }
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }
    info!("STDIO input closed; shutting down");
    Ok(())
}

async fn handle_request(
    orchestrator: &Orchestrator,
    request: StdioQueryRequest,
) -> StdioQueryResponse {
    let mut signals = QuerySignals::new(request.query, request.targets);
    signals.non_english = request.non_english;
    signals.fields = request.fields;

    let options = OrchestratorOptions {
        strategy: request.strategy.unwrap_or_default(),
        timeout: request.timeout_secs.map(Duration::from_secs),
        cancel: None,
    };

    match orchestrator.run(signals, options).await {
        Ok(trace) => {
            let rendered = request.render.map(|mode| render::render(&trace, mode));
            StdioQueryResponse::success(trace.id().to_string(), trace.to_records(), rendered)
        }
        Err(err) => {
            error!(%err, "Orchestration rejected the request");
            StdioQueryResponse::error(err.to_string())
        }
    }
}
