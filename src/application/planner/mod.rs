mod state;

use super::mapper::{FieldMapper, normalize_observation};
use super::resolver::DependencyResolver;
use super::tooling::ToolServerInterface;
use crate::config::{AppConfig, ConfigError};
use crate::domain::{QuerySignals, Seal, Step, Strategy, ToolRef, Trace};
use serde_json::{Map, Value, json};
use state::{Phase, PlannedCall, RunState, SealReason, StepOutcome};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("query signals did not imply any target tool")]
    NoTargets,
}

/// Per-query execution options. The default runs the planning strategy
/// with no deadline and no cancellation hook.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub strategy: Strategy,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

/// Sequences tool calls for one query at a time: consults the dependency
/// resolver for prerequisites, the field mapper for cross-server inputs,
/// and the tool-server bridge for the invocations themselves. Every run
/// produces a sealed trace; per-query faults are absorbed into it rather
/// than surfaced as errors.
pub struct Orchestrator {
    config: Arc<AppConfig>,
    bridge: Arc<dyn ToolServerInterface>,
}

impl Orchestrator {
    pub fn new(config: Arc<AppConfig>, bridge: Arc<dyn ToolServerInterface>) -> Self {
        Self { config, bridge }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Execute one query to a sealed trace. Fails only on configuration
    /// misuse (no targets, or a target absent from the catalog) - and then
    /// before any step is recorded.
    pub async fn run(
        &self,
        signals: QuerySignals,
        options: OrchestratorOptions,
    ) -> Result<Trace, OrchestratorError> {
        if signals.targets.is_empty() {
            return Err(OrchestratorError::NoTargets);
        }
        for target in &signals.targets {
            self.config.catalog.lookup(target, "query target")?;
        }

        // Catalog order keeps multi-target runs deterministic no matter how
        // the classifier ordered the targets.
        let mut targets = signals.targets.clone();
        targets.sort_by_key(|t| self.config.catalog.position(t).unwrap_or(usize::MAX));
        targets.dedup();

        info!(
            strategy = options.strategy.as_str(),
            targets = targets.len(),
            "Orchestration run started"
        );

        let resolver = DependencyResolver::new(&self.config);
        let mapper = FieldMapper::new(&self.config.mappings);
        let deadline = options.timeout.map(|t| Instant::now() + t);

        let mut run = RunState::new(targets);
        let mut phase = Phase::Idle;

        loop {
            debug!(
                phase = phase.as_str(),
                steps = run.trace.steps().len(),
                "Orchestration phase"
            );
            phase = match phase {
                Phase::Idle => Phase::Resolving,
                Phase::Resolving => self.resolve_phase(
                    &mut run,
                    &signals,
                    &resolver,
                    options.strategy,
                    deadline,
                    options.cancel.as_ref(),
                ),
                Phase::Invoking => {
                    self.invoke_phase(&mut run, &signals, &resolver, &mapper, deadline)
                        .await
                }
                Phase::Recording => record_phase(&mut run),
                Phase::Sealing => {
                    seal_phase(&mut run);
                    Phase::Sealed
                }
                Phase::Sealed => break,
            };
        }

        info!(
            trace = run.trace.id(),
            steps = run.trace.steps().len(),
            "Trace sealed"
        );
        Ok(run.trace)
    }

    fn resolve_phase(
        &self,
        run: &mut RunState,
        signals: &QuerySignals,
        resolver: &DependencyResolver<'_>,
        strategy: Strategy,
        deadline: Option<Instant>,
        cancel: Option<&CancellationToken>,
    ) -> Phase {
        // Cancellation and the deadline are observed strictly between
        // steps, never mid-invocation.
        if !run.trace.steps().is_empty() {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                info!("Cancellation observed between steps");
                run.seal_reason = Some(SealReason::Cancelled);
                return Phase::Sealing;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!("Query deadline expired between steps");
                run.seal_reason = Some(SealReason::TimedOut);
                return Phase::Sealing;
            }
        }

        if run.queue.is_empty() {
            match strategy {
                Strategy::Planning => {
                    if run.trace.steps().is_empty() {
                        self.plan_all(run, signals, resolver);
                    }
                }
                Strategy::Reactive => self.plan_next(run, signals, resolver),
            }
        }

        if run.queue.is_empty() {
            run.seal_reason = Some(SealReason::Done);
            Phase::Sealing
        } else {
            Phase::Invoking
        }
    }

    /// Planning strategy: materialize the whole ordered call list before
    /// the first invocation. Prerequisite chains are resolved against the
    /// raw input only - nothing has been observed yet.
    fn plan_all(
        &self,
        run: &mut RunState,
        signals: &QuerySignals,
        resolver: &DependencyResolver<'_>,
    ) {
        let mut planned: HashSet<ToolRef> = HashSet::new();
        for target in run.remaining_targets.clone() {
            for prerequisite in resolver.resolve(&target, signals, &[]) {
                if planned.insert(prerequisite.clone()) {
                    run.queue.push_back(PlannedCall {
                        tool: prerequisite,
                        is_target: false,
                    });
                }
            }
            if planned.insert(target.clone()) {
                run.queue.push_back(PlannedCall {
                    tool: target,
                    is_target: true,
                });
            }
        }
        info!(
            calls = run.queue.len(),
            "Materialized full plan before execution"
        );
    }

    /// Reactive strategy: schedule exactly one call, re-resolving against
    /// the observations produced so far. This is what lets a rule like
    /// "summarize only if no summary field is present" consult a field that
    /// only exists after execution started.
    fn plan_next(
        &self,
        run: &mut RunState,
        signals: &QuerySignals,
        resolver: &DependencyResolver<'_>,
    ) {
        while let Some(target) = run.remaining_targets.first().cloned() {
            if self.chain_blocked(&target, run, signals, resolver) {
                warn!(target = %target, "Target unreachable after prerequisite failure");
                run.shortfalls
                    .push(format!("'{target}' could not run: a prerequisite failed"));
                run.drop_target(&target);
                continue;
            }
            let chain = resolver.resolve(&target, signals, run.trace.steps());
            let call = match chain.into_iter().next() {
                Some(prerequisite) => PlannedCall {
                    tool: prerequisite,
                    is_target: false,
                },
                None => PlannedCall {
                    tool: target,
                    is_target: true,
                },
            };
            run.queue.push_back(call);
            return;
        }
    }

    /// A tool is unreachable when it already failed or when its active
    /// prerequisite chain contains a failed tool.
    fn chain_blocked(
        &self,
        tool: &ToolRef,
        run: &RunState,
        signals: &QuerySignals,
        resolver: &DependencyResolver<'_>,
    ) -> bool {
        if run.failed.contains(tool) {
            return true;
        }
        resolver
            .resolve(tool, signals, run.trace.steps())
            .iter()
            .any(|prerequisite| run.failed.contains(prerequisite))
    }

    async fn invoke_phase(
        &self,
        run: &mut RunState,
        signals: &QuerySignals,
        resolver: &DependencyResolver<'_>,
        mapper: &FieldMapper<'_>,
        deadline: Option<Instant>,
    ) -> Phase {
        let Some(call) = run.queue.pop_front() else {
            return Phase::Resolving;
        };

        // A planned call may have become unreachable since planning.
        if self.chain_blocked(&call.tool, run, signals, resolver) {
            warn!(tool = %call.tool, "Skipping call whose prerequisite chain failed");
            if run.remaining_targets.contains(&call.tool) {
                run.shortfalls
                    .push(format!("'{}' could not run: a prerequisite failed", call.tool));
                run.drop_target(&call.tool);
            }
            return Phase::Resolving;
        }

        let (input, missing) = self.build_input(&call, signals, run, mapper);
        let mut thought = self.thought_for(&call, signals, run, resolver);
        if !missing.is_empty() {
            warn!(
                tool = %call.tool,
                missing = ?missing,
                "Required destination fields absent after translation"
            );
            thought.push_str(&format!(
                " Proceeding without required fields: {}.",
                missing.join(", ")
            ));
        }

        info!(server = %call.tool.server, tool = %call.tool.name, "Invoking tool");
        let invocation = self
            .bridge
            .invoke(&call.tool.server, &call.tool.name, input.clone());
        let result = match deadline {
            Some(deadline) => match timeout_at(deadline, invocation).await {
                Ok(result) => Some(result),
                Err(_) => None,
            },
            None => Some(invocation.await),
        };

        run.outcome = Some(match result {
            Some(Ok(observation)) => StepOutcome {
                call,
                thought,
                input,
                observation,
                succeeded: true,
                timed_out: false,
            },
            Some(Err(err)) => {
                warn!(tool = %call.tool, %err, "Tool invocation failed");
                StepOutcome {
                    call,
                    thought,
                    input,
                    observation: json!({ "error": err.to_string() }),
                    succeeded: false,
                    timed_out: false,
                }
            }
            None => {
                warn!(tool = %call.tool, "Tool invocation exceeded the query deadline");
                StepOutcome {
                    call,
                    thought,
                    input,
                    observation: json!({ "error": "invocation exceeded the query deadline" }),
                    succeeded: false,
                    timed_out: true,
                }
            }
        });
        Phase::Recording
    }

    /// Merge the raw query (plus any structured fields the caller supplied)
    /// with the field-mapper translation of the most recent successful
    /// observation. The very first step receives the raw query as-is.
    fn build_input(
        &self,
        call: &PlannedCall,
        signals: &QuerySignals,
        run: &RunState,
        mapper: &FieldMapper<'_>,
    ) -> (Value, Vec<String>) {
        let previous = run.trace.steps().iter().rev().find(|step| !step.is_error());

        let mut base = Map::new();
        base.insert("query".to_string(), Value::String(signals.query.clone()));
        for (name, value) in &signals.fields {
            base.insert(name.clone(), value.clone());
        }

        let Some(previous) = previous else {
            if signals.fields.is_empty() {
                return (Value::String(signals.query.clone()), Vec::new());
            }
            return (Value::Object(base), Vec::new());
        };

        match self.config.catalog.lookup(&call.tool, "input construction") {
            Ok(dest_tool) => {
                let translated = mapper.translate(
                    &previous.server,
                    &normalize_observation(&previous.observation),
                    &call.tool.server,
                    dest_tool,
                );
                for (name, value) in translated.fields {
                    base.insert(name, value);
                }
                (Value::Object(base), translated.missing)
            }
            // Unreachable after load-time validation; translate nothing.
            Err(_) => (Value::Object(base), Vec::new()),
        }
    }

    /// Mechanical rationale for a step. Derived from the rule table and the
    /// call's role so both strategies produce identical thoughts.
    fn thought_for(
        &self,
        call: &PlannedCall,
        signals: &QuerySignals,
        run: &RunState,
        resolver: &DependencyResolver<'_>,
    ) -> String {
        if !call.is_target {
            if let Some(rule) = self
                .config
                .rules
                .iter()
                .find(|rule| rule.requires == call.tool && rule.when.active(signals, &[]))
            {
                return format!(
                    "'{}' requires '{}' first because {}.",
                    rule.tool.name,
                    call.tool.name,
                    rule.when.describe()
                );
            }
        }
        if let Some(rule) = resolver.active_rule(&call.tool, signals, &[]) {
            let satisfied = run
                .trace
                .steps()
                .iter()
                .any(|step| step.tool_ref() == rule.requires && !step.is_error());
            if satisfied {
                return format!(
                    "'{}' has run; calling '{}' with its output mapped across servers.",
                    rule.requires.name, call.tool.name
                );
            }
        }
        format!(
            "The query calls for '{}' on '{}'; invoking it directly.",
            call.tool.name, call.tool.server
        )
    }
}

fn record_phase(run: &mut RunState) -> Phase {
    let Some(outcome) = run.outcome.take() else {
        return Phase::Sealing;
    };
    let tool = outcome.call.tool.clone();
    run.trace.record(Step {
        thought: outcome.thought,
        server: tool.server.clone(),
        tool: tool.name.clone(),
        input: outcome.input,
        observation: outcome.observation.clone(),
    });
    if !outcome.succeeded {
        run.failed.insert(tool.clone());
    }
    // A prerequisite that is also one of the query's targets counts as
    // answered by its single step; it is never invoked twice.
    if run.remaining_targets.contains(&tool) {
        run.drop_target(&tool);
        if outcome.succeeded {
            run.answered.push((tool, outcome.observation));
        } else {
            run.shortfalls
                .push(format!("'{tool}' failed during invocation"));
        }
    }
    if outcome.timed_out {
        run.seal_reason = Some(SealReason::TimedOut);
        return Phase::Sealing;
    }
    Phase::Resolving
}

fn seal_phase(run: &mut RunState) {
    let reason = run.seal_reason.take().unwrap_or(SealReason::Done);
    if reason == SealReason::Cancelled {
        run.trace.seal(Seal::Cancelled);
        return;
    }

    for target in run.remaining_targets.clone() {
        run.shortfalls.push(format!("'{target}' was not invoked"));
    }
    run.remaining_targets.clear();

    let summary = run
        .answered
        .last()
        .map(|(_, observation)| summarize(observation));
    let answer = match (reason, summary) {
        (SealReason::TimedOut, Some(summary)) => {
            format!("The run timed out before completing; partial result: {summary}")
        }
        (SealReason::TimedOut, None) => {
            "The run timed out before any result was produced.".to_string()
        }
        (_, Some(summary)) if run.shortfalls.is_empty() => summary,
        (_, Some(summary)) => format!(
            "{summary} (the query could not be fully answered: {})",
            run.shortfalls.join("; ")
        ),
        (_, None) => {
            let detail = if run.shortfalls.is_empty() {
                "no tool produced a result".to_string()
            } else {
                run.shortfalls.join("; ")
            };
            format!("The query could not be answered: {detail}")
        }
    };
    run.trace.seal(Seal::Answered(answer));
}

/// Single-sentence rendering of the last relevant observation.
fn summarize(observation: &Value) -> String {
    match observation {
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            for key in ["text", "answer", "result", "response", "summary", "price", "message"] {
                if let Some(text) = map.get(key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            observation.to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_prefers_well_known_text_fields() {
        assert_eq!(summarize(&json!("plain")), "plain");
        assert_eq!(
            summarize(&json!({"price": "$59.99", "currency": "USD"})),
            "$59.99"
        );
        assert_eq!(summarize(&json!({"score": 0.87})), r#"{"score":0.87}"#);
    }
}
