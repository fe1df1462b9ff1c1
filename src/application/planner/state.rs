use crate::domain::{ToolRef, Trace};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Phases of the per-query state machine. One query moves strictly
/// `Idle -> Resolving -> Invoking -> Recording -> (Resolving | Sealing) ->
/// Sealed`; tool calls are issued sequentially, never concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Idle,
    Resolving,
    Invoking,
    Recording,
    Sealing,
    Sealed,
}

impl Phase {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving",
            Phase::Invoking => "invoking",
            Phase::Recording => "recording",
            Phase::Sealing => "sealing",
            Phase::Sealed => "sealed",
        }
    }
}

/// One scheduled invocation: the tool to call and whether it is a query
/// target (as opposed to a prerequisite inserted by the resolver).
#[derive(Debug, Clone)]
pub(super) struct PlannedCall {
    pub tool: ToolRef,
    pub is_target: bool,
}

/// Why the run is moving to `Sealing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SealReason {
    Done,
    TimedOut,
    Cancelled,
}

/// Outcome of the invocation currently awaiting recording.
pub(super) struct StepOutcome {
    pub call: PlannedCall,
    pub thought: String,
    pub input: Value,
    pub observation: Value,
    pub succeeded: bool,
    pub timed_out: bool,
}

/// Mutable bookkeeping for one query run. Everything here is owned by a
/// single orchestration pass; the shared configuration stays read-only.
pub(super) struct RunState {
    pub trace: Trace,
    /// Targets not yet invoked or written off, in execution order.
    pub remaining_targets: Vec<ToolRef>,
    pub queue: VecDeque<PlannedCall>,
    /// Tools whose invocation errored during this run.
    pub failed: HashSet<ToolRef>,
    /// Target observations that succeeded, in execution order.
    pub answered: Vec<(ToolRef, Value)>,
    /// Human-readable notes about targets that could not be answered.
    pub shortfalls: Vec<String>,
    pub outcome: Option<StepOutcome>,
    pub seal_reason: Option<SealReason>,
}

impl RunState {
    pub(super) fn new(targets: Vec<ToolRef>) -> Self {
        Self {
            trace: Trace::new(),
            remaining_targets: targets,
            queue: VecDeque::new(),
            failed: HashSet::new(),
            answered: Vec::new(),
            shortfalls: Vec::new(),
            outcome: None,
            seal_reason: None,
        }
    }

    pub(super) fn drop_target(&mut self, target: &ToolRef) {
        self.remaining_targets.retain(|t| t != target);
    }
}
