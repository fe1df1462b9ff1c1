use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Address of a tool within the catalog: its hosting server plus the tool
/// name unique within that server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolRef {
    pub server: String,
    pub name: String,
}

impl ToolRef {
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.name)
    }
}

/// Execution strategy for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Materialize the full ordered plan before the first invocation.
    #[default]
    Planning,
    /// Resolve one step, invoke it, observe, then resolve again.
    Reactive,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Planning => "planning",
            Strategy::Reactive => "reactive",
        }
    }
}

/// Output of the external classification boundary, opaque to the engine:
/// which top-level tools the query implies and whether its content is
/// non-English, plus any structured fields supplied alongside the raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySignals {
    pub query: String,
    #[serde(default)]
    pub non_english: bool,
    pub targets: Vec<ToolRef>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl QuerySignals {
    pub fn new(query: impl Into<String>, targets: Vec<ToolRef>) -> Self {
        Self {
            query: query.into(),
            non_english: false,
            targets,
            fields: Map::new(),
        }
    }

    pub fn non_english(mut self) -> Self {
        self.non_english = true;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// One executed tool call: rationale, address, the input the planner built,
/// and the observation the tool returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub thought: String,
    pub server: String,
    pub tool: String,
    pub input: Value,
    pub observation: Value,
}

impl Step {
    pub fn tool_ref(&self) -> ToolRef {
        ToolRef::new(self.server.clone(), self.tool.clone())
    }

    /// Whether the observation carries the error marker the planner records
    /// for failed invocations.
    pub fn is_error(&self) -> bool {
        self.observation
            .as_object()
            .is_some_and(|map| map.contains_key("error"))
    }
}

/// Terminal marker of a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seal {
    /// Normal completion (possibly a degraded answer).
    Answered(String),
    /// The caller abandoned the query between steps.
    Cancelled,
}

/// Append-only record of everything executed for one query. Sealed exactly
/// once; no mutation is possible afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    id: String,
    steps: Vec<Step>,
    seal: Option<Seal>,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            steps: Vec::new(),
            seal: None,
        }
    }

    pub(crate) fn record(&mut self, step: Step) {
        debug_assert!(self.seal.is_none(), "step recorded after seal");
        if self.seal.is_none() {
            self.steps.push(step);
        }
    }

    pub(crate) fn seal(&mut self, seal: Seal) {
        debug_assert!(self.seal.is_none(), "trace sealed twice");
        if self.seal.is_none() {
            self.seal = Some(seal);
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_some()
    }

    pub fn outcome(&self) -> Option<&Seal> {
        self.seal.as_ref()
    }

    pub fn final_answer(&self) -> Option<&str> {
        match &self.seal {
            Some(Seal::Answered(answer)) => Some(answer),
            _ => None,
        }
    }

    /// The raw query is not stored separately; it is always the input of the
    /// first step, which every valid trace has.
    pub fn query_label(&self) -> String {
        self.steps
            .first()
            .map(|step| value_label(&step.input))
            .unwrap_or_default()
    }

    /// Serialize to the wire contract: one record per step followed by one
    /// terminal record.
    pub fn to_records(&self) -> Vec<TraceRecord> {
        let mut records: Vec<TraceRecord> = self
            .steps
            .iter()
            .map(|step| TraceRecord::Step {
                thought: step.thought.clone(),
                server: step.server.clone(),
                tool: step.tool.clone(),
                input: step.input.clone(),
                observation: step.observation.clone(),
            })
            .collect();
        match &self.seal {
            Some(Seal::Answered(answer)) => records.push(TraceRecord::Final {
                final_answer: answer.clone(),
            }),
            Some(Seal::Cancelled) => records.push(TraceRecord::Cancelled { cancelled: true }),
            None => {}
        }
        records
    }

    /// Rebuild a trace from its wire records, validating the shape: at least
    /// one step, exactly one terminal record, terminal record last.
    pub fn from_records(records: Vec<TraceRecord>) -> Result<Self, TraceFormatError> {
        let mut trace = Trace::new();
        for record in records {
            if trace.seal.is_some() {
                return Err(TraceFormatError::RecordAfterTerminal);
            }
            match record {
                TraceRecord::Step {
                    thought,
                    server,
                    tool,
                    input,
                    observation,
                } => trace.steps.push(Step {
                    thought,
                    server,
                    tool,
                    input,
                    observation,
                }),
                TraceRecord::Final { final_answer } => {
                    trace.seal = Some(Seal::Answered(final_answer));
                }
                TraceRecord::Cancelled { .. } => {
                    trace.seal = Some(Seal::Cancelled);
                }
            }
        }
        if trace.seal.is_none() {
            return Err(TraceFormatError::MissingTerminal);
        }
        if trace.steps.is_empty() {
            return Err(TraceFormatError::NoSteps);
        }
        Ok(trace)
    }
}

/// Wire/storage representation of a trace entry. The exact field names are
/// a contract with external tooling (UI, logging) and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceRecord {
    Step {
        thought: String,
        server: String,
        tool: String,
        input: Value,
        observation: Value,
    },
    Final {
        final_answer: String,
    },
    Cancelled {
        cancelled: bool,
    },
}

#[derive(Debug, Error)]
pub enum TraceFormatError {
    #[error("trace records must end with exactly one terminal record")]
    MissingTerminal,
    #[error("trace contains records after the terminal record")]
    RecordAfterTerminal,
    #[error("a trace must contain at least one step")]
    NoSteps,
}

/// Short human-readable label for an opaque structured value, used by the
/// renderers for node and panel titles.
pub(crate) fn value_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("query")
            .or_else(|| map.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_step() -> Step {
        Step {
            thought: "call it".into(),
            server: "MCP-OSB".into(),
            tool: "price_checker".into(),
            input: json!("What is the price?"),
            observation: json!("The estimated price is $59.99"),
        }
    }

    #[test]
    fn sealed_trace_reports_final_answer() {
        let mut trace = Trace::new();
        trace.record(sample_step());
        trace.seal(Seal::Answered("done".into()));
        assert!(trace.is_sealed());
        assert_eq!(trace.final_answer(), Some("done"));
    }

    #[test]
    fn wire_records_round_trip() {
        let mut trace = Trace::new();
        trace.record(sample_step());
        trace.seal(Seal::Answered("The estimated price is $59.99.".into()));

        let records = trace.to_records();
        let rebuilt = Trace::from_records(records).expect("round trip");
        assert_eq!(rebuilt.steps(), trace.steps());
        assert_eq!(rebuilt.final_answer(), trace.final_answer());
    }

    #[test]
    fn terminal_record_is_required_and_final() {
        let step = TraceRecord::Step {
            thought: String::new(),
            server: "s".into(),
            tool: "t".into(),
            input: json!(null),
            observation: json!(null),
        };
        assert!(matches!(
            Trace::from_records(vec![step.clone()]),
            Err(TraceFormatError::MissingTerminal)
        ));
        assert!(matches!(
            Trace::from_records(vec![
                step.clone(),
                TraceRecord::Final {
                    final_answer: "x".into()
                },
                step,
            ]),
            Err(TraceFormatError::RecordAfterTerminal)
        ));
    }

    #[test]
    fn zero_step_trace_is_invalid() {
        let records = vec![TraceRecord::Final {
            final_answer: "nothing ran".into(),
        }];
        assert!(matches!(
            Trace::from_records(records),
            Err(TraceFormatError::NoSteps)
        ));
    }
}
