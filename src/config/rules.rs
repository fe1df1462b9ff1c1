use crate::domain::{QuerySignals, Step, ToolRef};
use serde::{Deserialize, Serialize};

/// Condition under which a dependency rule activates. Every predicate is
/// evaluable either from the raw input signals alone or from the
/// observations of steps already executed - never from a tool that has not
/// run yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPredicate {
    /// The external classifier flagged the query content as non-English.
    InputNotEnglish,
    /// Neither the structured raw input nor any prior observation carries
    /// the named field yet.
    FieldAbsent(String),
    Always,
}

impl ActivationPredicate {
    pub fn active(&self, signals: &QuerySignals, prior: &[Step]) -> bool {
        match self {
            ActivationPredicate::InputNotEnglish => signals.non_english,
            ActivationPredicate::FieldAbsent(field) => {
                !signals.fields.contains_key(field) && !observed(prior, field)
            }
            ActivationPredicate::Always => true,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ActivationPredicate::InputNotEnglish => "the input is not in English".to_string(),
            ActivationPredicate::FieldAbsent(field) => {
                format!("no '{field}' field is present in the input")
            }
            ActivationPredicate::Always => "it is always required".to_string(),
        }
    }
}

fn observed(prior: &[Step], field: &str) -> bool {
    prior.iter().any(|step| {
        step.observation
            .as_object()
            .is_some_and(|map| map.contains_key(field))
    })
}

/// Declarative requirement that `requires` run before `tool` whenever
/// `when` holds. The rule table is a single-prerequisite chain: the loader
/// admits at most one rule per tool, so at most one prerequisite can ever
/// be active for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRule {
    pub tool: ToolRef,
    pub requires: ToolRef,
    pub when: ActivationPredicate,
}
