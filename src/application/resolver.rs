use crate::config::AppConfig;
use crate::domain::{QuerySignals, Step, ToolRef};
use tracing::debug;

/// Determines which prerequisite tools, if any, must run before a target.
/// Consults the rule table against the raw input signals and the
/// observations already recorded for this query.
pub struct DependencyResolver<'a> {
    config: &'a AppConfig,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Ordered prerequisites for `target`, each at most once, prerequisite
    /// always before dependent, transitively resolved. A prerequisite whose
    /// step has already been recorded is skipped: the engine calls the
    /// minimum number of tools.
    pub fn resolve(&self, target: &ToolRef, signals: &QuerySignals, prior: &[Step]) -> Vec<ToolRef> {
        let mut chain = Vec::new();
        let mut visiting = Vec::new();
        self.resolve_into(target, signals, prior, &mut chain, &mut visiting);
        debug!(
            target = %target,
            prerequisites = chain.len(),
            "Resolved dependency chain"
        );
        chain
    }

    /// The active dependency rule for a tool under the current signals,
    /// if any. At most one rule can exist per tool; the loader rejects
    /// second rules outright.
    pub fn active_rule(
        &self,
        target: &ToolRef,
        signals: &QuerySignals,
        prior: &[Step],
    ) -> Option<&'a crate::config::DependencyRule> {
        self.config
            .rules
            .iter()
            .find(|rule| &rule.tool == target && rule.when.active(signals, prior))
    }

    fn resolve_into(
        &self,
        target: &ToolRef,
        signals: &QuerySignals,
        prior: &[Step],
        chain: &mut Vec<ToolRef>,
        visiting: &mut Vec<ToolRef>,
    ) {
        // Load-time validation rejects cycles; the visited list only guards
        // against runaway recursion if that invariant is ever broken.
        if visiting.contains(target) {
            return;
        }
        visiting.push(target.clone());

        if let Some(rule) = self.active_rule(target, signals, prior) {
            let prerequisite = &rule.requires;
            // A failed step produced no usable observation, so it does not
            // satisfy the prerequisite.
            let already_ran = prior
                .iter()
                .any(|step| &step.tool_ref() == prerequisite && !step.is_error());
            if !already_ran && !chain.contains(prerequisite) {
                self.resolve_into(prerequisite, signals, prior, chain, visiting);
                chain.push(prerequisite.clone());
            }
        }

        visiting.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuerySignals;
    use serde_json::json;

    fn demo() -> AppConfig {
        AppConfig::demo()
    }

    fn price_checker() -> ToolRef {
        ToolRef::new("MCP-OSB", "price_checker")
    }

    #[test]
    fn no_prerequisite_when_predicate_is_inactive() {
        let config = demo();
        let resolver = DependencyResolver::new(&config);
        let signals = QuerySignals::new("What is the price of model X?", vec![price_checker()]);
        assert!(resolver.resolve(&price_checker(), &signals, &[]).is_empty());
    }

    #[test]
    fn translation_precedes_price_check_for_non_english_input() {
        let config = demo();
        let resolver = DependencyResolver::new(&config);
        let signals =
            QuerySignals::new("¿Cuál es el precio?", vec![price_checker()]).non_english();
        let chain = resolver.resolve(&price_checker(), &signals, &[]);
        assert_eq!(chain, vec![ToolRef::new("MCP-OTN", "translate_to_english")]);
    }

    #[test]
    fn prerequisite_already_executed_is_skipped() {
        let config = demo();
        let resolver = DependencyResolver::new(&config);
        let signals =
            QuerySignals::new("¿Cuál es el precio?", vec![price_checker()]).non_english();
        let prior = vec![Step {
            thought: String::new(),
            server: "MCP-OTN".into(),
            tool: "translate_to_english".into(),
            input: json!("¿Cuál es el precio?"),
            observation: json!({"text": "What is the price?", "model_id": "abc123"}),
        }];
        assert!(resolver.resolve(&price_checker(), &signals, &prior).is_empty());
    }

    #[test]
    fn summary_chain_activates_only_when_summary_is_absent() {
        let config = demo();
        let resolver = DependencyResolver::new(&config);
        let score = ToolRef::new("MCP-OSB", "score_summary");

        let without = QuerySignals::new("score this document", vec![score.clone()]);
        assert_eq!(
            resolver.resolve(&score, &without, &[]),
            vec![ToolRef::new("MCP-OTN", "summarize_text")]
        );

        let with = QuerySignals::new("score this document", vec![score.clone()])
            .with_field("summary", json!("already summarized"));
        assert!(resolver.resolve(&score, &with, &[]).is_empty());
    }
}
