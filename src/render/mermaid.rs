use crate::domain::{Trace, value_label};

/// Mermaid `graph LR` projection: the initial query is the single source
/// node, each step contributes a tool node and a response node, and edges
/// flow previous-response -> tool -> response in strict step order. The
/// diagram is always a linear chain because the trace itself is already
/// linearized to execution order.
pub(super) fn graph_diagram(trace: &Trace) -> String {
    let mut lines = vec!["graph LR".to_string()];
    let mut previous = format!("Query[\"{}\"]", escape(&trace.query_label()));

    for (index, step) in trace.steps().iter().enumerate() {
        let tool_node = format!("Tool{index}[{}]", escape(&step.tool));
        let response_node = format!(
            "Resp{index}[\"{}\"]",
            escape(&value_label(&step.observation))
        );
        lines.push(format!("{previous} --> {tool_node}"));
        lines.push(format!("{tool_node} --> {response_node}"));
        previous = response_node;
    }

    if let Some(answer) = trace.final_answer() {
        lines.push(format!("{previous} --> Final[\"{}\"]", escape(answer)));
    }

    lines.join("\n")
}

/// Mermaid breaks on raw quotes and newlines inside node labels.
fn escape(label: &str) -> String {
    label.replace('"', "#quot;").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Trace, TraceRecord};
    use serde_json::json;

    fn sample_trace() -> Trace {
        Trace::from_records(vec![
            TraceRecord::Step {
                thought: "direct call".into(),
                server: "MCP-OSB".into(),
                tool: "price_checker".into(),
                input: json!("What is the price of model X?"),
                observation: json!("The estimated price is $59.99"),
            },
            TraceRecord::Final {
                final_answer: "The estimated price is $59.99".into(),
            },
        ])
        .expect("valid trace")
    }

    #[test]
    fn diagram_is_a_linear_chain_in_step_order() {
        let diagram = graph_diagram(&sample_trace());
        let lines: Vec<&str> = diagram.lines().collect();
        assert_eq!(lines[0], "graph LR");
        assert_eq!(
            lines[1],
            "Query[\"What is the price of model X?\"] --> Tool0[price_checker]"
        );
        assert_eq!(
            lines[2],
            "Tool0[price_checker] --> Resp0[\"The estimated price is $59.99\"]"
        );
        assert!(lines[3].starts_with("Resp0["));
        assert!(lines[3].contains("Final["));
    }

    #[test]
    fn quotes_in_labels_are_escaped() {
        let trace = Trace::from_records(vec![
            TraceRecord::Step {
                thought: String::new(),
                server: "MCP-XYZ".into(),
                tool: "detect_intent".into(),
                input: json!("say \"hello\""),
                observation: json!({"intent": "greeting"}),
            },
            TraceRecord::Final {
                final_answer: "greeting".into(),
            },
        ])
        .expect("valid trace");
        let diagram = graph_diagram(&trace);
        assert!(diagram.contains("#quot;hello#quot;"));
    }
}
