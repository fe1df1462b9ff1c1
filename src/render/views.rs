use crate::domain::{Seal, Trace, value_label};
use serde_json::Value;

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn outcome_line(trace: &Trace) -> String {
    match trace.outcome() {
        Some(Seal::Answered(answer)) => format!("**Final answer:** {answer}"),
        Some(Seal::Cancelled) => "**Cancelled** before a final answer was produced.".to_string(),
        None => String::new(),
    }
}

/// Step-by-step markdown list, one block per step in execution order.
pub(super) fn timeline(trace: &Trace) -> String {
    let mut out = String::from("## Timeline\n");
    for (index, step) in trace.steps().iter().enumerate() {
        out.push_str(&format!(
            "\n#### Step {}: `{}` ({})\n- **Thought:** {}\n- **Input:** `{}`\n- **Observation:** `{}`\n",
            index + 1,
            step.tool,
            step.server,
            step.thought,
            value_label(&step.input),
            value_label(&step.observation),
        ));
    }
    out.push('\n');
    out.push_str(&outcome_line(trace));
    out
}

/// One collapsible panel per step: a header line followed by the full
/// input and observation payloads.
pub(super) fn grouped_panels(trace: &Trace) -> String {
    let mut out = String::from("## Steps\n");
    for (index, step) in trace.steps().iter().enumerate() {
        out.push_str(&format!(
            "\n<details>\n<summary>{} (step {} on {})</summary>\n\nInput:\n```json\n{}\n```\n\nObservation:\n```json\n{}\n```\n</details>\n",
            step.tool,
            index + 1,
            step.server,
            pretty(&step.input),
            pretty(&step.observation),
        ));
    }
    out.push('\n');
    out.push_str(&outcome_line(trace));
    out
}

/// One markdown table row per step, input beside observation.
pub(super) fn grid(trace: &Trace) -> String {
    let mut out = String::from(
        "## Grid\n\n| # | Tool | Input | Observation |\n| --- | --- | --- | --- |\n",
    );
    for (index, step) in trace.steps().iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} ({}) | {} | {} |\n",
            index + 1,
            step.tool,
            step.server,
            cell(&value_label(&step.input)),
            cell(&value_label(&step.observation)),
        ));
    }
    out.push('\n');
    out.push_str(&outcome_line(trace));
    out
}

/// Pipes and newlines would break the table row.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// One tab per step: the tab strip first, then each tab's body in order.
pub(super) fn tabbed_panels(trace: &Trace) -> String {
    let strip: Vec<String> = trace
        .steps()
        .iter()
        .map(|step| format!("[{}]", step.tool))
        .collect();
    let mut out = format!("{}\n", strip.join(" "));
    for (index, step) in trace.steps().iter().enumerate() {
        out.push_str(&format!(
            "\n--- tab {}: {} ({}) ---\n{}\n=> {}\n",
            index + 1,
            step.tool,
            step.server,
            value_label(&step.input),
            value_label(&step.observation),
        ));
    }
    out.push('\n');
    out.push_str(&outcome_line(trace));
    out
}

/// Chat-style view: the query as the user turn, each step as an assistant
/// turn, the final answer closing the conversation.
pub(super) fn conversational(trace: &Trace) -> String {
    let mut out = format!("user: {}\n", trace.query_label());
    for step in trace.steps() {
        out.push_str(&format!(
            "assistant [{}/{}]: {}\n  input: {}\n  observation: {}\n",
            step.server,
            step.tool,
            step.thought,
            value_label(&step.input),
            value_label(&step.observation),
        ));
    }
    match trace.outcome() {
        Some(Seal::Answered(answer)) => out.push_str(&format!("assistant: {answer}\n")),
        Some(Seal::Cancelled) => out.push_str("assistant: (cancelled)\n"),
        None => {}
    }
    out
}
