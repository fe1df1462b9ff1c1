// Wire-contract tests for the trace record format and the render surface.

use mcp_toolchain::render::RenderMode;
use mcp_toolchain::{Trace, TraceRecord, render};
use serde_json::{Value, json};

fn sample_records() -> Vec<TraceRecord> {
    vec![
        TraceRecord::Step {
            thought: "The query calls for 'translate_to_english' on 'MCP-OTN'; invoking it directly."
                .into(),
            server: "MCP-OTN".into(),
            tool: "translate_to_english".into(),
            input: json!("¿Cuál es el precio del modelo X?"),
            observation: json!({"text": "What is the price of model X?", "model_id": "abc123"}),
        },
        TraceRecord::Step {
            thought: "'translate_to_english' has run; calling 'price_checker' with its output mapped across servers."
                .into(),
            server: "MCP-OSB".into(),
            tool: "price_checker".into(),
            input: json!({"query": "What is the price of model X?", "mdlid": "abc123"}),
            observation: json!("The estimated price is $59.99"),
        },
        TraceRecord::Final {
            final_answer: "The estimated price is $59.99".into(),
        },
    ]
}

#[test]
fn step_records_serialize_with_the_exact_field_names() {
    let serialized = serde_json::to_value(sample_records()).expect("serialize");
    let array = serialized.as_array().expect("array");
    assert_eq!(array.len(), 3);

    let step = array[0].as_object().expect("step object");
    let mut keys: Vec<&str> = step.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["input", "observation", "server", "thought", "tool"]);

    let terminal = array[2].as_object().expect("terminal object");
    assert_eq!(terminal.len(), 1);
    assert!(terminal.contains_key("final_answer"));
}

#[test]
fn records_parse_back_from_plain_json() {
    let text = serde_json::to_string(&sample_records()).expect("serialize");
    let parsed: Vec<TraceRecord> = serde_json::from_str(&text).expect("parse");
    assert_eq!(parsed, sample_records());

    let trace = Trace::from_records(parsed).expect("valid shape");
    assert_eq!(trace.steps().len(), 2);
    assert_eq!(trace.final_answer(), Some("The estimated price is $59.99"));
}

#[test]
fn cancelled_terminal_round_trips() {
    let records = vec![
        TraceRecord::Step {
            thought: String::new(),
            server: "MCP-OTN".into(),
            tool: "translate_to_english".into(),
            input: json!("hola"),
            observation: json!({"text": "hello"}),
        },
        TraceRecord::Cancelled { cancelled: true },
    ];
    let text = serde_json::to_string(&records).expect("serialize");
    let value: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value[1], json!({"cancelled": true}));

    let parsed: Vec<TraceRecord> = serde_json::from_str(&text).expect("parse");
    let trace = Trace::from_records(parsed).expect("valid shape");
    assert!(trace.is_sealed());
    assert_eq!(trace.final_answer(), None);
}

#[test]
fn rendering_is_a_pure_projection() {
    let trace = Trace::from_records(sample_records()).expect("valid shape");
    for mode in [
        RenderMode::GraphDiagram,
        RenderMode::Timeline,
        RenderMode::GroupedPanels,
        RenderMode::Grid,
        RenderMode::TabbedPanels,
        RenderMode::Conversational,
    ] {
        let first = render(&trace, mode);
        let second = render(&trace, mode);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
    // The trace itself is untouched by rendering.
    assert_eq!(trace.to_records(), sample_records());
}

#[test]
fn graph_diagram_chains_query_steps_and_answer() {
    let trace = Trace::from_records(sample_records()).expect("valid shape");
    let diagram = render(&trace, RenderMode::GraphDiagram);

    assert!(diagram.starts_with("graph LR"));
    assert!(diagram.contains("Query"));
    assert!(diagram.contains("translate_to_english"));
    assert!(diagram.contains("price_checker"));
    assert!(diagram.contains("Final"));
    // Steps appear in trace order.
    let translate_at = diagram.find("translate_to_english").expect("first tool");
    let price_at = diagram.find("price_checker").expect("second tool");
    assert!(translate_at < price_at);
}
