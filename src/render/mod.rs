mod mermaid;
mod views;

use crate::domain::Trace;
use serde::{Deserialize, Serialize};

/// Available projections of a trace. Every mode is pure and stateless:
/// rendering never alters step order or content, and rendering the same
/// sealed trace twice yields identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Directed node-and-edge diagram (Mermaid `graph LR`).
    GraphDiagram,
    /// Step-by-step markdown list.
    Timeline,
    /// One collapsible panel per step.
    GroupedPanels,
    /// Two-column table, input beside observation, one row per step.
    Grid,
    /// One tab per step.
    TabbedPanels,
    /// Chat-style exchange between the query and the tools.
    Conversational,
}

pub fn render(trace: &Trace, mode: RenderMode) -> String {
    match mode {
        RenderMode::GraphDiagram => mermaid::graph_diagram(trace),
        RenderMode::Timeline => views::timeline(trace),
        RenderMode::GroupedPanels => views::grouped_panels(trace),
        RenderMode::Grid => views::grid(trace),
        RenderMode::TabbedPanels => views::tabbed_panels(trace),
        RenderMode::Conversational => views::conversational(trace),
    }
}
