use thiserror::Error;

/// Failures at the external tool-invocation boundary. These are never
/// fatal to a run: the planner absorbs them into the trace as error-marked
/// observations.
#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool server '{server}' is unavailable")]
    Unavailable { server: String },

    #[error("tool '{tool}' on server '{server}' rejected the input: {message}")]
    Rejected {
        server: String,
        tool: String,
        message: String,
    },

    #[error("tool '{tool}' on server '{server}' failed: {message}")]
    Failed {
        server: String,
        tool: String,
        message: String,
    },
}
