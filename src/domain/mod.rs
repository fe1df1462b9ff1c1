mod types;

pub use types::{
    QuerySignals, Seal, Step, Strategy, ToolRef, Trace, TraceFormatError, TraceRecord,
};
pub(crate) use types::value_label;
