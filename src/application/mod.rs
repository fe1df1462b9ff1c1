pub mod mapper;
pub mod planner;
pub mod resolver;
pub mod stdio;
pub mod tooling;

pub use mapper::{FieldMapper, Translated};
pub use planner::{Orchestrator, OrchestratorError, OrchestratorOptions};
pub use resolver::DependencyResolver;
pub use tooling::{ToolInvokeError, ToolServerInterface};
