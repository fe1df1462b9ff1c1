use super::error::ToolInvokeError;
use async_trait::async_trait;
use serde_json::Value;

/// The only side-effecting boundary of the engine. The orchestrator decides
/// what to call and with what input; performing the call belongs to the
/// implementor behind this trait (a real server bridge in production, a
/// scripted stand-in under test).
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    async fn invoke(
        &self,
        server: &str,
        tool: &str,
        input: Value,
    ) -> Result<Value, ToolInvokeError>;
}
