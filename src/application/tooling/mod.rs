mod error;
mod interface;

pub use error::ToolInvokeError;
pub use interface::ToolServerInterface;
