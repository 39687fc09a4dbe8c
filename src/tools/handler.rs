use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;

/// A tool's execution handler. Implement this for each tool the model may call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool. `Ok` is the tool result content sent back to the model.
    async fn call(&self, input: &Value) -> Result<String, ToolError>;
}

/// A tool definition: schema for the LLM + handler for execution.
pub struct ToolDef {
    pub name: String,
    pub schema: Value,
    pub(crate) handler: Box<dyn ToolHandler>,
}
