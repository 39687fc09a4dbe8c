use serde_json::Value;

/// Events emitted while a conversation runs, for UI streaming.
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    ModelCall { call: usize },
    Text { content: String },
    ToolCall { name: String, input: Value },
    ToolResult { name: String, output: String, is_error: bool },
    Finished { model_calls: usize },
}
