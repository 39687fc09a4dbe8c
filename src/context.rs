use serde_json::{json, Value};

use crate::types::{ContentBlock, InferenceRequest, InferenceResponse};

/// Owns the transcript the model sees for one exchange and builds each request from it.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    model: String,
    max_tokens: u32,
    system: Option<String>,
    tools: Vec<Value>,
    messages: Vec<Value>,
}

impl ConversationContext {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system: None,
            tools: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, schemas: Vec<Value>) -> Self {
        self.tools = schemas;
        self
    }

    /// The complete request for the next model call: tool catalogue plus full transcript.
    pub fn build_request(&self) -> InferenceRequest {
        InferenceRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: self.system.clone(),
            tools: self.tools.clone(),
            messages: self.messages.clone(),
        }
    }

    pub fn add_prompt(&mut self, prompt: &str) {
        self.messages.push(json!({
            "role": "user",
            "content": prompt,
        }));
    }

    /// Record the model's turn verbatim so tool_use ids stay resolvable.
    pub fn record_response(&mut self, response: &InferenceResponse) {
        let content: Vec<Value> = response
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text(text) => json!({
                    "type": "text",
                    "text": text,
                }),
                ContentBlock::ToolUse { id, name, input } => json!({
                    "type": "tool_use",
                    "id": id,
                    "name": name,
                    "input": input,
                }),
            })
            .collect();

        self.messages.push(json!({
            "role": "assistant",
            "content": content,
        }));
    }

    /// Record a tool result. Consecutive results share one user turn.
    pub fn record_tool_result(&mut self, call_id: &str, result: &str, is_error: bool) {
        let mut tool_result = json!({
            "type": "tool_result",
            "tool_use_id": call_id,
            "content": result,
        });
        if is_error {
            tool_result["is_error"] = json!(true);
        }

        if let Some(last) = self.messages.last_mut() {
            let is_tool_result_msg = last["role"] == "user"
                && last["content"]
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(|c| c.get("type"))
                    .and_then(Value::as_str)
                    == Some("tool_result");

            if is_tool_result_msg {
                if let Some(arr) = last.get_mut("content").and_then(Value::as_array_mut) {
                    arr.push(tool_result);
                    return;
                }
            }
        }

        self.messages.push(json!({
            "role": "user",
            "content": [tool_result],
        }));
    }

    pub fn messages(&self) -> &[Value] {
        &self.messages
    }
}
