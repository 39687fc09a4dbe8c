pub mod context;
pub mod error;
pub mod events;
pub mod inference;
pub mod note;
pub mod tools;
pub mod types;
pub mod validate;

use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

pub use context::ConversationContext;
pub use error::{AgentError, InferenceError, StorageError, ToolError, ValidationError};
pub use events::ConversationEvent;
pub use inference::{AnthropicProvider, InferenceProvider};
pub use note::{Author, Note, Priority, SaveNoteResponse};
pub use tools::{
    AcknowledgeSink, NoteSink, SaveNoteExecutor, SaveNoteTool, ToolHandler, ToolRegistry,
};
pub use types::{ContentBlock, InferenceRequest, InferenceResponse, StopReason, Usage};
pub use validate::validate;

/// What the driver does when the model's tool input fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationFailurePolicy {
    /// Send the error back as an `is_error` tool result and let the model answer.
    #[default]
    ReportToModel,
    /// Stop the exchange and return `AgentError::Validation`.
    Abort,
}

/// Conversation configuration.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub system: Option<String>,
    pub validation_failure: ValidationFailurePolicy,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 1024,
            system: None,
            validation_failure: ValidationFailurePolicy::default(),
        }
    }
}

/// One executed tool call.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub id: String,
    pub name: String,
    pub output: String,
    pub is_error: bool,
}

/// Result of one exchange.
#[derive(Debug)]
pub struct ConversationResult {
    pub text: String,
    pub tool_outcomes: Vec<ToolOutcome>,
    pub model_calls: usize,
    pub usage: Usage,
}

/// A registry holding only the `save_note` tool.
pub fn save_note_registry() -> ToolRegistry {
    ToolRegistry::new().add(
        tools::save_note::TOOL_NAME,
        tools::save_note::schema(),
        SaveNoteTool::new(),
    )
}

enum State {
    AwaitingModel,
    AwaitingToolResult(InferenceResponse),
    Final(InferenceResponse),
}

/// Drives one exchange: prompt, optional tool round, final reply.
/// Borrows its provider and tools; every `send` starts a fresh transcript.
pub struct Conversation<'a> {
    provider: &'a dyn InferenceProvider,
    tools: &'a ToolRegistry,
    config: ConversationConfig,
}

impl<'a> Conversation<'a> {
    pub fn new(
        provider: &'a dyn InferenceProvider,
        tools: &'a ToolRegistry,
        config: ConversationConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub async fn send(&self, prompt: &str) -> Result<ConversationResult, AgentError> {
        self.run(prompt, None).await
    }

    /// Like `send`, emitting progress events. A dropped receiver is ignored.
    pub async fn send_streaming(
        &self,
        prompt: &str,
        tx: Sender<ConversationEvent>,
    ) -> Result<ConversationResult, AgentError> {
        self.run(prompt, Some(&tx)).await
    }

    async fn run(
        &self,
        prompt: &str,
        tx: Option<&Sender<ConversationEvent>>,
    ) -> Result<ConversationResult, AgentError> {
        let mut context = ConversationContext::new(&self.config.model, self.config.max_tokens)
            .with_tools(self.tools.schemas());
        if let Some(ref system) = self.config.system {
            context = context.with_system(system);
        }
        context.add_prompt(prompt);

        let mut model_calls = 0;
        let mut usage = Usage::default();
        let mut tool_outcomes = Vec::new();
        let mut tools_answered = false;
        let mut state = State::AwaitingModel;

        loop {
            state = match state {
                State::AwaitingModel => {
                    model_calls += 1;
                    emit(tx, ConversationEvent::ModelCall { call: model_calls }).await;
                    info!(call = model_calls, "calling model");

                    let response = self.provider.infer(context.build_request()).await?;
                    usage.accumulate(&response.usage);
                    context.record_response(&response);

                    for block in &response.content {
                        if let ContentBlock::Text(text) = block {
                            emit(tx, ConversationEvent::Text { content: text.clone() }).await;
                        }
                    }

                    // Only the first reply may trigger tools; the next one is final.
                    if response.has_tool_use() && !tools_answered {
                        State::AwaitingToolResult(response)
                    } else {
                        if response.has_tool_use() {
                            warn!("model requested tools after the tool round, ignoring");
                        }
                        State::Final(response)
                    }
                }
                State::AwaitingToolResult(response) => {
                    for block in &response.content {
                        let ContentBlock::ToolUse { id, name, input } = block else {
                            continue;
                        };
                        emit(
                            tx,
                            ConversationEvent::ToolCall {
                                name: name.clone(),
                                input: input.clone(),
                            },
                        )
                        .await;

                        let (output, is_error) = match self.tools.execute(name, input).await {
                            Ok(output) => (output, false),
                            Err(ToolError::Validation(e))
                                if self.config.validation_failure
                                    == ValidationFailurePolicy::Abort =>
                            {
                                warn!(tool = %name, error = %e, "tool input rejected, aborting");
                                return Err(AgentError::Validation(e));
                            }
                            Err(e) => {
                                warn!(
                                    tool = %name,
                                    error = %e,
                                    "tool call failed, reporting to model"
                                );
                                (e.to_string(), true)
                            }
                        };

                        emit(
                            tx,
                            ConversationEvent::ToolResult {
                                name: name.clone(),
                                output: output.clone(),
                                is_error,
                            },
                        )
                        .await;

                        context.record_tool_result(id, &output, is_error);
                        tool_outcomes.push(ToolOutcome {
                            id: id.clone(),
                            name: name.clone(),
                            output,
                            is_error,
                        });
                    }
                    tools_answered = true;
                    State::AwaitingModel
                }
                State::Final(response) => {
                    emit(tx, ConversationEvent::Finished { model_calls }).await;
                    info!(model_calls, tools = tool_outcomes.len(), "conversation finished");
                    return Ok(ConversationResult {
                        text: response.text(),
                        tool_outcomes,
                        model_calls,
                        usage,
                    });
                }
            };
        }
    }
}

async fn emit(tx: Option<&Sender<ConversationEvent>>, event: ConversationEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}
