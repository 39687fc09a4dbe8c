use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::handler::ToolHandler;
use crate::error::{StorageError, ToolError};
use crate::note::{
    Note, SaveNoteResponse, DEFAULT_IS_PUBLIC, DEFAULT_PRIORITY, PRIORITY_MAX, PRIORITY_MIN,
};
use crate::validate::validate;

pub const TOOL_NAME: &str = "save_note";

pub const SAVED_MESSAGE: &str = "Note saved successfully!";

/// The `save_note` tool definition (name, description, input_schema) sent to the model.
/// Bounds and defaults come from the same constants the validator enforces.
pub fn schema() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Save a note with author information, optional tags, a priority and a visibility flag.",
        "input_schema": {
            "type": "object",
            "properties": {
                "note": {
                    "type": "string",
                    "description": "The note text"
                },
                "author": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Author's name" },
                        "email": {
                            "type": "string",
                            "format": "email",
                            "description": "Author's email address"
                        }
                    },
                    "required": ["name", "email"]
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional tags for the note"
                },
                "priority": {
                    "type": "integer",
                    "minimum": PRIORITY_MIN,
                    "maximum": PRIORITY_MAX,
                    "default": DEFAULT_PRIORITY,
                    "description": "Priority from 1 (lowest) to 5 (highest)"
                },
                "is_public": {
                    "type": "boolean",
                    "default": DEFAULT_IS_PUBLIC,
                    "description": "Whether the note is publicly visible"
                }
            },
            "required": ["note", "author"]
        }
    })
}

/// Where saved notes go.
#[async_trait]
pub trait NoteSink: Send + Sync {
    async fn save(&self, note: &Note) -> Result<(), StorageError>;
}

/// Logs the note and reports success. Stores nothing.
pub struct AcknowledgeSink;

#[async_trait]
impl NoteSink for AcknowledgeSink {
    async fn save(&self, note: &Note) -> Result<(), StorageError> {
        info!(
            author = note.author().name(),
            priority = note.priority().get(),
            is_public = note.is_public(),
            "note received"
        );
        Ok(())
    }
}

/// Runs the save side effect for a validated note.
pub struct SaveNoteExecutor<S = AcknowledgeSink> {
    sink: S,
}

impl SaveNoteExecutor<AcknowledgeSink> {
    pub fn new() -> Self {
        Self {
            sink: AcknowledgeSink,
        }
    }
}

impl Default for SaveNoteExecutor<AcknowledgeSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NoteSink> SaveNoteExecutor<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Save the note. Storage failures become `success: false`, never an error.
    pub async fn execute(&self, note: Note) -> SaveNoteResponse {
        match self.sink.save(&note).await {
            Ok(()) => SaveNoteResponse {
                success: true,
                message: SAVED_MESSAGE.into(),
            },
            Err(e) => {
                warn!(error = %e, "note sink failed");
                SaveNoteResponse {
                    success: false,
                    message: format!("Failed to save note: {e}"),
                }
            }
        }
    }
}

/// `save_note` handler: validate the raw input, execute, return the JSON response.
pub struct SaveNoteTool<S = AcknowledgeSink> {
    executor: SaveNoteExecutor<S>,
}

impl SaveNoteTool<AcknowledgeSink> {
    pub fn new() -> Self {
        Self {
            executor: SaveNoteExecutor::new(),
        }
    }
}

impl Default for SaveNoteTool<AcknowledgeSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NoteSink> SaveNoteTool<S> {
    pub fn with_executor(executor: SaveNoteExecutor<S>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<S: NoteSink> ToolHandler for SaveNoteTool<S> {
    async fn call(&self, input: &Value) -> Result<String, ToolError> {
        let note = validate(input)?;
        let response = self.executor.execute(note).await;
        serde_json::to_string(&response).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    #[async_trait]
    impl NoteSink for CountingSink {
        async fn save(&self, _note: &Note) -> Result<(), StorageError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FullDisk;

    #[async_trait]
    impl NoteSink for FullDisk {
        async fn save(&self, _note: &Note) -> Result<(), StorageError> {
            Err(StorageError("disk full".into()))
        }
    }

    #[tokio::test]
    async fn saves_valid_note() {
        let raw = json!({
            "note": "Buy milk",
            "author": {"name": "John Doe", "email": "johndoe@gmail.com"},
            "priority": 4,
        });
        let response = SaveNoteExecutor::new().execute(validate(&raw).unwrap()).await;
        assert_eq!(
            response,
            SaveNoteResponse {
                success: true,
                message: "Note saved successfully!".into(),
            }
        );
    }

    #[tokio::test]
    async fn storage_failure_is_reported_not_raised() {
        let raw = json!({"note": "x", "author": {"name": "A", "email": "a@b.com"}});
        let response = SaveNoteExecutor::with_sink(FullDisk)
            .execute(validate(&raw).unwrap())
            .await;
        assert!(!response.success);
        assert!(response.message.contains("disk full"));
    }

    #[tokio::test]
    async fn tool_returns_json_response() {
        let out = SaveNoteTool::new()
            .call(&json!({
                "note": "Buy milk",
                "author": {"name": "John Doe", "email": "johndoe@gmail.com"},
                "priority": 4,
            }))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"success": true, "message": "Note saved successfully!"}));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_sink() {
        let saves = Arc::new(AtomicUsize::new(0));
        let tool =
            SaveNoteTool::with_executor(SaveNoteExecutor::with_sink(CountingSink(saves.clone())));

        let err = tool
            .call(&json!({"note": "x", "author": {"name": "A", "email": "bad"}}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::Validation(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(saves.load(Ordering::SeqCst), 0);

        tool.call(&json!({"note": "x", "author": {"name": "A", "email": "a@b.com"}}))
            .await
            .unwrap();
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schema_matches_validator() {
        let s = schema();
        assert_eq!(s["name"], TOOL_NAME);

        let input = &s["input_schema"];
        assert_eq!(input["required"], json!(["note", "author"]));
        assert_eq!(input["properties"]["author"]["required"], json!(["name", "email"]));

        let priority = &input["properties"]["priority"];
        assert_eq!(priority["type"], "integer");
        assert_eq!(priority["minimum"], 1);
        assert_eq!(priority["maximum"], 5);
        assert_eq!(priority["default"], 3);
        assert_eq!(input["properties"]["is_public"]["default"], false);

        // Every bound the schema advertises is accepted, one past it is not.
        let author = json!({"name": "A", "email": "a@b.com"});
        for (p, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let raw = json!({"note": "x", "author": author.clone(), "priority": p});
            assert_eq!(validate(&raw).is_ok(), ok, "priority {p}");
        }

        // Omitted optionals resolve to the advertised defaults.
        let note = validate(&json!({"note": "x", "author": author})).unwrap();
        assert_eq!(json!(note.priority().get()), priority["default"]);
        assert_eq!(json!(note.is_public()), input["properties"]["is_public"]["default"]);
    }
}
