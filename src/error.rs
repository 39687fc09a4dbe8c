#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
    #[error("tool input rejected: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("API key not set: {0}")]
    MissingApiKey(String),
}

/// Why raw tool input could not become a `Note`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },
    #[error("invalid format for `{field}`: {reason}")]
    InvalidFormat { field: String, reason: String },
    #[error("constraint violated for `{field}`: {reason}")]
    ConstraintViolation { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn format(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Dotted path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::InvalidFormat { field, .. }
            | Self::ConstraintViolation { field, .. } => field,
        }
    }
}

/// The note sink could not persist a note.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Failure from a tool handler. Reported back to the model as an error tool result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0}")]
    Failed(String),
}
