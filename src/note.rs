use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;

pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;
pub const DEFAULT_IS_PUBLIC: bool = false;

// dot-atom local part, then hostname labels with at least one dot.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    const ATEXT: &str = r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]";
    const LABEL: &str = r"[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?";
    Regex::new(&format!(r"^{ATEXT}+(?:\.{ATEXT}+)*@{LABEL}(?:\.{LABEL})+$"))
        .expect("email pattern compiles")
});

/// Who wrote a note. Both fields are checked at construction and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    name: String,
    email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let email = email.into();

        if name.trim().is_empty() {
            return Err(ValidationError::missing("author.name"));
        }
        if email.is_empty() {
            return Err(ValidationError::missing("author.email"));
        }
        if !EMAIL.is_match(&email) {
            return Err(ValidationError::format(
                "author.email",
                format!("`{email}` is not a valid email address"),
            ));
        }

        Ok(Self { name, email })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Note priority, always within `PRIORITY_MIN..=PRIORITY_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(PRIORITY_MIN) || value > i64::from(PRIORITY_MAX) {
            return Err(ValidationError::ConstraintViolation {
                field: "priority".into(),
                reason: format!("{value} is outside {PRIORITY_MIN}..={PRIORITY_MAX}"),
            });
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY)
    }
}

/// A note the model asked to save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    note: String,
    author: Author,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    priority: Priority,
    is_public: bool,
}

impl Note {
    /// A note with default priority, private, no tags.
    pub fn new(note: impl Into<String>, author: Author) -> Result<Self, ValidationError> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(ValidationError::missing("note"));
        }
        Ok(Self {
            note,
            author,
            tags: None,
            priority: Priority::default(),
            is_public: DEFAULT_IS_PUBLIC,
        })
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }
}

/// Outcome of one save_note invocation, sent back to the model as the tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveNoteResponse {
    pub success: bool,
    pub message: String,
}
