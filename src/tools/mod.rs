pub mod handler;
pub mod registry;
pub mod save_note;

pub use handler::{ToolDef, ToolHandler};
pub use registry::ToolRegistry;
pub use save_note::{AcknowledgeSink, NoteSink, SaveNoteExecutor, SaveNoteTool};
