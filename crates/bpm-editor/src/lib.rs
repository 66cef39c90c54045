pub mod commands;
pub mod editor;
pub mod hit;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod tools;

pub use commands::CommandStack;
pub use editor::{Editor, EditorConfig, EventOutcome};
pub use hit::{Hit, hit_test};
pub use input::{InputEvent, Modifiers};
pub use selection::{PropertyField, Selection, SelectionView};
pub use session::{Feedback, ModelRecord, SaveError, SaveRequest, SaveSession};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{Change, DocumentStore, EdgePatch, EditError, GraphMutation, NodePatch};
pub use tools::{Tool, ToolKind};
