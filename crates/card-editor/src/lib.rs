pub mod clipboard;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod gesture;
pub mod history;
pub mod input;
pub mod selection;
pub mod shortcuts;
pub mod text_edit;
pub mod transform;
pub mod view;

pub use clipboard::ClipboardError;
pub use config::EditorConfig;
pub use dispatch::KeyRoute;
pub use editor::Editor;
pub use gesture::PointerGesture;
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use selection::Selection;
pub use shortcuts::{SHORTCUTS, ShortcutAction, ShortcutBinding, ShortcutMap};
pub use text_edit::{KeyOutcome, OverlayKey, OverlayStyle, OverlayView, TextEditSession};
pub use transform::LiveTransform;
pub use view::FrameResources;
