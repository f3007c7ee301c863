//! Headless WYSIWYG editing engine for standalone HTML pages.
//!
//! An [`Editor`] owns one loaded document. Elements are selected, styled and
//! restructured through [`Command`]s; style edits land either inline or in an
//! editor-owned stylesheet, every committed edit is snapshotted for undo/redo,
//! and [`Editor::export`] hands back clean HTML.

pub mod config;
pub mod dom;
pub mod editor;
pub mod error;
pub mod parser;
pub mod script;
pub mod style;

pub use config::{Breakpoint, EditorConfig};
pub use editor::surface::{DocumentSurface, FontLoad, HeadlessSurface};
pub use editor::{Command, Confirm, Direction, Editor, ExportOptions, Status, StatusKind};
pub use error::{EditorError, Result};
