use std::io;
use thiserror::Error;

use crate::editor::commands::Direction;

/// Errors surfaced by the editing engine.
///
/// Most variants are user-facing: their `Display` text is the status message
/// shown when an action is refused. Operations that merely find no loaded
/// document degrade to no-ops instead of returning an error.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No element selected.")]
    NoSelection,

    #[error("Editing is disabled.")]
    EditingDisabled,

    /// Deleting or duplicating `<html>`, `<head>` or `<body>`.
    #[error("Cannot {action} this element.")]
    RootElement { action: &'static str },

    #[error("This is not a 2-column flex container.")]
    NotFlippable,

    #[error("Element cannot be moved {0}.")]
    CannotMove(Direction),

    #[error("Editor not ready. Please wait.")]
    NotReady,

    #[error("invalid tag name `{0}`")]
    InvalidTag(String),

    #[error("invalid CSS value `{0}`")]
    InvalidValue(String),

    #[error("no element matches selector `{0}`")]
    NoMatch(String),

    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, EditorError>;
