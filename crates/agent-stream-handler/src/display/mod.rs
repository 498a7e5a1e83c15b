//! Display commands issued by the handler and the surfaces that render them.
//!
//! Commands are one-way: the handler never reads anything back from a
//! surface besides success or failure.

mod recording;
mod terminal;

pub use recording::RecordingSurface;
pub use terminal::TerminalSurface;

use crate::errors::DisplayError;

/// State shown by the status region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Running,
    Complete,
    Error,
}

/// Code block with a language tag used for syntax highlighting.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeBlock {
    pub code: String,
    pub language: String,
}

impl CodeBlock {
    pub fn text(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: "text".to_string(),
        }
    }
}

/// A single rendering instruction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DisplayCommand {
    /// Creates the collapsible status region.
    OpenStatus { label: String, expanded: bool },
    /// Creates the placeholder that holds the streamed response.
    OpenPlaceholder,
    UpdateStatus {
        label: String,
        state: StatusState,
        expanded: bool,
    },
    /// Writes a markdown line inside the status region.
    StatusLine { markdown: String },
    /// Writes an error banner inside the status region.
    StatusError { text: String },
    /// Renders an expandable panel inside the status region.
    DetailPanel {
        title: String,
        expanded: bool,
        block: CodeBlock,
    },
    /// Replaces the placeholder content.
    ResponseMarkdown { markdown: String },
}

/// Target that renders display commands.
pub trait DisplaySurface {
    /// Reports whether the surface can render at all.
    fn check_available(&self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn render(&mut self, command: DisplayCommand) -> Result<(), DisplayError>;
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn check_available(&self) -> Result<(), DisplayError> {
        (**self).check_available()
    }

    fn render(&mut self, command: DisplayCommand) -> Result<(), DisplayError> {
        (**self).render(command)
    }
}
