use super::{DisplayCommand, DisplaySurface};
use crate::errors::DisplayError;

/// Headless surface that keeps every command it receives.
///
/// Useful when the caller renders events itself, and for inspecting what a run
/// would have shown.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DisplayCommand>,
    unavailable: Option<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a surface that refuses to render, reporting `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Returns the recorded commands and clears the log.
    pub fn take(&mut self) -> Vec<DisplayCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl DisplaySurface for RecordingSurface {
    fn check_available(&self) -> Result<(), DisplayError> {
        match &self.unavailable {
            Some(reason) => Err(DisplayError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn render(&mut self, command: DisplayCommand) -> Result<(), DisplayError> {
        self.check_available()?;
        self.commands.push(command);
        Ok(())
    }
}
