/// Failure raised by the agent runtime while starting or pulling its stream.
///
/// Carries the runtime's error type name (for example `RateLimitError`) next to
/// its message so failures can be classified the same way regardless of which
/// runtime produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AgentError {
    error_type: String,
    message: String,
}

impl AgentError {
    /// Creates an error from a runtime type name and message.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Wraps any Rust error, using the last path segment of its type name.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        let short = full
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full);
        Self::new(short, err.to_string())
    }

    /// Returns the runtime type name of the failure.
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// Returns the failure message without the type name.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"<Type>: <message>"` form used for classification.
    pub fn composite(&self) -> String {
        format!("{}: {}", self.error_type, self.message)
    }
}

/// Errors returned by a display surface.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The surface cannot render at all (missing terminal, closed toolkit, ...).
    #[error("display surface unavailable: {0}")]
    Unavailable(String),
    /// Writing a command to the surface failed.
    #[error("display write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for the handler API.
///
/// Runtime failures of the agent stream never show up here; they are reported
/// as a terminal `StreamEvent::Error` instead.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The display surface could not be set up, so nothing can be rendered.
    #[error("{source}; attach a working display surface before streaming")]
    DisplayUnavailable {
        #[source]
        source: DisplayError,
    },
}

impl From<DisplayError> for HandlerError {
    fn from(source: DisplayError) -> Self {
        HandlerError::DisplayUnavailable { source }
    }
}
