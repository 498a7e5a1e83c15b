use crate::classify::ClassifiedError;

/// Normalized events yielded by `HandlerStream`.
///
/// Serializes as `{"type": "...", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The agent asked for a tool invocation.
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
    /// A tool returned. `content` is never truncated.
    ToolResult { name: String, content: String },
    /// Visible response text chunk plus the response accumulated so far.
    Token { content: String, accumulated: String },
    /// Terminal success event.
    Complete { response: String },
    /// Terminal failure event.
    Error {
        error_type: String,
        classified: ClassifiedError,
        raw: String,
    },
}

impl StreamEvent {
    /// Returns true for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}
