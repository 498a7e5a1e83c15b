/// Display toggles and labels for a `StreamHandler`.
///
/// Created once per handler and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Whether the status region starts expanded so tool calls are visible.
    pub expand_new_thoughts: bool,
    /// Maximum number of characters of tool output shown before truncating.
    ///
    /// Only the rendered output is truncated; events carry the full content.
    pub max_tool_content_length: usize,
    pub show_tool_calls: bool,
    pub show_tool_results: bool,
    /// Status label while the agent is running.
    pub thinking_label: String,
    /// Status label once the stream completed.
    pub complete_label: String,
    pub tool_call_emoji: String,
    pub tool_complete_emoji: String,
    /// Appended to the response while tokens are still arriving.
    pub cursor: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            expand_new_thoughts: true,
            max_tool_content_length: 2000,
            show_tool_calls: true,
            show_tool_results: true,
            thinking_label: "🤔 Thinking...".to_string(),
            complete_label: "✅ Complete!".to_string(),
            tool_call_emoji: "🔧".to_string(),
            tool_complete_emoji: "✅".to_string(),
            cursor: "▌".to_string(),
        }
    }
}

impl HandlerConfig {
    pub fn expand_new_thoughts(mut self, expand: bool) -> Self {
        self.expand_new_thoughts = expand;
        self
    }

    pub fn max_tool_content_length(mut self, max_chars: usize) -> Self {
        self.max_tool_content_length = max_chars;
        self
    }

    pub fn show_tool_calls(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }

    pub fn show_tool_results(mut self, show: bool) -> Self {
        self.show_tool_results = show;
        self
    }

    pub fn thinking_label(mut self, label: impl Into<String>) -> Self {
        self.thinking_label = label.into();
        self
    }

    pub fn complete_label(mut self, label: impl Into<String>) -> Self {
        self.complete_label = label.into();
        self
    }

    pub fn tool_call_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.tool_call_emoji = emoji.into();
        self
    }

    pub fn tool_complete_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.tool_complete_emoji = emoji.into();
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }
}
