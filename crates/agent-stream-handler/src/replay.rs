//! Agent runtime that replays a recorded JSONL stream.
//!
//! Each non-empty line is one stream item:
//!
//! ```text
//! ["updates", {"model": {"messages": [{"tool_calls": [{"name": "search", "args": {}}]}]}}]
//! ["messages", [{"content": "Hel"}, {"langgraph_node": "model"}]]
//! {"error": {"type": "RateLimitError", "message": "Error code: 429"}}
//! ```
//!
//! An `error` line replays a failure raised by the runtime at that point.

use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::agent::{AgentRequest, AgentRuntime, AgentStreamHandle};
use crate::errors::AgentError;
use crate::message::ChannelEvent;

/// Error type name for transcripts that cannot be read or parsed.
pub const TRANSCRIPT_ERROR_TYPE: &str = "TranscriptError";

enum TranscriptSource {
    Path(PathBuf),
    Text(String),
}

/// Replays a transcript on every `start_stream` call.
pub struct ReplayAgent {
    source: TranscriptSource,
}

impl ReplayAgent {
    /// Reads the transcript from `path` each time a stream starts.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: TranscriptSource::Path(path.into()),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: TranscriptSource::Text(text.into()),
        }
    }
}

#[async_trait::async_trait]
impl AgentRuntime for ReplayAgent {
    async fn start_stream(&self, request: AgentRequest) -> Result<AgentStreamHandle, AgentError> {
        let text = match &self.source {
            TranscriptSource::Text(text) => text.clone(),
            TranscriptSource::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|err| {
                    AgentError::new(TRANSCRIPT_ERROR_TYPE, format!("{}: {err}", path.display()))
                })?,
        };
        let items = parse_transcript(&text);
        debug!(
            items = items.len(),
            modes = ?request.stream_modes,
            "replaying agent transcript"
        );
        Ok(AgentStreamHandle::new(Box::pin(futures::stream::iter(items))))
    }
}

/// Parses every non-empty line of a transcript.
///
/// Malformed lines become `Err` items at their position so a replay fails
/// exactly where the transcript breaks.
pub fn parse_transcript(text: &str) -> Vec<Result<ChannelEvent, AgentError>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(idx + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Result<ChannelEvent, AgentError> {
    let value: Value = serde_json::from_str(line).map_err(|err| {
        AgentError::new(TRANSCRIPT_ERROR_TYPE, format!("line {line_no}: {err}"))
    })?;

    if let Some(recorded) = value.get("error") {
        let error_type = recorded
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("Error");
        let message = recorded
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(AgentError::new(error_type, message));
    }

    ChannelEvent::from_pair(value).map_err(|err| {
        AgentError::new(
            err.error_type(),
            format!("line {line_no}: {}", err.message()),
        )
    })
}
