use std::pin::Pin;

use futures::Stream;

use crate::errors::AgentError;
use crate::message::ChannelEvent;

/// Boxed two-channel event stream returned by an agent runtime.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = Result<ChannelEvent, AgentError>> + Send>>;

/// Logical channels an agent runtime can multiplex onto one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Per-node state deltas.
    Updates,
    /// Token fragments paired with per-fragment metadata.
    Messages,
}

impl StreamMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamMode::Updates => "updates",
            StreamMode::Messages => "messages",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "updates" => Some(StreamMode::Updates),
            "messages" => Some(StreamMode::Messages),
            _ => None,
        }
    }
}

/// A single streaming call to the agent runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentRequest {
    /// Agent input, typically `{"messages": [...]}`.
    pub input: serde_json::Value,
    /// Runtime config, for example `{"configurable": {"thread_id": "..."}}`.
    pub config: serde_json::Value,
    pub stream_modes: Vec<StreamMode>,
}

/// Handle returned by `AgentRuntime::start_stream`.
pub struct AgentStreamHandle {
    pub stream: AgentEventStream,
}

impl AgentStreamHandle {
    pub fn new(stream: AgentEventStream) -> Self {
        Self { stream }
    }
}

/// Contract implemented by graph agent runtimes.
///
/// The runtime yields `(channel, payload)` pairs in the order it produced them;
/// an `Err` item aborts the run.
#[async_trait::async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn start_stream(&self, request: AgentRequest) -> Result<AgentStreamHandle, AgentError>;
}
