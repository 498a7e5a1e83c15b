//! Typed descriptors for the agent runtime's channel payloads.
//!
//! Runtimes hand over loosely shaped JSON; everything is parsed here once so the
//! handler only sees explicit optional fields. A missing field and an explicit
//! `null` both become `None`. Message descriptors never fail a whole update: a
//! non-string name is kept in its JSON form and malformed tool calls are dropped.

use serde::Deserialize;
use serde_json::Value;

use crate::agent::StreamMode;
use crate::errors::AgentError;

/// Node name the runtime uses for tool execution.
pub const TOOLS_NODE: &str = "tools";

/// Error type name reported for payloads that do not fit the channel shape.
pub const PROTOCOL_ERROR_TYPE: &str = "ProtocolError";

/// One item of the multiplexed agent stream.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// State deltas keyed by source node, in the order the runtime sent them.
    Updates(Vec<(String, NodeUpdate)>),
    /// A token fragment and its metadata.
    Messages(MessageChunk, ChunkMetadata),
}

/// Update payload emitted by one node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeUpdate {
    State(StateDelta),
    /// Anything that is not a mapping; ignored by the handler.
    Other(Value),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDelta {
    pub messages: Vec<MessageDescriptor>,
}

/// Message produced by a node, as seen on the updates channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageDescriptor {
    pub tool_calls: Option<Vec<ToolCallDescriptor>>,
    pub name: Option<String>,
    pub content: Option<Value>,
}

impl MessageDescriptor {
    /// Reads a descriptor from a JSON object; `None` for anything else.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        let tool_calls = match fields.remove("tool_calls") {
            Some(Value::Array(calls)) => Some(
                calls
                    .into_iter()
                    .filter_map(ToolCallDescriptor::from_value)
                    .collect(),
            ),
            _ => None,
        };
        Some(Self {
            tool_calls,
            name: fields.remove("name").and_then(loose_string),
            content: fields.remove("content").filter(|content| !content.is_null()),
        })
    }

    /// Returns the content as display text; empty when absent.
    pub fn content_text(&self) -> String {
        match &self.content {
            None => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCallDescriptor {
    pub name: Option<String>,
    pub args: Option<Value>,
}

impl ToolCallDescriptor {
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        Some(Self {
            name: fields.remove("name").and_then(loose_string),
            args: fields.remove("args").filter(|args| !args.is_null()),
        })
    }
}

/// Token fragment from the messages channel.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessageChunk {
    #[serde(deserialize_with = "chunk_text")]
    pub content: Option<String>,
    /// Partial tool-call syntax still being streamed.
    pub tool_call_chunks: Option<Vec<Value>>,
}

impl MessageChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_call_chunks: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMetadata {
    /// Graph node that produced the fragment.
    pub langgraph_node: Option<String>,
    /// Remaining metadata, kept for consumers that need it.
    pub extra: serde_json::Map<String, Value>,
}

impl ChunkMetadata {
    pub fn node(node: impl Into<String>) -> Self {
        Self {
            langgraph_node: Some(node.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_tools_node(&self) -> bool {
        self.langgraph_node.as_deref() == Some(TOOLS_NODE)
    }
}

impl ChannelEvent {
    /// Parses a `[mode, payload]` pair as serialized by the runtime.
    pub fn from_pair(value: Value) -> Result<Self, AgentError> {
        let Value::Array(mut items) = value else {
            return Err(protocol_error("stream item must be a [mode, payload] pair"));
        };
        if items.len() != 2 {
            return Err(protocol_error(format!(
                "stream item must have 2 elements, got {}",
                items.len()
            )));
        }
        let payload = items.pop().unwrap_or(Value::Null);
        let mode = match items.pop() {
            Some(Value::String(mode)) => mode,
            _ => return Err(protocol_error("stream mode must be a string")),
        };
        let mode = StreamMode::parse(&mode)
            .ok_or_else(|| protocol_error(format!("unknown stream mode: {mode}")))?;
        Self::from_json(mode, payload)
    }

    /// Parses the payload of one channel.
    pub fn from_json(mode: StreamMode, payload: Value) -> Result<Self, AgentError> {
        match mode {
            StreamMode::Updates => parse_updates(payload),
            StreamMode::Messages => parse_messages(payload),
        }
    }
}

fn parse_updates(payload: Value) -> Result<ChannelEvent, AgentError> {
    let Value::Object(sources) = payload else {
        return Err(protocol_error("updates payload must be a mapping"));
    };
    let mut updates = Vec::with_capacity(sources.len());
    for (source, update) in sources {
        let update = match update {
            Value::Object(mut fields) => {
                let messages = match fields.remove("messages") {
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .filter_map(MessageDescriptor::from_value)
                        .collect(),
                    _ => Vec::new(),
                };
                NodeUpdate::State(StateDelta { messages })
            }
            other => NodeUpdate::Other(other),
        };
        updates.push((source, update));
    }
    Ok(ChannelEvent::Updates(updates))
}

fn parse_messages(payload: Value) -> Result<ChannelEvent, AgentError> {
    let Value::Array(items) = payload else {
        return Err(protocol_error("messages payload must be a [chunk, metadata] pair"));
    };
    let mut items = items.into_iter();
    let (Some(chunk), Some(metadata), None) = (items.next(), items.next(), items.next()) else {
        return Err(protocol_error("messages payload must be a [chunk, metadata] pair"));
    };

    let chunk = serde_json::from_value::<MessageChunk>(chunk)
        .map_err(|err| protocol_error(format!("invalid message chunk: {err}")))?;
    let metadata = match metadata {
        Value::Object(mut extra) => {
            let langgraph_node = match extra.remove("langgraph_node") {
                Some(Value::String(node)) => Some(node),
                _ => None,
            };
            ChunkMetadata {
                langgraph_node,
                extra,
            }
        }
        Value::Null => ChunkMetadata::default(),
        _ => return Err(protocol_error("chunk metadata must be a mapping")),
    };
    Ok(ChannelEvent::Messages(chunk, metadata))
}

/// Accepts plain string content or a list of content blocks, keeping text blocks.
fn chunk_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Array(blocks)) => {
            let text: String = blocks
                .iter()
                .filter_map(|block| match block {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect();
            Some(text)
        }
        _ => None,
    })
}

/// Strings as-is, other non-null scalars and containers in their JSON form.
fn loose_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn protocol_error(message: impl Into<String>) -> AgentError {
    AgentError::new(PROTOCOL_ERROR_TYPE, message)
}
