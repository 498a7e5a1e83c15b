//! Streams a graph agent run onto a display surface.
//!
//! The agent runtime multiplexes two channels onto one stream: `updates`
//! (per-node state deltas carrying tool calls and tool results) and `messages`
//! (token fragments). `StreamHandler` demultiplexes them into `StreamEvent`s,
//! keeps the visible response, renders everything through a `DisplaySurface`,
//! and turns runtime failures into a classified terminal event.
//!
//! ```no_run
//! use agent_stream_handler::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), HandlerError> {
//! let agent = ReplayAgent::from_path("run.jsonl");
//! let mut handler = StreamHandler::builder(TerminalSurface::stdout())
//!     .max_tool_content_length(500)
//!     .build();
//!
//! let mut run = handler
//!     .stream(&agent, serde_json::json!({"messages": []}), None)
//!     .await?;
//! while let Some(event) = run.next_event().await {
//!     if let StreamEvent::Error { classified, .. } = event {
//!         eprintln!("{}", classified.title);
//!     }
//! }
//! println!("{}", handler.get_response());
//! # Ok(())
//! # }
//! ```

/// Agent runtime contract.
pub mod agent;
/// Failure classification table and matcher.
pub mod classify;
/// Handler display configuration.
pub mod config;
/// Display commands and surfaces.
pub mod display;
/// Error types.
pub mod errors;
/// Stream demultiplexer.
pub mod handler;
/// Typed channel payloads.
pub mod message;
/// Logging setup.
pub mod observability;
pub mod prelude;
/// Transcript-backed agent runtime.
pub mod replay;
/// Normalized events.
pub mod stream;

pub use agent::{AgentEventStream, AgentRequest, AgentRuntime, AgentStreamHandle, StreamMode};
pub use classify::{ClassifiedError, ErrorPattern, classify, classify_error};
pub use config::HandlerConfig;
pub use display::{
    CodeBlock, DisplayCommand, DisplaySurface, RecordingSurface, StatusState, TerminalSurface,
};
pub use errors::{AgentError, DisplayError, HandlerError};
pub use handler::{HandlerBuilder, HandlerStream, StreamHandler};
pub use message::{
    ChannelEvent, ChunkMetadata, MessageChunk, MessageDescriptor, NodeUpdate, StateDelta,
    ToolCallDescriptor,
};
pub use observability::{LogOutput, LogSettings, init_observability};
pub use replay::ReplayAgent;
pub use stream::StreamEvent;
