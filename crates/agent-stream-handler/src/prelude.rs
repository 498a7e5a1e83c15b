//! Common imports for typical handler usage.
pub use crate::{
    AgentError, AgentRuntime, ClassifiedError, DisplaySurface, HandlerConfig, HandlerError,
    RecordingSurface, ReplayAgent, StreamEvent, StreamHandler, TerminalSurface,
};
