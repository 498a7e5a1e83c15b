use std::collections::VecDeque;

use futures::StreamExt as _;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::agent::{AgentEventStream, AgentRequest, AgentRuntime, StreamMode};
use crate::classify::{classify_error, truncate_chars};
use crate::config::HandlerConfig;
use crate::display::{CodeBlock, DisplayCommand, DisplaySurface, StatusState};
use crate::errors::{AgentError, HandlerError};
use crate::message::{ChannelEvent, ChunkMetadata, MessageChunk, NodeUpdate, TOOLS_NODE};
use crate::stream::StreamEvent;

const ERROR_STATUS_LABEL: &str = "❌ 오류 발생";
const SOLUTION_HEADING: &str = "**해결 방법:**";
const ERROR_DETAIL_TITLE: &str = "🔍 상세 에러 메시지";
const TRUNCATION_MARKER: &str = "\n... (truncated)";
const DEFAULT_TOOL_NAME: &str = "tool";

/// Renders one agent run at a time onto a display surface.
///
/// The handler owns the accumulated response; it is reset by every call to
/// `stream` and can be read back with `get_response` afterwards.
pub struct StreamHandler<D: DisplaySurface> {
    surface: D,
    config: HandlerConfig,
    response: String,
}

/// Builder for `StreamHandler`.
///
/// A full `HandlerConfig` passed through `config` replaces every individual
/// setter, whichever order they were called in.
pub struct HandlerBuilder<D: DisplaySurface> {
    surface: D,
    expand_new_thoughts: Option<bool>,
    max_tool_content_length: Option<usize>,
    show_tool_calls: Option<bool>,
    show_tool_results: Option<bool>,
    thinking_label: Option<String>,
    complete_label: Option<String>,
    config: Option<HandlerConfig>,
}

impl<D: DisplaySurface> HandlerBuilder<D> {
    pub fn expand_new_thoughts(mut self, expand: bool) -> Self {
        self.expand_new_thoughts = Some(expand);
        self
    }

    pub fn max_tool_content_length(mut self, max_chars: usize) -> Self {
        self.max_tool_content_length = Some(max_chars);
        self
    }

    pub fn show_tool_calls(mut self, show: bool) -> Self {
        self.show_tool_calls = Some(show);
        self
    }

    pub fn show_tool_results(mut self, show: bool) -> Self {
        self.show_tool_results = Some(show);
        self
    }

    pub fn thinking_label(mut self, label: impl Into<String>) -> Self {
        self.thinking_label = Some(label.into());
        self
    }

    pub fn complete_label(mut self, label: impl Into<String>) -> Self {
        self.complete_label = Some(label.into());
        self
    }

    /// Uses a prebuilt config and ignores all individual overrides.
    pub fn config(mut self, config: HandlerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> StreamHandler<D> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let mut config = HandlerConfig::default();
                if let Some(expand) = self.expand_new_thoughts {
                    config.expand_new_thoughts = expand;
                }
                if let Some(max_chars) = self.max_tool_content_length {
                    config.max_tool_content_length = max_chars;
                }
                if let Some(show) = self.show_tool_calls {
                    config.show_tool_calls = show;
                }
                if let Some(show) = self.show_tool_results {
                    config.show_tool_results = show;
                }
                if let Some(label) = self.thinking_label {
                    config.thinking_label = label;
                }
                if let Some(label) = self.complete_label {
                    config.complete_label = label;
                }
                config
            }
        };
        StreamHandler::new(self.surface, config)
    }
}

impl<D: DisplaySurface> StreamHandler<D> {
    pub fn new(surface: D, config: HandlerConfig) -> Self {
        Self {
            surface,
            config,
            response: String::new(),
        }
    }

    pub fn builder(surface: D) -> HandlerBuilder<D> {
        HandlerBuilder {
            surface,
            expand_new_thoughts: None,
            max_tool_content_length: None,
            show_tool_calls: None,
            show_tool_results: None,
            thinking_label: None,
            complete_label: None,
            config: None,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Returns the response accumulated by the most recent run.
    pub fn get_response(&self) -> &str {
        &self.response
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn into_surface(self) -> D {
        self.surface
    }

    /// Starts a run and returns the lazy event stream.
    ///
    /// Fails only when the display surface cannot be set up. Failures of the
    /// agent itself, including a failed start, surface as a terminal
    /// `StreamEvent::Error`.
    pub async fn stream(
        &mut self,
        agent: &dyn AgentRuntime,
        input: Value,
        config: Option<Value>,
    ) -> Result<HandlerStream<'_, D>, HandlerError> {
        self.surface.check_available()?;
        self.response.clear();
        self.surface.render(DisplayCommand::OpenStatus {
            label: self.config.thinking_label.clone(),
            expanded: self.config.expand_new_thoughts,
        })?;
        self.surface.render(DisplayCommand::OpenPlaceholder)?;

        let run_id = uuid::Uuid::new_v4();
        let request = AgentRequest {
            input,
            config: config.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            stream_modes: vec![StreamMode::Messages, StreamMode::Updates],
        };
        debug!(run_id = %run_id, "starting agent stream");
        let upstream: AgentEventStream = match agent.start_stream(request).await {
            Ok(handle) => handle.stream,
            Err(err) => Box::pin(futures::stream::once(async move {
                Err::<ChannelEvent, AgentError>(err)
            })),
        };

        Ok(HandlerStream {
            run_id,
            handler: self,
            upstream,
            pending: VecDeque::new(),
            state: RunState::Running,
        })
    }

    /// Runs the agent to the end and returns the accumulated response.
    ///
    /// A failed run still returns whatever text arrived before the failure.
    pub async fn invoke(
        &mut self,
        agent: &dyn AgentRuntime,
        input: Value,
        config: Option<Value>,
    ) -> Result<String, HandlerError> {
        let run = self.stream(agent, input, config).await?;
        Ok(run.finish().await)
    }

    fn show(&mut self, command: DisplayCommand) {
        if let Err(err) = self.surface.render(command) {
            warn!(error = %err, "display command failed");
        }
    }

    fn handle_updates(
        &mut self,
        updates: Vec<(String, NodeUpdate)>,
        out: &mut VecDeque<StreamEvent>,
    ) {
        for (source, update) in updates {
            let NodeUpdate::State(delta) = update else {
                continue;
            };
            for msg in delta.messages {
                if let Some(calls) = msg.tool_calls.as_deref()
                    && !calls.is_empty()
                    && self.config.show_tool_calls
                {
                    for call in calls {
                        let name = call
                            .name
                            .clone()
                            .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
                        let args = call
                            .args
                            .clone()
                            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                        self.show(DisplayCommand::StatusLine {
                            markdown: format!(
                                "{} **{}**: `{}`",
                                self.config.tool_call_emoji, name, args
                            ),
                        });
                        out.push_back(StreamEvent::ToolCall { name, args });
                    }
                }

                if source == TOOLS_NODE
                    && let Some(name) = msg.name.as_deref()
                    && self.config.show_tool_results
                {
                    let content = msg.content_text();
                    self.show_tool_result(name, &content);
                    out.push_back(StreamEvent::ToolResult {
                        name: name.to_string(),
                        content,
                    });
                }
            }
        }
    }

    fn show_tool_result(&mut self, name: &str, content: &str) {
        let max_chars = self.config.max_tool_content_length;
        let code = if content.chars().count() > max_chars {
            format!("{}{TRUNCATION_MARKER}", truncate_chars(content, max_chars))
        } else {
            content.to_string()
        };
        self.show(DisplayCommand::StatusLine {
            markdown: format!("{} **{}** 완료", self.config.tool_complete_emoji, name),
        });
        self.show(DisplayCommand::DetailPanel {
            title: format!("📋 {name} 결과 보기"),
            expanded: false,
            block: CodeBlock::text(code),
        });
    }

    fn handle_message(
        &mut self,
        chunk: MessageChunk,
        metadata: &ChunkMetadata,
    ) -> Option<StreamEvent> {
        if metadata.is_tools_node() {
            return None;
        }
        let content = chunk.content.filter(|c| !c.is_empty())?;
        if chunk.tool_call_chunks.as_ref().is_some_and(|c| !c.is_empty()) {
            return None;
        }

        self.response.push_str(&content);
        let markdown = format!("{}{}", self.response, self.config.cursor);
        self.show(DisplayCommand::ResponseMarkdown { markdown });
        Some(StreamEvent::Token {
            content,
            accumulated: self.response.clone(),
        })
    }

    fn complete(&mut self) -> StreamEvent {
        self.show(DisplayCommand::UpdateStatus {
            label: self.config.complete_label.clone(),
            state: StatusState::Complete,
            expanded: false,
        });
        if !self.response.is_empty() {
            self.show(DisplayCommand::ResponseMarkdown {
                markdown: self.response.clone(),
            });
        }
        StreamEvent::Complete {
            response: self.response.clone(),
        }
    }

    fn fail(&mut self, run_id: uuid::Uuid, err: AgentError) -> StreamEvent {
        let classified = classify_error(&err);

        self.show(DisplayCommand::UpdateStatus {
            label: ERROR_STATUS_LABEL.to_string(),
            state: StatusState::Error,
            expanded: true,
        });
        self.show(DisplayCommand::StatusError {
            text: format!("**{}**", classified.title),
        });
        self.show(DisplayCommand::StatusLine {
            markdown: format!("_{}_", classified.message),
        });
        self.show(DisplayCommand::StatusLine {
            markdown: SOLUTION_HEADING.to_string(),
        });
        for step in &classified.solution {
            self.show(DisplayCommand::StatusLine {
                markdown: format!("  {step}"),
            });
        }
        self.show(DisplayCommand::DetailPanel {
            title: ERROR_DETAIL_TITLE.to_string(),
            expanded: false,
            block: CodeBlock::text(classified.original_error.clone()),
        });

        error!(
            run_id = %run_id,
            error_type = err.error_type(),
            error = %err,
            matched = classified.matched,
            title = %classified.title,
            response_len = self.response.len(),
            "agent execution error"
        );

        StreamEvent::Error {
            error_type: err.error_type().to_string(),
            classified,
            raw: err.message().to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Running,
    Completed,
    Failed,
}

/// Lazy event stream for one run, returned by `StreamHandler::stream`.
///
/// Each call to `next_event` pulls from the agent only when no already
/// demultiplexed event is pending. The stream ends after `Complete` or `Error`.
pub struct HandlerStream<'h, D: DisplaySurface> {
    run_id: uuid::Uuid,
    handler: &'h mut StreamHandler<D>,
    upstream: AgentEventStream,
    pending: VecDeque<StreamEvent>,
    state: RunState,
}

impl<'h, D: DisplaySurface> HandlerStream<'h, D> {
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    /// Response accumulated so far in this run.
    pub fn response(&self) -> &str {
        &self.handler.response
    }

    pub fn surface(&self) -> &D {
        &self.handler.surface
    }

    /// Returns the next event, or `None` once the run has ended.
    ///
    /// Display commands for an event are issued before it is returned.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.state != RunState::Running {
                return None;
            }

            match self.upstream.next().await {
                Some(Ok(ChannelEvent::Updates(updates))) => {
                    debug!(run_id = %self.run_id, sources = updates.len(), "updates event");
                    self.handler.handle_updates(updates, &mut self.pending);
                }
                Some(Ok(ChannelEvent::Messages(chunk, metadata))) => {
                    if let Some(event) = self.handler.handle_message(chunk, &metadata) {
                        self.pending.push_back(event);
                    }
                }
                Some(Err(err)) => {
                    self.state = RunState::Failed;
                    let event = self.handler.fail(self.run_id, err);
                    self.pending.push_back(event);
                }
                None => {
                    self.state = RunState::Completed;
                    debug!(
                        run_id = %self.run_id,
                        response_len = self.handler.response.len(),
                        "agent stream completed"
                    );
                    let event = self.handler.complete();
                    self.pending.push_back(event);
                }
            }
        }
    }

    /// Drains the remaining events and returns the accumulated response.
    pub async fn finish(mut self) -> String {
        while self.next_event().await.is_some() {}
        self.handler.response.clone()
    }

    /// Adapts the run into a `futures::Stream` of events.
    pub fn into_stream(self) -> impl futures::Stream<Item = StreamEvent> {
        futures::stream::unfold(self, |mut run| async move {
            let event = run.next_event().await?;
            Some((event, run))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{StreamExt, stream};
    use serde_json::json;

    use super::*;
    use crate::agent::AgentStreamHandle;
    use crate::display::RecordingSurface;
    use crate::message::{MessageDescriptor, StateDelta, ToolCallDescriptor};

    struct FakeAgent {
        calls: Arc<AtomicUsize>,
        behavior: FakeBehavior,
    }

    enum FakeBehavior {
        StartError(AgentError),
        Events(Vec<Result<ChannelEvent, AgentError>>),
    }

    impl FakeAgent {
        fn events(events: Vec<Result<ChannelEvent, AgentError>>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                behavior: FakeBehavior::Events(events),
            }
        }
    }

    #[async_trait::async_trait]
    impl AgentRuntime for FakeAgent {
        async fn start_stream(
            &self,
            request: AgentRequest,
        ) -> Result<AgentStreamHandle, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(
                request.stream_modes,
                vec![StreamMode::Messages, StreamMode::Updates]
            );
            match &self.behavior {
                FakeBehavior::StartError(err) => Err(err.clone()),
                FakeBehavior::Events(events) => Ok(AgentStreamHandle::new(Box::pin(stream::iter(
                    events.clone(),
                )))),
            }
        }
    }

    fn token(text: &str) -> Result<ChannelEvent, AgentError> {
        Ok(ChannelEvent::Messages(
            MessageChunk::text(text),
            ChunkMetadata::node("model"),
        ))
    }

    fn tool_call_update(calls: Vec<ToolCallDescriptor>) -> Result<ChannelEvent, AgentError> {
        Ok(ChannelEvent::Updates(vec![(
            "model".to_string(),
            NodeUpdate::State(StateDelta {
                messages: vec![MessageDescriptor {
                    tool_calls: Some(calls),
                    ..Default::default()
                }],
            }),
        )]))
    }

    fn tool_result_update(
        source: &str,
        name: Option<&str>,
        content: &str,
    ) -> Result<ChannelEvent, AgentError> {
        Ok(ChannelEvent::Updates(vec![(
            source.to_string(),
            NodeUpdate::State(StateDelta {
                messages: vec![MessageDescriptor {
                    name: name.map(str::to_string),
                    content: Some(json!(content)),
                    ..Default::default()
                }],
            }),
        )]))
    }

    fn handler() -> StreamHandler<RecordingSurface> {
        StreamHandler::new(RecordingSurface::new(), HandlerConfig::default())
    }

    async fn collect(
        handler: &mut StreamHandler<RecordingSurface>,
        agent: &FakeAgent,
    ) -> Vec<StreamEvent> {
        let mut run = handler
            .stream(agent, json!({"messages": []}), None)
            .await
            .expect("stream");
        let mut events = Vec::new();
        while let Some(event) = run.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn tokens_accumulate_and_complete() {
        let agent = FakeAgent::events(vec![token("Hello"), token(" world")]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Token {
                    content: "Hello".into(),
                    accumulated: "Hello".into()
                },
                StreamEvent::Token {
                    content: " world".into(),
                    accumulated: "Hello world".into()
                },
                StreamEvent::Complete {
                    response: "Hello world".into()
                },
            ]
        );
        assert_eq!(handler.get_response(), "Hello world");

        let commands = handler.surface().commands();
        assert_eq!(
            commands[0],
            DisplayCommand::OpenStatus {
                label: "🤔 Thinking...".into(),
                expanded: true
            }
        );
        assert_eq!(commands[1], DisplayCommand::OpenPlaceholder);
        assert_eq!(
            commands[2],
            DisplayCommand::ResponseMarkdown {
                markdown: "Hello▌".into()
            }
        );
        assert_eq!(
            &commands[4..],
            &[
                DisplayCommand::UpdateStatus {
                    label: "✅ Complete!".into(),
                    state: StatusState::Complete,
                    expanded: false
                },
                DisplayCommand::ResponseMarkdown {
                    markdown: "Hello world".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn display_is_updated_before_event_is_returned() {
        let agent = FakeAgent::events(vec![token("Hi")]);
        let mut handler = handler();
        let mut run = handler.stream(&agent, json!({}), None).await.expect("stream");

        let first = run.next_event().await.expect("token");
        assert!(matches!(first, StreamEvent::Token { .. }));
        assert_eq!(
            run.surface().commands().last(),
            Some(&DisplayCommand::ResponseMarkdown {
                markdown: "Hi▌".into()
            })
        );

        let last = run.next_event().await.expect("complete");
        assert!(matches!(last, StreamEvent::Complete { .. }));
        assert!(run.next_event().await.is_none());
    }

    #[tokio::test]
    async fn tool_node_fragments_are_suppressed() {
        let agent = FakeAgent::events(vec![
            token("A"),
            Ok(ChannelEvent::Messages(
                MessageChunk::text("tool output"),
                ChunkMetadata::node(TOOLS_NODE),
            )),
        ]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(events.len(), 2);
        assert_eq!(handler.get_response(), "A");
    }

    #[tokio::test]
    async fn partial_tool_call_fragments_are_suppressed() {
        let agent = FakeAgent::events(vec![
            Ok(ChannelEvent::Messages(
                MessageChunk {
                    content: Some("{\"q\":".into()),
                    tool_call_chunks: Some(vec![json!({"name": "search"})]),
                },
                ChunkMetadata::node("model"),
            )),
            Ok(ChannelEvent::Messages(
                MessageChunk {
                    content: Some("ok".into()),
                    tool_call_chunks: Some(Vec::new()),
                },
                ChunkMetadata::default(),
            )),
            Ok(ChannelEvent::Messages(MessageChunk::text(""), ChunkMetadata::default())),
        ]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Token {
                    content: "ok".into(),
                    accumulated: "ok".into()
                },
                StreamEvent::Complete {
                    response: "ok".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failure_after_tokens_keeps_partial_response() {
        let agent = FakeAgent::events(vec![
            token("H"),
            token("e"),
            Err(AgentError::new("RateLimitError", "Error code: 429")),
            token("never"),
        ]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;

        assert_eq!(events.len(), 3);
        let StreamEvent::Error {
            error_type,
            classified,
            raw,
        } = &events[2]
        else {
            panic!("expected error event, got {:?}", events[2]);
        };
        assert_eq!(error_type, "RateLimitError");
        assert_eq!(raw, "Error code: 429");
        assert_eq!(classified.title, "⏱️ Rate Limit 초과");
        assert!(!events.iter().any(|e| matches!(e, StreamEvent::Complete { .. })));

        let commands = handler.surface().commands();
        assert!(commands.contains(&DisplayCommand::UpdateStatus {
            label: ERROR_STATUS_LABEL.into(),
            state: StatusState::Error,
            expanded: true
        }));
        assert!(commands.contains(&DisplayCommand::StatusError {
            text: "**⏱️ Rate Limit 초과**".into()
        }));
        assert_eq!(
            commands.last(),
            Some(&DisplayCommand::DetailPanel {
                title: ERROR_DETAIL_TITLE.into(),
                expanded: false,
                block: CodeBlock::text("RateLimitError: Error code: 429"),
            })
        );

        let mut handler = self::handler();
        let agent = FakeAgent::events(vec![
            token("H"),
            token("e"),
            Err(AgentError::new("RuntimeError", "boom")),
        ]);
        let response = handler.invoke(&agent, json!({}), None).await.expect("invoke");
        assert_eq!(response, "He");
    }

    #[tokio::test]
    async fn start_failure_becomes_error_event() {
        let agent = FakeAgent {
            calls: Arc::new(AtomicUsize::new(0)),
            behavior: FakeBehavior::StartError(AgentError::new("ConnectionError", "refused")),
        };
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            StreamEvent::Error { error_type, classified, .. }
                if error_type == "ConnectionError" && classified.matched
        ));
        assert_eq!(handler.get_response(), "");
    }

    #[tokio::test]
    async fn unavailable_display_fails_before_agent_call() {
        let agent = FakeAgent::events(vec![token("x")]);
        let mut handler = StreamHandler::new(
            RecordingSurface::unavailable("no toolkit"),
            HandlerConfig::default(),
        );
        let result = handler.invoke(&agent, json!({}), None).await;
        assert!(matches!(result, Err(HandlerError::DisplayUnavailable { .. })));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tool_calls_use_defaults_and_respect_toggle() {
        let calls = vec![
            ToolCallDescriptor {
                name: Some("search".into()),
                args: Some(json!({"q": "rust"})),
            },
            ToolCallDescriptor::default(),
        ];
        let agent = FakeAgent::events(vec![tool_call_update(calls.clone())]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(
            &events[..2],
            &[
                StreamEvent::ToolCall {
                    name: "search".into(),
                    args: json!({"q": "rust"})
                },
                StreamEvent::ToolCall {
                    name: "tool".into(),
                    args: json!({})
                },
            ]
        );
        assert!(handler.surface().commands().contains(&DisplayCommand::StatusLine {
            markdown: "🔧 **search**: `{\"q\":\"rust\"}`".into()
        }));

        let agent = FakeAgent::events(vec![tool_call_update(calls), tool_call_update(Vec::new())]);
        let mut handler = StreamHandler::builder(RecordingSurface::new())
            .show_tool_calls(false)
            .build();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn tool_result_event_carries_untruncated_content() {
        let content = "x".repeat(50);
        let agent =
            FakeAgent::events(vec![tool_result_update(TOOLS_NODE, Some("fetch"), &content)]);
        let mut handler = StreamHandler::builder(RecordingSurface::new())
            .max_tool_content_length(10)
            .build();
        let events = collect(&mut handler, &agent).await;

        let StreamEvent::ToolResult { name, content: got } = &events[0] else {
            panic!("expected tool result");
        };
        assert_eq!(name, "fetch");
        assert!(got.chars().count() > handler.config().max_tool_content_length);
        assert_eq!(got, &content);

        let commands = handler.surface().commands();
        assert!(commands.contains(&DisplayCommand::StatusLine {
            markdown: "✅ **fetch** 완료".into()
        }));
        assert!(commands.contains(&DisplayCommand::DetailPanel {
            title: "📋 fetch 결과 보기".into(),
            expanded: false,
            block: CodeBlock::text(format!("{}{TRUNCATION_MARKER}", "x".repeat(10))),
        }));
    }

    #[tokio::test]
    async fn tool_results_need_tools_source_and_name() {
        let agent = FakeAgent::events(vec![
            tool_result_update("model", Some("fetch"), "a"),
            tool_result_update(TOOLS_NODE, None, "b"),
            Ok(ChannelEvent::Updates(vec![(
                TOOLS_NODE.to_string(),
                NodeUpdate::Other(json!("not a mapping")),
            )])),
        ]);
        let mut handler = handler();
        let events = collect(&mut handler, &agent).await;
        assert_eq!(
            events,
            vec![StreamEvent::Complete {
                response: String::new()
            }]
        );
        // Nothing to re-render without a response.
        assert!(matches!(
            handler.surface().commands().last(),
            Some(DisplayCommand::UpdateStatus { .. })
        ));

        let agent = FakeAgent::events(vec![tool_result_update(TOOLS_NODE, Some("fetch"), "a")]);
        let mut handler = StreamHandler::builder(RecordingSurface::new())
            .show_tool_results(false)
            .build();
        assert_eq!(collect(&mut handler, &agent).await.len(), 1);
    }

    #[tokio::test]
    async fn explicit_config_overrides_keyword_settings() {
        let config = HandlerConfig::default().thinking_label("working");
        let handler = StreamHandler::builder(RecordingSurface::new())
            .expand_new_thoughts(false)
            .max_tool_content_length(5)
            .config(config.clone())
            .complete_label("ignored")
            .build();
        assert_eq!(handler.config(), &config);

        let handler = StreamHandler::builder(RecordingSurface::new())
            .expand_new_thoughts(false)
            .thinking_label("busy")
            .build();
        assert!(!handler.config().expand_new_thoughts);
        assert_eq!(handler.config().thinking_label, "busy");
        assert_eq!(handler.config().max_tool_content_length, 2000);
    }

    #[tokio::test]
    async fn each_stream_call_resets_response_and_restarts_agent() {
        let agent = FakeAgent::events(vec![token("one")]);
        let mut handler = handler();
        assert_eq!(handler.invoke(&agent, json!({}), None).await.expect("first"), "one");
        assert_eq!(handler.invoke(&agent, json!({}), None).await.expect("second"), "one");
        assert_eq!(agent.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn into_stream_yields_same_events() {
        let agent = FakeAgent::events(vec![token("a"), token("b")]);
        let mut handler = handler();
        let run = handler.stream(&agent, json!({}), None).await.expect("stream");
        let events: Vec<StreamEvent> = run.into_stream().collect().await;
        assert_eq!(events.len(), 3);
        assert_eq!(
            events.last(),
            Some(&StreamEvent::Complete {
                response: "ab".into()
            })
        );
    }
}
