//! Replays a recorded agent stream through the handler.
//!
//! By default the run is rendered on the terminal; `--events` prints the
//! normalized events as JSON lines instead.

use std::path::PathBuf;

use agent_stream_handler::prelude::*;
use agent_stream_handler::{HandlerBuilder, init_observability};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "agent-stream-replay")]
#[command(version)]
#[command(about = "Replay a recorded graph agent stream (JSONL) through the stream handler")]
struct Args {
    /// Path to the JSONL transcript
    transcript: PathBuf,

    /// Agent input passed to the runtime, as JSON
    #[arg(long, default_value = r#"{"messages": []}"#)]
    input: String,

    /// Thread id placed under `configurable.thread_id` in the runtime config
    #[arg(long)]
    thread_id: Option<String>,

    /// Print normalized events as JSON lines instead of rendering the run
    #[arg(long)]
    events: bool,

    /// Start with the status region collapsed
    #[arg(long)]
    collapsed: bool,

    /// Maximum characters of tool output to render
    #[arg(long)]
    max_tool_chars: Option<usize>,

    #[arg(long)]
    hide_tool_calls: bool,

    #[arg(long)]
    hide_tool_results: bool,

    #[arg(long)]
    thinking_label: Option<String>,

    #[arg(long)]
    complete_label: Option<String>,
}

impl Args {
    fn configure<D: DisplaySurface>(&self, builder: HandlerBuilder<D>) -> HandlerBuilder<D> {
        let mut builder = builder
            .expand_new_thoughts(!self.collapsed)
            .show_tool_calls(!self.hide_tool_calls)
            .show_tool_results(!self.hide_tool_results);
        if let Some(max_chars) = self.max_tool_chars {
            builder = builder.max_tool_content_length(max_chars);
        }
        if let Some(label) = &self.thinking_label {
            builder = builder.thinking_label(label.clone());
        }
        if let Some(label) = &self.complete_label {
            builder = builder.complete_label(label.clone());
        }
        builder
    }

    fn runtime_config(&self) -> Option<serde_json::Value> {
        self.thread_id.as_ref().map(|thread_id| {
            serde_json::json!({"configurable": {"thread_id": thread_id}})
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_observability();
    let args = Args::parse();

    let input: serde_json::Value = serde_json::from_str(&args.input)?;
    let agent = ReplayAgent::from_path(&args.transcript);
    info!(transcript = %args.transcript.display(), events = args.events, "replaying transcript");

    let failed = if args.events {
        let mut handler = args
            .configure(StreamHandler::builder(RecordingSurface::new()))
            .build();
        let mut run = handler.stream(&agent, input, args.runtime_config()).await?;
        let mut failed = false;
        while let Some(event) = run.next_event().await {
            failed |= matches!(event, StreamEvent::Error { .. });
            println!("{}", serde_json::to_string(&event)?);
        }
        failed
    } else {
        let mut handler = args
            .configure(StreamHandler::builder(TerminalSurface::stdout()))
            .build();
        let mut run = handler.stream(&agent, input, args.runtime_config()).await?;
        let mut failed = false;
        while let Some(event) = run.next_event().await {
            failed |= matches!(event, StreamEvent::Error { .. });
        }
        println!();
        failed
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
