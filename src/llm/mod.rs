//! Chat-completion probe
//!
//! Exercises an OpenAI-compatible chat endpoint twice: once with streaming
//! on, printing fragments as they arrive, and once waiting for the complete
//! answer. Neither exchange is retried; the first error is returned to the
//! caller.
//!
//! # Examples
//!
//! ```no_run
//! use oasis::config::ProbeConfig;
//! use oasis::llm::{run_probe, ChatClient, ProbeMode, Prompts};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatClient::new(&ProbeConfig::from_env()?)?;
//! run_probe(&client, ProbeMode::Both, &Prompts::default()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod sse;
mod types;

pub use client::ChatClient;
pub use error::LlmError;
pub use sse::{content_stream, LineBuffer, SseEvent, SseParser};
pub use types::{ChatMessage, ChatRequest, ChatResponse, StreamChunk};

use futures_util::{Stream, StreamExt};
use std::io::Write;

pub const DEFAULT_STREAM_PROMPT: &str = "안녕하세요! Upstage Solar Pro2 모델에 대해 간단히 소개해주세요.";
pub const DEFAULT_COMPLETE_PROMPT: &str = "Python에서 간단한 계산을 해주세요: 15 * 23 = ?";

/// Which exchanges a probe run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    #[default]
    Both,
    Stream,
    Complete,
}

impl ProbeMode {
    fn streams(&self) -> bool {
        matches!(self, ProbeMode::Both | ProbeMode::Stream)
    }

    fn completes(&self) -> bool {
        matches!(self, ProbeMode::Both | ProbeMode::Complete)
    }
}

/// User messages sent by the two exchanges
#[derive(Debug, Clone)]
pub struct Prompts {
    pub stream: String,
    pub complete: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            stream: DEFAULT_STREAM_PROMPT.to_string(),
            complete: DEFAULT_COMPLETE_PROMPT.to_string(),
        }
    }
}

/// What a consumed stream delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub fragments: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub streamed: Option<StreamSummary>,
    pub completed: Option<String>,
}

/// Write each fragment to `out` as soon as it arrives, flushing after every
/// one. Stops at the first error.
pub async fn print_stream<S, W>(stream: S, out: &mut W) -> Result<StreamSummary, LlmError>
where
    S: Stream<Item = Result<String, LlmError>>,
    W: Write,
{
    let mut stream = std::pin::pin!(stream);
    let mut summary = StreamSummary::default();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        out.write_all(fragment.as_bytes())?;
        out.flush()?;
        summary.fragments += 1;
        summary.text.push_str(&fragment);
    }
    Ok(summary)
}

fn banner(title: &str) {
    let rule = "=".repeat(50);
    println!("{}", rule);
    println!("{}", yansi::Paint::new(title).bold());
    println!("{}", rule);
}

/// Run the streaming exchange, then the complete one, as `mode` allows.
pub async fn run_probe(client: &ChatClient, mode: ProbeMode, prompts: &Prompts) -> Result<ProbeReport, LlmError> {
    let mut report = ProbeReport::default();

    if mode.streams() {
        banner(&format!("Testing {} with STREAMING", client.model()));
        tracing::info!(model = client.model(), "Starting streaming exchange");
        let stream = client.stream(&prompts.stream).await?;
        println!("\n[Response (Streaming)]:");
        let mut stdout = std::io::stdout();
        let summary = print_stream(stream, &mut stdout).await?;
        println!("\n{}\n", "=".repeat(50));
        tracing::info!(fragments = summary.fragments, chars = summary.text.chars().count(), "Streaming exchange finished");
        report.streamed = Some(summary);
    }

    if mode.completes() {
        banner(&format!("Testing {} WITHOUT STREAMING", client.model()));
        tracing::info!(model = client.model(), "Starting non-streaming exchange");
        let answer = client.complete(&prompts.complete).await?;
        println!("\n[Response (Non-streaming)]:");
        println!("{}", answer);
        println!("\n{}\n", "=".repeat(50));
        report.completed = Some(answer);
    }

    Ok(report)
}
