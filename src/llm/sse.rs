//! Server-Sent Events decoding for streamed chat completions.

use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

use super::error::LlmError;
use super::types::StreamChunk;

/// SSE event types
#[derive(Debug, Clone)]
pub enum SseEvent {
    /// Data chunk
    Chunk(StreamChunk),
    /// Stream complete
    Done,
    /// Named event
    Event(String),
}

/// Parse Server-Sent Events line by line
pub struct SseParser;

impl SseParser {
    /// Parse one SSE line. Blank lines, comments and unknown fields yield
    /// `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<SseEvent>, LlmError> {
        if line.is_empty() || line.starts_with(':') {
            return Ok(None);
        }

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            if data.trim() == "[DONE]" {
                return Ok(Some(SseEvent::Done));
            }
            let chunk = serde_json::from_str::<StreamChunk>(data)?;
            return Ok(Some(SseEvent::Chunk(chunk)));
        }

        if let Some(event_type) = line.strip_prefix("event:") {
            return Ok(Some(SseEvent::Event(event_type.trim().to_string())));
        }

        Ok(None)
    }
}

/// Reassembles lines from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<Result<String, LlmError>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(decode(line))
    }

    /// Whatever is left once the input has ended.
    pub fn finish(&mut self) -> Option<Result<String, LlmError>> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode(rest))
    }
}

fn decode(bytes: Vec<u8>) -> Result<String, LlmError> {
    String::from_utf8(bytes).map_err(|e| LlmError::Stream(format!("Invalid UTF-8 in stream: {}", e)))
}

struct ContentState<S> {
    bytes: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<Result<String, LlmError>>,
    done: bool,
}

impl<S> ContentState<S> {
    // Returns true once the stream should stop being read.
    fn handle_line(&mut self, line: Result<String, LlmError>) -> bool {
        let event = line.and_then(|l| SseParser::parse_line(&l));
        match event {
            Ok(Some(SseEvent::Chunk(chunk))) => {
                if let Some(error) = &chunk.error {
                    self.pending.push_back(Err(LlmError::Stream(error.message.clone())));
                    return true;
                }
                if let Some(content) = chunk.content().filter(|c| !c.is_empty()) {
                    self.pending.push_back(Ok(content.to_string()));
                }
                false
            }
            Ok(Some(SseEvent::Done)) => true,
            Ok(Some(SseEvent::Event(name))) => {
                tracing::debug!(event = %name, "SSE event");
                false
            }
            Ok(None) => false,
            Err(e) => {
                self.pending.push_back(Err(e));
                true
            }
        }
    }
}

/// Turn a raw SSE byte stream into the sequence of content fragments it
/// carries. Ends at `data: [DONE]`, at end of input, or after the first
/// error.
pub fn content_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, LlmError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
{
    let state = ContentState {
        bytes: Box::pin(bytes),
        lines: LineBuffer::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.lines.push(chunk.as_ref());
                    while let Some(line) = st.lines.next_line() {
                        if st.handle_line(line) {
                            st.done = true;
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.pending.push_back(Err(e.into()));
                    st.done = true;
                }
                None => {
                    if let Some(line) = st.lines.finish() {
                        st.handle_line(line);
                    }
                    st.done = true;
                }
            }
        }
    })
}
