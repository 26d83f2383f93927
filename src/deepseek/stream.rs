//! Decoding of streamed chat completion responses.
//!
//! The API answers with one event per line, either `data: <json>`
//! carrying the next fragment of the reply or `data: [DONE]` once the
//! reply is complete. The decoder folds those lines into the full
//! reply text and asks a `Render` implementation to redraw the
//! partial reply as it grows.
use std::io;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

/// End of stream marker sent by the API once the reply is complete.
pub const DONE_SENTINEL: &str = "data: [DONE]";

const DATA_PREFIX: &str = "data:";

/// Minimum time between two partial renders.
pub const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can show the reply while it is being streamed.
pub trait Render {
    /// Called with the accumulated text at most once per
    /// `RENDER_INTERVAL`.
    fn render_partial(&mut self, text: &str);

    /// Called exactly once with the accumulated text after the stream
    /// has ended, however it ended.
    fn render_final(&mut self, text: &str);
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Gates renders so that they are at least `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    /// Returns `true` and resets the window if enough time has passed
    /// since the last time this returned `true`.
    pub fn ready(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

// {"choices": [{"delta": {"content": "Hel"}}]}
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Option<Vec<CompletionChunkChoice>>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// The text fragment carried by a single streamed event.
#[derive(Debug, PartialEq)]
pub struct StreamChunk {
    pub content: String,
}

impl StreamChunk {
    /// Parse the JSON payload of a `data:` line. Payloads without any
    /// content (role announcements, usage, finish reasons) yield
    /// `Ok(None)`.
    pub fn parse(payload: &str) -> Result<Option<Self>, serde_json::Error> {
        let chunk: CompletionChunk = serde_json::from_str(payload)?;
        let content = chunk
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content);
        Ok(content.map(|content| StreamChunk { content }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Streaming,
    Done,
    Aborted,
}

/// A line that could not be decoded. These never stop the stream.
#[derive(Debug, Error)]
pub enum DecodeWarning {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Stream processing error: {0}")]
    Processing(String),
}

/// Result of folding a whole stream.
#[derive(Debug)]
pub struct Decoded {
    pub text: String,
    pub state: DecodeState,
    pub warnings: Vec<DecodeWarning>,
    /// The transport error that aborted the stream, if any.
    pub failure: Option<io::Error>,
}

pub struct StreamDecoder<C: Clock = SystemClock> {
    clock: C,
    throttle: Throttle,
    text: String,
    state: DecodeState,
    warnings: Vec<DecodeWarning>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> StreamDecoder<C> {
    pub fn with_clock(clock: C) -> Self {
        let throttle = Throttle::new(RENDER_INTERVAL, clock.now());
        Self {
            clock,
            throttle,
            text: String::new(),
            state: DecodeState::Streaming,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Process a single line of the response. Does nothing once the
    /// decoder has reached a terminal state.
    pub fn feed_line<R: Render + ?Sized>(&mut self, line: &str, render: &mut R) -> DecodeState {
        if self.state != DecodeState::Streaming {
            return self.state;
        }

        let line = line.trim();
        if line.is_empty() {
            return self.state;
        }

        if line == DONE_SENTINEL {
            self.state = DecodeState::Done;
            return self.state;
        }

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            tracing::trace!("Ignoring unrecognized stream line: {}", line);
            return self.state;
        };

        match StreamChunk::parse(payload.trim()) {
            Ok(Some(chunk)) => {
                self.text.push_str(&chunk.content);
                if self.throttle.ready(self.clock.now()) {
                    render.render_partial(&self.text);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Parsing completion chunk failed for {}\nError: {}", payload, e);
                self.warnings.push(DecodeWarning::Parse(e));
            }
        }

        self.state
    }

    /// Same as `feed_line` for a raw line off the wire. Lines that are
    /// not valid UTF-8 are recorded as a warning and skipped.
    pub fn feed_bytes<R: Render + ?Sized>(&mut self, line: &[u8], render: &mut R) -> DecodeState {
        if self.state != DecodeState::Streaming {
            return self.state;
        }
        match std::str::from_utf8(line) {
            Ok(line) => self.feed_line(line, render),
            Err(e) => {
                tracing::warn!("Skipping stream line that is not UTF-8: {}", e);
                self.warnings.push(DecodeWarning::Processing(e.to_string()));
                self.state
            }
        }
    }

    /// Consume every line of a response until the sentinel, the end of
    /// the input, or a read error. Always renders the final text.
    pub fn decode<I, R>(mut self, lines: I, render: &mut R) -> Decoded
    where
        I: IntoIterator<Item = io::Result<Vec<u8>>>,
        R: Render + ?Sized,
    {
        let mut failure = None;

        for line in lines {
            match line {
                Ok(line) => {
                    if self.feed_bytes(&line, render) != DecodeState::Streaming {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Response stream aborted: {}", e);
                    self.state = DecodeState::Aborted;
                    failure = Some(e);
                    break;
                }
            }
        }

        if self.state == DecodeState::Streaming {
            tracing::debug!("Response stream ended without {}", DONE_SENTINEL);
            self.state = DecodeState::Done;
        }

        render.render_final(&self.text);

        Decoded {
            text: self.text,
            state: self.state,
            warnings: self.warnings,
            failure,
        }
    }
}
