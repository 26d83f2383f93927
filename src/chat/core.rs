use std::time::Duration;

use crate::deepseek::{
    DecodeState, Message, REQUEST_TIMEOUT, RequestConfig, Role, StreamDecoder, TurnError,
    completion_stream, response_lines,
};

use super::models::{DEFAULT_GREETING, Transcript};
use super::view::ChatView;

pub const BUSY_LABEL: &str = "Generating a response...";

/// What happened during a single turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The assistant message appended to the transcript, if any text
    /// was received.
    pub reply: Option<Message>,
    /// The failure that ended the turn early.
    pub error: Option<TurnError>,
    /// Number of stream lines that could not be decoded.
    pub warnings: usize,
    /// Number of messages dropped from the transcript afterwards.
    pub dropped: usize,
}

/// A chat session against a streaming chat completions API. Owns the
/// transcript and the request settings for the lifetime of the
/// session.
///
/// Use `ChatBuilder` to construct a `Chat`.
pub struct Chat {
    api_hostname: String,
    api_key: String,
    timeout: Duration,
    config: RequestConfig,
    transcript: Transcript,
}

impl Chat {
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Settings apply from the next turn on.
    pub fn set_config(&mut self, config: RequestConfig) {
        self.config = config;
    }

    /// Runs the next turn in chat: the prompt is added to the
    /// transcript, the whole transcript is sent to the LLM and the
    /// reply is streamed to `view`. Failures are reported on the view
    /// and returned in the outcome instead of being propagated so the
    /// session can always continue.
    pub fn next_msg<V: ChatView + ?Sized>(&mut self, prompt: &str, view: &mut V) -> TurnOutcome {
        self.transcript.push(Message::new(Role::User, prompt));
        view.busy(BUSY_LABEL);

        let mut text = String::new();
        let mut warnings = 0;
        let mut error = None;

        match completion_stream(
            self.transcript.messages(),
            &self.config,
            &self.api_hostname,
            &self.api_key,
            self.timeout,
        ) {
            Ok(response) => {
                let decoded = StreamDecoder::new().decode(response_lines(response), view);
                for warning in decoded.warnings.iter() {
                    view.error(&warning.to_string());
                }
                warnings = decoded.warnings.len();
                if let (DecodeState::Aborted, Some(e)) = (decoded.state, &decoded.failure) {
                    error = Some(TurnError::from_io(e));
                }
                text = decoded.text;
            }
            Err(e) => error = Some(e),
        }

        if let Some(e) = &error {
            tracing::error!("Chat turn failed: {:?}", e);
            view.error(&e.to_string());
        }

        // Keep whatever was received, even if the stream was cut short
        let reply = if text.is_empty() {
            None
        } else {
            let msg = Message::new(Role::Assistant, &text);
            self.transcript.push(msg.clone());
            Some(msg)
        };

        let dropped = self.transcript.truncate();

        TurnOutcome {
            reply,
            error,
            warnings,
            dropped,
        }
    }
}

pub struct ChatBuilder {
    api_hostname: String,
    api_key: String,
    timeout: Duration,
    config: RequestConfig,
    transcript: Transcript,
}

impl ChatBuilder {
    pub fn new(api_hostname: &str, api_key: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            timeout: REQUEST_TIMEOUT,
            config: RequestConfig::default(),
            transcript: Transcript::seeded(DEFAULT_GREETING),
        }
    }

    pub fn build(self) -> Chat {
        Chat {
            api_hostname: self.api_hostname,
            api_key: self.api_key,
            timeout: self.timeout,
            config: self.config,
            transcript: self.transcript,
        }
    }

    pub fn config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    /// Bounds connecting and each whole request, including reading the
    /// streamed body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn greeting(mut self, greeting: &str) -> Self {
        self.transcript = Transcript::seeded(greeting);
        self
    }

    pub fn transcript(mut self, messages: Vec<Message>) -> Self {
        self.transcript = Transcript::new_with_messages(messages);
        self
    }
}
