//! The core models for managing a stateful chat with an LLM.
use crate::deepseek::{Message, Role};

/// Once the transcript grows past this many messages it is cut down.
pub const TRANSCRIPT_CAPACITY: usize = 20;

/// How many of the most recent messages survive a truncation.
pub const TRANSCRIPT_RETAIN: usize = 10;

pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A transcript that opens with an assistant greeting.
    pub fn seeded(greeting: &str) -> Self {
        Self(vec![Message::new(Role::Assistant, greeting)])
    }

    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// Keep only the most recent `TRANSCRIPT_RETAIN` messages when the
    /// transcript is over capacity. Older context is lost, including
    /// the greeting and possibly one side of an exchange. Returns how
    /// many messages were dropped.
    pub fn truncate(&mut self) -> usize {
        if self.0.len() <= TRANSCRIPT_CAPACITY {
            return 0;
        }
        let dropped = self.0.len() - TRANSCRIPT_RETAIN;
        self.0.drain(..dropped);
        tracing::debug!("Dropped {} messages from the transcript", dropped);
        dropped
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
