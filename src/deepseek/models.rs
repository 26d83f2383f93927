use std::fmt;
use std::ops::RangeInclusive;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Serialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        };
        write!(f, "{}", s)
    }
}

/// A single entry in the conversation. Messages are never mutated
/// after they are created so the fields are only readable.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    #[serde(rename = "deepseek-chat")]
    Chat,
    #[serde(rename = "deepseek-coder")]
    Coder,
}

impl ModelKind {
    /// The model identifier expected by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Chat => "deepseek-chat",
            ModelKind::Coder => "deepseek-coder",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=4096;
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max tokens must be between 1 and 4096, got {0}")]
    MaxTokens(u32),
    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    Temperature(f64),
}

/// Per request settings that are sent along with the transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestConfig {
    model: ModelKind,
    max_tokens: u32,
    temperature: f64,
}

impl RequestConfig {
    pub fn new(model: ModelKind, max_tokens: u32, temperature: f64) -> Result<Self, ConfigError> {
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(ConfigError::MaxTokens(max_tokens));
        }
        // NaN fails the range check too
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(ConfigError::Temperature(temperature));
        }
        Ok(Self {
            model,
            max_tokens,
            temperature,
        })
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn with_model(&self, model: ModelKind) -> Self {
        Self {
            model,
            ..self.clone()
        }
    }

    pub fn with_max_tokens(&self, max_tokens: u32) -> Result<Self, ConfigError> {
        Self::new(self.model, max_tokens, self.temperature)
    }

    pub fn with_temperature(&self, temperature: f64) -> Result<Self, ConfigError> {
        Self::new(self.model, self.max_tokens, temperature)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Chat,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

impl fmt::Display for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "model: {}, max tokens: {}, temperature: {:.1}",
            self.model, self.max_tokens, self.temperature
        )
    }
}

/// Body of a streaming chat completion request.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: ModelKind,
    pub messages: &'a [Message],
    pub temperature: f64,
    pub max_tokens: u32,
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn streaming(messages: &'a [Message], config: &RequestConfig) -> Self {
        Self {
            model: config.model(),
            messages,
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            stream: true,
        }
    }
}
