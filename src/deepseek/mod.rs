//! Client for DeepSeek's OpenAI compatible chat completions API.
mod client;
mod error;
mod models;
mod stream;

pub use client::*;
pub use error::*;
pub use models::*;
pub use stream::*;
