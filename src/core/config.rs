use std::env;

use anyhow::{Result, bail};

use crate::chat::DEFAULT_GREETING;
use crate::deepseek::DEFAULT_API_HOSTNAME;

pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const API_HOST_VAR: &str = "DEEPCHAT_API_HOST";
pub const GREETING_VAR: &str = "DEEPCHAT_GREETING";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_hostname: String,
    pub api_key: String,
    pub greeting: String,
}

impl AppConfig {
    /// Read the configuration from the environment. A missing API key
    /// is fatal since no request could ever succeed without it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup(API_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("Missing env var {}", API_KEY_VAR),
        };
        let api_hostname = lookup(API_HOST_VAR)
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_HOSTNAME.to_string());
        let greeting = lookup(GREETING_VAR).unwrap_or_else(|| DEFAULT_GREETING.to_string());

        Ok(Self {
            api_hostname,
            api_key,
            greeting,
        })
    }
}
