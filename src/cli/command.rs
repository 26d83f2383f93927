//! Slash commands for changing the session between turns.
use clap::ValueEnum;
use thiserror::Error;

use crate::deepseek::ModelKind;

pub const HELP: &str = r"Commands:
  /model <chat|coder>   Switch the model used for the next turns
  /max-tokens <1-4096>  Limit the length of replies
  /temperature <0-2>    Higher values give more creative replies
  /settings             Show the current settings
  /history              Show the conversation so far
  /help                 Show this message
  /quit                 Leave the chat";

#[derive(Debug, PartialEq)]
pub enum Command {
    Model(ModelKind),
    MaxTokens(u32),
    Temperature(f64),
    Settings,
    History,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command /{0}, type /help for a list of commands")]
    Unknown(String),
    #[error("/{0} needs a value")]
    MissingValue(&'static str),
    #[error("Invalid value for /{name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

fn parse_model(value: &str) -> Option<ModelKind> {
    ModelKind::from_str(value, true).ok().or_else(|| {
        ModelKind::value_variants()
            .iter()
            .find(|m| m.as_str() == value)
            .copied()
    })
}

impl Command {
    /// Returns `None` when the line is not a command and should be
    /// sent as a prompt.
    pub fn parse(line: &str) -> Option<Result<Command, CommandError>> {
        let rest = line.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let value = parts.next();

        let cmd = match name {
            "model" => {
                let value = value.ok_or(CommandError::MissingValue("model"));
                value.and_then(|v| {
                    parse_model(v).map(Command::Model).ok_or(CommandError::InvalidValue {
                        name: "model",
                        value: v.to_string(),
                    })
                })
            }
            "max-tokens" => {
                let value = value.ok_or(CommandError::MissingValue("max-tokens"));
                value.and_then(|v| {
                    v.parse()
                        .map(Command::MaxTokens)
                        .map_err(|_| CommandError::InvalidValue {
                            name: "max-tokens",
                            value: v.to_string(),
                        })
                })
            }
            "temperature" => {
                let value = value.ok_or(CommandError::MissingValue("temperature"));
                value.and_then(|v| {
                    v.parse()
                        .map(Command::Temperature)
                        .map_err(|_| CommandError::InvalidValue {
                            name: "temperature",
                            value: v.to_string(),
                        })
                })
            }
            "settings" => Ok(Command::Settings),
            "history" => Ok(Command::History),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        };

        Some(cmd)
    }
}
