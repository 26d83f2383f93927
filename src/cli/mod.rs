use anyhow::Result;
use clap::{Args, Parser, Subcommand};

pub mod chat;
pub mod command;
pub mod view;

use crate::deepseek::{ModelKind, RequestConfig, TEMPERATURE_RANGE};

fn parse_temperature(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if TEMPERATURE_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} is not in {}..={}",
            value,
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        ))
    }
}

/// Settings sent along with every request. Global so they can be given
/// before or after the subcommand.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Model to chat with
    #[arg(long, global = true, value_enum, default_value_t = ModelKind::Chat)]
    model: ModelKind,

    /// Maximum number of tokens in a reply
    #[arg(long, global = true, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..=4096))]
    max_tokens: u32,

    /// Higher values give more creative replies
    #[arg(long, global = true, default_value_t = 0.7, value_parser = parse_temperature)]
    temperature: f64,
}

impl RequestArgs {
    pub fn request_config(&self) -> Result<RequestConfig> {
        Ok(RequestConfig::new(self.model, self.max_tokens, self.temperature)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Start a chat session (the default)
    Chat,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    request: RequestArgs,
}

pub fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Some(Command::Chat) | None => {
            chat::run(args.request.request_config()?)?;
        }
    }

    Ok(())
}
