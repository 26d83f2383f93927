use std::io::Write;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::command::{Command, HELP};
use super::view::TerminalView;
use crate::chat::{Chat, ChatBuilder, ChatView};
use crate::core::AppConfig;
use crate::deepseek::RequestConfig;

const TITLE: &str = "DeepSeek Chat";
const CAPTION: &str = "Streaming chat with the DeepSeek API. Type /help for commands.";

/// Whether the session should keep reading input.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Handle a slash command. Setting changes that fail validation are
/// reported and leave the current settings untouched.
pub fn apply_command<W: Write, E: Write>(
    chat: &mut Chat,
    cmd: Command,
    view: &mut TerminalView<W, E>,
) -> Flow {
    let updated = match cmd {
        Command::Model(model) => Ok(chat.config().with_model(model)),
        Command::MaxTokens(n) => chat.config().with_max_tokens(n),
        Command::Temperature(t) => chat.config().with_temperature(t),
        Command::Settings => {
            view.info(&chat.config().to_string());
            return Flow::Continue;
        }
        Command::History => {
            for msg in chat.transcript() {
                view.message(msg);
            }
            return Flow::Continue;
        }
        Command::Help => {
            view.info(HELP);
            return Flow::Continue;
        }
        Command::Quit => return Flow::Quit,
    };

    match updated {
        Ok(config) => {
            view.info(&config.to_string());
            chat.set_config(config);
        }
        Err(e) => view.error(&e.to_string()),
    }
    Flow::Continue
}

pub fn run(request_config: RequestConfig) -> Result<()> {
    let app_config = AppConfig::from_env()?;
    let mut rl = DefaultEditor::new()?;
    let mut view = TerminalView::new();

    let mut chat = ChatBuilder::new(&app_config.api_hostname, &app_config.api_key)
        .config(request_config)
        .greeting(&app_config.greeting)
        .build();

    view.banner(TITLE, CAPTION);
    view.info(&chat.config().to_string());
    for msg in chat.transcript() {
        view.message(msg);
    }

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match Command::parse(&line) {
                    Some(Ok(cmd)) => {
                        if apply_command(&mut chat, cmd, &mut view) == Flow::Quit {
                            break;
                        }
                    }
                    Some(Err(e)) => view.error(&e.to_string()),
                    None => {
                        let outcome = chat.next_msg(&line, &mut view);
                        if outcome.dropped > 0 {
                            tracing::info!(
                                "Transcript trimmed, {} older messages dropped",
                                outcome.dropped
                            );
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
