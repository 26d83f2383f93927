use std::io::{self, Stderr, Stdout, Write};

use crate::chat::ChatView;
use crate::deepseek::{Message, Render};

/// Shown after the text while a reply is still streaming.
pub const CURSOR: &str = "▌";

/// Backspace over the cursor, blank it, and step back again.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Renders a chat in a terminal. The reply is printed incrementally:
/// each render only writes the part of the text that has not been
/// printed yet, which works because replies only ever grow.
pub struct TerminalView<W: Write = Stdout, E: Write = Stderr> {
    out: W,
    err: E,
    printed: usize,
    cursor: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write, E: Write> TerminalView<W, E> {
    pub fn with_writers(out: W, err: E) -> Self {
        Self {
            out,
            err,
            printed: 0,
            cursor: false,
        }
    }

    pub fn into_writers(self) -> (W, E) {
        (self.out, self.err)
    }

    pub fn banner(&mut self, title: &str, caption: &str) {
        let result = writeln!(self.out, "{}\n{}\n", title, caption);
        log_write_error(result);
    }

    pub fn message(&mut self, msg: &Message) {
        let result = writeln!(self.out, "{}> {}", msg.role(), msg.content());
        log_write_error(result);
    }

    pub fn info(&mut self, text: &str) {
        let result = writeln!(self.out, "{}", text);
        log_write_error(result);
    }

    fn write_unprinted(&mut self, text: &str, cursor: bool) -> io::Result<()> {
        // A shorter text means a new reply started without `busy`
        if !text.is_char_boundary(self.printed) {
            self.printed = 0;
        }
        let unprinted = &text[self.printed..];
        if unprinted.is_empty() && self.cursor == cursor {
            return Ok(());
        }
        if self.cursor {
            self.out.write_all(ERASE_CURSOR.as_bytes())?;
            self.cursor = false;
        }
        self.out.write_all(unprinted.as_bytes())?;
        self.printed = text.len();
        if cursor {
            self.out.write_all(CURSOR.as_bytes())?;
            self.cursor = true;
        }
        self.out.flush()
    }
}

fn log_write_error(result: io::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("Failed to write to terminal: {}", e);
    }
}

impl<W: Write, E: Write> Render for TerminalView<W, E> {
    fn render_partial(&mut self, text: &str) {
        let result = self.write_unprinted(text, true);
        log_write_error(result);
    }

    fn render_final(&mut self, text: &str) {
        let result = self
            .write_unprinted(text, false)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        self.printed = 0;
        log_write_error(result);
    }
}

impl<W: Write, E: Write> ChatView for TerminalView<W, E> {
    fn busy(&mut self, label: &str) {
        self.printed = 0;
        self.cursor = false;
        let result = writeln!(self.err, "{}", label);
        log_write_error(result);
    }

    fn error(&mut self, message: &str) {
        let result = writeln!(self.err, "error: {}", message);
        log_write_error(result);
    }
}
