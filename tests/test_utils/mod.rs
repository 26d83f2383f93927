//! Test utilities for integration tests
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use deepchat::chat::ChatView;
use deepchat::deepseek::Render;

/// A `ChatView` that records everything it is asked to show.
#[derive(Default, Debug)]
pub struct RecordingView {
    pub partials: Vec<String>,
    pub finals: Vec<String>,
    pub errors: Vec<String>,
    pub busy: Vec<String>,
}

impl Render for RecordingView {
    fn render_partial(&mut self, text: &str) {
        self.partials.push(text.to_string());
    }

    fn render_final(&mut self, text: &str) {
        self.finals.push(text.to_string());
    }
}

impl ChatView for RecordingView {
    fn busy(&mut self, label: &str) {
        self.busy.push(label.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Builds an SSE body the way the API streams it: one `data:` event
/// per content fragment followed by the `[DONE]` sentinel.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let event = serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion.chunk",
            "model": "deepseek-chat",
            "choices": [{"index": 0, "delta": {"content": fragment}, "finish_reason": null}]
        });
        body.push_str(&format!("data: {}\n\n", event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// What the server does after sending the first event.
pub enum Hangup {
    /// Keep the connection open without sending anything else.
    Stall(Duration),
    /// Close the connection before the body is complete.
    Close,
}

/// Serves a single streaming response that stops after one event
/// carrying `fragment`. mockito always completes the body, so this
/// writes the chunked response over a plain socket. Returns the base URL
/// to point a chat at.
pub fn partial_stream_server(fragment: &str, hangup: Hangup) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Missing local address");
    let event = format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"index": 0, "delta": {"content": fragment}}]})
    );

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Failed to accept connection");
        read_request(&mut stream);

        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: text/event-stream\r\n\
                    transfer-encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{}\r\n", event.len(), event);
        stream.write_all(head.as_bytes()).expect("Failed to write head");
        stream.write_all(chunk.as_bytes()).expect("Failed to write chunk");
        stream.flush().expect("Failed to flush");

        match hangup {
            Hangup::Stall(duration) => thread::sleep(duration),
            Hangup::Close => {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    });

    format!("http://{}", addr)
}

/// Consumes the request headers and body so closing the socket later
/// doesn't reset the connection.
fn read_request(stream: &mut TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).expect("Failed to read request");
        if read == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("Failed to read request body");
}
