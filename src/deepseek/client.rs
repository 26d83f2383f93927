use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use super::error::TurnError;
use super::models::{ChatRequest, Message, RequestConfig};

pub const DEFAULT_API_HOSTNAME: &str = "https://api.deepseek.com";

/// Default bound for both establishing the connection and the whole
/// request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn completions_url(api_hostname: &str) -> String {
    format!("{}/v1/chat/completions", api_hostname.trim_end_matches('/'))
}

/// Send the transcript and return the response once the server has
/// accepted the request. Error statuses are classified here so that
/// callers only ever see a streaming body.
pub fn completion_stream(
    messages: &[Message],
    config: &RequestConfig,
    api_hostname: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Response, TurnError> {
    let client = Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;

    let payload = ChatRequest::streaming(messages, config);
    let url = completions_url(api_hostname);
    tracing::debug!(
        "Sending {} messages to {} using {}",
        messages.len(),
        url,
        config
    );

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()?;

    let status = response.status();
    tracing::debug!("Completion HTTP status: {}", status);
    if let Some(err) = TurnError::from_status(status) {
        return Err(err);
    }

    Ok(response)
}

/// Split a streaming response body into raw lines.
pub fn response_lines(response: Response) -> impl Iterator<Item = std::io::Result<Vec<u8>>> {
    BufReader::new(response).split(b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deepseek::{ModelKind, Role};
    use mockito::Matcher;
    use std::io::Read;

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.deepseek.com"),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:8080/"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_completion_stream_request() {
        let mut server = mockito::Server::new();

        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "model": "deepseek-coder",
                "messages": [{"role": "user", "content": "Hi"}],
                "temperature": 0.5,
                "max_tokens": 64,
                "stream": true,
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: [DONE]\n\n")
            .create();

        let messages = vec![Message::new(Role::User, "Hi")];
        let config = RequestConfig::new(ModelKind::Coder, 64, 0.5).unwrap();
        let mut response = completion_stream(
            &messages,
            &config,
            server.url().as_str(),
            "test-key",
            REQUEST_TIMEOUT,
        )
        .unwrap();

        let mut body = String::new();
        response.read_to_string(&mut body).unwrap();

        mock.assert();
        assert_eq!(body, "data: [DONE]\n\n");
    }

    #[test]
    fn test_completion_stream_unauthorized() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Authentication Fails"}}"#)
            .create();

        let messages = vec![Message::new(Role::User, "Hi")];
        let result = completion_stream(
            &messages,
            &RequestConfig::default(),
            server.url().as_str(),
            "bad-key",
            REQUEST_TIMEOUT,
        );

        mock.assert();
        assert!(matches!(result, Err(TurnError::Unauthorized)));
    }

    #[test]
    fn test_completion_stream_rate_limited() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .create();

        let messages = vec![Message::new(Role::User, "Hi")];
        let result = completion_stream(
            &messages,
            &RequestConfig::default(),
            server.url().as_str(),
            "test-key",
            REQUEST_TIMEOUT,
        );

        mock.assert();
        assert!(matches!(result, Err(TurnError::RateLimited)));
    }

    #[test]
    fn test_completion_stream_server_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .create();

        let messages = vec![Message::new(Role::User, "Hi")];
        let result = completion_stream(
            &messages,
            &RequestConfig::default(),
            server.url().as_str(),
            "test-key",
            REQUEST_TIMEOUT,
        );

        mock.assert();
        match result {
            Err(TurnError::Http { status }) => assert_eq!(status.as_u16(), 503),
            other => panic!("Expected Http variant, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_completion_stream_connection_refused() {
        let messages = vec![Message::new(Role::User, "Hi")];
        // Nothing listens on port 1
        let result = completion_stream(
            &messages,
            &RequestConfig::default(),
            "http://127.0.0.1:1",
            "test-key",
            REQUEST_TIMEOUT,
        );
        assert!(matches!(result, Err(TurnError::Transport(_))));
    }

    #[test]
    fn test_response_lines() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("data: a\r\n\r\ndata: b\n")
            .create();

        let messages = vec![Message::new(Role::User, "Hi")];
        let response = completion_stream(
            &messages,
            &RequestConfig::default(),
            server.url().as_str(),
            "test-key",
            REQUEST_TIMEOUT,
        )
        .unwrap();

        let lines: Vec<Vec<u8>> = response_lines(response).map(|l| l.unwrap()).collect();
        assert_eq!(
            lines,
            vec![b"data: a\r".to_vec(), b"\r".to_vec(), b"data: b".to_vec()]
        );
    }
}
