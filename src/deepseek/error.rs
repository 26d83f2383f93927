use std::error::Error as StdError;
use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can end a turn early. The `Display` of each
/// variant is what gets shown to the user.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Authentication failed: set a valid API key in DEEPSEEK_API_KEY")]
    Unauthorized,
    #[error("Too many requests: please try again in a moment")]
    RateLimited,
    #[error("API request failed: {status}")]
    Http { status: StatusCode },
    #[error("Request timed out: check your network connection")]
    Timeout,
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl TurnError {
    /// Classify a non-success HTTP status. Returns `None` for
    /// successful statuses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        let err = match status {
            StatusCode::UNAUTHORIZED => TurnError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => TurnError::RateLimited,
            status => TurnError::Http { status },
        };
        Some(err)
    }

    /// Errors raised while reading the response body mid-stream. The
    /// client wraps its own errors in `io::Error`, so the whole source
    /// chain is searched for a timeout.
    pub fn from_io(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::TimedOut {
            return TurnError::Timeout;
        }
        let mut source = err.get_ref().map(|inner| inner as &(dyn StdError + 'static));
        while let Some(inner) = source {
            let timed_out = inner
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout)
                || inner
                    .downcast_ref::<io::Error>()
                    .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut);
            if timed_out {
                return TurnError::Timeout;
            }
            source = inner.source();
        }
        TurnError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for TurnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TurnError::Timeout;
        }
        if let Some(err) = err.status().and_then(TurnError::from_status) {
            return err;
        }
        if err.is_builder() {
            return TurnError::Unexpected(err.into());
        }
        TurnError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_success_is_none() {
        assert!(TurnError::from_status(StatusCode::OK).is_none());
    }

    #[test]
    fn test_from_status_unauthorized() {
        let err = TurnError::from_status(StatusCode::UNAUTHORIZED).unwrap();
        assert!(matches!(err, TurnError::Unauthorized));
        assert!(err.to_string().starts_with("Authentication failed"));
    }

    #[test]
    fn test_from_status_rate_limited() {
        let err = TurnError::from_status(StatusCode::TOO_MANY_REQUESTS).unwrap();
        assert!(matches!(err, TurnError::RateLimited));
        assert!(err.to_string().starts_with("Too many requests"));
    }

    #[test]
    fn test_from_status_generic_includes_reason() {
        let err = TurnError::from_status(StatusCode::INTERNAL_SERVER_ERROR).unwrap();
        assert_eq!(
            err.to_string(),
            "API request failed: 500 Internal Server Error"
        );
    }

    #[test]
    fn test_from_io_timeout() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        assert!(matches!(TurnError::from_io(&err), TurnError::Timeout));
    }

    #[test]
    fn test_from_io_wrapped_timeout() {
        let inner = io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed");
        let err = io::Error::other(inner);
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(matches!(TurnError::from_io(&err), TurnError::Timeout));
    }

    #[test]
    fn test_from_io_other_is_transport() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        match TurnError::from_io(&err) {
            TurnError::Transport(msg) => assert_eq!(msg, "reset by peer"),
            other => panic!("Expected Transport variant, got {:?}", other),
        }
    }
}
