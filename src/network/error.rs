//! Remote API error kinds

use super::models::ErrorEnvelope;
use thiserror::Error;

/// Failure of a call to the Perplexity API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}. Please check your PERPLEXITY_API_KEY environment variable")]
    Authentication(String),

    #[error("rate limit exceeded: {0}. Try reducing request frequency or using the 'sonar' model")]
    RateLimit(String),

    #[error("bad request: {0}. {}", bad_request_hint(.0))]
    BadRequest(String),

    #[error("server error: {0}. The Perplexity API is experiencing issues, please try again later")]
    Server(String),

    #[error("API error ({kind}, status {status}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Map a non-2xx status and its body to an error kind.
    ///
    /// The upstream message comes from the JSON error envelope; when the body
    /// is not an envelope the raw text is kept instead.
    pub fn from_status(status: u16, body: &str) -> Self {
        let (kind, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (
                envelope.error.kind.unwrap_or_else(|| "unknown".to_string()),
                envelope.error.message,
            ),
            Err(_) => ("unknown".to_string(), body.trim().to_string()),
        };

        match status {
            401 => ApiError::Authentication(message),
            429 => ApiError::RateLimit(message),
            400 => ApiError::BadRequest(message),
            500 => ApiError::Server(message),
            _ => ApiError::Api {
                status,
                kind,
                message,
            },
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimit(_))
    }
}

fn bad_request_hint(message: &str) -> &'static str {
    if message.contains("Invalid model") {
        "Use 'sonar' for quick searches or 'sonar-pro' for comprehensive searches"
    } else {
        "Check your query parameters and try simplifying the request"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"type":"invalid_request","message":"nope"}}"#;

        assert!(matches!(ApiError::from_status(401, body), ApiError::Authentication(m) if m == "nope"));
        assert!(matches!(ApiError::from_status(429, body), ApiError::RateLimit(m) if m == "nope"));
        assert!(matches!(ApiError::from_status(400, body), ApiError::BadRequest(m) if m == "nope"));
        assert!(matches!(ApiError::from_status(500, body), ApiError::Server(m) if m == "nope"));
        assert!(matches!(
            ApiError::from_status(503, body),
            ApiError::Api { status: 503, ref kind, .. } if kind == "invalid_request"
        ));
    }

    #[test]
    fn test_rate_limit_message_preserved() {
        let body = r#"{"error":{"type":"rate_limit_error","message":"slow down"}}"#;
        let err = ApiError::from_status(429, body);
        assert!(err.is_rate_limit());
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_unparseable_body_kept_verbatim() {
        let err = ApiError::from_status(502, "<html>Bad Gateway</html>");
        let text = err.to_string();
        assert!(text.contains("502"));
        assert!(text.contains("<html>Bad Gateway</html>"));
    }

    #[test]
    fn test_bad_request_hints() {
        let err = ApiError::BadRequest("Invalid model 'foo'".to_string());
        assert!(err.to_string().contains("sonar-pro"));

        let err = ApiError::BadRequest("temperature out of range".to_string());
        assert!(err.to_string().contains("simplifying"));
    }
}
