use thiserror::Error;

// Fatal at startup, before the listener is bound
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),
}

// Errors from the generation backend. The Display text is what the reply
// pipeline inspects, so Api keeps the numeric status and the status label.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{status} {label}: {message}")]
    Api {
        status: u16,
        label: &'static str,
        message: String,
    },
    #[error("generation request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("generation response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("generation response contained no text")]
    EmptyResponse,
    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

// Errors from the messaging backend (Slack Web API)
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("slack response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("slack api error: {0}")]
    Api(String),
    #[error("slack request timed out after {0}s")]
    Timeout(u64),
}

/// User-facing class of a failed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RateLimitedUpstream,
    InvalidInput,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimitedUpstream => "rate_limited_upstream",
            Self::InvalidInput => "invalid_input",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_lists_every_name() {
        let err = ConfigError::MissingEnv(vec![
            "GOOGLE_API_KEY".to_string(),
            "SLACK_BOT_TOKEN".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required environment variables: GOOGLE_API_KEY, SLACK_BOT_TOKEN"
        );
    }

    #[test]
    fn api_error_display_keeps_status_and_label() {
        let err = GenerationError::Api {
            status: 429,
            label: "ResourceExhausted",
            message: "RATE_LIMIT_EXCEEDED: quota".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("429 ResourceExhausted"));
        assert!(text.contains("RATE_LIMIT_EXCEEDED"));
    }
}
