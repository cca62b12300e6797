use thiserror::Error;

/// Failure causes for a single pipeline run.
///
/// The `Display` form carries full context for logs; `user_message` is what
/// a caller gets back.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no video id found in {0:?}")]
    InvalidUrl(String),

    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("model declared content not applicable: {0}")]
    NonApplicable(String),

    #[error("could not parse model response: {0}")]
    ResponseParse(String),

    #[error("completion request failed: {0}")]
    Completion(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

pub const RESPONSE_PARSE_MESSAGE: &str = "Could not interpret the model response, please retry";

impl PipelineError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Message safe to hand back to a client. Parser internals are never exposed.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidUrl(input) => format!("Invalid YouTube URL: {input}"),
            PipelineError::Fetch { reason, .. } => format!("Could not load the video page: {reason}"),
            PipelineError::TranscriptUnavailable(reason) => format!("Transcript unavailable: {reason}"),
            PipelineError::NonApplicable(message) => message.clone(),
            PipelineError::ResponseParse(_) => RESPONSE_PARSE_MESSAGE.to_string(),
            PipelineError::Completion(reason) => format!("Model request failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message_mentions_url() {
        let err = PipelineError::InvalidUrl("not-a-youtube-link".to_string());
        assert!(err.user_message().contains("URL"));
    }

    #[test]
    fn test_parse_error_is_sanitized() {
        let err = PipelineError::ResponseParse("expected value at line 1 column 1".to_string());
        assert_eq!(err.user_message(), RESPONSE_PARSE_MESSAGE);
        assert!(err.to_string().contains("line 1 column 1"));
    }

    #[test]
    fn test_non_applicable_passes_message_through() {
        let err = PipelineError::NonApplicable("not a cooking video".to_string());
        assert_eq!(err.user_message(), "not a cooking video");
    }

    #[test]
    fn test_fetch_wraps_reason() {
        let err = PipelineError::fetch("https://www.youtube.com/watch?v=x", "HTTP status 404");
        assert_eq!(err.user_message(), "Could not load the video page: HTTP status 404");
    }
}
