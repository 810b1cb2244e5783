use thiserror::Error;

/// Failures raised while talking to the upstream model provider.
///
/// Variants are classified from typed signals (HTTP status, upstream error type)
/// so callers can map them onto user-facing responses without inspecting text.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Upstream stream error: {0}")]
    Stream(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Stable name for the error class, used in `details` of error responses
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Authentication(_) => "AuthenticationError",
            ProviderError::RateLimited(_) => "RateLimitError",
            ProviderError::Connection(_) => "APIConnectionError",
            ProviderError::Api { .. } => "APIError",
            ProviderError::Stream(_) => "StreamError",
            ProviderError::InvalidResponse(_) => "InvalidResponseError",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            ProviderError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            ProviderError::Stream(err.to_string())
        } else {
            ProviderError::Connection(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures of a single client request to the relay endpoint.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to relay failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Relay responded with {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Response stream aborted: {0}")]
    Stream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ProviderError::Connection("refused".into()).kind(),
            "APIConnectionError"
        );
        assert_eq!(
            ProviderError::Authentication("bad key".into()).kind(),
            "AuthenticationError"
        );
        assert_eq!(
            ProviderError::RateLimited("slow down".into()).kind(),
            "RateLimitError"
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = ProviderError::Api {
            status: 529,
            message: "Overloaded".into(),
        };
        assert_eq!(err.to_string(), "Upstream API error (529): Overloaded");
    }
}
