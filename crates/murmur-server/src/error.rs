use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use murmur::errors::ProviderError;
use murmur::models::api::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Everything that can stop a chat request before its stream starts
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing API key: set {env_var} in the server environment")]
    MissingApiKey { env_var: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No valid messages provided")]
    NoValidMessages,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingApiKey { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidRequest(_) | RelayError::NoValidMessages => StatusCode::BAD_REQUEST,
            RelayError::Provider(err) => match err {
                ProviderError::Authentication(_) => StatusCode::UNAUTHORIZED,
                ProviderError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ProviderError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// The user-facing body; upstream details beyond the class name stay in the logs
    pub fn body(&self) -> ErrorResponse {
        match self {
            RelayError::Provider(err) => match err {
                ProviderError::Authentication(_) => {
                    ErrorResponse::new("Authentication failed. Please check your API key.")
                        .with_details(err.kind())
                }
                ProviderError::RateLimited(_) => {
                    ErrorResponse::new("Rate limit exceeded. Please try again in a moment.")
                        .with_details(err.kind())
                }
                ProviderError::Connection(_) => ErrorResponse::new(
                    "Connection to Anthropic API failed. Please check your network connection.",
                )
                .with_details(err.kind()),
                _ => ErrorResponse::new(err.to_string()),
            },
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Chat request failed: {}", self);
        } else {
            tracing::warn!("Chat request rejected: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (
                RelayError::MissingApiKey {
                    env_var: "ANTHROPIC_API_KEY".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (RelayError::NoValidMessages, StatusCode::BAD_REQUEST),
            (
                RelayError::InvalidRequest("bad json".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ProviderError::Authentication("x".into()).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ProviderError::RateLimited("x".into()).into(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ProviderError::Connection("x".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ProviderError::Api {
                    status: 400,
                    message: "x".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }

    #[test]
    fn test_missing_key_body() {
        let body = RelayError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY".into(),
        }
        .body();
        assert_eq!(
            body.error,
            "Missing API key: set ANTHROPIC_API_KEY in the server environment"
        );
        assert_eq!(body.details, None);
    }

    #[test]
    fn test_unclassified_error_passes_text_through() {
        let body = RelayError::from(ProviderError::Api {
            status: 400,
            message: "max_tokens: must be positive".into(),
        })
        .body();
        assert_eq!(
            body.error,
            "Upstream API error (400): max_tokens: must be positive"
        );
    }
}
