use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON body of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn upstream() -> Self {
        Self::new("UPSTREAM_ERROR", "Ontology lookup failed")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Every search attempt against the ontology failed.
    #[error("Ontology lookup failed: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, ApiError::upstream().with_details(msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_messages_and_status() {
        let upstream = AppError::Upstream("connection reset".to_string());
        assert_eq!(upstream.to_string(), "Ontology lookup failed: connection reset");
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);

        let internal = AppError::from(anyhow::anyhow!("template missing"));
        assert_eq!(internal.to_string(), "Internal error: template missing");
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
