use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(messages) => ErrorResponse {
                message: "Validation failed".into(),
                messages,
            },
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                ErrorResponse::new("Internal server error")
            }
            other => ErrorResponse::new(other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(res: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("error body is JSON")
    }

    #[tokio::test]
    async fn validation_error_carries_detail_list() {
        let res = AppError::Validation(vec!["Invalid email".into(), "Password too short".into()])
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_of(res).await;
        assert_eq!(body.message, "Validation failed");
        assert_eq!(body.messages, vec!["Invalid email", "Password too short"]);
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let err = AppError::from(anyhow::anyhow!("connection refused"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(err.into_response()).await;
        assert_eq!(body, ErrorResponse::new("Internal server error"));
    }

    #[test]
    fn messages_field_is_omitted_when_empty() {
        let json = serde_json::to_string(&ErrorResponse::new("Title not found")).unwrap();
        assert_eq!(json, r#"{"message":"Title not found"}"#);
    }

    #[test]
    fn not_found_message_names_resource() {
        assert_eq!(AppError::NotFound("Title").to_string(), "Title not found");
    }
}
