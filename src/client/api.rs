use reqwest::{header::AUTHORIZATION, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    auth::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    client::session::Session,
    error::ErrorResponse,
    titles::{dto::CreateTitleRequest, repo_types::Title},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{}", .body.message)]
    Api {
        status: StatusCode,
        body: ErrorResponse,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Text suitable for a toast.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Api { body, .. } => &body.message,
            ClientError::Transport(_) => "An unexpected error occurred.",
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
        }
    }
}

/// Typed client for the `/api/v1` endpoints. The session token, when present,
/// is sent verbatim as the `Authorization` header.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Logs in and stores the issued token in the session.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let res: LoginResponse = self
            .send(self.http.post(self.url("/auth/login")).json(req))
            .await?;
        self.session.store_token(res.token.clone());
        Ok(res)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        self.send(self.http.post(self.url("/auth/register")).json(req))
            .await
    }

    pub async fn titles(&self) -> Result<Vec<Title>, ClientError> {
        self.send(self.http.get(self.url("/title"))).await
    }

    pub async fn add_title(&self, title: &str) -> Result<Title, ClientError> {
        let body = CreateTitleRequest {
            title: title.to_string(),
        };
        self.send(self.http.post(self.url("/title")).json(&body))
            .await
    }

    pub async fn delete_title(&self, id: Uuid) -> Result<Title, ClientError> {
        self.send(self.http.delete(self.url(&format!("/title/{id}"))))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let req = match self.session.token() {
            Some(token) => req.header(AUTHORIZATION, token),
            None => req,
        };
        let res = req.send().await.map_err(|e| {
            error!(error = %e, "request failed");
            ClientError::Transport(e)
        })?;
        if !res.status().is_success() {
            return Err(api_error(res).await);
        }
        Ok(res.json::<T>().await?)
    }
}

async fn api_error(res: Response) -> ClientError {
    let status = res.status();
    let bytes = res.bytes().await.unwrap_or_default();
    let body = parse_error_body(status, &bytes);
    debug!(%status, message = %body.message, "api error");
    ClientError::Api { status, body }
}

/// Structured error bodies are passed through; anything else gets a
/// generic message.
fn parse_error_body(status: StatusCode, bytes: &[u8]) -> ErrorResponse {
    serde_json::from_slice::<ErrorResponse>(bytes).unwrap_or_else(|_| {
        ErrorResponse::new(format!(
            "Request failed with status {}.",
            status.as_u16()
        ))
    })
}
