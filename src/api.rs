//! Jobly REST API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session talks to the backend only through [`JoblyApi`], so tests and
//! embedders can swap the transport. [`HttpJoblyApi`] is the reqwest binding.
//! Authenticated calls take the bearer token as an argument; nothing here
//! keeps a process-wide token.
//!
//! ERROR HANDLING
//! ==============
//! The backend reports failures as `{"error": {"message": ..., "status": ...}}`
//! where `message` is a string or a list of strings. Both shapes become
//! [`ApiError::Rejected`] with a message list callers can show as-is.

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::models::{JobId, LoginData, SignupData, User};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("API request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("API rejected request: status {status}: {}", .messages.join("; "))]
    Rejected { status: u16, messages: Vec<String> },

    /// The response body did not have the expected shape.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The configured base URL cannot have path segments appended.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Error list suitable for display next to a form.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Rejected { messages, .. } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Calls the session needs from the backend.
#[async_trait::async_trait]
pub trait JoblyApi: Send + Sync {
    /// Fetch the full record for `username`.
    async fn get_current_user(&self, token: &str, username: &str) -> Result<User, ApiError>;

    /// Exchange credentials for a token.
    async fn login(&self, data: &LoginData) -> Result<String, ApiError>;

    /// Register a new user and return their token.
    async fn signup(&self, data: &SignupData) -> Result<String, ApiError>;

    /// Record that `username` applied to `job_id`.
    async fn apply_to_job(&self, token: &str, username: &str, job_id: JobId) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpJoblyApi {
    http: reqwest::Client,
    base_url: String,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct AppliedResponse {
    applied: JobId,
}

impl HttpJoblyApi {
    /// Build a client for `config.base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if `config.base_url` is not an
    /// absolute http(s) URL, or [`ApiError::HttpClientBuild`] if the reqwest
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        let base = Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, base })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "jobly api rejected request");
            return Err(ApiError::Rejected { status: status.as_u16(), messages: error_messages(status, &body) });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait::async_trait]
impl JoblyApi for HttpJoblyApi {
    async fn get_current_user(&self, token: &str, username: &str) -> Result<User, ApiError> {
        let url = endpoint(&self.base, &["users", username])?;
        let body = self.send(self.http.get(url).bearer_auth(token)).await?;
        Ok(parse_body::<UserResponse>(body)?.user)
    }

    async fn login(&self, data: &LoginData) -> Result<String, ApiError> {
        let url = endpoint(&self.base, &["auth", "token"])?;
        let body = self.send(self.http.post(url).json(data)).await?;
        Ok(parse_body::<TokenResponse>(body)?.token)
    }

    async fn signup(&self, data: &SignupData) -> Result<String, ApiError> {
        let url = endpoint(&self.base, &["auth", "register"])?;
        let body = self.send(self.http.post(url).json(data)).await?;
        Ok(parse_body::<TokenResponse>(body)?.token)
    }

    async fn apply_to_job(&self, token: &str, username: &str, job_id: JobId) -> Result<(), ApiError> {
        let job = job_id.to_string();
        let url = endpoint(&self.base, &["users", username, "jobs", &job])?;
        let body = self.send(self.http.post(url).bearer_auth(token)).await?;
        let applied = parse_body::<AppliedResponse>(body)?.applied;
        if applied != job_id {
            return Err(ApiError::Parse(format!("applied to {applied}, expected {job_id}")));
        }
        Ok(())
    }
}

/// Append `segments` to `base`, percent-encoding each one so a username
/// cannot add path levels, a query or a fragment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Pull the message list out of an error body, falling back to the raw body
/// or the status reason.
fn error_messages(status: StatusCode, body: &str) -> Vec<String> {
    let message = serde_json::from_str::<Value>(body)
        .map(|v| v.pointer("/error/message").cloned())
        .unwrap_or(None);

    match message {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ if !body.trim().is_empty() => vec![body.trim().to_owned()],
        _ => vec![status.canonical_reason().unwrap_or("request failed").to_owned()],
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
