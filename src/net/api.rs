//! Backend API boundary for the session core.
//!
//! `ClinicApi` is the seam the store and the pending-count loader call
//! through; `HttpClinicApi` is the real implementation over `reqwest` with a
//! cookie store holding the backend-issued session artifact.
//!
//! ERROR HANDLING
//! ==============
//! `/auth/me` answering 401/403 is not an error: it means "no session" and
//! maps to `Ok(None)`. Every other non-success status, transport failure, or
//! undecodable body is an `ApiError` the caller decides how to surface.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::types::{LoginRequest, SessionPayload};
use crate::config::ClientConfig;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";
pub const INCOMPLETE_PATIENTS_PATH: &str = "/patients/incomplete";
pub const UPCOMING_EVENTS_PATH: &str = "/events/upcoming";

/// Errors produced by backend calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("could not reach the server: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The response body did not match the expected schema.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Whether the failure happened below the HTTP layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Backend operations the session core depends on.
#[async_trait(?Send)]
pub trait ClinicApi {
    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for bad credentials, or a transport/decode error.
    async fn login(&self, request: &LoginRequest) -> Result<SessionPayload, ApiError>;

    /// `POST /auth/logout`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the backend did not confirm the logout.
    async fn logout(&self) -> Result<(), ApiError>;

    /// `GET /auth/me`. `Ok(None)` means the backend reports no valid session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures and unexpected statuses.
    async fn me(&self) -> Result<Option<SessionPayload>, ApiError>;

    /// `GET /patients/incomplete`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the list could not be loaded.
    async fn incomplete_patients(&self) -> Result<Vec<Value>, ApiError>;

    /// `GET /events/upcoming`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the list could not be loaded.
    async fn upcoming_events(&self) -> Result<Vec<Value>, ApiError>;
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn request_failed_message(status: u16) -> String {
    format!("request failed: {status}")
}

/// Pick the most useful human-readable message out of a failure body.
fn failure_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(field) {
                if !message.trim().is_empty() {
                    return message.trim().to_owned();
                }
            }
        }
        return request_failed_message(status);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        request_failed_message(status)
    } else {
        trimmed.to_owned()
    }
}

fn treats_as_no_session(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// `reqwest`-backed [`ClinicApi`].
#[derive(Clone, Debug)]
pub struct HttpClinicApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClinicApi {
    /// Build a client with a private cookie store and the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { client, base_url: config.api_url.clone() })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .client
            .get(endpoint(&self.base_url, path))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

async fn rejected(resp: reqwest::Response) -> ApiError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ApiError::Rejected { status, message: failure_message(status, &body) }
}

#[async_trait(?Send)]
impl ClinicApi for HttpClinicApi {
    async fn login(&self, request: &LoginRequest) -> Result<SessionPayload, ApiError> {
        let resp = self
            .client
            .post(endpoint(&self.base_url, LOGIN_PATH))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        resp.json::<SessionPayload>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(endpoint(&self.base_url, LOGOUT_PATH))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        Ok(())
    }

    async fn me(&self) -> Result<Option<SessionPayload>, ApiError> {
        let resp = self
            .client
            .get(endpoint(&self.base_url, ME_PATH))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if treats_as_no_session(status) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejected(resp).await);
        }
        resp.json::<SessionPayload>()
            .await
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn incomplete_patients(&self) -> Result<Vec<Value>, ApiError> {
        self.get_json(INCOMPLETE_PATIENTS_PATH).await
    }

    async fn upcoming_events(&self) -> Result<Vec<Value>, ApiError> {
        self.get_json(UPCOMING_EVENTS_PATH).await
    }
}
