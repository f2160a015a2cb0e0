// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed HTTP client for the Gym-Pro API.
//!
//! Handles:
//! - Registration and login (the returned token is attached with
//!   [`GymClient::with_token`])
//! - Member, admin and activity endpoints
//! - Mapping the API's JSON error body into [`ClientError::Api`]

mod directory;

pub use directory::{LoadState, MemberDirectory};

use crate::models::{ActivityLogResponse, AdminStats, MemberResponse};
use crate::routes::activity::AttendanceResponse;
use crate::routes::HealthResponse;
use crate::services::{
    AdminMemberUpdate, AuthResponse, LoginRequest, LogRequest, ProfileUpdate, RegisterRequest,
    SeriesPoint,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("API error {status}: {error}")]
    Api {
        status: StatusCode,
        /// Machine-readable code, e.g. `forbidden`
        error: String,
        details: Option<String>,
    },
}

impl ClientError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Roster query for `GET /members`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Gym-Pro API client.
#[derive(Clone)]
pub struct GymClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GymClient {
    /// Create an unauthenticated client for `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// A copy of this client that sends `token` as its bearer credential.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Drop the credential. Logging out is purely client side.
    pub fn logout(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    // ─── Public ──────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send_json(self.request(Method::GET, "/health")).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.send_json(self.request(Method::POST, "/members").json(request))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(self.request(Method::POST, "/members/login").json(&body))
            .await
    }

    // ─── Member ──────────────────────────────────────────────────

    pub async fn profile(&self) -> Result<MemberResponse, ClientError> {
        self.send_json(self.request(Method::GET, "/members/profile"))
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<MemberResponse, ClientError> {
        self.send_json(self.request(Method::PUT, "/members/profile").json(update))
            .await
    }

    pub async fn list_logs(&self) -> Result<Vec<ActivityLogResponse>, ClientError> {
        self.send_json(self.request(Method::GET, "/activity")).await
    }

    pub async fn upsert_log(&self, log: &LogRequest) -> Result<ActivityLogResponse, ClientError> {
        self.send_json(self.request(Method::POST, "/activity").json(log))
            .await
    }

    pub async fn attendance(&self) -> Result<usize, ClientError> {
        let response: AttendanceResponse = self
            .send_json(self.request(Method::GET, "/activity/attendance"))
            .await?;
        Ok(response.attendance)
    }

    pub async fn metric_series(
        &self,
        metric: &str,
        aggregation: &str,
    ) -> Result<Vec<SeriesPoint>, ClientError> {
        self.send_json(
            self.request(Method::GET, "/activity/series")
                .query(&[("metric", metric), ("aggregation", aggregation)]),
        )
        .await
    }

    // ─── Admin ───────────────────────────────────────────────────

    pub async fn list_members(&self, query: &MemberQuery) -> Result<Vec<MemberResponse>, ClientError> {
        self.send_json(self.request(Method::GET, "/members").query(query))
            .await
    }

    pub async fn member_stats(&self) -> Result<AdminStats, ClientError> {
        self.send_json(self.request(Method::GET, "/members/stats"))
            .await
    }

    pub async fn update_member(
        &self,
        id: Uuid,
        update: &AdminMemberUpdate,
    ) -> Result<MemberResponse, ClientError> {
        self.send_json(
            self.request(Method::PUT, &format!("/members/{}", id))
                .json(update),
        )
        .await
    }

    pub async fn delete_member(&self, id: Uuid) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/members/{}", id))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    // ─── Plumbing ────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = check_response(builder.send().await?).await?;
        Ok(response.json().await?)
    }
}

/// Turn an error status into [`ClientError::Api`].
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (error, details) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (parsed.error, parsed.details),
        Err(_) => (status.as_str().to_string(), Some(body).filter(|b| !b.is_empty())),
    };

    Err(ClientError::Api {
        status,
        error,
        details,
    })
}
