//! HTTP client for the attendance backend
//!
//! Every route lives under `{base_url}/api/usuarios`. Authenticated calls carry
//! the session token as a bearer credential. Failures are read the same way for
//! every route: 401 means the token was refused, a non-2xx body with
//! `{ "message": ... }` is a rejection, anything else is a bare status error.

use crate::client::attendance::{AttendanceTransport, TransportError};
use crate::client::token::SessionToken;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use presenca_common::api::{
    routes, AttendanceReport, AttendanceRequest, AttendanceResult, AttendanceStatus,
    CertificateResponse, ExportFormat, LoginRequest, LoginResponse, MessageResponse,
    PromoteRequest, QrCodeRequest, QrCodeResponse, RegisterRequest, UserProfile, API_PREFIX,
};
use presenca_common::time::unix_millis;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("presenca-client/", env!("CARGO_PKG_VERSION"));

/// Non-2xx response, classified
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Unauthorized,
    Rejected { status: u16, message: String },
    Status(u16),
}

impl From<Failure> for ClientError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unauthorized => ClientError::Unauthenticated,
            Failure::Rejected { status, message } => ClientError::Rejected { status, message },
            Failure::Status(status) => ClientError::Status(status),
        }
    }
}

impl From<Failure> for TransportError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Unauthorized => TransportError::Unauthorized,
            Failure::Rejected { status, message } => TransportError::Rejected { status, message },
            Failure::Status(status) => TransportError::Status(status),
        }
    }
}

/// Read a failed response into a [`Failure`]
async fn classify_failure(response: Response) -> Failure {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Failure::Unauthorized;
    }

    let body = response.text().await.unwrap_or_default();
    classify_body(status.as_u16(), &body)
}

fn classify_body(status: u16, body: &str) -> Failure {
    let message = serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|m| m.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    match message {
        Some(message) => Failure::Rejected { status, message },
        None => Failure::Status(status),
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(body)
}

/// Backend HTTP client
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `route`
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, route)
    }

    fn request(&self, method: Method, route: &str, token: Option<&SessionToken>) -> RequestBuilder {
        debug!(%method, route, "Backend request");
        let builder = self.http.request(method, self.endpoint(route));
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    /// Send and turn non-2xx responses into errors
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_failure(response).await.into())
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = self.send(builder).await?;
        let body = response.text().await?;
        parse_json(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // ========================================
    // Accounts
    // ========================================

    /// `POST /login` (no token)
    pub async fn login(&self, cpf: &str) -> ClientResult<LoginResponse> {
        let body = LoginRequest {
            cpf: cpf.to_string(),
        };
        self.send_json(self.request(Method::POST, routes::LOGIN, None).json(&body))
            .await
    }

    /// `POST /register` (no token); the response body is ignored
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<()> {
        self.send(self.request(Method::POST, routes::REGISTER, None).json(request))
            .await?;
        Ok(())
    }

    pub async fn profile(&self, token: &SessionToken) -> ClientResult<UserProfile> {
        self.send_json(self.request(Method::GET, routes::PROFILE, Some(token)))
            .await
    }

    /// `GET /users/{id}`
    pub async fn user(&self, id: &str, token: &SessionToken) -> ClientResult<UserProfile> {
        let route = format!("{}/{}", routes::USERS, id);
        self.send_json(self.request(Method::GET, &route, Some(token)))
            .await
    }

    /// `PUT /users/promote`
    pub async fn promote(&self, cpf: &str, token: &SessionToken) -> ClientResult<MessageResponse> {
        let body = PromoteRequest {
            cpf: cpf.to_string(),
        };
        self.send_json(self.request(Method::PUT, routes::PROMOTE, Some(token)).json(&body))
            .await
    }

    // ========================================
    // Images
    // ========================================

    pub async fn generate_qr_code(
        &self,
        cpf: &str,
        token: &SessionToken,
    ) -> ClientResult<QrCodeResponse> {
        let body = QrCodeRequest {
            cpf: cpf.to_string(),
        };
        self.send_json(
            self.request(Method::POST, routes::GENERATE_QRCODE, Some(token))
                .json(&body),
        )
        .await
    }

    pub async fn generate_certificate(
        &self,
        token: &SessionToken,
    ) -> ClientResult<CertificateResponse> {
        self.send_json(self.request(Method::GET, routes::GENERATE_CERTIFICATE, Some(token)))
            .await
    }

    // ========================================
    // Attendance and reporting
    // ========================================

    pub async fn check_attendance(&self, token: &SessionToken) -> ClientResult<AttendanceStatus> {
        self.send_json(self.request(Method::GET, routes::CHECK_ATTENDANCE, Some(token)))
            .await
    }

    /// `GET /relatorio?t={millis}`; the timestamp defeats intermediate caches
    pub async fn report(&self, token: &SessionToken) -> ClientResult<AttendanceReport> {
        let builder = self
            .request(Method::GET, routes::REPORT, Some(token))
            .query(&[("t", unix_millis())]);
        self.send_json(builder).await
    }

    /// `GET /export/{format}`, raw file bytes
    pub async fn export(&self, format: ExportFormat, token: &SessionToken) -> ClientResult<Vec<u8>> {
        let route = format!("{}/{}", routes::EXPORT, format.extension());
        let response = self
            .send(
                self.request(Method::GET, &route, Some(token))
                    .header(reqwest::header::ACCEPT, format.mime_type()),
            )
            .await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl AttendanceTransport for BackendClient {
    async fn post_attendance(
        &self,
        request: &AttendanceRequest,
        token: &SessionToken,
    ) -> Result<AttendanceResult, TransportError> {
        let response = self
            .request(Method::POST, routes::REGISTER_ATTENDANCE, Some(token))
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_failure(response).await.into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(AttendanceResult::default());
        }
        parse_json(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
