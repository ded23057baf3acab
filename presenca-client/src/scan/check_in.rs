//! Check-in pipeline: validate → window → token → submit
//!
//! Every failure is turned into a [`Resolution`] carrying the message shown to
//! the operator. Nothing here propagates an error to the caller.

use crate::client::attendance::{AttendanceClient, SubmitError};
use crate::client::token::SessionToken;
use crate::scan::camera::CameraError;
use presenca_common::api::AttendanceResult;
use presenca_common::cpf::{validate, InvalidCpf};
use presenca_common::time::Clock;
use presenca_common::{AttendancePeriod, Cpf, TimeWindowPolicy};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Operator-facing messages
pub mod messages {
    pub const COMPLETE: &str = "Presença registrada! Comparecimento completo hoje.";
    pub const REGISTERED: &str = "Presença registrada.";
    pub const INVALID_CODE: &str = "QR Code inválido.";
    pub const NO_TOKEN: &str = "Token não encontrado. Faça login novamente.";
    pub const SERVER_UNREACHABLE: &str = "Erro ao conectar com o servidor.";
    pub const REGISTRATION_FAILED: &str = "Erro ao registrar presença.";
    pub const PERMISSION_DENIED: &str = "Permissão não concedida. Acesso à câmera negado.";

    /// "No window open" message naming the accepted windows
    pub fn window_closed(windows: &str) -> String {
        format!(
            "Nenhuma janela de leitura ativa no momento ({}).",
            windows
        )
    }
}

/// Why a check-in did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInError {
    #[error("camera unavailable: {0}")]
    PermissionDenied(#[from] CameraError),

    #[error("invalid code: {0}")]
    InvalidCode(#[from] InvalidCpf),

    #[error("no attendance window open (accepted: {windows})")]
    WindowClosed { windows: String },

    #[error("not authenticated")]
    Unauthenticated,

    #[error("submission failed: {0}")]
    Submit(SubmitError),
}

/// Severity of a resolved check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

/// How a scanned or typed code was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub message: String,
    /// Period the code was submitted for, when it got that far
    pub period: Option<AttendancePeriod>,
    /// Both periods of the day are now registered
    pub complete: bool,
    pub error: Option<CheckInError>,
}

impl Resolution {
    fn success(period: AttendancePeriod, result: AttendanceResult) -> Self {
        let message = if result.complete {
            messages::COMPLETE.to_string()
        } else {
            result
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| messages::REGISTERED.to_string())
        };

        Self {
            outcome: Outcome::Success,
            message,
            period: Some(period),
            complete: result.complete,
            error: None,
        }
    }

    fn failure(error: CheckInError, period: Option<AttendancePeriod>) -> Self {
        let (outcome, message) = match &error {
            CheckInError::PermissionDenied(_) => {
                (Outcome::Error, messages::PERMISSION_DENIED.to_string())
            }
            CheckInError::InvalidCode(_) => (Outcome::Error, messages::INVALID_CODE.to_string()),
            CheckInError::WindowClosed { windows } => {
                (Outcome::Warning, messages::window_closed(windows))
            }
            CheckInError::Unauthenticated => (Outcome::Error, messages::NO_TOKEN.to_string()),
            CheckInError::Submit(SubmitError::Rejected { message, .. }) => {
                (Outcome::Error, message.clone())
            }
            CheckInError::Submit(SubmitError::Unauthenticated) => {
                (Outcome::Error, messages::NO_TOKEN.to_string())
            }
            CheckInError::Submit(SubmitError::Exhausted { .. }) => {
                (Outcome::Error, messages::SERVER_UNREACHABLE.to_string())
            }
            CheckInError::Submit(SubmitError::InvalidResponse(_)) => {
                (Outcome::Error, messages::REGISTRATION_FAILED.to_string())
            }
        };

        Self {
            outcome,
            message,
            period,
            complete: false,
            error: Some(error),
        }
    }

    /// Resolution for a camera that could not be acquired
    pub fn permission_denied(error: CameraError) -> Self {
        Self::failure(CheckInError::PermissionDenied(error), None)
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// A code that passed every local check and is ready to send
#[derive(Debug, Clone)]
pub struct Submission {
    pub cpf: Cpf,
    pub period: AttendancePeriod,
    token: SessionToken,
}

/// Runs the check-in pipeline for one code at a time
#[derive(Clone)]
pub struct CheckInEngine {
    client: AttendanceClient,
    clock: Arc<dyn Clock>,
    policy: TimeWindowPolicy,
    token: Option<SessionToken>,
}

impl CheckInEngine {
    /// `token` is the session credential read once by the caller; `None`
    /// makes every valid code resolve as unauthenticated.
    pub fn new(
        client: AttendanceClient,
        clock: Arc<dyn Clock>,
        policy: TimeWindowPolicy,
        token: Option<SessionToken>,
    ) -> Self {
        Self {
            client,
            clock,
            policy,
            token,
        }
    }

    /// Local checks only; no network access
    pub fn prepare(&self, code: &str) -> Result<Submission, Resolution> {
        let cpf = validate(code).map_err(|e| {
            info!(reason = %e, "Rejected scanned code");
            Resolution::failure(CheckInError::InvalidCode(e), None)
        })?;

        let now = self.clock.now();
        let period = self.policy.period_for(&now).ok_or_else(|| {
            info!(cpf = %cpf.masked(), at = %now, "Scan outside attendance windows");
            Resolution::failure(
                CheckInError::WindowClosed {
                    windows: self.policy.describe(),
                },
                None,
            )
        })?;

        let token = self.token.clone().ok_or_else(|| {
            warn!(cpf = %cpf.masked(), "No session token, cannot submit attendance");
            Resolution::failure(CheckInError::Unauthenticated, Some(period))
        })?;

        Ok(Submission { cpf, period, token })
    }

    /// Send a prepared submission
    pub async fn submit(&self, submission: Submission) -> Resolution {
        match self
            .client
            .submit(&submission.cpf, submission.period, &submission.token)
            .await
        {
            Ok(result) => Resolution::success(submission.period, result),
            Err(e) => Resolution::failure(CheckInError::Submit(e), Some(submission.period)),
        }
    }
}
