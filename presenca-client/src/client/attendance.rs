//! Attendance submission with retry
//!
//! One HTTP call per attempt through an [`AttendanceTransport`]. Transient
//! failures (network errors, non-2xx responses without a readable message) are
//! retried with a fixed delay; backend rejections and 401s are returned at once.

use crate::client::token::SessionToken;
use crate::utils::retry::{retry_fixed, RetryError, RetryPolicy};
use async_trait::async_trait;
use presenca_common::api::{AttendanceRequest, AttendanceResult};
use presenca_common::{AttendancePeriod, Cpf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Failure of a single attendance HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned HTTP {0} without a message")]
    Status(u16),

    #[error("Backend rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Backend refused the session token")]
    Unauthorized,

    /// 2xx with an unreadable body. The backend may already have stored the
    /// attendance, so this is never retried.
    #[error("Invalid backend response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Network(_) | TransportError::Status(_))
    }
}

/// Final outcome of a failed submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Session token missing or refused")]
    Unauthenticated,

    #[error("Submission failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: TransportError },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

/// One attendance HTTP call
#[async_trait]
pub trait AttendanceTransport: Send + Sync {
    async fn post_attendance(
        &self,
        request: &AttendanceRequest,
        token: &SessionToken,
    ) -> Result<AttendanceResult, TransportError>;
}

/// Submits attendance through a transport, retrying transient failures
#[derive(Clone)]
pub struct AttendanceClient {
    transport: Arc<dyn AttendanceTransport>,
    retry: RetryPolicy,
}

impl AttendanceClient {
    pub fn new(transport: Arc<dyn AttendanceTransport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Register `cpf` for `period`
    ///
    /// Makes at most `max_attempts` calls. Performs no local state mutation.
    pub async fn submit(
        &self,
        cpf: &Cpf,
        period: AttendancePeriod,
        token: &SessionToken,
    ) -> Result<AttendanceResult, SubmitError> {
        let request = AttendanceRequest {
            cpf: cpf.as_str().to_string(),
            periodo: period,
        };
        let transport = &self.transport;
        let request_ref = &request;

        let outcome = retry_fixed(
            "attendance submission",
            self.retry,
            TransportError::is_transient,
            move || transport.post_attendance(request_ref, token),
        )
        .await;

        match outcome {
            Ok(result) => {
                info!(
                    cpf = %cpf.masked(),
                    period = period.as_wire_str(),
                    complete = result.complete,
                    "Attendance registered"
                );
                Ok(result)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                warn!(cpf = %cpf.masked(), attempts, error = %last, "Attendance submission gave up");
                Err(SubmitError::Exhausted { attempts, last })
            }
            Err(RetryError::Permanent(err)) => {
                warn!(cpf = %cpf.masked(), error = %err, "Attendance submission refused");
                Err(match err {
                    TransportError::Unauthorized => SubmitError::Unauthenticated,
                    TransportError::Rejected { status, message } => {
                        SubmitError::Rejected { status, message }
                    }
                    TransportError::Decode(detail) => SubmitError::InvalidResponse(detail),
                    // Only reachable if is_transient changes
                    other @ (TransportError::Network(_) | TransportError::Status(_)) => {
                        SubmitError::Exhausted {
                            attempts: 1,
                            last: other,
                        }
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Network("reset".into()).is_transient());
        assert!(TransportError::Status(502).is_transient());
        assert!(!TransportError::Unauthorized.is_transient());
        assert!(!TransportError::Decode("eof".into()).is_transient());
        assert!(!TransportError::Rejected {
            status: 409,
            message: "Presença já registrada".into()
        }
        .is_transient());
    }

    #[test]
    fn test_rejected_displays_server_message() {
        let err = SubmitError::Rejected {
            status: 404,
            message: "Usuário não encontrado".into(),
        };
        assert_eq!(err.to_string(), "Usuário não encontrado");
    }
}
