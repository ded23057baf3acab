//! Attendance certificate download

use crate::client::backend::BackendClient;
use crate::client::token::SessionToken;
use crate::error::{ClientError, ClientResult};
use crate::utils::data_url::save_data_url;
use presenca_common::api::AttendanceStatus;
use std::path::{Path, PathBuf};
use tracing::info;

/// Shown when the day's attendance is not complete
pub const INCOMPLETE_MESSAGE: &str =
    "Você precisa ter presença registrada na manhã e na tarde para gerar o certificado.";

/// Result of a certificate request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateOutcome {
    /// Morning or afternoon attendance is missing; nothing was downloaded
    Incomplete(AttendanceStatus),
    Saved(PathBuf),
}

#[derive(Debug, Clone)]
pub struct CertificateService {
    backend: BackendClient,
}

impl CertificateService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Download the certificate to `out` once both periods are registered
    pub async fn generate(&self, token: &SessionToken, out: &Path) -> ClientResult<CertificateOutcome> {
        let status = self.backend.check_attendance(token).await?;
        if !status.is_complete() {
            info!(
                morning = status.morning,
                afternoon = status.afternoon,
                "Certificate not available yet"
            );
            return Ok(CertificateOutcome::Incomplete(status));
        }

        let response = self.backend.generate_certificate(token).await?;
        let image = response
            .certificate_image
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClientError::Decode("certificate response carries no image".to_string()))?;

        let bytes = save_data_url(&image, out)?;
        info!(path = %out.display(), bytes, "Certificate saved");
        Ok(CertificateOutcome::Saved(out.to_path_buf()))
    }
}
