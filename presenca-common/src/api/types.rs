//! Backend request/response types
//!
//! Field names follow the backend's JSON (Portuguese, camelCase) through
//! serde renames; Rust-side names are snake_case.
//!
//! Response types are lenient: optional fields default when absent, because
//! the backend omits fields rather than sending nulls.

use crate::period::AttendancePeriod;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ========================================
// Authentication
// ========================================

/// `POST /login` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub cpf: String,
}

/// `POST /login` response
///
/// # Examples
///
/// ```
/// use presenca_common::api::types::LoginResponse;
///
/// let body = r#"{"token":"abc","user":{"nome":"Ana","tipoUsuario":"admin"}}"#;
/// let response: LoginResponse = serde_json::from_str(body).unwrap();
/// assert_eq!(response.token.as_deref(), Some("abc"));
/// assert!(response.is_admin());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl LoginResponse {
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserSummary::is_admin)
    }
}

/// User fields returned alongside a login token
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UserSummary {
    #[serde(default)]
    pub nome: Option<String>,

    #[serde(default, rename = "tipoUsuario")]
    pub tipo_usuario: Option<String>,
}

impl UserSummary {
    pub fn is_admin(&self) -> bool {
        self.tipo_usuario.as_deref() == Some("admin")
    }
}

// ========================================
// Users
// ========================================

/// Role assigned to self-registered users
pub const DEFAULT_USER_KIND: &str = "usuario";

/// `POST /register` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub nome: String,
    pub cpf: String,
    pub area: i64,
    pub congregacao: String,
    pub email: String,
    #[serde(rename = "tipoUsuario")]
    pub tipo_usuario: String,
}

/// `GET /profile` and `GET /users/{id}` response
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub nome: String,

    #[serde(default)]
    pub cpf: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// `PUT /users/promote` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromoteRequest {
    pub cpf: String,
}

// ========================================
// Images rendered by the backend
// ========================================

/// `POST /generate-qrcode` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QrCodeRequest {
    pub cpf: String,
}

/// `POST /generate-qrcode` response (PNG as a data URL)
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct QrCodeResponse {
    #[serde(default, rename = "qrCodeURL")]
    pub qr_code_url: Option<String>,
}

/// `GET /generate-certificate` response (PNG as a data URL)
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CertificateResponse {
    #[serde(default, rename = "certificateImage")]
    pub certificate_image: Option<String>,
}

// ========================================
// Attendance
// ========================================

/// `POST /register-attendance` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceRequest {
    pub cpf: String,
    pub periodo: AttendancePeriod,
}

/// `POST /register-attendance` success body
///
/// `complete` is true once both periods of the day are registered.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AttendanceResult {
    #[serde(default)]
    pub complete: bool,

    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /check-attendance` response
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AttendanceStatus {
    #[serde(default)]
    pub morning: bool,

    #[serde(default)]
    pub afternoon: bool,
}

impl AttendanceStatus {
    pub fn is_complete(&self) -> bool {
        self.morning && self.afternoon
    }
}

/// Error body carried by non-2xx responses
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ========================================
// Reporting
// ========================================

/// `GET /relatorio` response
///
/// Counts that are missing, null or non-numeric are read as zero.
///
/// # Examples
///
/// ```
/// use presenca_common::api::types::AttendanceReport;
///
/// let body = r#"{"totalUsuarios":"12","presentes":9,"ausentes":null}"#;
/// let report: AttendanceReport = serde_json::from_str(body).unwrap();
/// assert_eq!((report.total_usuarios, report.presentes, report.ausentes), (12, 9, 0));
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AttendanceReport {
    #[serde(default, rename = "totalUsuarios", deserialize_with = "lenient_count")]
    pub total_usuarios: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub presentes: u64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub ausentes: u64,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map_or(0, |f| f as u64),
        _ => 0,
    };
    Ok(count)
}

/// File formats offered by `GET /export/{format}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl ExportFormat {
    /// Path segment and file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Default download name, e.g. `usuarios.pdf`
    pub fn default_file_name(&self) -> String {
        format!("usuarios.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unsupported export format '{}' (use pdf or xlsx)", other)),
        }
    }
}
