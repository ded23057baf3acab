//! Backend HTTP contract shared by the client crates
//!
//! Contains ONLY types and route constants; no HTTP client code.

pub mod types;

pub use types::{
    AttendanceReport, AttendanceRequest, AttendanceResult, AttendanceStatus,
    CertificateResponse, ExportFormat, LoginRequest, LoginResponse, MessageResponse,
    PromoteRequest, QrCodeRequest, QrCodeResponse, RegisterRequest, UserProfile, UserSummary,
};

/// Route prefix shared by every backend endpoint
pub const API_PREFIX: &str = "/api/usuarios";

/// Backend routes, relative to [`API_PREFIX`]
pub mod routes {
    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/register";
    pub const PROFILE: &str = "/profile";
    pub const USERS: &str = "/users";
    pub const PROMOTE: &str = "/users/promote";
    pub const GENERATE_QRCODE: &str = "/generate-qrcode";
    pub const REGISTER_ATTENDANCE: &str = "/register-attendance";
    pub const CHECK_ATTENDANCE: &str = "/check-attendance";
    pub const GENERATE_CERTIFICATE: &str = "/generate-certificate";
    pub const REPORT: &str = "/relatorio";
    pub const EXPORT: &str = "/export";
}
