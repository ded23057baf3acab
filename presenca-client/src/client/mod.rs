//! Backend access: HTTP client, attendance submission, session token

pub mod attendance;
pub mod backend;
pub mod token;

pub use attendance::{AttendanceClient, AttendanceTransport, SubmitError, TransportError};
pub use backend::BackendClient;
pub use token::{SessionToken, TokenStore};
