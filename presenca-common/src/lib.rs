//! # Presença Common Library
//!
//! Shared code for the attendance check-in client:
//! - CPF validation (format and check digits)
//! - Attendance time-window policy
//! - Backend wire types
//! - Configuration loading
//! - Clock abstraction and timestamp helpers

pub mod api;
pub mod config;
pub mod cpf;
pub mod error;
pub mod period;
pub mod time;

pub use cpf::{Cpf, InvalidCpf};
pub use error::{Error, Result};
pub use period::{AttendancePeriod, TimeWindowPolicy};
