//! # Presença client
//!
//! Attendance check-in client for the Presença backend:
//! - Backend HTTP client and session token store
//! - Attendance submission with fixed-delay retry
//! - Scan engine (camera sources, decoders, scheduler, session state machine)
//! - Account, certificate and report services

pub mod build_info;
pub mod client;
pub mod config;
pub mod error;
pub mod scan;
pub mod services;
pub mod utils;

pub use config::{ClientConfig, ConfigOverrides};
pub use error::{ClientError, ClientResult};
