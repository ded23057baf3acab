//! Shared helpers

pub mod data_url;
pub mod retry;

pub use retry::{retry_fixed, RetryError, RetryPolicy};
