//! Authenticated backend operations exposed by the CLI

pub mod account;
pub mod certificate;
pub mod report;

pub use account::{AccountService, LoginOutcome, Registration};
pub use certificate::{CertificateOutcome, CertificateService};
pub use report::{render_chart, ReportService};
