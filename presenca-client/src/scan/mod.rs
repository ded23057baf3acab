//! Attendance scan engine
//!
//! Independent of any UI: a [`ScanSession`] drives a [`CameraSource`] one
//! frame per [`Scheduler`] tick, decodes with a [`Decoder`], and resolves each
//! code through the [`CheckInEngine`].

pub mod camera;
pub mod check_in;
pub mod decoder;
pub mod scheduler;
pub mod session;

pub use camera::{
    CameraError, CameraHandle, CameraSource, ChannelCamera, Frame, FramePoll, KeyboardWedgeCamera,
    PixelBuffer,
};
pub use check_in::{messages, CheckInEngine, CheckInError, Outcome, Resolution, Submission};
pub use decoder::{normalize_code, Decoder, PassthroughDecoder, PixelDecoder};
pub use scheduler::{IntervalScheduler, Scheduler};
pub use session::{PhaseTransition, ScanPhase, ScanSession, TickOutcome};
