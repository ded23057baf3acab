//! Scan session state machine
//!
//! ```text
//! AwaitingPermission -> Scanning            camera granted
//! AwaitingPermission -> PermissionDenied    denied or unsupported (terminal)
//! Scanning           -> Submitting          valid code, window open, token present
//! Scanning           -> Resolved(outcome)   invalid code, window closed, no token
//! Submitting         -> Resolved(outcome)   backend answered or retries exhausted
//! Resolved(_)        -> Scanning            explicit rearm
//! any                -> Closed              teardown or camera stream ended
//! ```
//!
//! The session owns its camera. Once a frame decodes to a non-empty value,
//! neither the camera nor the decoder is touched again until [`ScanSession::rearm`],
//! which is what keeps a single submission in flight per session.

use crate::scan::camera::{CameraSource, Frame, FramePoll};
use crate::scan::check_in::{CheckInEngine, CheckInError, Outcome, Resolution};
use crate::scan::decoder::{normalize_code, Decoder};
use crate::scan::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanPhase {
    AwaitingPermission,
    /// Terminal: camera access refused or unsupported
    PermissionDenied,
    Scanning,
    Submitting,
    Resolved(Outcome),
    /// Terminal: session torn down, camera released
    Closed,
}

impl ScanPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::PermissionDenied | ScanPhase::Closed)
    }
}

/// Phase change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub session_id: Uuid,
    pub old_phase: ScanPhase,
    pub new_phase: ScanPhase,
    pub transitioned_at: DateTime<Utc>,
}

/// What a tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No code this tick
    Idle,
    /// A code was decoded (or typed) and resolved
    Resolved(Resolution),
    /// The camera stream ended; the session is closed
    CameraEnded,
    /// The scheduler stopped
    Stopped,
    /// The session is not scanning; nothing was done
    Inactive,
}

/// One scanning interaction
pub struct ScanSession<C: CameraSource> {
    id: Uuid,
    phase: ScanPhase,
    last_decoded_value: Option<String>,
    last_status_message: Option<String>,
    last_resolution: Option<Resolution>,
    camera: C,
    decoder: Box<dyn Decoder>,
    scheduler: Box<dyn Scheduler>,
    engine: CheckInEngine,
    transitions: Vec<PhaseTransition>,
}

impl<C: CameraSource> ScanSession<C> {
    pub fn new(
        camera: C,
        decoder: Box<dyn Decoder>,
        scheduler: Box<dyn Scheduler>,
        engine: CheckInEngine,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, "Scan session created");
        Self {
            id,
            phase: ScanPhase::AwaitingPermission,
            last_decoded_value: None,
            last_status_message: None,
            last_resolution: None,
            camera,
            decoder,
            scheduler,
            engine,
            transitions: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn last_decoded_value(&self) -> Option<&str> {
        self.last_decoded_value.as_deref()
    }

    pub fn last_status_message(&self) -> Option<&str> {
        self.last_status_message.as_deref()
    }

    pub fn last_resolution(&self) -> Option<&Resolution> {
        self.last_resolution.as_ref()
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Direct camera access, e.g. to read operator input between scans
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// Take the transitions recorded since the last call
    pub fn drain_transitions(&mut self) -> Vec<PhaseTransition> {
        std::mem::take(&mut self.transitions)
    }

    fn transition_to(&mut self, new_phase: ScanPhase) {
        let transition = PhaseTransition {
            session_id: self.id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        debug!(
            session_id = %self.id,
            from = ?transition.old_phase,
            to = ?new_phase,
            "Scan phase transition"
        );
        self.phase = new_phase;
        self.transitions.push(transition);
    }

    /// Acquire the camera
    ///
    /// Only valid in `AwaitingPermission`. A denial is terminal: the phase
    /// becomes `PermissionDenied`, the status message is set, and the error is
    /// returned.
    pub async fn start(&mut self) -> Result<(), CheckInError> {
        if self.phase != ScanPhase::AwaitingPermission {
            warn!(session_id = %self.id, phase = ?self.phase, "Scan session already started");
            return Ok(());
        }

        match self.camera.acquire().await {
            Ok(()) => {
                info!(session_id = %self.id, "Camera acquired, scanning");
                self.transition_to(ScanPhase::Scanning);
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Camera access denied");
                self.camera.release();
                let resolution = Resolution::permission_denied(e.clone());
                self.last_status_message = Some(resolution.message);
                self.transition_to(ScanPhase::PermissionDenied);
                Err(CheckInError::PermissionDenied(e))
            }
        }
    }

    /// Wait for one scheduler tick and make one decode attempt
    pub async fn tick(&mut self) -> TickOutcome {
        if self.phase != ScanPhase::Scanning {
            return TickOutcome::Inactive;
        }

        if !self.scheduler.next_tick().await {
            debug!(session_id = %self.id, "Scheduler stopped");
            return TickOutcome::Stopped;
        }

        self.poll_frame().await
    }

    /// Tick until something other than an idle tick happens
    pub async fn run(&mut self) -> TickOutcome {
        loop {
            match self.tick().await {
                TickOutcome::Idle => continue,
                other => return other,
            }
        }
    }

    async fn poll_frame(&mut self) -> TickOutcome {
        let frame = match self.camera.next_frame().await {
            FramePoll::Frame(frame) => frame,
            FramePoll::Pending => return TickOutcome::Idle,
            FramePoll::Ended => {
                info!(session_id = %self.id, "Camera stream ended");
                self.close();
                return TickOutcome::CameraEnded;
            }
        };

        if let Frame::Pixels(buffer) = &frame {
            if buffer.is_empty() {
                return TickOutcome::Idle;
            }
        }

        match normalize_code(self.decoder.decode(&frame)) {
            Some(code) => TickOutcome::Resolved(self.handle_code(code).await),
            None => TickOutcome::Idle,
        }
    }

    /// Feed a typed code into the pipeline
    ///
    /// Follows the same rules as a scanned code and is only accepted while
    /// scanning.
    pub async fn submit_manual(&mut self, code: &str) -> TickOutcome {
        if self.phase != ScanPhase::Scanning {
            debug!(session_id = %self.id, phase = ?self.phase, "Manual code ignored");
            return TickOutcome::Inactive;
        }

        match normalize_code(Some(code.to_string())) {
            Some(code) => TickOutcome::Resolved(self.handle_code(code).await),
            None => TickOutcome::Idle,
        }
    }

    async fn handle_code(&mut self, code: String) -> Resolution {
        self.last_decoded_value = Some(code.clone());

        let resolution = match self.engine.prepare(&code) {
            Ok(submission) => {
                self.transition_to(ScanPhase::Submitting);
                self.engine.submit(submission).await
            }
            Err(resolution) => resolution,
        };

        match resolution.outcome {
            Outcome::Success => {
                info!(session_id = %self.id, message = %resolution.message, "Check-in resolved")
            }
            Outcome::Warning | Outcome::Error => {
                warn!(session_id = %self.id, message = %resolution.message, "Check-in resolved")
            }
        }

        self.last_status_message = Some(resolution.message.clone());
        self.last_resolution = Some(resolution.clone());
        self.transition_to(ScanPhase::Resolved(resolution.outcome));
        resolution
    }

    /// Return to scanning after a resolution
    ///
    /// Clears the last decoded value and message and drops frames buffered
    /// while resolved. Returns false (and does nothing) in any other phase.
    pub fn rearm(&mut self) -> bool {
        if !matches!(self.phase, ScanPhase::Resolved(_)) {
            debug!(session_id = %self.id, phase = ?self.phase, "Rearm ignored");
            return false;
        }

        self.last_decoded_value = None;
        self.last_status_message = None;
        self.last_resolution = None;
        self.camera.discard_pending();
        self.transition_to(ScanPhase::Scanning);
        true
    }

    /// Tear down: release the camera and move to `Closed`
    pub fn close(&mut self) {
        self.camera.release();
        if self.phase != ScanPhase::Closed {
            info!(session_id = %self.id, "Scan session closed");
            self.transition_to(ScanPhase::Closed);
        }
    }
}

impl<C: CameraSource> Drop for ScanSession<C> {
    fn drop(&mut self) {
        self.camera.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(ScanPhase::PermissionDenied.is_terminal());
        assert!(ScanPhase::Closed.is_terminal());
        assert!(!ScanPhase::Resolved(Outcome::Error).is_terminal());
        assert!(!ScanPhase::Scanning.is_terminal());
    }
}
