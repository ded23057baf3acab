//! Fakes shared by the integration tests
//!
//! - [`FakeCamera`]: scripted frame polls, observable through a [`CameraProbe`]
//! - [`CountingDecoder`]: pass-through decoder that counts calls
//! - [`TickBudget`]: scheduler that runs a fixed number of ticks
//! - [`ScriptedTransport`]: attendance transport with canned answers

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use presenca_client::client::{
    AttendanceClient, AttendanceTransport, SessionToken, TransportError,
};
use presenca_client::scan::{
    CameraError, CameraSource, CheckInEngine, Decoder, Frame, FramePoll, PassthroughDecoder,
    Scheduler,
};
use presenca_client::utils::RetryPolicy;
use presenca_common::api::{AttendanceRequest, AttendanceResult};
use presenca_common::time::FixedClock;
use presenca_common::TimeWindowPolicy;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const VALID_CPF: &str = "52998224725";
pub const OTHER_VALID_CPF: &str = "39053344705";
pub const INVALID_CPF: &str = "12345678900";

pub fn at_hour(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn token() -> SessionToken {
    SessionToken::new("test-token").unwrap()
}

pub fn text(code: &str) -> FramePoll {
    FramePoll::Frame(Frame::Text(code.to_string()))
}

// ========================================
// Camera
// ========================================

/// Shared view of a [`FakeCamera`], still readable after the camera is dropped
#[derive(Debug, Clone, Default)]
pub struct CameraProbe {
    pub polls: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub discards: Arc<AtomicUsize>,
    pub active: Arc<AtomicBool>,
}

impl CameraProbe {
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Camera yielding scripted polls, then `Pending` forever
pub struct FakeCamera {
    script: VecDeque<FramePoll>,
    denial: Option<CameraError>,
    probe: CameraProbe,
}

impl FakeCamera {
    pub fn new(script: Vec<FramePoll>) -> (Self, CameraProbe) {
        let probe = CameraProbe::default();
        (
            Self {
                script: script.into(),
                denial: None,
                probe: probe.clone(),
            },
            probe,
        )
    }

    pub fn denied(reason: &str) -> (Self, CameraProbe) {
        let (mut camera, probe) = Self::new(Vec::new());
        camera.denial = Some(CameraError::PermissionDenied(reason.to_string()));
        (camera, probe)
    }

    pub fn push(&mut self, poll: FramePoll) {
        self.script.push_back(poll);
    }
}

#[async_trait]
impl CameraSource for FakeCamera {
    async fn acquire(&mut self) -> Result<(), CameraError> {
        if let Some(denial) = self.denial.clone() {
            return Err(denial);
        }
        self.probe.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_frame(&mut self) -> FramePoll {
        self.probe.polls.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or(FramePoll::Pending)
    }

    fn discard_pending(&mut self) {
        self.probe.discards.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        self.probe.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.probe.is_active()
    }
}

// ========================================
// Decoder and scheduler
// ========================================

/// Pass-through decoder counting its invocations
pub struct CountingDecoder {
    calls: Arc<AtomicUsize>,
}

impl CountingDecoder {
    pub fn new() -> (Box<dyn Decoder>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

impl Decoder for CountingDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PassthroughDecoder.decode(frame)
    }
}

/// Scheduler that allows `remaining` ticks, then stops
pub struct TickBudget {
    remaining: usize,
}

impl TickBudget {
    pub fn new(ticks: usize) -> Box<dyn Scheduler> {
        Box::new(Self { remaining: ticks })
    }
}

#[async_trait]
impl Scheduler for TickBudget {
    async fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

// ========================================
// Transport
// ========================================

/// Transport answering from a script; a network error once the script is empty
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<AttendanceResult, TransportError>>>,
    requests: Mutex<Vec<AttendanceRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<AttendanceResult, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(message: &str) -> Arc<Self> {
        Self::new(vec![Ok(AttendanceResult {
            complete: false,
            message: Some(message.to_string()),
        })])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<AttendanceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttendanceTransport for ScriptedTransport {
    async fn post_attendance(
        &self,
        request: &AttendanceRequest,
        token: &SessionToken,
    ) -> Result<AttendanceResult, TransportError> {
        assert_eq!(token.as_str(), "test-token");
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("connection refused".to_string())))
    }
}

/// Check-in engine over `transport` with the clock pinned to `now`
///
/// Retries are immediate so session tests do not wait on timers.
pub fn engine(
    transport: Arc<ScriptedTransport>,
    now: NaiveDateTime,
    token: Option<SessionToken>,
) -> CheckInEngine {
    let client = AttendanceClient::new(transport, RetryPolicy::new(3, Duration::ZERO));
    CheckInEngine::new(
        client,
        Arc::new(FixedClock::new(now)),
        TimeWindowPolicy::default(),
        token,
    )
}
