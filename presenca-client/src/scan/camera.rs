//! Camera sources
//!
//! A [`CameraSource`] is acquired once (which may ask the user for permission),
//! then polled for one frame per scheduler tick until it is released.
//!
//! Two sources are provided:
//! - [`KeyboardWedgeCamera`]: a handheld scanner that decodes on-device and
//!   types the code followed by Enter, one line per scan
//! - [`ChannelCamera`]: frames pushed by an embedding UI shell through a
//!   [`CameraHandle`], with an asynchronous permission grant

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Camera acquisition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// RGBA8 pixel data
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Bytes per pixel (RGBA)
    pub const CHANNELS: usize = 4;

    /// `data` must hold exactly `width * height * 4` bytes
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, CameraError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(Self::CHANNELS))
            .ok_or_else(|| CameraError::InvalidFrame(format!("{}x{} overflows", width, height)))?;

        if data.len() != expected {
            return Err(CameraError::InvalidFrame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True while the video stream has no dimensions yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelBuffer({}x{})", self.width, self.height)
    }
}

/// One camera frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Pixels(PixelBuffer),
    /// Already decoded by the device
    Text(String),
}

/// Result of polling a camera for a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePoll {
    Frame(Frame),
    /// Nothing available this tick
    Pending,
    /// The stream is over (device unplugged, input closed, released)
    Ended,
}

#[async_trait]
pub trait CameraSource: Send {
    /// Request access and start the stream
    async fn acquire(&mut self) -> Result<(), CameraError>;

    /// One acquisition attempt
    async fn next_frame(&mut self) -> FramePoll;

    /// Drop frames buffered while the session was not scanning
    fn discard_pending(&mut self) {}

    /// Stop the stream. Idempotent.
    fn release(&mut self);

    fn is_active(&self) -> bool;
}

// ========================================
// Keyboard wedge
// ========================================

/// Handheld scanner in keyboard mode: one decoded code per input line
pub struct KeyboardWedgeCamera<R> {
    reader: R,
    line: String,
    active: bool,
}

impl KeyboardWedgeCamera<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> KeyboardWedgeCamera<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            active: false,
        }
    }

    /// Read one line of operator input outside of scanning (e.g. "scan
    /// again" prompts). Returns `None` at end of input.
    pub async fn read_control_line(&mut self) -> std::io::Result<Option<String>> {
        self.line.clear();
        let read = self.reader.read_line(&mut self.line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CameraSource for KeyboardWedgeCamera<R> {
    async fn acquire(&mut self) -> Result<(), CameraError> {
        self.active = true;
        debug!("Keyboard wedge scanner ready");
        Ok(())
    }

    async fn next_frame(&mut self) -> FramePoll {
        if !self.active {
            return FramePoll::Ended;
        }

        self.line.clear();
        match self.reader.read_line(&mut self.line).await {
            Ok(0) => {
                debug!("Scanner input closed");
                FramePoll::Ended
            }
            Ok(_) => FramePoll::Frame(Frame::Text(
                self.line.trim_end_matches(['\r', '\n']).to_string(),
            )),
            Err(e) => {
                warn!(error = %e, "Scanner input failed");
                FramePoll::Ended
            }
        }
    }

    fn release(&mut self) {
        if self.active {
            debug!("Keyboard wedge scanner released");
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ========================================
// Channel camera
// ========================================

/// Sending half of a [`ChannelCamera`], held by the UI shell
pub struct CameraHandle {
    permission: Option<oneshot::Sender<Result<(), String>>>,
    frames: mpsc::Sender<Frame>,
}

impl CameraHandle {
    /// Answer the permission prompt with a grant. Later answers are ignored.
    pub fn grant(&mut self) {
        if let Some(tx) = self.permission.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Answer the permission prompt with a denial
    pub fn deny(&mut self, reason: impl Into<String>) {
        if let Some(tx) = self.permission.take() {
            let _ = tx.send(Err(reason.into()));
        }
    }

    /// Push a frame without waiting. Returns false if the buffer is full or
    /// the camera was released.
    pub fn try_push(&self, frame: Frame) -> bool {
        self.frames.try_send(frame).is_ok()
    }

    /// Push a frame, waiting for buffer space
    pub async fn push(&self, frame: Frame) -> Result<(), CameraError> {
        self.frames
            .send(frame)
            .await
            .map_err(|_| CameraError::Unavailable("camera released".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }
}

/// Frames delivered over a bounded channel
pub struct ChannelCamera {
    permission: Option<oneshot::Receiver<Result<(), String>>>,
    frames: mpsc::Receiver<Frame>,
    granted: bool,
    active: bool,
}

impl ChannelCamera {
    /// Camera plus the handle that feeds it; `capacity` bounds buffered frames
    pub fn channel(capacity: usize) -> (CameraHandle, ChannelCamera) {
        let (permission_tx, permission_rx) = oneshot::channel();
        let (frames_tx, frames_rx) = mpsc::channel(capacity.max(1));

        (
            CameraHandle {
                permission: Some(permission_tx),
                frames: frames_tx,
            },
            ChannelCamera {
                permission: Some(permission_rx),
                frames: frames_rx,
                granted: false,
                active: false,
            },
        )
    }
}

#[async_trait]
impl CameraSource for ChannelCamera {
    async fn acquire(&mut self) -> Result<(), CameraError> {
        if !self.granted {
            let answer = match self.permission.take() {
                Some(rx) => rx.await,
                None => {
                    return Err(CameraError::Unavailable(
                        "permission already refused".to_string(),
                    ))
                }
            };

            match answer {
                Ok(Ok(())) => self.granted = true,
                Ok(Err(reason)) => return Err(CameraError::PermissionDenied(reason)),
                Err(_) => {
                    return Err(CameraError::Unavailable(
                        "camera host went away before answering".to_string(),
                    ))
                }
            }
        }

        self.active = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> FramePoll {
        if !self.active {
            return FramePoll::Ended;
        }

        match self.frames.try_recv() {
            Ok(frame) => FramePoll::Frame(frame),
            Err(mpsc::error::TryRecvError::Empty) => FramePoll::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => FramePoll::Ended,
        }
    }

    fn discard_pending(&mut self) {
        let mut dropped = 0usize;
        while self.frames.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "Discarded stale frames");
        }
    }

    fn release(&mut self) {
        if self.active {
            debug!("Channel camera released");
        }
        self.active = false;
        self.frames.close();
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
