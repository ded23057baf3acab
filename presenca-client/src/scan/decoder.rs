//! Frame decoders
//!
//! Pixel decoding is delegated to an external QR library supplied by the host
//! as a closure; text frames from hardware scanners pass through unchanged.
//! Callers normalize the result with [`normalize_code`].

use crate::scan::camera::Frame;

/// Turns a frame into a candidate code
pub trait Decoder: Send {
    fn decode(&mut self, frame: &Frame) -> Option<String>;
}

/// Accepts text frames only
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl Decoder for PassthroughDecoder {
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        match frame {
            Frame::Text(text) => Some(text.clone()),
            Frame::Pixels(_) => None,
        }
    }
}

/// Wraps a pixel decoding function `(rgba, width, height) -> text`
///
/// Text frames are passed through, so one decoder serves any camera.
pub struct PixelDecoder<F> {
    decode_pixels: F,
}

impl<F> PixelDecoder<F>
where
    F: FnMut(&[u8], u32, u32) -> Option<String> + Send,
{
    pub fn new(decode_pixels: F) -> Self {
        Self { decode_pixels }
    }
}

impl<F> Decoder for PixelDecoder<F>
where
    F: FnMut(&[u8], u32, u32) -> Option<String> + Send,
{
    fn decode(&mut self, frame: &Frame) -> Option<String> {
        match frame {
            Frame::Pixels(buffer) => {
                (self.decode_pixels)(buffer.data(), buffer.width(), buffer.height())
            }
            Frame::Text(text) => Some(text.clone()),
        }
    }
}

/// Trim surrounding whitespace; empty text means nothing was decoded
pub fn normalize_code(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}
