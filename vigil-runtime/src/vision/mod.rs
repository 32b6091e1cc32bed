pub use remote::{FrameReport, RemoteVision};

pub mod overlay;
mod remote;

use crate::core::Detection;

/// Guide orientation for the overlay.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// The setpoint is a column, the guide is a vertical line.
    Horizontal,
    /// The setpoint is a row, the guide is a horizontal line.
    Vertical,
}

/// Camera frame.
///
/// Frames analysed upstream carry their detections with them. The pixel
/// buffer is optional, headless sources do not provide one.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Frame sequence number.
    pub sequence: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detections attached by the source.
    pub detections: Vec<Detection>,
    /// Packed RGB8 pixel data.
    pub pixels: Option<Vec<u8>>,
}

impl Frame {
    /// Construct a frame without pixel data.
    pub fn new(sequence: u64, width: u32, height: u32) -> Self {
        Self {
            sequence,
            width,
            height,
            detections: Vec::new(),
            pixels: None,
        }
    }

    /// Construct a black frame with pixel data.
    pub fn with_pixels(sequence: u64, width: u32, height: u32) -> Self {
        Self {
            pixels: Some(vec![0; width as usize * height as usize * 3]),
            ..Self::new(sequence, width, height)
        }
    }

    /// Set the pixel at `(x, y)`. Coordinates outside the frame are ignored.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 3;
        if let Some(pixels) = self.pixels.as_mut() {
            if let Some(pixel) = pixels.get_mut(offset..offset + 3) {
                pixel.copy_from_slice(&color);
            }
        }
    }

    /// Get the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let pixels = self.pixels.as_ref()?;
        let pixel = pixels.get(offset..offset + 3)?;

        Some([pixel[0], pixel[1], pixel[2]])
    }
}

/// Source of camera frames.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame.
    async fn next_frame(&mut self) -> crate::runtime::Result<Frame>;
}

/// Target estimator.
///
/// Returns zero or more detections ordered by confidence. Only the first
/// detection is tracked.
pub trait TargetEstimator: Send {
    fn detect(&mut self, frame: &Frame) -> Vec<Detection>;
}

/// Estimator for frames analysed upstream.
///
/// Passes on the detections attached to the frame, dropping those below
/// the minimum confidence.
pub struct Upstream {
    min_score: f32,
}

impl Upstream {
    pub fn new(min_score: f32) -> Self {
        Self { min_score }
    }
}

impl TargetEstimator for Upstream {
    fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        let mut detections = frame
            .detections
            .iter()
            .filter(|detection| detection.score >= self.min_score)
            .copied()
            .collect::<Vec<_>>();

        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        detections
    }
}
