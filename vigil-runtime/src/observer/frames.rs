use std::{
    path::{Path, PathBuf},
    sync::mpsc::{sync_channel, SyncSender, TrySendError},
};

use super::Observer;
use crate::{core::Axis, vision::Frame};

/// Frames buffered between the control loop and the writer.
const QUEUE_SIZE: usize = 16;

/// Write annotated frames as PNG images.
///
/// Each frame lands in `frame-<sequence>.png` inside the target directory.
/// Encoding runs on a dedicated thread, frames are dropped when it falls
/// behind. Frames without pixel data are skipped.
pub struct FrameDump {
    sender: SyncSender<Frame>,
    dropped: u64,
}

impl FrameDump {
    pub fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        log::debug!("Writing annotated frames to {}", dir.display());

        let (sender, receiver) = sync_channel::<Frame>(QUEUE_SIZE);

        std::thread::spawn(move || {
            while let Ok(frame) = receiver.recv() {
                if let Err(e) = write_frame(&dir, frame) {
                    log::error!("Failed to write frame: {}", e);
                    return;
                }
            }
        });

        Ok(Self { sender, dropped: 0 })
    }

    /// Frames dropped because the writer could not keep up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

fn frame_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("frame-{:06}.png", sequence))
}

fn write_frame(dir: &Path, frame: Frame) -> image::ImageResult<()> {
    let Some(pixels) = frame.pixels else {
        return Ok(());
    };

    match image::RgbImage::from_raw(frame.width, frame.height, pixels) {
        Some(image) => image.save(frame_path(dir, frame.sequence)),
        None => {
            log::warn!("Frame {} has a short pixel buffer", frame.sequence);
            Ok(())
        }
    }
}

impl Observer for FrameDump {
    fn notify(&mut self, _axis: Axis, _correction: f32) {}

    fn wants_frames(&self) -> bool {
        true
    }

    fn annotated(&mut self, frame: &Frame) {
        if frame.pixels.is_none() {
            return;
        }

        match self.sender.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    log::warn!("Frame writer is behind, {} frames dropped", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }
}
