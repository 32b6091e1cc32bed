use std::{
    path::Path,
    sync::mpsc::{sync_channel, SyncSender, TrySendError},
    time::Instant,
};

use super::Observer;
use crate::core::Axis;

/// Samples buffered between the control loop and the writer.
const QUEUE_SIZE: usize = 1_024;

#[derive(Debug, serde::Serialize)]
struct Sample {
    timestamp: String,
    /// Milliseconds since the trace started.
    elapsed: u64,
    axis: &'static str,
    correction: f32,
}

/// Write corrections to a CSV file.
///
/// The file is written on a dedicated thread. When the writer falls behind
/// samples are dropped rather than stalling the control loop.
pub struct TraceObserver {
    sender: SyncSender<Sample>,
    start: Instant,
    dropped: u64,
}

impl TraceObserver {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let writer = csv::Writer::from_path(path.as_ref()).map_err(std::io::Error::from)?;

        log::debug!("Writing correction trace to {}", path.as_ref().display());

        Ok(Self::from_writer(writer))
    }

    pub fn from_writer<W: std::io::Write + Send + 'static>(mut writer: csv::Writer<W>) -> Self {
        let (sender, receiver) = sync_channel::<Sample>(QUEUE_SIZE);

        std::thread::spawn(move || {
            while let Ok(sample) = receiver.recv() {
                if let Err(e) = writer.serialize(&sample) {
                    log::error!("Failed to write trace: {}", e);
                    return;
                }
            }

            if let Err(e) = writer.flush() {
                log::error!("Failed to flush trace: {}", e);
            }
        });

        Self {
            sender,
            start: Instant::now(),
            dropped: 0,
        }
    }

    /// Samples dropped because the writer could not keep up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Observer for TraceObserver {
    fn notify(&mut self, axis: Axis, correction: f32) {
        let sample = Sample {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            elapsed: self.start.elapsed().as_millis() as u64,
            axis: axis.name(),
            correction,
        };

        match self.sender.try_send(sample) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped.is_power_of_two() {
                    log::warn!("Trace writer is behind, {} samples dropped", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }
}
