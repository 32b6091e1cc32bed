pub use frames::FrameDump;
pub use trace::TraceObserver;

mod frames;
mod trace;

use crate::{core::Axis, vision::Frame};

/// Observer of the controller output.
///
/// Observers are notified after the command for the cycle was sent. An
/// observer must return immediately, any slow work is to be handed off.
pub trait Observer: Send {
    /// Correction of a single axis for the current cycle.
    fn notify(&mut self, axis: Axis, correction: f32);

    /// Whether this observer wants annotated frames. Frames are only
    /// annotated when at least one observer asks for them.
    fn wants_frames(&self) -> bool {
        false
    }

    /// Frame with the setpoint guides and target drawn on it.
    fn annotated(&mut self, _frame: &Frame) {}
}

/// Log corrections at trace level.
#[derive(Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&mut self, axis: Axis, correction: f32) {
        log::trace!("Axis {} correction: {:.2}", axis, correction);
    }
}
