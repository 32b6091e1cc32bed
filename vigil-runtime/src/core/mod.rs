pub use self::axis::Axis;
pub use self::command::Command;
pub use self::observation::{Detection, Observation};

mod axis;
mod command;
mod observation;
