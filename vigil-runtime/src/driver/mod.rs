pub use sim::{Event, Scene, SimVehicle, World};
pub use tello::TelloVehicle;

mod sim;
mod tello;

use crate::{core::Command, runtime::Result};

/// Command channel to the vehicle.
///
/// Called at most once per cycle. Sending must complete within a bounded
/// time, it must never wait for the vehicle to act on the command.
#[async_trait::async_trait]
pub trait CommandChannel: Send {
    async fn send(&mut self, command: Command) -> Result;
}

/// Vehicle lifecycle.
///
/// Lifecycle commands are issued outside the control loop and may take
/// as long as the vehicle needs to acknowledge them.
#[async_trait::async_trait]
pub trait Vehicle: CommandChannel {
    /// Establish the command session.
    async fn connect(&mut self) -> Result;

    /// Battery level in percent.
    async fn battery(&mut self) -> Result<u8>;

    async fn stream_on(&mut self) -> Result;

    async fn stream_off(&mut self) -> Result;

    async fn takeoff(&mut self) -> Result;

    /// Ascend the distance in centimeters.
    async fn ascend(&mut self, distance: u16) -> Result;

    async fn land(&mut self) -> Result;
}
