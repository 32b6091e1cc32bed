use std::time::Duration;

use vigil_tello::Tello;

use super::{CommandChannel, Vehicle};
use crate::{config::VehicleConfig, core::Command, runtime::Result};

/// Tello vehicle over the SDK command protocol.
pub struct TelloVehicle {
    tello: Tello,
}

impl TelloVehicle {
    pub async fn from_config(config: &VehicleConfig) -> Result<Self> {
        let mut tello = Tello::bind(config.bind.as_str(), config.address.as_str()).await?;
        tello.set_timeout(Duration::from_millis(config.command_timeout));

        Ok(Self { tello })
    }
}

#[async_trait::async_trait]
impl CommandChannel for TelloVehicle {
    async fn send(&mut self, command: Command) -> Result {
        let (left_right, forward_back, up_down, yaw) = command.as_tuple();

        Ok(self.tello.rc(left_right, forward_back, up_down, yaw).await?)
    }
}

#[async_trait::async_trait]
impl Vehicle for TelloVehicle {
    async fn connect(&mut self) -> Result {
        Ok(self.tello.connect().await?)
    }

    async fn battery(&mut self) -> Result<u8> {
        Ok(self.tello.battery().await?)
    }

    async fn stream_on(&mut self) -> Result {
        // Reset a stream left open by an earlier session.
        if let Err(e) = self.tello.stream_off().await {
            log::debug!("Stream off before stream on: {}", e);
        }

        Ok(self.tello.stream_on().await?)
    }

    async fn stream_off(&mut self) -> Result {
        Ok(self.tello.stream_off().await?)
    }

    async fn takeoff(&mut self) -> Result {
        Ok(self.tello.takeoff().await?)
    }

    async fn ascend(&mut self, distance: u16) -> Result {
        Ok(self.tello.up(distance).await?)
    }

    async fn land(&mut self) -> Result {
        Ok(self.tello.land().await?)
    }
}
