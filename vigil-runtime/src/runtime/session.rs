use super::{Result, Shutdown, Tracker};
use crate::{config::VehicleConfig, core::Command, driver::Vehicle};

/// Vehicle session.
///
/// Brings the vehicle up, runs the tracking loop and brings the vehicle
/// down again. Teardown runs exactly once, whether the session ends by
/// shutdown, by a failing command channel or by a failing startup step.
pub struct Session<V: Vehicle> {
    vehicle: V,
    tracker: Tracker,
    config: VehicleConfig,
    streaming: bool,
    airborne: bool,
}

impl<V: Vehicle> Session<V> {
    pub fn new(vehicle: V, tracker: Tracker, config: VehicleConfig) -> Self {
        Self {
            vehicle,
            tracker,
            config,
            streaming: false,
            airborne: false,
        }
    }

    async fn startup(&mut self, shutdown: &Shutdown) -> Result {
        self.vehicle.connect().await?;

        log::info!("Vehicle connected");

        match self.vehicle.battery().await {
            Ok(level) if level < self.config.low_battery => {
                log::warn!("Battery level low: {}%", level);
            }
            Ok(level) => log::info!("Battery level: {}%", level),
            Err(e) => log::warn!("Failed to read battery level: {}", e),
        }

        self.vehicle.stream_on().await?;
        self.streaming = true;

        if shutdown.is_triggered() {
            return Ok(());
        }

        if self.config.takeoff {
            log::info!("Taking off");

            // A takeoff without acknowledgement may still have lifted the
            // vehicle, so it must be landed either way.
            self.airborne = true;
            self.vehicle.takeoff().await?;

            if let Some(distance) = self.config.ascend {
                log::debug!("Ascending {} cm", distance);

                self.vehicle.ascend(distance).await?;
            }
        }

        Ok(())
    }

    async fn teardown(&mut self) {
        log::debug!("Tearing down session");

        if let Err(e) = self.vehicle.send(Command::NEUTRAL).await {
            log::warn!("Failed to stop vehicle: {}", e);
        }

        if self.airborne {
            log::info!("Landing");

            match self.vehicle.land().await {
                Ok(()) => self.airborne = false,
                Err(e) => log::error!("Failed to land: {}", e),
            }
        }

        if self.streaming {
            match self.vehicle.stream_off().await {
                Ok(()) => self.streaming = false,
                Err(e) => log::warn!("Failed to stop stream: {}", e),
            }
        }
    }

    /// Run the session until shutdown is requested or the loop fails.
    pub async fn run(mut self, shutdown: &Shutdown) -> Result {
        let result = match self.startup(shutdown).await {
            Ok(()) if shutdown.is_triggered() => Ok(()),
            Ok(()) => self.tracker.run(&mut self.vehicle, shutdown).await,
            Err(e) => {
                log::error!("Failed to start session: {}", e);
                Err(e)
            }
        };

        self.teardown().await;

        let stats = self.tracker.stats();
        log::info!(
            "Session ended after {} cycles, target observed in {}",
            stats.cycles,
            stats.observed
        );

        result
    }
}
