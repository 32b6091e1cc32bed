use crate::{
    config::{ControllerConfig, PidConfig},
    core::{Axis, Observation},
    math::AxisController,
    vision::{Frame, Orientation},
    ConfigError,
};

/// Corrections for a single cycle, one per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Corrections {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Corrections {
    /// Correction emitted for an axis without measurement.
    pub const NEUTRAL_VALUE: f32 = 0.0;

    pub const NEUTRAL: Corrections = Corrections {
        x: Self::NEUTRAL_VALUE,
        y: Self::NEUTRAL_VALUE,
        z: Self::NEUTRAL_VALUE,
    };

    #[inline]
    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Corrections in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f32)> + '_ {
        Axis::ALL.into_iter().map(|axis| (axis, self.get(axis)))
    }

    pub fn as_tuple(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }
}

/// The three axis controllers and the policy for cycles without target.
///
/// A cycle without observation does not update any controller. All
/// corrections are neutral and the controller state is kept as is, so the
/// first cycle after the target is found again continues from the last
/// known error. Optionally the controllers are reset after the target has
/// been lost for a number of cycles.
pub struct ControllerBank {
    x: AxisController,
    y: AxisController,
    z: AxisController,
    /// Consecutive cycles without observation.
    lost: u32,
    /// Reset the controllers after this many lost cycles.
    reset_after_lost: Option<u32>,
}

impl ControllerBank {
    pub fn new(x: AxisController, y: AxisController, z: AxisController) -> Self {
        Self {
            x,
            y,
            z,
            lost: 0,
            reset_after_lost: None,
        }
    }

    /// Build the controllers from the tuning.
    ///
    /// Image axes without explicit setpoint default to the frame center.
    pub fn from_config(
        config: &ControllerConfig,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self, ConfigError> {
        let build = |pid: &PidConfig, default_setpoint: f32| -> Result<AxisController, ConfigError> {
            let controller = AxisController::new(
                pid.kp,
                pid.ki,
                pid.kd,
                pid.setpoint.unwrap_or(default_setpoint),
            )?;

            match pid.limit {
                Some((lower, upper)) => controller.with_limit(lower, upper),
                None => Ok(controller),
            }
        };

        let x = build(&config.x, (frame_width / 2) as f32)?
            .with_orientation(Orientation::Horizontal);
        let y = build(&config.y, (frame_height / 2) as f32)?
            .with_orientation(Orientation::Vertical);
        let z = match config.z.setpoint {
            Some(setpoint) => build(&config.z, setpoint)?,
            None => return Err(ConfigError::InvalidValue("pid.z.setpoint")),
        };

        Ok(Self::new(x, y, z))
    }

    /// Reset the controllers after `cycles` consecutive cycles without
    /// observation.
    pub fn with_reset_after_lost(mut self, cycles: Option<u32>) -> Self {
        self.reset_after_lost = cycles;
        self
    }

    /// Run the controllers for a single cycle.
    pub fn step(&mut self, observation: Option<&Observation>) -> Corrections {
        let Some(observation) = observation else {
            self.lost = self.lost.saturating_add(1);

            if self.reset_after_lost == Some(self.lost) {
                log::info!("Target lost for {} cycles, resetting controllers", self.lost);
                self.reset();
            }

            return Corrections::NEUTRAL;
        };

        self.lost = 0;

        Corrections {
            x: Self::update_axis(&mut self.x, Axis::X, observation.center_x),
            y: Self::update_axis(&mut self.y, Axis::Y, observation.center_y),
            z: Self::update_axis(&mut self.z, Axis::Z, observation.area),
        }
    }

    /// Update a single axis. A rejected measurement counts as no
    /// observation for that axis only.
    fn update_axis(controller: &mut AxisController, axis: Axis, measured: f32) -> f32 {
        match controller.update(measured) {
            Ok(correction) => correction,
            Err(e) => {
                log::warn!("Axis {} rejected update: {}", axis, e);
                Corrections::NEUTRAL_VALUE
            }
        }
    }

    /// Reset all controllers.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }

    pub fn axis(&self, axis: Axis) -> &AxisController {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Consecutive cycles without observation.
    #[inline]
    pub fn lost(&self) -> u32 {
        self.lost
    }

    /// Draw the setpoint guides of all axes.
    pub fn draw(&self, frame: &mut Frame, point: (f32, f32)) {
        for axis in Axis::ALL {
            self.axis(axis).draw(frame, point);
        }
    }
}
