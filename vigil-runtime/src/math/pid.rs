use crate::{
    vision::{overlay, Frame, Orientation},
    ConfigError,
};

/// A measurement was not a finite number.
///
/// The update was rejected and the controller state is unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NonFiniteMeasurement(pub f32);

impl std::fmt::Display for NonFiniteMeasurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "non-finite measurement: {}", self.0)
    }
}

impl std::error::Error for NonFiniteMeasurement {}

/// Single axis PID controller.
///
/// The error is `setpoint - measured`. The controller does not know about
/// time. The derivative is the plain difference between two consecutive
/// errors and the integral is the plain sum of errors, so the gains absorb
/// the cycle period they were tuned at. Running the loop at another rate
/// changes the behavior of the controller.
///
/// The first update after construction or reset has no error history and
/// therefore no derivative term.
#[derive(Clone, Debug)]
pub struct AxisController {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Derivative gain
    kd: f32,
    /// Value the measurement is driven towards
    setpoint: f32,
    /// Error of the last accepted update
    previous_error: Option<f32>,
    /// Sum of errors, only accumulated with a non-zero integral gain
    integral: f32,
    /// Output clamp
    limit: Option<(f32, f32)>,
    /// Overlay orientation
    orientation: Option<Orientation>,
}

impl AxisController {
    /// Construct a new controller.
    ///
    /// All gains and the setpoint must be finite.
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Result<Self, ConfigError> {
        for (name, gain) in [("kp", kp), ("ki", ki), ("kd", kd)] {
            if !gain.is_finite() {
                return Err(ConfigError::InvalidGain(name, gain));
            }
        }

        if !setpoint.is_finite() {
            return Err(ConfigError::InvalidSetpoint(setpoint));
        }

        Ok(Self {
            kp,
            ki,
            kd,
            setpoint,
            previous_error: None,
            integral: 0.0,
            limit: None,
            orientation: None,
        })
    }

    /// Clamp the output into `[lower, upper]`.
    pub fn with_limit(mut self, lower: f32, upper: f32) -> Result<Self, ConfigError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(ConfigError::InvalidLimit(lower, upper));
        }

        self.limit = Some((lower, upper));
        Ok(self)
    }

    /// Set the orientation used to draw the setpoint guide.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Feed the next measurement and return the correction.
    ///
    /// A non-finite measurement, or one large enough to make the output
    /// non-finite, is rejected without touching the controller state. An
    /// accepted measurement always becomes the previous error, even when the
    /// output is clamped.
    pub fn update(&mut self, measured: f32) -> Result<f32, NonFiniteMeasurement> {
        let error = self.setpoint - measured;
        if !error.is_finite() {
            return Err(NonFiniteMeasurement(measured));
        }

        let derivative = self.previous_error.map_or(0.0, |previous| error - previous);
        let integral = if self.ki != 0.0 {
            self.integral + error
        } else {
            self.integral
        };

        let output = self.kp * error + self.ki * integral + self.kd * derivative;
        if !output.is_finite() {
            return Err(NonFiniteMeasurement(measured));
        }

        self.previous_error = Some(error);
        self.integral = integral;

        Ok(match self.limit {
            Some((lower, upper)) => output.clamp(lower, upper),
            None => output,
        })
    }

    /// Forget the error history.
    pub fn reset(&mut self) {
        self.previous_error = None;
        self.integral = 0.0;
    }

    /// Draw the setpoint guide and the measured point onto the frame.
    ///
    /// Does nothing for a controller without orientation or a frame without
    /// pixel data.
    pub fn draw(&self, frame: &mut Frame, point: (f32, f32)) {
        if let Some(orientation) = self.orientation {
            overlay::guide(frame, orientation, self.setpoint, point);
        }
    }

    #[inline]
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Error of the last accepted update, zero before the first.
    #[inline]
    pub fn previous_error(&self) -> f32 {
        self.previous_error.unwrap_or(0.0)
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    pub fn limit(&self) -> Option<(f32, f32)> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 0.0001;

    #[test]
    fn test_previous_error_tracks_measurement() {
        let mut pid = AxisController::new(0.22, 0.0, 0.1, 320.0).unwrap();

        for value in [420.0, 100.0, -3.5, 320.0, 639.0] {
            pid.update(value).unwrap();
            assert_eq!(pid.previous_error(), 320.0 - value);
        }
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = AxisController::new(0.5, 0.0, 0.0, 100.0)
            .unwrap()
            .with_limit(-20.0, 15.0)
            .unwrap();

        assert!((pid.update(90.0).unwrap() - 5.0).abs() < TOLERANCE);
        assert!((pid.update(110.0).unwrap() + 5.0).abs() < TOLERANCE);
        assert_eq!(pid.update(0.0).unwrap(), 15.0);
        assert_eq!(pid.update(200.0).unwrap(), -20.0);
    }

    #[test]
    fn test_clamp_boundary() {
        let mut pid = AxisController::new(1.0, 0.0, 0.0, 0.0)
            .unwrap()
            .with_limit(-20.0, 15.0)
            .unwrap();

        assert_eq!(pid.update(-50.0).unwrap(), 15.0);
        assert_eq!(pid.update(40.0).unwrap(), -20.0);
        assert_eq!(pid.previous_error(), -40.0);
    }

    #[test]
    fn test_output_within_limit() {
        let mut pid = AxisController::new(3.7, 0.4, 9.1, 12_000.0)
            .unwrap()
            .with_limit(-20.0, 15.0)
            .unwrap();

        for value in [0.0, 50_000.0, -50_000.0, 12_000.0, 1.0e9, 11_999.0] {
            let output = pid.update(value).unwrap();
            assert!((-20.0..=15.0).contains(&output));
        }
    }

    #[test]
    fn test_derivative_zero_on_constant_error() {
        let mut pid = AxisController::new(0.22, 0.0, 0.1, 320.0).unwrap();

        let first = pid.update(420.0).unwrap();
        assert!((first + 22.0).abs() < TOLERANCE);

        let second = pid.update(420.0).unwrap();
        assert!((second + 22.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_derivative() {
        let mut pid = AxisController::new(0.22, 0.0, 0.1, 320.0).unwrap();

        pid.update(420.0).unwrap();
        let output = pid.update(370.0).unwrap();

        // error -50, derivative 50
        assert!((output - (0.22 * -50.0 + 0.1 * 50.0)).abs() < TOLERANCE);
    }

    #[test]
    fn test_integral_inert_without_gain() {
        let mut pid = AxisController::new(0.27, 0.0, 0.1, 240.0).unwrap();

        pid.update(100.0).unwrap();
        pid.update(120.0).unwrap();

        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = AxisController::new(0.0, 0.5, 0.0, 10.0).unwrap();

        assert!((pid.update(8.0).unwrap() - 1.0).abs() < TOLERANCE);
        assert!((pid.update(8.0).unwrap() - 2.0).abs() < TOLERANCE);
        assert_eq!(pid.integral(), 4.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut pid = AxisController::new(0.22, 0.1, 0.1, 320.0).unwrap();
        pid.update(300.0).unwrap();

        assert!(pid.update(f32::NAN).is_err());
        assert!(pid.update(f32::INFINITY).is_err());
        assert!(pid.update(f32::NEG_INFINITY).is_err());
        assert_eq!(pid.previous_error(), 20.0);
        assert!((pid.integral() - 20.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_reset() {
        let mut pid = AxisController::new(0.22, 0.1, 0.1, 320.0).unwrap();
        pid.update(300.0).unwrap();
        pid.reset();

        assert_eq!(pid.previous_error(), 0.0);
        assert_eq!(pid.integral(), 0.0);

        // No derivative kick after a reset.
        let output = pid.update(300.0).unwrap();
        assert!((output - (0.22 * 20.0 + 0.1 * 20.0)).abs() < TOLERANCE);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(AxisController::new(f32::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(AxisController::new(0.1, 0.0, f32::INFINITY, 0.0).is_err());
        assert!(AxisController::new(0.1, 0.0, 0.0, f32::NAN).is_err());
        assert!(AxisController::new(0.1, 0.0, 0.0, 0.0)
            .unwrap()
            .with_limit(15.0, -20.0)
            .is_err());
    }
}
