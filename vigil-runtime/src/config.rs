use std::path::Path;

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Io(std::io::Error),
    /// Configuration file could not be parsed.
    Parse(toml::de::Error),
    /// Gain is not a finite number.
    InvalidGain(&'static str, f32),
    /// Setpoint is not a finite number.
    InvalidSetpoint(f32),
    /// Output limit is not a finite, ordered range.
    InvalidLimit(f32, f32),
    /// Some other value is out of range.
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
            ConfigError::InvalidGain(name, value) => write!(f, "invalid gain {}: {}", name, value),
            ConfigError::InvalidSetpoint(value) => write!(f, "invalid setpoint: {}", value),
            ConfigError::InvalidLimit(lower, upper) => {
                write!(f, "invalid output limit: [{}, {}]", lower, upper)
            }
            ConfigError::InvalidValue(name) => write!(f, "invalid value for {}", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Read and parse a TOML configuration file.
pub fn from_file<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    from_str(&contents)
}

/// Parse a TOML configuration.
pub fn from_str<T: for<'de> Deserialize<'de>>(contents: &str) -> Result<T, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frame width in pixels.
    pub frame_width: u32,
    /// Frame height in pixels.
    pub frame_height: u32,
    /// Fixed cycle period in milliseconds.
    ///
    /// When absent the loop runs as fast as frames arrive. The reference
    /// gains were tuned against a free running loop.
    pub interval: Option<u64>,
    /// Time to wait for a frame in milliseconds.
    pub frame_timeout: u64,
    /// Cycle duration in milliseconds above which a warning is logged.
    pub slow_cycle: u64,
    /// Consecutive command failures before the loop gives up.
    pub max_channel_failures: u32,
    /// Reset the controllers after this many cycles without target.
    pub reset_after_lost: Option<u32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            interval: None,
            frame_timeout: 1_000,
            slow_cycle: 100,
            max_channel_failures: 5,
            reset_after_lost: None,
        }
    }
}

/// Controller tuning for a single axis.
#[derive(Clone, Debug, PartialEq)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Setpoint, defaults to the frame center for the image axes.
    pub setpoint: Option<f32>,
    /// Output limit as `[lower, upper]`.
    pub limit: Option<(f32, f32)>,
}

/// Axis section as written in the configuration file.
///
/// Absent keys keep the value of the axis default.
#[derive(Default, Deserialize)]
#[serde(default)]
struct PidSection {
    kp: Option<f32>,
    ki: Option<f32>,
    kd: Option<f32>,
    setpoint: Option<f32>,
    limit: Option<(f32, f32)>,
}

impl PidSection {
    fn apply(self, mut base: PidConfig) -> PidConfig {
        if let Some(kp) = self.kp {
            base.kp = kp;
        }
        if let Some(ki) = self.ki {
            base.ki = ki;
        }
        if let Some(kd) = self.kd {
            base.kd = kd;
        }
        if self.setpoint.is_some() {
            base.setpoint = self.setpoint;
        }
        if self.limit.is_some() {
            base.limit = self.limit;
        }
        base
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ControllerSection {
    x: PidSection,
    y: PidSection,
    z: PidSection,
}

impl From<ControllerSection> for ControllerConfig {
    fn from(section: ControllerSection) -> Self {
        let base = ControllerConfig::default();

        Self {
            x: section.x.apply(base.x),
            y: section.y.apply(base.y),
            z: section.z.apply(base.z),
        }
    }
}

/// Controller tuning for all axes.
///
/// The error is `setpoint - measured`, hence the negative gains. A target
/// right of center yields a positive yaw, a target below center a descent
/// and a target too close a backward motion.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "ControllerSection")]
pub struct ControllerConfig {
    pub x: PidConfig,
    pub y: PidConfig,
    pub z: PidConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            x: PidConfig {
                kp: -0.22,
                ki: 0.0,
                kd: -0.1,
                setpoint: None,
                limit: None,
            },
            y: PidConfig {
                kp: -0.27,
                ki: 0.0,
                kd: -0.1,
                setpoint: None,
                limit: None,
            },
            // Negative output moves the vehicle forward, so the vehicle
            // approaches faster than it backs off.
            z: PidConfig {
                kp: -0.005,
                ki: 0.0,
                kd: -0.003,
                setpoint: Some(12_000.0),
                limit: Some((-20.0, 15.0)),
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VehicleConfig {
    /// Vehicle command address.
    pub address: String,
    /// Local command socket address.
    pub bind: String,
    /// Take off before tracking.
    pub takeoff: bool,
    /// Ascend after takeoff in centimeters.
    pub ascend: Option<u16>,
    /// Command reply timeout in milliseconds.
    pub command_timeout: u64,
    /// Battery level in percent below which a warning is logged.
    pub low_battery: u8,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            address: vigil_tello::DEFAULT_ADDRESS.to_string(),
            bind: vigil_tello::DEFAULT_BIND.to_string(),
            takeoff: true,
            ascend: Some(80),
            command_timeout: vigil_tello::DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
            low_battery: 20,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisionConfig {
    /// Address to receive frame reports on.
    pub listen: String,
    /// Minimum detection confidence.
    pub min_score: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:11112".to_string(),
            min_score: 0.7,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Enable simulation mode.
    pub enabled: bool,
    /// Enable simulation jitter.
    pub jitter: bool,
    /// Render pixel data for each frame.
    pub render: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    /// CSV file to write corrections to.
    pub path: Option<std::path::PathBuf>,
    /// Directory to write annotated frames to.
    pub frames: Option<std::path::PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub pid: ControllerConfig,
    pub vehicle: VehicleConfig,
    pub vision: VisionConfig,
    pub simulation: SimulationConfig,
    pub trace: TraceConfig,
}

impl Config {
    /// Check the values which are not checked when the controllers are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.frame_width == 0 || self.tracker.frame_height == 0 {
            return Err(ConfigError::InvalidValue("tracker.frame_width/frame_height"));
        }
        if self.tracker.frame_timeout == 0 {
            return Err(ConfigError::InvalidValue("tracker.frame_timeout"));
        }
        if self.tracker.interval == Some(0) {
            return Err(ConfigError::InvalidValue("tracker.interval"));
        }
        if self.tracker.reset_after_lost == Some(0) {
            return Err(ConfigError::InvalidValue("tracker.reset_after_lost"));
        }
        if self.tracker.max_channel_failures == 0 {
            return Err(ConfigError::InvalidValue("tracker.max_channel_failures"));
        }
        if self
            .vehicle
            .ascend
            .is_some_and(|ascend| !vigil_tello::MOVE_RANGE.contains(&ascend))
        {
            return Err(ConfigError::InvalidValue("vehicle.ascend"));
        }
        if !(0.0..=1.0).contains(&self.vision.min_score) {
            return Err(ConfigError::InvalidValue("vision.min_score"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config: Config = from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.pid.z.limit, Some((-20.0, 15.0)));
        assert_eq!(config.vehicle.address, "192.168.10.1:8889");
    }

    #[test]
    fn test_partial_config() {
        let config: Config = from_str(
            r#"
            [tracker]
            interval = 33
            reset_after_lost = 30

            [pid.x]
            kp = -0.3
            kd = -0.05
            limit = [-50.0, 50.0]

            [simulation]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.tracker.interval, Some(33));
        assert_eq!(config.tracker.frame_width, 640);
        assert_eq!(config.tracker.reset_after_lost, Some(30));
        assert_eq!(config.pid.x.kp, -0.3);
        assert_eq!(config.pid.x.ki, 0.0);
        assert_eq!(config.pid.x.limit, Some((-50.0, 50.0)));
        assert_eq!(config.pid.y, ControllerConfig::default().y);
        assert!(config.simulation.enabled);
    }

    #[test]
    fn test_partial_pid_keeps_defaults() {
        let config: Config = from_str(
            r#"
            [pid.x]
            kp = -0.3

            [pid.z]
            kp = -0.01
            "#,
        )
        .unwrap();

        let x = &config.pid.x;
        assert_eq!(x.kp, -0.3);
        assert_eq!(x.kd, -0.1);
        assert_eq!(x.setpoint, None);

        let z = &config.pid.z;
        assert_eq!(z.kp, -0.01);
        assert_eq!(z.kd, -0.003);
        assert_eq!(z.setpoint, Some(12_000.0));
        assert_eq!(z.limit, Some((-20.0, 15.0)));

        assert!(config.validate().is_ok());
        assert!(crate::control::ControllerBank::from_config(&config.pid, 640, 480).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(from_str::<Config>("[tracker]\nframe_width = \"wide\"").is_err());

        let mut config = Config::default();
        config.vehicle.ascend = Some(10);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracker.max_channel_failures = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracker.reset_after_lost = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue("tracker.reset_after_lost"))
        ));
    }
}
