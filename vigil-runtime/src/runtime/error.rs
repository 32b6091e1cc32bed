use std::{error, fmt};

use crate::ConfigError;

#[derive(Debug)]
pub enum Error {
    /// Invalid configuration.
    Config(ConfigError),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The vehicle driver reported an error.
    Vehicle(vigil_tello::Error),
    /// The vehicle is not connected.
    Disconnected,
    /// Commands kept failing and tracking was given up.
    ChannelFailure { attempts: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Vehicle(e) => write!(f, "vehicle: {}", e),
            Error::Disconnected => write!(f, "vehicle is not connected"),
            Error::ChannelFailure { attempts } => {
                write!(f, "command channel failed {} consecutive times", attempts)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Vehicle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<vigil_tello::Error> for Error {
    fn from(e: vigil_tello::Error) -> Self {
        Error::Vehicle(e)
    }
}
