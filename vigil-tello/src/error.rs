use std::{error, fmt, io};

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred on the command socket.
    Io(io::Error),
    /// The vehicle did not reply within the command timeout.
    ///
    /// This does not mean the command was not executed. Replies are
    /// sent over UDP and may be lost.
    Timeout,
    /// The vehicle replied with an error.
    Rejected(String),
    /// The vehicle replied with something we cannot interpret.
    InvalidResponse(String),
    /// One or multiple parameters were out of range.
    InvalidInput,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Timeout => write!(f, "command timeout"),
            Error::Rejected(reply) => write!(f, "command rejected: {}", reply),
            Error::InvalidResponse(reply) => write!(f, "invalid response: {}", reply),
            Error::InvalidInput => write!(f, "invalid command parameters"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
