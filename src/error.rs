use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The config file could not be read or a value failed validation.
    Config(String),
    /// A notification could not be sent or the inbox could not be polled.
    Transport(String),
    /// A GPIO pin could not be acquired or driven.
    Gpio(String),
    Io(io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::Transport(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config: {}", msg),
            Error::Transport(msg) => write!(f, "transport: {}", msg),
            Error::Gpio(msg) => write!(f, "gpio: {}", msg),
            Error::Io(err) => write!(f, "io: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<rppal::gpio::Error> for Error {
    fn from(err: rppal::gpio::Error) -> Self {
        Error::Gpio(err.to_string())
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<json::Error> for Error {
    fn from(err: json::Error) -> Self {
        Error::Transport(format!("invalid JSON: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
