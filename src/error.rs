use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error{
    //transport-level failure talking to the actuator (write fault,
    //disconnect, response deadline)
    #[error("Actuator link error: {0}")]
    Link(String),

    //A response arrived but does not encode a valid angle
    #[error("Protocol error: {0}")]
    Protocol(String),

    //A bounded wait expired
    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    //lifecycle call made before `init()`
    #[error("Scanner not initialized")]
    NotInitialized,

    //cycle driven before `start()` or after `stop()`
    #[error("Scanner not started")]
    NotStarted,

    #[error("{0}")]
    Other(String),
}

impl Error{
    pub fn link(msg: impl Display) -> Self{
        Error::Link(msg.to_string())
    }

    pub fn protocol(msg: impl Display) -> Self{
        Error::Protocol(msg.to_string())
    }

    //reclassify raw transport faults as link failures. Already classified
    //errors pass through unchanged.
    pub fn into_link(self) -> Self{
        match self{
            Error::Serial(e) => Error::Link(e.to_string()),
            Error::Io(e) => Error::Link(e.to_string()),
            other => other,
        }
    }

    pub fn is_link(&self) -> bool{
        matches!(self, Error::Link(_))
    }

    pub fn is_protocol(&self) -> bool{
        matches!(self, Error::Protocol(_))
    }

    pub fn is_timeout(&self) -> bool{
        matches!(self, Error::Timeout(_))
    }
}

//no sample has arrived in the scan buffer yet. Transient; callers retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("No range sample available yet")]
pub struct BufferUnavailable;
