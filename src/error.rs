//! Unified error types for the dual-ToF daemon.
//!
//! Every subsystem has its own small error enum; all of them convert into
//! the top-level [`Error`] so the orchestrator's outer handler deals with a
//! single type.
//!
//! | Failure class     | Types                                   | Handling                      |
//! |-------------------|-----------------------------------------|-------------------------------|
//! | connect           | [`ConnectError`]                        | retried forever at startup    |
//! | init              | [`SensorError::Init`]                   | slot skipped for the cycle    |
//! | read              | [`SensorError`] (other), [`PublishError`] | rest of slot skipped        |
//! | unexpected        | [`LineError`], [`RestartError`]         | outer handler, 5 s pause      |

use core::fmt;

use crate::sensors::SlotId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the daemon funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The broker could not be reached.
    Connect(ConnectError),
    /// A sensor could not be initialised or sampled.
    Sensor(SensorError),
    /// A reading could not be handed to the broker client.
    Publish(PublishError),
    /// An enable line could not be driven.
    Line(LineError),
    /// The external restart command failed.
    Restart(RestartError),
}

impl Error {
    /// `true` for failures only the outermost loop handler is expected to see.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Line(_) | Self::Restart(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "connect: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::Line(e) => write!(f, "line: {e}"),
            Self::Restart(e) => write!(f, "restart: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Broker connection
// ---------------------------------------------------------------------------

/// The broker refused or never answered a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectError(pub String);

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConnectError {}

impl From<ConnectError> for Error {
    fn from(e: ConnectError) -> Self {
        Self::Connect(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Device did not answer, reported the wrong model id, or refused to
    /// start ranging.
    Init(String),
    /// A ranging sample could not be fetched.
    Read(String),
    /// Data-ready never asserted within the sampling window.
    DataTimeout,
    /// Ranging could not be stopped cleanly.
    Close(String),
}

impl SensorError {
    pub fn is_init(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init failed: {msg}"),
            Self::Read(msg) => write!(f, "read failed: {msg}"),
            Self::DataTimeout => write!(f, "no sample ready in time"),
            Self::Close(msg) => write!(f, "close failed: {msg}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// `publish` was called before `connect` succeeded.
    NotConnected,
    /// Payload serialisation failed.
    Encode(String),
    /// The broker client rejected the message.
    Send(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "broker not connected"),
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
            Self::Send(msg) => write!(f, "send failed: {msg}"),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

// ---------------------------------------------------------------------------
// Enable line errors
// ---------------------------------------------------------------------------

/// Writing an enable line failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub slot: SlotId,
    pub detail: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enable line for {} failed: {}", self.slot, self.detail)
    }
}

impl std::error::Error for LineError {}

impl From<LineError> for Error {
    fn from(e: LineError) -> Self {
        Self::Line(e)
    }
}

// ---------------------------------------------------------------------------
// Restart action errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartError {
    /// The restart command could not be spawned.
    Spawn(String),
    /// The restart command ran but exited unsuccessfully.
    /// `None` when it was killed by a signal.
    Status(Option<i32>),
}

impl fmt::Display for RestartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "could not run restart command: {msg}"),
            Self::Status(Some(code)) => write!(f, "restart command exited with {code}"),
            Self::Status(None) => write!(f, "restart command terminated by signal"),
        }
    }
}

impl std::error::Error for RestartError {}

impl From<RestartError> for Error {
    fn from(e: RestartError) -> Self {
        Self::Restart(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
