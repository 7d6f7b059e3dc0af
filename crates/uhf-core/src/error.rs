use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Failure classes surfaced to the host application.
///
/// Each kind has a stable string [`code`](ErrorKind::code) that command
/// transports forward verbatim to their callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation not valid for the current power or session state.
    State,
    Power,
    Inventory,
    Freq,
    Session,
    ReadMode,
    Version,
    Temp,
    /// Bad configuration argument.
    Init,
    /// Command name not known to the dispatcher.
    NotImplemented,
    /// Command arguments could not be decoded.
    InvalidArgument,
    /// Internal failure of the execution machinery (panicked job, stopped thread).
    Platform,
}

impl ErrorKind {
    /// Wire code for this kind, e.g. `"STATE_ERROR"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::State => "STATE_ERROR",
            Self::Power => "POWER_ERROR",
            Self::Inventory => "INVENTORY_ERROR",
            Self::Freq => "FREQ_ERROR",
            Self::Session => "SESSION_ERROR",
            Self::ReadMode => "READ_MODE_ERROR",
            Self::Version => "VERSION_ERROR",
            Self::Temp => "TEMP_ERROR",
            Self::Init => "INIT_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Platform => "PLATFORM_ERROR",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // State errors
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Hardware operation errors
    #[error("Power control failed: {0}")]
    Power(String),

    #[error("Inventory failed: {0}")]
    Inventory(String),

    #[error("Frequency mode failed: {0}")]
    Frequency(String),

    #[error("Session mode failed: {0}")]
    Session(String),

    #[error("Read mode failed: {0}")]
    ReadMode(String),

    #[error("Version query failed: {0}")]
    Version(String),

    #[error("Temperature query failed: {0}")]
    Temperature(String),

    // Configuration errors
    #[error("Initialization failed: {0}")]
    Init(String),

    #[error("Unknown module type: {0}")]
    UnknownModuleType(String),

    // Command boundary errors
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Execution machinery
    #[error("Platform error: {0}")]
    Platform(String),
}

impl Error {
    /// The failure class reported to the host.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::State(_) | Self::InvalidStateTransition { .. } => ErrorKind::State,
            Self::Power(_) => ErrorKind::Power,
            Self::Inventory(_) => ErrorKind::Inventory,
            Self::Frequency(_) => ErrorKind::Freq,
            Self::Session(_) => ErrorKind::Session,
            Self::ReadMode(_) => ErrorKind::ReadMode,
            Self::Version(_) => ErrorKind::Version,
            Self::Temperature(_) => ErrorKind::Temp,
            Self::Init(_) | Self::UnknownModuleType(_) => ErrorKind::Init,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Platform(_) => ErrorKind::Platform,
        }
    }

    /// Shorthand for `self.kind().code()`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Error returned by every device operation issued while the reader is not On.
    pub fn not_powered() -> Self {
        Self::State("UHF not powered on".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
