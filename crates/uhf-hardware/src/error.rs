//! Error types for vendor primitive operations.
//!
//! The vendor library reports failures either by throwing or by returning a
//! negative status; bindings translate both into [`HardwareError`].

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors raised by a [`UhfModule`](crate::traits::UhfModule) primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// Transport-level failure inside the vendor library.
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// The module answered with data the binding could not interpret.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// The vendor library refused to create a handle.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },
}

impl HardwareError {
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("serial port closed");
        assert_eq!(error.to_string(), "Communication error: serial port closed");
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("module returned no data");
        assert!(matches!(error, HardwareError::InvalidData { .. }));
        assert_eq!(error.to_string(), "Invalid data: module returned no data");
    }

    #[test]
    fn test_initialization_failed_error() {
        let error = HardwareError::initialization_failed("no such device");
        assert_eq!(error.to_string(), "Initialization failed: no such device");
    }
}
