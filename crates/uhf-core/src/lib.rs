//! Shared domain types for the UHF reader control layer.
//!
//! Everything here is free of I/O: the error taxonomy reported to hosts,
//! the power and session states of the reader, the supported module
//! families and the decoded [`TagReading`].

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
