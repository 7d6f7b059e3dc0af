//! Timing and encoding constants of the UHF reader modules.
//!
//! These values come from the module vendor's reference behavior. Changing
//! the timing constants may leave the module silently unresponsive.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use uhf_core::constants::*;
//!
//! let settle = Duration::from_millis(POWER_ON_SETTLE_MS);
//! assert_eq!(settle, Duration::from_millis(2500));
//! ```

// ============================================================================
// Timing
// ============================================================================

/// Warm-up delay after a successful primitive power-on, in milliseconds.
///
/// The serial port and the radio module need this long before they answer
/// reliably. Commands issued earlier fail without any error being reported.
pub const POWER_ON_SETTLE_MS: u64 = 2500;

/// Interval between two buffered-frame reads while scanning, in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 50;

// ============================================================================
// Transport
// ============================================================================

/// Default serial baud rate of the module.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rate used when the host requests the high-speed link (some M118 devices).
pub const HIGH_BAUD_RATE: u32 = 921_600;

// ============================================================================
// Streaming
// ============================================================================

/// Default capacity of the channel feeding the tag stream subscriber.
///
/// Readings arriving while the channel is full are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ============================================================================
// Frame encoding
// ============================================================================

/// Minimum length of the RSSI hex field (two bytes, four hex digits).
///
/// Shorter fields decode to an RSSI of 0.
pub const RSSI_HEX_LEN: usize = 4;

/// Default read mode passed when starting an inventory (EPC only).
pub const DEFAULT_READ_MODE: i32 = 0;
