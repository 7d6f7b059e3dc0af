//! Control layer for UHF RFID reader modules.
//!
//! [`UhfReader`] drives one module through a vendor primitive library
//! ([`uhf_hardware::UhfModule`]): power lifecycle with settle wait, radio
//! configuration, inventory sessions, and a polling loop that decodes
//! buffered tag frames into [`TagReading`]s for a single subscriber.
//!
//! Hosts either call the typed methods on [`UhfReader`] directly or go
//! through the [`commands`] boundary, which maps `{"method", "args"}`
//! requests onto them.
//!
//! # Concurrency
//!
//! Primitive calls block, so they run on tokio's blocking pool behind one
//! device lock. Module handles are created and dropped on a dedicated
//! [`affinity::AffinityThread`]. Tag readings reach the subscriber through
//! a bounded channel; a slow subscriber loses readings, it never stalls
//! the poll loop.

pub mod affinity;
pub mod commands;
pub mod config;
pub mod decoder;
mod lock;
pub mod logging;
pub mod poller;
mod reader;
pub mod sink;
pub mod state;

pub use commands::{Command, ErrorReply, Reply};
pub use config::ReaderConfig;
pub use poller::PollStats;
pub use reader::UhfReader;
pub use sink::{Delivery, EventSink, TagStream};
pub use state::{DeviceState, ReaderStatus};

pub use uhf_core::{Error, ErrorKind, ModuleType, PowerState, Result, SessionState, TagReading};
