//! Hardware boundary of the UHF reader control layer.
//!
//! This crate defines what the reader core expects from a vendor
//! hardware-abstraction library, without talking to any transport itself:
//!
//! - [`UhfModule`]: the blocking primitive operations of one module handle
//!   (power, radio configuration, inventory control, buffered frame reads,
//!   version and temperature queries).
//! - [`ModuleFactory`]: creates handles; carries the execution-context
//!   affinity precondition of the vendor library.
//! - [`RawFrame`]: one unparsed tag record as the vendor returns it.
//! - [`HardwareError`]: failures raised by primitives.
//!
//! # Threading
//!
//! Primitives block on serial I/O and the vendor library is not
//! thread-safe. Handles are `Send` but never shared: the reader serializes
//! every call behind one lock and runs them on blocking worker threads.
//!
//! # Mock Implementation
//!
//! With the default `mock` feature, [`mock::MockFactory`] provides a
//! simulated module for development and tests:
//!
//! ```
//! use uhf_hardware::mock::{MockFactory, ModuleCall};
//! use uhf_hardware::{ModuleConfig, ModuleFactory, UhfModule};
//!
//! let (factory, handle) = MockFactory::new();
//! let mut module = factory.create(&ModuleConfig::default()).unwrap();
//! module.power_on().unwrap();
//! assert_eq!(handle.calls(), vec![ModuleCall::PowerOn]);
//! ```

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{ModuleFactory, UhfModule};
pub use types::{ModuleConfig, RawFrame};
