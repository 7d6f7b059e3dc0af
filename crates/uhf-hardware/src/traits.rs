//! Vendor primitive trait definitions.
//!
//! [`UhfModule`] is the contract a binding to the vendor hardware library
//! must fulfil; [`ModuleFactory`] creates module handles. All methods are
//! blocking: the vendor library performs synchronous serial I/O and the
//! reader calls them from blocking worker threads, never from async tasks
//! directly.

use crate::error::Result;
use crate::types::{ModuleConfig, RawFrame};

/// A live handle to one UHF reader module.
///
/// Handles are `Send` so they can move between worker threads, but they are
/// not required to be `Sync`: the vendor library is not thread-safe, and the
/// reader serializes every call behind its device lock.
///
/// Boolean results mirror the vendor API: `Ok(false)` means the module
/// refused the request, `Err` means the call itself failed.
///
/// # Examples
///
/// ```
/// use uhf_hardware::traits::UhfModule;
/// use uhf_hardware::error::Result;
///
/// fn drain<M: UhfModule>(module: &mut M) -> Result<usize> {
///     let mut count = 0;
///     while module.read_frame()?.is_some() {
///         count += 1;
///     }
///     Ok(count)
/// }
/// ```
pub trait UhfModule: Send {
    /// Switch the radio on. The module needs a settle period afterwards.
    fn power_on(&mut self) -> Result<bool>;

    fn power_off(&mut self) -> Result<bool>;

    /// Set the transmit power level (vendor units, usually dBm).
    fn set_power(&mut self, level: i32) -> Result<bool>;

    fn power(&mut self) -> Result<i32>;

    /// Select the regional frequency plan.
    fn set_frequency_mode(&mut self, mode: i32) -> Result<bool>;

    fn frequency_mode(&mut self) -> Result<i32>;

    /// Select the Gen2 session (S0..S3).
    fn set_session_mode(&mut self, mode: i32) -> Result<bool>;

    /// Generic inventory-mode primitive used by most module families.
    fn set_inventory_mode(&mut self, mode: i32, flag: bool) -> Result<bool>;

    /// Inventory-mode primitive specific to the SLR family.
    fn set_slr_inventory_mode(&mut self, mode: i32) -> Result<bool>;

    /// Choose which memory banks an inventory reads.
    ///
    /// `mode` 0 reads EPC only; other modes add TID or user memory starting
    /// at `start_addr` for `word_count` words, using `password` for access.
    fn set_read_mode(
        &mut self,
        mode: i32,
        start_addr: i32,
        word_count: i32,
        password: i32,
    ) -> Result<bool>;

    fn start_inventory(&mut self) -> Result<bool>;

    fn stop_inventory(&mut self) -> Result<bool>;

    /// Pop one buffered tag record. `Ok(None)` means no tag is available.
    fn read_frame(&mut self) -> Result<Option<RawFrame>>;

    fn hardware_version(&mut self) -> Result<String>;

    fn firmware_version(&mut self) -> Result<String>;

    /// Module temperature as reported by the vendor (free-form string).
    fn temperature(&mut self) -> Result<String>;

    /// Forget configuration cached by the vendor library.
    ///
    /// Called once after power-off, right before the handle is dropped.
    fn clear_config(&mut self);
}

/// Creates [`UhfModule`] handles.
///
/// # Execution-context affinity
///
/// Vendor libraries bind an internal timer to the thread that constructs
/// the handle and deliver its callbacks there. A handle created on one
/// thread and driven by callbacks on another malfunctions without any
/// error. The reader therefore calls [`create`](ModuleFactory::create), and
/// drops the handle, on a single dedicated thread that lives as long as the
/// reader. Implementations may rely on that; everything else about the
/// handle is thread-independent.
pub trait ModuleFactory: Send + Sync + 'static {
    type Module: UhfModule + 'static;

    /// Create a handle for the configured module family.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor library cannot open the module.
    fn create(&self, config: &ModuleConfig) -> Result<Self::Module>;
}

impl<M: UhfModule + ?Sized> UhfModule for Box<M> {
    fn power_on(&mut self) -> Result<bool> {
        (**self).power_on()
    }

    fn power_off(&mut self) -> Result<bool> {
        (**self).power_off()
    }

    fn set_power(&mut self, level: i32) -> Result<bool> {
        (**self).set_power(level)
    }

    fn power(&mut self) -> Result<i32> {
        (**self).power()
    }

    fn set_frequency_mode(&mut self, mode: i32) -> Result<bool> {
        (**self).set_frequency_mode(mode)
    }

    fn frequency_mode(&mut self) -> Result<i32> {
        (**self).frequency_mode()
    }

    fn set_session_mode(&mut self, mode: i32) -> Result<bool> {
        (**self).set_session_mode(mode)
    }

    fn set_inventory_mode(&mut self, mode: i32, flag: bool) -> Result<bool> {
        (**self).set_inventory_mode(mode, flag)
    }

    fn set_slr_inventory_mode(&mut self, mode: i32) -> Result<bool> {
        (**self).set_slr_inventory_mode(mode)
    }

    fn set_read_mode(
        &mut self,
        mode: i32,
        start_addr: i32,
        word_count: i32,
        password: i32,
    ) -> Result<bool> {
        (**self).set_read_mode(mode, start_addr, word_count, password)
    }

    fn start_inventory(&mut self) -> Result<bool> {
        (**self).start_inventory()
    }

    fn stop_inventory(&mut self) -> Result<bool> {
        (**self).stop_inventory()
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        (**self).read_frame()
    }

    fn hardware_version(&mut self) -> Result<String> {
        (**self).hardware_version()
    }

    fn firmware_version(&mut self) -> Result<String> {
        (**self).firmware_version()
    }

    fn temperature(&mut self) -> Result<String> {
        (**self).temperature()
    }

    fn clear_config(&mut self) {
        (**self).clear_config()
    }
}
