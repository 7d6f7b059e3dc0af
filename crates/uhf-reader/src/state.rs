//! Device state machine.
//!
//! [`DeviceState`] is the single source of truth for the reader: power
//! lifecycle, inventory session, configured module family and cached read
//! mode. It enforces both transition tables and the invariant that ties
//! them together:
//!
//! - Power: Off → PoweringOn → On → PoweringOff → Off, any → Error,
//!   Error → PoweringOn | Off
//! - Session: Idle → Starting → Scanning → Stopping → Idle, Starting → Idle
//! - The session is active only while power is On, and power leaves On
//!   only once the session is Idle.
//!
//! The state is only ever mutated while the device lock is held.
//!
//! # Examples
//!
//! ```
//! use uhf_core::{PowerState, SessionState};
//! use uhf_reader::state::DeviceState;
//!
//! let mut state = DeviceState::default();
//! state.set_power(PowerState::PoweringOn).unwrap();
//! state.set_power(PowerState::On).unwrap();
//! state.set_session(SessionState::Starting).unwrap();
//! state.set_session(SessionState::Scanning).unwrap();
//!
//! // Power cannot leave On while scanning
//! assert!(state.set_power(PowerState::PoweringOff).is_err());
//! assert!(state.power().is_on());
//! ```

use serde::Serialize;
use uhf_core::constants::DEFAULT_READ_MODE;
use uhf_core::{Error, ModuleType, PowerState, Result, SessionState};
use uhf_hardware::ModuleConfig;

/// Power, session and configuration state of the one reader module.
#[derive(Debug, Clone)]
pub struct DeviceState {
    power: PowerState,
    session: SessionState,
    module_type: ModuleType,
    high_baud: bool,
    read_mode: i32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(ModuleType::default(), false)
    }
}

impl DeviceState {
    /// Fresh state: Off, Idle, default read mode.
    pub fn new(module_type: ModuleType, high_baud: bool) -> Self {
        Self {
            power: PowerState::Off,
            session: SessionState::Idle,
            module_type,
            high_baud,
            read_mode: DEFAULT_READ_MODE,
        }
    }

    pub fn power(&self) -> &PowerState {
        &self.power
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    pub fn high_baud(&self) -> bool {
        self.high_baud
    }

    /// Read mode last applied to the module.
    pub fn read_mode(&self) -> i32 {
        self.read_mode
    }

    /// Parameters for creating the next module handle.
    pub fn module_config(&self) -> ModuleConfig {
        ModuleConfig::new(self.module_type, self.high_baud)
    }

    /// Select the module family and link speed used at the next power-on.
    pub fn configure(&mut self, module_type: ModuleType, high_baud: bool) {
        self.module_type = module_type;
        self.high_baud = high_baud;
    }

    pub(crate) fn set_read_mode(&mut self, mode: i32) {
        self.read_mode = mode;
    }

    /// Forget configuration that only lives as long as a module handle.
    pub(crate) fn reset_config(&mut self) {
        self.read_mode = DEFAULT_READ_MODE;
    }

    /// Move the power machine, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not in
    /// the table, or if it would leave On while a session is active.
    pub fn set_power(&mut self, to: PowerState) -> Result<()> {
        if !self.power.can_transition_to(&to) || (self.power.is_on() && self.session.is_active())
        {
            return Err(Error::InvalidStateTransition {
                from: self.power.to_string(),
                to: to.to_string(),
            });
        }
        self.power = to;
        Ok(())
    }

    /// Move the session machine, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not in
    /// the table, or if it would activate a session while power is not On.
    pub fn set_session(&mut self, to: SessionState) -> Result<()> {
        if !self.session.can_transition_to(&to) || (to.is_active() && !self.power.is_on()) {
            return Err(Error::InvalidStateTransition {
                from: self.session.to_string(),
                to: to.to_string(),
            });
        }
        self.session = to;
        Ok(())
    }

    /// Enter `Error(reason)` after an unrecoverable power failure.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.power = PowerState::Error(reason.into());
    }

    /// Force Off/Idle regardless of the current state.
    ///
    /// Used for teardown when the reader is dropped without a shutdown.
    pub fn reset(&mut self) {
        self.session = SessionState::Idle;
        self.power = PowerState::Off;
        self.reset_config();
    }
}

/// Point-in-time view of the reader, for hosts and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderStatus {
    pub power: PowerState,
    pub session: SessionState,
    pub module_type: ModuleType,
    pub high_baud: bool,
    pub read_mode: i32,
    pub subscribed: bool,
}

impl ReaderStatus {
    pub(crate) fn new(state: &DeviceState, subscribed: bool) -> Self {
        Self {
            power: state.power.clone(),
            session: state.session,
            module_type: state.module_type,
            high_baud: state.high_baud,
            read_mode: state.read_mode,
            subscribed,
        }
    }
}
