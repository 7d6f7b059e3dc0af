//! The device lock.
//!
//! One `std::sync::Mutex` guards the device state together with the module
//! handle, so every primitive call is serialized with every state change.
//! The mutex is only ever taken on blocking threads (the tokio blocking
//! pool or the affinity thread), for the duration of the primitive calls of
//! one operation. It is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;
use uhf_core::{Error, PowerState, Result};
use uhf_hardware::UhfModule;

use crate::state::DeviceState;

/// Everything the device lock protects.
#[derive(Debug)]
pub(crate) struct DeviceCore<M> {
    pub state: DeviceState,
    pub module: Option<M>,
}

impl<M: UhfModule> DeviceCore<M> {
    /// The module handle, if power is On.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` when the reader is not powered on or the
    /// handle is missing.
    pub fn powered(&mut self) -> Result<(&mut M, &mut DeviceState)> {
        if !self.state.power().is_on() {
            return Err(Error::not_powered());
        }
        match self.module.as_mut() {
            Some(module) => Ok((module, &mut self.state)),
            None => Err(Error::State("UHF not initialized".to_string())),
        }
    }

    /// Drop the handle and enter `Error(reason)`.
    ///
    /// Must run on the affinity thread when a handle is present.
    pub fn fail_power(&mut self, reason: impl Into<String>) -> Error {
        let reason = reason.into();
        self.module = None;
        self.state.fail(reason.clone());
        Error::Power(reason)
    }

    /// Stop, power down and drop the handle without touching the lifecycle.
    ///
    /// Last-resort teardown when the reader goes away while still powered.
    /// Must run on the affinity thread.
    pub fn abandon(&mut self) {
        if let Some(mut module) = self.module.take() {
            warn!("Reader dropped while powered, releasing module");
            if let Err(e) = module.stop_inventory() {
                warn!(error = %e, "Failed to stop inventory during teardown");
            }
            if let Err(e) = module.power_off() {
                warn!(error = %e, "Failed to power off during teardown");
            }
            module.clear_config();
        }
        if self.state.power() != &PowerState::Off {
            self.state.reset();
        }
    }
}

/// Shared handle to the [`DeviceCore`].
pub(crate) struct DeviceLock<M> {
    core: Arc<Mutex<DeviceCore<M>>>,
}

impl<M> Clone for DeviceLock<M> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<M: UhfModule + 'static> DeviceLock<M> {
    pub fn new(state: DeviceState) -> Self {
        Self {
            core: Arc::new(Mutex::new(DeviceCore {
                state,
                module: None,
            })),
        }
    }

    /// Run `f` with the lock held, blocking the current thread.
    ///
    /// Only call this from a blocking context.
    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceCore<M>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Run `f` with the lock held on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `Error::Platform` if the blocking job panicked or was
    /// cancelled.
    pub async fn run<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut DeviceCore<M>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let lock = self.clone();
        tokio::task::spawn_blocking(move || lock.with(f))
            .await
            .map_err(|e| Error::Platform(format!("device job failed: {e}")))
    }

    /// Every closure leaves the core in a legal state, so a poisoned lock
    /// is still consistent.
    fn lock(&self) -> MutexGuard<'_, DeviceCore<M>> {
        self.core.lock().unwrap_or_else(|poisoned| {
            warn!("Device lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uhf_core::SessionState;
    use uhf_hardware::mock::{MockFactory, MockModule, ModuleCall};
    use uhf_hardware::{ModuleConfig, ModuleFactory};

    fn lock_with_module() -> (DeviceLock<MockModule>, uhf_hardware::mock::MockModuleHandle) {
        let (factory, handle) = MockFactory::new();
        let lock = DeviceLock::new(DeviceState::default());
        lock.with(|core| {
            core.module = Some(factory.create(&ModuleConfig::default()).unwrap());
            core.state.set_power(PowerState::PoweringOn).unwrap();
            core.state.set_power(PowerState::On).unwrap();
        });
        (lock, handle)
    }

    #[test]
    fn test_powered_requires_on() {
        let lock: DeviceLock<MockModule> = DeviceLock::new(DeviceState::default());
        let err = lock.with(|core| core.powered().map(|_| ()).unwrap_err());
        assert_eq!(err, Error::not_powered());
    }

    #[test]
    fn test_powered_returns_module() {
        let (lock, handle) = lock_with_module();
        lock.with(|core| {
            let (module, _) = core.powered().unwrap();
            module.set_power(20).unwrap();
        });
        assert_eq!(handle.power_level(), 20);
    }

    #[test]
    fn test_fail_power_drops_module() {
        let (lock, handle) = lock_with_module();
        let err = lock.with(|core| core.fail_power("boom"));

        assert_eq!(err.code(), "POWER_ERROR");
        assert_eq!(handle.live_count(), 0);
        lock.with(|core| assert!(matches!(core.state.power(), PowerState::Error(_))));
    }

    #[test]
    fn test_abandon_releases_module() {
        let (lock, handle) = lock_with_module();
        lock.with(|core| {
            core.state.set_session(SessionState::Starting).unwrap();
            core.state.set_session(SessionState::Scanning).unwrap();
            core.abandon();
            assert_eq!(core.state.power(), &PowerState::Off);
            assert_eq!(core.state.session(), SessionState::Idle);
        });

        assert_eq!(handle.live_count(), 0);
        assert_eq!(
            handle.calls(),
            vec![
                ModuleCall::StopInventory,
                ModuleCall::PowerOff,
                ModuleCall::ClearConfig
            ]
        );
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let (lock, _handle) = lock_with_module();
        let power = lock.run(|core| core.state.power().clone()).await.unwrap();
        assert_eq!(power, PowerState::On);
    }

    #[tokio::test]
    async fn test_run_reports_panics() {
        let lock: DeviceLock<MockModule> = DeviceLock::new(DeviceState::default());
        let err = lock.run(|_| -> bool { panic!("boom") }).await.unwrap_err();
        assert_eq!(err.code(), "PLATFORM_ERROR");

        // The poisoned lock is still usable
        let session = lock.with(|core| core.state.session());
        assert_eq!(session, SessionState::Idle);
    }
}
