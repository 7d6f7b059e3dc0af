//! The reader controller.
//!
//! [`UhfReader`] owns the device state, the module handle, the poll task
//! and the subscriber slot of one UHF module. Two locks are involved:
//!
//! - the device lock (`std::sync::Mutex`) serializes every primitive call
//!   and state change, and is held on blocking threads only;
//! - the lifecycle lock (`tokio::sync::Mutex`) serializes power-on,
//!   power-off, inventory start/stop and shutdown, and owns the poll task.
//!   It may be held across awaits (including the power-on settle wait)
//!   because the poll task never takes it.
//!
//! Handle creation and destruction run on the reader's [`AffinityThread`].

use std::sync::Arc;
use std::thread::ThreadId;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uhf_core::{Error, ModuleType, PowerState, Result, SessionState};
use uhf_hardware::{ModuleFactory, UhfModule};

use crate::affinity::AffinityThread;
use crate::config::ReaderConfig;
use crate::lock::{DeviceCore, DeviceLock};
use crate::poller::Poller;
use crate::sink::{EventSink, TagStream};
use crate::state::{DeviceState, ReaderStatus};

/// Controller of one UHF reader module.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use uhf_hardware::RawFrame;
/// use uhf_hardware::mock::MockFactory;
/// use uhf_reader::{ReaderConfig, UhfReader};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> uhf_reader::Result<()> {
/// let (factory, module) = MockFactory::new();
/// let config = ReaderConfig::default()
///     .with_settle_period(Duration::ZERO)
///     .with_poll_interval(Duration::from_millis(5));
/// let reader = UhfReader::new(factory, config)?;
///
/// let mut tags = reader.subscribe();
/// reader.power_on().await?;
/// reader.start_inventory(0).await?;
///
/// module.inject_frame(RawFrame::new("E2801160").with_rssi("C820"));
/// let reading = tags.recv().await.unwrap();
/// assert_eq!(reading.rssi, -1430);
///
/// reader.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct UhfReader<F: ModuleFactory> {
    factory: Arc<F>,
    device: DeviceLock<F::Module>,
    sink: EventSink,
    lifecycle: Mutex<Option<Poller>>,
    config: ReaderConfig,
    // Dropped last: joining it waits for the final handle release.
    affinity: AffinityThread,
}

impl<F: ModuleFactory> UhfReader<F> {
    /// Create a reader in the Off/Idle state and start its affinity thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::Init` if the affinity thread cannot be started.
    pub fn new(factory: F, config: ReaderConfig) -> Result<Self> {
        let affinity = AffinityThread::spawn(config.affinity_thread_name.clone())?;
        info!(
            module_type = %config.module_type,
            high_baud = config.high_baud,
            "UHF reader created"
        );

        Ok(Self {
            factory: Arc::new(factory),
            device: DeviceLock::new(DeviceState::new(config.module_type, config.high_baud)),
            sink: EventSink::new(config.event_capacity),
            lifecycle: Mutex::new(None),
            config,
            affinity,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The thread on which module handles are created and dropped.
    pub fn affinity_thread_id(&self) -> ThreadId {
        self.affinity.thread_id()
    }

    /// Start receiving tag readings, replacing any previous subscriber.
    pub fn subscribe(&self) -> TagStream {
        self.sink.subscribe()
    }

    pub fn unsubscribe(&self) -> bool {
        self.sink.unsubscribe()
    }

    /// Snapshot of the reader state.
    pub async fn status(&self) -> Result<ReaderStatus> {
        let subscribed = self.sink.has_subscriber();
        self.device
            .run(move |core| ReaderStatus::new(&core.state, subscribed))
            .await
    }

    /// Select the module family and link speed for the next power-on.
    ///
    /// Without a module type the current one is kept and only the link
    /// speed changes.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownModuleType` (`INIT_ERROR`) for a name that is
    /// not a known module family.
    pub async fn initialize(&self, module_type: Option<&str>, high_baud: bool) -> Result<()> {
        let requested = module_type
            .map(str::parse::<ModuleType>)
            .transpose()
            .inspect_err(|e| error!(error = %e, "Failed to initialize UHF reader"))?;

        let module_type = self
            .device
            .run(move |core| {
                let module_type = requested.unwrap_or(core.state.module_type());
                core.state.configure(module_type, high_baud);
                module_type
            })
            .await?;
        info!(%module_type, high_baud, "UHF reader initialized");
        Ok(())
    }

    /// Power the module on.
    ///
    /// Returns `Ok(true)` at once if already on. Otherwise creates the
    /// handle on the affinity thread, switches the radio on and waits the
    /// settle period before reporting On.
    ///
    /// # Errors
    ///
    /// Returns `Error::Power` if the handle cannot be created or the module
    /// refuses; the reader is then in `PowerState::Error`.
    pub async fn power_on(&self) -> Result<bool> {
        let _lifecycle = self.lifecycle.lock().await;

        let device = self.device.clone();
        let factory = Arc::clone(&self.factory);
        let needs_settle = self
            .affinity
            .run(move || device.with(|core| create_and_power(core, &*factory)))
            .await?
            .inspect_err(|e| error!(error = %e, "UHF power-on failed"))?;

        if !needs_settle {
            debug!("Power-on requested while already on");
            return Ok(true);
        }

        debug!(
            settle_ms = self.config.settle_period.as_millis() as u64,
            "Module powered, waiting for it to settle"
        );
        tokio::time::sleep(self.config.settle_period).await;

        self.device
            .run(|core| core.state.set_power(PowerState::On))
            .await??;
        info!("UHF powered on");
        Ok(true)
    }

    /// Stop any inventory, power the module off and release the handle.
    ///
    /// Returns `Ok(false)` if the reader was already off.
    ///
    /// # Errors
    ///
    /// Returns `Error::Power` if the module fails to power off; the handle
    /// is released regardless.
    pub async fn power_off(&self) -> Result<bool> {
        let mut poller = self.lifecycle.lock().await;
        if let Err(e) = self.end_session(&mut poller).await {
            warn!(error = %e, "Inventory did not stop cleanly before power-off");
        }
        self.release().await
    }

    /// Start an inventory session and the tag polling loop.
    ///
    /// `read_mode` 0 reads EPC only. Returns `Ok(true)` without side
    /// effects if a session is already running.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` if the reader is not powered on and
    /// `Error::Inventory` if the module refuses to start.
    pub async fn start_inventory(&self, read_mode: i32) -> Result<bool> {
        let mut poller = self.lifecycle.lock().await;

        let started = self
            .device
            .run(move |core| begin_inventory(core, read_mode))
            .await?
            .inspect_err(|e| error!(error = %e, "Failed to start inventory"))?;

        if poller.is_none() {
            *poller = Some(Poller::spawn(
                self.device.clone(),
                self.sink.clone(),
                self.config.poll_interval,
            ));
        }

        if started {
            info!(read_mode, "Inventory started");
        } else {
            debug!("Inventory already running");
        }
        Ok(true)
    }

    /// Stop the inventory session. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Inventory` if the module fails to stop; the session
    /// is Idle regardless.
    pub async fn stop_inventory(&self) -> Result<bool> {
        let mut poller = self.lifecycle.lock().await;
        self.end_session(&mut poller)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to stop inventory"))?;
        Ok(true)
    }

    pub async fn set_power(&self, level: i32) -> Result<bool> {
        self.command("set_power", Error::Power, move |module, _| {
            module.set_power(level)
        })
        .await
    }

    pub async fn power(&self) -> Result<i32> {
        self.command("power", Error::Power, |module, _| module.power())
            .await
    }

    pub async fn set_frequency_mode(&self, mode: i32) -> Result<bool> {
        self.command("set_frequency_mode", Error::Frequency, move |module, _| {
            module.set_frequency_mode(mode)
        })
        .await
    }

    pub async fn frequency_mode(&self) -> Result<i32> {
        self.command("frequency_mode", Error::Frequency, |module, _| {
            module.frequency_mode()
        })
        .await
    }

    pub async fn set_session_mode(&self, mode: i32) -> Result<bool> {
        self.command("set_session_mode", Error::Session, move |module, _| {
            module.set_session_mode(mode)
        })
        .await
    }

    /// Set the inventory mode with the primitive of the configured module
    /// family.
    pub async fn set_inventory_mode(&self, mode: i32) -> Result<bool> {
        self.command("set_inventory_mode", Error::Inventory, move |module, state| {
            if state.module_type().has_dedicated_inventory_mode() {
                module.set_slr_inventory_mode(mode)
            } else {
                module.set_inventory_mode(mode, false)
            }
        })
        .await
    }

    /// Choose which memory banks inventories read. The mode is cached when
    /// the module accepts it.
    pub async fn set_read_mode(&self, mode: i32, start_addr: i32, word_count: i32) -> Result<bool> {
        self.command("set_read_mode", Error::ReadMode, move |module, state| {
            let accepted = module.set_read_mode(mode, start_addr, word_count, 0)?;
            if accepted {
                state.set_read_mode(mode);
            }
            Ok(accepted)
        })
        .await
    }

    pub async fn hardware_version(&self) -> Result<String> {
        self.command("hardware_version", Error::Version, |module, _| {
            module.hardware_version()
        })
        .await
    }

    pub async fn firmware_version(&self) -> Result<String> {
        self.command("firmware_version", Error::Version, |module, _| {
            module.firmware_version()
        })
        .await
    }

    pub async fn module_temperature(&self) -> Result<String> {
        self.command("module_temperature", Error::Temperature, |module, _| {
            module.temperature()
        })
        .await
    }

    /// Stop any inventory, power off and drop the subscriber.
    ///
    /// Safe to call at any time and more than once; failures are logged.
    pub async fn shutdown(&self) {
        let mut poller = self.lifecycle.lock().await;
        if let Err(e) = self.end_session(&mut poller).await {
            warn!(error = %e, "Inventory did not stop cleanly during shutdown");
        }
        if let Err(e) = self.release().await {
            warn!(error = %e, "Module did not power off cleanly during shutdown");
        }
        self.sink.unsubscribe();
        info!("UHF reader shut down");
    }

    /// Run one primitive on the powered module.
    ///
    /// Primitive failures become the error produced by `kind`.
    async fn command<R, Op>(
        &self,
        operation: &'static str,
        kind: fn(String) -> Error,
        op: Op,
    ) -> Result<R>
    where
        Op: FnOnce(&mut F::Module, &mut DeviceState) -> uhf_hardware::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        debug!(operation, "Executing device command");
        self.device
            .run(move |core| -> Result<R> {
                let (module, state) = core.powered()?;
                op(module, state).map_err(|e| kind(e.to_string()))
            })
            .await
            .and_then(|result| result)
            .inspect_err(|e| error!(operation, error = %e, "Device command failed"))
    }

    /// Leave Scanning: mark Stopping, stop the poll task, stop the module.
    ///
    /// The caller holds the lifecycle lock.
    async fn end_session(&self, poller: &mut Option<Poller>) -> Result<()> {
        let stopping = self
            .device
            .run(|core| match core.state.session() {
                SessionState::Scanning => core
                    .state
                    .set_session(SessionState::Stopping)
                    .map(|_| true),
                SessionState::Stopping => Ok(true),
                SessionState::Idle | SessionState::Starting => Ok(false),
            })
            .await??;

        if let Some(poller) = poller.take() {
            let stats = poller.stop().await;
            info!(
                iterations = stats.iterations,
                frames = stats.frames,
                delivered = stats.delivered,
                rejected = stats.rejected,
                read_errors = stats.read_errors,
                "Tag polling finished"
            );
        }

        if !stopping {
            return Ok(());
        }

        self.device
            .run(|core| -> Result<()> {
                let stopped = core.module.as_mut().map(|module| module.stop_inventory());
                core.state.set_session(SessionState::Idle)?;
                match stopped {
                    Some(Err(e)) => Err(Error::Inventory(e.to_string())),
                    Some(Ok(false)) => {
                        warn!("Module refused to stop inventory");
                        Ok(())
                    }
                    Some(Ok(true)) | None => Ok(()),
                }
            })
            .await??;
        info!("Inventory stopped");
        Ok(())
    }

    /// Power off and drop the handle on the affinity thread.
    ///
    /// The caller holds the lifecycle lock and has ended the session.
    async fn release(&self) -> Result<bool> {
        let device = self.device.clone();
        let released = self
            .affinity
            .run(move || device.with(release_module))
            .await?;

        match &released {
            Ok(true) => info!("UHF powered off"),
            Ok(false) => debug!("Power-off requested while already off"),
            Err(e) => error!(error = %e, "UHF power-off failed"),
        }
        released
    }
}

impl<F: ModuleFactory> Drop for UhfReader<F> {
    fn drop(&mut self) {
        if let Some(poller) = self.lifecycle.get_mut().take() {
            poller.cancel();
        }
        let device = self.device.clone();
        if let Err(e) = self
            .affinity
            .submit(move || device.with(DeviceCore::abandon))
        {
            warn!(error = %e, "Could not release module on drop");
        }
    }
}

impl<F: ModuleFactory> std::fmt::Debug for UhfReader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UhfReader")
            .field("config", &self.config)
            .field("affinity", &self.affinity)
            .finish_non_exhaustive()
    }
}

/// Create the handle and switch the radio on. Runs on the affinity thread.
///
/// Returns `true` when the caller must wait the settle period.
fn create_and_power<F: ModuleFactory>(
    core: &mut DeviceCore<F::Module>,
    factory: &F,
) -> Result<bool> {
    match core.state.power() {
        PowerState::On => return Ok(false),
        // A previous power-on was abandoned during its settle wait
        PowerState::PoweringOn if core.module.is_some() => return Ok(true),
        _ => {}
    }

    core.state.set_power(PowerState::PoweringOn)?;
    let config = core.state.module_config();

    let mut module = match factory.create(&config) {
        Ok(module) => module,
        Err(e) => return Err(core.fail_power(format!("failed to create module: {e}"))),
    };
    debug!(
        module_type = %config.module_type,
        baud_rate = config.baud_rate,
        "Module handle created"
    );

    match module.power_on() {
        Ok(true) => {
            core.module = Some(module);
            Ok(true)
        }
        Ok(false) => Err(core.fail_power(
            "Failed to power on. Check module type and device compatibility.",
        )),
        Err(e) => Err(core.fail_power(format!("power on failed: {e}"))),
    }
}

/// Power the module off and drop the handle. Runs on the affinity thread.
///
/// Returns `false` if there was nothing to release.
fn release_module<M: UhfModule>(core: &mut DeviceCore<M>) -> Result<bool> {
    let Some(mut module) = core.module.take() else {
        if matches!(core.state.power(), PowerState::Error(_)) {
            core.state.set_power(PowerState::Off)?;
        }
        return Ok(false);
    };

    let was_on = core.state.power().is_on();
    if was_on {
        if let Err(e) = core.state.set_power(PowerState::PoweringOff) {
            core.module = Some(module);
            return Err(e);
        }
    }

    let result = module.power_off();
    module.clear_config();
    drop(module);

    match result {
        Ok(accepted) => {
            if !accepted {
                warn!("Module refused power-off, releasing handle anyway");
            }
            if was_on {
                core.state.set_power(PowerState::Off)?;
                core.state.reset_config();
            } else {
                core.state.reset();
            }
            Ok(true)
        }
        Err(e) => {
            core.state.reset_config();
            Err(core.fail_power(format!("power off failed: {e}")))
        }
    }
}

/// Move the session to Scanning. Runs under the device lock.
///
/// Returns `false` if a session was already running.
fn begin_inventory<M: UhfModule>(core: &mut DeviceCore<M>, read_mode: i32) -> Result<bool> {
    let (module, state) = core.powered()?;
    if state.session() == SessionState::Scanning {
        return Ok(false);
    }

    state.set_session(SessionState::Starting)?;
    let started = module
        .set_read_mode(read_mode, 0, 0, 0)
        .and_then(|_| module.start_inventory());

    match started {
        Ok(true) => {
            state.set_read_mode(read_mode);
            state.set_session(SessionState::Scanning)?;
            Ok(true)
        }
        Ok(false) => {
            state.set_session(SessionState::Idle)?;
            Err(Error::Inventory("Failed to start inventory".to_string()))
        }
        Err(e) => {
            state.set_session(SessionState::Idle)?;
            Err(Error::Inventory(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uhf_hardware::mock::{Failure, MockFactory, MockModuleHandle, ModuleCall, Primitive};

    fn reader() -> (UhfReader<MockFactory>, MockModuleHandle) {
        let (factory, handle) = MockFactory::new();
        let config = ReaderConfig::default()
            .with_settle_period(Duration::ZERO)
            .with_poll_interval(Duration::from_millis(5));
        (UhfReader::new(factory, config).unwrap(), handle)
    }

    #[tokio::test]
    async fn test_commands_require_power() {
        let (reader, handle) = reader();

        let err = reader.set_power(20).await.unwrap_err();
        assert_eq!(err, Error::not_powered());
        assert_eq!(reader.hardware_version().await.unwrap_err().code(), "STATE_ERROR");
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_power_cycle() {
        let (reader, handle) = reader();

        assert!(reader.power_on().await.unwrap());
        assert_eq!(reader.status().await.unwrap().power, PowerState::On);
        assert!(handle.is_powered());

        assert!(reader.power_off().await.unwrap());
        assert!(!reader.power_off().await.unwrap());
        assert_eq!(handle.live_count(), 0);
        assert_eq!(
            handle.calls(),
            vec![ModuleCall::PowerOn, ModuleCall::PowerOff, ModuleCall::ClearConfig]
        );
    }

    #[tokio::test]
    async fn test_power_on_refused() {
        let (reader, handle) = reader();
        handle.fail(Primitive::PowerOn, Failure::Refuse);

        let err = reader.power_on().await.unwrap_err();
        assert_eq!(err.code(), "POWER_ERROR");
        assert!(matches!(
            reader.status().await.unwrap().power,
            PowerState::Error(_)
        ));
        assert_eq!(handle.live_count(), 0);

        // Error behaves like Off
        handle.clear_failures();
        assert!(reader.power_on().await.unwrap());
        assert_eq!(handle.created_count(), 2);
    }

    #[tokio::test]
    async fn test_factory_failure() {
        let (reader, handle) = reader();
        handle.fail(Primitive::Create, Failure::Error("no device".into()));

        let err = reader.power_on().await.unwrap_err();
        assert_eq!(err.code(), "POWER_ERROR");

        // Power-off from Error normalizes to Off
        assert!(!reader.power_off().await.unwrap());
        assert_eq!(reader.status().await.unwrap().power, PowerState::Off);
    }

    #[tokio::test]
    async fn test_power_off_failure_releases_handle() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        handle.fail(Primitive::PowerOff, Failure::Error("uart".into()));

        let err = reader.power_off().await.unwrap_err();
        assert_eq!(err.code(), "POWER_ERROR");
        assert_eq!(handle.live_count(), 0);
        assert!(handle.calls().contains(&ModuleCall::ClearConfig));
    }

    #[tokio::test]
    async fn test_setters_and_getters() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();

        assert!(reader.set_power(25).await.unwrap());
        assert_eq!(reader.power().await.unwrap(), 25);
        assert!(reader.set_frequency_mode(3).await.unwrap());
        assert_eq!(reader.frequency_mode().await.unwrap(), 3);
        assert!(reader.set_session_mode(1).await.unwrap());
        assert_eq!(handle.session_mode(), 1);
        assert_eq!(reader.hardware_version().await.unwrap(), "MOCK-HW-1.0");
        assert_eq!(reader.firmware_version().await.unwrap(), "MOCK-FW-2.3");
        assert_eq!(reader.module_temperature().await.unwrap(), "36");
    }

    #[tokio::test]
    async fn test_primitive_errors_map_to_operation_kind() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();

        handle.fail(Primitive::SetFrequencyMode, Failure::Error("nak".into()));
        handle.fail(Primitive::SetSessionMode, Failure::Error("nak".into()));
        handle.fail(Primitive::Temperature, Failure::Error("nak".into()));
        handle.fail(Primitive::FirmwareVersion, Failure::Error("nak".into()));

        assert_eq!(reader.set_frequency_mode(1).await.unwrap_err().code(), "FREQ_ERROR");
        assert_eq!(reader.set_session_mode(1).await.unwrap_err().code(), "SESSION_ERROR");
        assert_eq!(reader.module_temperature().await.unwrap_err().code(), "TEMP_ERROR");
        assert_eq!(reader.firmware_version().await.unwrap_err().code(), "VERSION_ERROR");
    }

    #[tokio::test]
    async fn test_refused_setter_returns_false() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        handle.fail(Primitive::SetPower, Failure::Refuse);

        assert!(!reader.set_power(33).await.unwrap());
    }

    #[tokio::test]
    async fn test_inventory_mode_dispatch() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        reader.set_inventory_mode(1).await.unwrap();
        assert!(handle.calls().contains(&ModuleCall::SetSlrInventoryMode(1)));

        reader.power_off().await.unwrap();
        reader.initialize(Some("UM_MODULE"), false).await.unwrap();
        reader.power_on().await.unwrap();
        reader.set_inventory_mode(2).await.unwrap();
        assert!(handle.calls().contains(&ModuleCall::SetInventoryMode { mode: 2, flag: false }));
    }

    #[tokio::test]
    async fn test_read_mode_is_cached() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();

        assert!(reader.set_read_mode(2, 0, 6).await.unwrap());
        assert_eq!(reader.status().await.unwrap().read_mode, 2);

        handle.fail(Primitive::SetReadMode, Failure::Error("nak".into()));
        assert_eq!(reader.set_read_mode(1, 0, 0).await.unwrap_err().code(), "READ_MODE_ERROR");
        assert_eq!(reader.status().await.unwrap().read_mode, 2);

        handle.clear_failures();
        reader.power_off().await.unwrap();
        assert_eq!(reader.status().await.unwrap().read_mode, 0);
    }

    #[tokio::test]
    async fn test_initialize() {
        let (reader, handle) = reader();

        reader.initialize(Some("GX"), true).await.unwrap();
        let status = reader.status().await.unwrap();
        assert_eq!(status.module_type, ModuleType::Gx);
        assert!(status.high_baud);

        reader.power_on().await.unwrap();
        let config = handle.last_config().unwrap();
        assert_eq!(config.module_type, ModuleType::Gx);
        assert_eq!(config.baud_rate, 921_600);

        let err = reader.initialize(Some("NFC_MODULE"), false).await.unwrap_err();
        assert_eq!(err.code(), "INIT_ERROR");
        assert_eq!(reader.status().await.unwrap().module_type, ModuleType::Gx);
    }

    #[tokio::test]
    async fn test_initialize_keeps_module_type_when_absent() {
        let (reader, _handle) = reader();
        reader.initialize(Some("UM"), false).await.unwrap();

        reader.initialize(None, true).await.unwrap();
        let status = reader.status().await.unwrap();
        assert_eq!(status.module_type, ModuleType::Um);
        assert!(status.high_baud);
    }

    #[tokio::test]
    async fn test_start_failure_returns_to_idle() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        handle.fail(Primitive::StartInventory, Failure::Refuse);

        let err = reader.start_inventory(0).await.unwrap_err();
        assert_eq!(err.code(), "INVENTORY_ERROR");
        assert_eq!(reader.status().await.unwrap().session, SessionState::Idle);
        assert!(reader.lifecycle.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_start_configures_read_mode() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();

        assert!(reader.start_inventory(1).await.unwrap());
        assert!(reader.start_inventory(1).await.unwrap());
        assert_eq!(handle.count(&ModuleCall::StartInventory), 1);
        assert!(handle.calls().contains(&ModuleCall::SetReadMode {
            mode: 1,
            start_addr: 0,
            word_count: 0,
            password: 0,
        }));

        let status = reader.status().await.unwrap();
        assert_eq!(status.session, SessionState::Scanning);
        assert_eq!(status.read_mode, 1);
        reader.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_failure_still_idle() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        reader.start_inventory(0).await.unwrap();
        handle.fail(Primitive::StopInventory, Failure::Error("uart".into()));

        let err = reader.stop_inventory().await.unwrap_err();
        assert_eq!(err.code(), "INVENTORY_ERROR");
        assert_eq!(reader.status().await.unwrap().session, SessionState::Idle);
        assert!(reader.stop_inventory().await.unwrap());
    }

    #[tokio::test]
    async fn test_power_off_stops_inventory_first() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        reader.start_inventory(0).await.unwrap();

        assert!(reader.power_off().await.unwrap());

        let calls = handle.calls();
        let stop = calls.iter().position(|c| *c == ModuleCall::StopInventory).unwrap();
        let off = calls.iter().position(|c| *c == ModuleCall::PowerOff).unwrap();
        assert!(stop < off);
        assert_eq!(reader.status().await.unwrap().session, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (reader, handle) = reader();
        reader.shutdown().await;

        reader.power_on().await.unwrap();
        let _tags = reader.subscribe();
        reader.start_inventory(0).await.unwrap();

        reader.shutdown().await;
        reader.shutdown().await;

        let status = reader.status().await.unwrap();
        assert_eq!(status.power, PowerState::Off);
        assert!(!status.subscribed);
        assert_eq!(handle.live_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_module_on_affinity_thread() {
        let (reader, handle) = reader();
        reader.power_on().await.unwrap();
        reader.start_inventory(0).await.unwrap();
        let affinity = reader.affinity_thread_id();

        drop(reader);

        assert_eq!(handle.live_count(), 0);
        assert_eq!(handle.drop_threads(), vec![affinity]);
        assert!(!handle.is_powered());
    }
}
