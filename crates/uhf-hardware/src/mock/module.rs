//! Simulated UHF module for testing and development.
//!
//! [`MockFactory`] produces [`MockModule`] handles that share one
//! [`MockModuleHandle`]. Tests use the handle to queue tag frames, make
//! primitives fail, and inspect the exact sequence of primitive calls and
//! the threads on which handles were created and dropped.

use crate::error::{HardwareError, Result};
use crate::traits::{ModuleFactory, UhfModule};
use crate::types::{ModuleConfig, RawFrame};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Primitive operations of a module, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Handle creation in the factory.
    Create,
    PowerOn,
    PowerOff,
    SetPower,
    Power,
    SetFrequencyMode,
    FrequencyMode,
    SetSessionMode,
    SetInventoryMode,
    SetSlrInventoryMode,
    SetReadMode,
    StartInventory,
    StopInventory,
    ReadFrame,
    HardwareVersion,
    FirmwareVersion,
    Temperature,
}

/// A recorded primitive call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleCall {
    PowerOn,
    PowerOff,
    SetPower(i32),
    Power,
    SetFrequencyMode(i32),
    FrequencyMode,
    SetSessionMode(i32),
    SetInventoryMode { mode: i32, flag: bool },
    SetSlrInventoryMode(i32),
    SetReadMode {
        mode: i32,
        start_addr: i32,
        word_count: i32,
        password: i32,
    },
    StartInventory,
    StopInventory,
    ReadFrame,
    HardwareVersion,
    FirmwareVersion,
    Temperature,
    ClearConfig,
}

/// How an injected failure manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The primitive returns `Ok(false)` (or a default value).
    Refuse,
    /// The primitive returns a communication error.
    Error(String),
}

#[derive(Debug)]
enum QueuedRead {
    Frame(RawFrame),
    Error(String),
}

#[derive(Debug)]
struct MockState {
    calls: Vec<ModuleCall>,
    reads: VecDeque<QueuedRead>,
    failures: HashMap<Primitive, Failure>,
    read_delay: Duration,
    powered: bool,
    inventory_running: bool,
    power_level: i32,
    frequency_mode: i32,
    session_mode: i32,
    hardware_version: String,
    firmware_version: String,
    temperature: String,
    created: usize,
    live: usize,
    creation_threads: Vec<ThreadId>,
    drop_threads: Vec<ThreadId>,
    last_config: Option<ModuleConfig>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            reads: VecDeque::new(),
            failures: HashMap::new(),
            read_delay: Duration::ZERO,
            powered: false,
            inventory_running: false,
            power_level: 30,
            frequency_mode: 0,
            session_mode: 0,
            hardware_version: "MOCK-HW-1.0".to_string(),
            firmware_version: "MOCK-FW-2.3".to_string(),
            temperature: "36".to_string(),
            created: 0,
            live: 0,
            creation_threads: Vec::new(),
            drop_threads: Vec::new(),
            last_config: None,
        }
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Factory producing [`MockModule`] handles.
///
/// # Examples
///
/// ```
/// use uhf_hardware::mock::MockFactory;
/// use uhf_hardware::traits::{ModuleFactory, UhfModule};
/// use uhf_hardware::{ModuleConfig, RawFrame};
///
/// let (factory, handle) = MockFactory::new();
/// let mut module = factory.create(&ModuleConfig::default()).unwrap();
///
/// handle.inject_frame(RawFrame::new("E200").with_rssi("C820"));
/// assert!(module.power_on().unwrap());
/// assert!(module.start_inventory().unwrap());
/// assert_eq!(module.read_frame().unwrap().unwrap().epc.as_deref(), Some("E200"));
/// ```
#[derive(Debug, Clone)]
pub struct MockFactory {
    state: Shared,
}

impl MockFactory {
    /// Create a factory and the handle controlling every module it creates.
    pub fn new() -> (Self, MockModuleHandle) {
        let state: Shared = Arc::default();
        (
            Self {
                state: state.clone(),
            },
            MockModuleHandle { state },
        )
    }
}

impl ModuleFactory for MockFactory {
    type Module = MockModule;

    fn create(&self, config: &ModuleConfig) -> Result<MockModule> {
        let mut state = lock(&self.state);
        if let Some(failure) = state.failures.get(&Primitive::Create) {
            let message = match failure {
                Failure::Refuse => "module not found".to_string(),
                Failure::Error(message) => message.clone(),
            };
            return Err(HardwareError::initialization_failed(message));
        }
        state.created += 1;
        state.live += 1;
        state.creation_threads.push(thread::current().id());
        state.last_config = Some(*config);
        Ok(MockModule {
            state: self.state.clone(),
        })
    }
}

/// Simulated module handle.
///
/// Tag frames are only handed out while an inventory is running, like the
/// real buffer, which fills during inventory only.
#[derive(Debug)]
pub struct MockModule {
    state: Shared,
}

impl MockModule {
    /// Record the call and return the injected failure for it, if any.
    fn enter(&self, call: ModuleCall, primitive: Primitive) -> (MutexGuard<'_, MockState>, Option<Failure>) {
        let mut state = lock(&self.state);
        state.calls.push(call);
        let failure = state.failures.get(&primitive).cloned();
        (state, failure)
    }

    fn flag(&mut self, call: ModuleCall, primitive: Primitive, apply: impl FnOnce(&mut MockState)) -> Result<bool> {
        let (mut state, failure) = self.enter(call, primitive);
        match failure {
            Some(Failure::Refuse) => Ok(false),
            Some(Failure::Error(message)) => Err(HardwareError::communication(message)),
            None => {
                apply(&mut state);
                Ok(true)
            }
        }
    }

    fn query<T>(&mut self, call: ModuleCall, primitive: Primitive, read: impl FnOnce(&MockState) -> T) -> Result<T> {
        let (state, failure) = self.enter(call, primitive);
        match failure {
            Some(Failure::Refuse) => Err(HardwareError::invalid_data("module returned no data")),
            Some(Failure::Error(message)) => Err(HardwareError::communication(message)),
            None => Ok(read(&state)),
        }
    }
}

impl UhfModule for MockModule {
    fn power_on(&mut self) -> Result<bool> {
        self.flag(ModuleCall::PowerOn, Primitive::PowerOn, |s| s.powered = true)
    }

    fn power_off(&mut self) -> Result<bool> {
        self.flag(ModuleCall::PowerOff, Primitive::PowerOff, |s| {
            s.powered = false;
            s.inventory_running = false;
        })
    }

    fn set_power(&mut self, level: i32) -> Result<bool> {
        self.flag(ModuleCall::SetPower(level), Primitive::SetPower, |s| {
            s.power_level = level
        })
    }

    fn power(&mut self) -> Result<i32> {
        self.query(ModuleCall::Power, Primitive::Power, |s| s.power_level)
    }

    fn set_frequency_mode(&mut self, mode: i32) -> Result<bool> {
        self.flag(
            ModuleCall::SetFrequencyMode(mode),
            Primitive::SetFrequencyMode,
            |s| s.frequency_mode = mode,
        )
    }

    fn frequency_mode(&mut self) -> Result<i32> {
        self.query(ModuleCall::FrequencyMode, Primitive::FrequencyMode, |s| {
            s.frequency_mode
        })
    }

    fn set_session_mode(&mut self, mode: i32) -> Result<bool> {
        self.flag(
            ModuleCall::SetSessionMode(mode),
            Primitive::SetSessionMode,
            |s| s.session_mode = mode,
        )
    }

    fn set_inventory_mode(&mut self, mode: i32, flag: bool) -> Result<bool> {
        self.flag(
            ModuleCall::SetInventoryMode { mode, flag },
            Primitive::SetInventoryMode,
            |_| {},
        )
    }

    fn set_slr_inventory_mode(&mut self, mode: i32) -> Result<bool> {
        self.flag(
            ModuleCall::SetSlrInventoryMode(mode),
            Primitive::SetSlrInventoryMode,
            |_| {},
        )
    }

    fn set_read_mode(
        &mut self,
        mode: i32,
        start_addr: i32,
        word_count: i32,
        password: i32,
    ) -> Result<bool> {
        self.flag(
            ModuleCall::SetReadMode {
                mode,
                start_addr,
                word_count,
                password,
            },
            Primitive::SetReadMode,
            |_| {},
        )
    }

    fn start_inventory(&mut self) -> Result<bool> {
        self.flag(ModuleCall::StartInventory, Primitive::StartInventory, |s| {
            s.inventory_running = true
        })
    }

    fn stop_inventory(&mut self) -> Result<bool> {
        self.flag(ModuleCall::StopInventory, Primitive::StopInventory, |s| {
            s.inventory_running = false
        })
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let delay = {
            let (state, failure) = self.enter(ModuleCall::ReadFrame, Primitive::ReadFrame);
            if let Some(Failure::Error(message)) = failure {
                return Err(HardwareError::communication(message));
            }
            state.read_delay
        };
        // Simulates the blocking serial round-trip
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let mut state = lock(&self.state);
        if !state.inventory_running {
            return Ok(None);
        }
        match state.reads.pop_front() {
            Some(QueuedRead::Frame(frame)) => Ok(Some(frame)),
            Some(QueuedRead::Error(message)) => Err(HardwareError::communication(message)),
            None => Ok(None),
        }
    }

    fn hardware_version(&mut self) -> Result<String> {
        self.query(ModuleCall::HardwareVersion, Primitive::HardwareVersion, |s| {
            s.hardware_version.clone()
        })
    }

    fn firmware_version(&mut self) -> Result<String> {
        self.query(ModuleCall::FirmwareVersion, Primitive::FirmwareVersion, |s| {
            s.firmware_version.clone()
        })
    }

    fn temperature(&mut self) -> Result<String> {
        self.query(ModuleCall::Temperature, Primitive::Temperature, |s| {
            s.temperature.clone()
        })
    }

    fn clear_config(&mut self) {
        let mut state = lock(&self.state);
        state.calls.push(ModuleCall::ClearConfig);
        state.power_level = MockState::default().power_level;
        state.frequency_mode = 0;
        state.session_mode = 0;
    }
}

impl Drop for MockModule {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.live = state.live.saturating_sub(1);
        state.drop_threads.push(thread::current().id());
    }
}

/// Handle for controlling and inspecting mock modules.
#[derive(Debug, Clone)]
pub struct MockModuleHandle {
    state: Shared,
}

impl MockModuleHandle {
    /// Queue a frame in the module buffer.
    pub fn inject_frame(&self, frame: RawFrame) {
        lock(&self.state).reads.push_back(QueuedRead::Frame(frame));
    }

    /// Queue a failing buffer read.
    pub fn inject_read_error(&self, message: impl Into<String>) {
        lock(&self.state)
            .reads
            .push_back(QueuedRead::Error(message.into()));
    }

    /// Number of queued frames and read errors not yet consumed.
    pub fn pending_reads(&self) -> usize {
        lock(&self.state).reads.len()
    }

    /// Make a primitive fail until [`clear_failures`](Self::clear_failures).
    pub fn fail(&self, primitive: Primitive, failure: Failure) {
        lock(&self.state).failures.insert(primitive, failure);
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failures.clear();
    }

    /// Block every buffer read for `delay`, like a slow serial link.
    pub fn set_read_delay(&self, delay: Duration) {
        lock(&self.state).read_delay = delay;
    }

    pub fn set_temperature(&self, temperature: impl Into<String>) {
        lock(&self.state).temperature = temperature.into();
    }

    /// Every primitive call so far, in order.
    pub fn calls(&self) -> Vec<ModuleCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &ModuleCall) -> usize {
        lock(&self.state).calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Handles created by the factory so far.
    pub fn created_count(&self) -> usize {
        lock(&self.state).created
    }

    /// Handles created and not yet dropped.
    pub fn live_count(&self) -> usize {
        lock(&self.state).live
    }

    pub fn creation_threads(&self) -> Vec<ThreadId> {
        lock(&self.state).creation_threads.clone()
    }

    pub fn drop_threads(&self) -> Vec<ThreadId> {
        lock(&self.state).drop_threads.clone()
    }

    /// Configuration passed to the most recent `create`.
    pub fn last_config(&self) -> Option<ModuleConfig> {
        lock(&self.state).last_config
    }

    pub fn is_powered(&self) -> bool {
        lock(&self.state).powered
    }

    pub fn is_inventory_running(&self) -> bool {
        lock(&self.state).inventory_running
    }

    pub fn power_level(&self) -> i32 {
        lock(&self.state).power_level
    }

    pub fn session_mode(&self) -> i32 {
        lock(&self.state).session_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powered_module() -> (MockModule, MockModuleHandle) {
        let (factory, handle) = MockFactory::new();
        let mut module = factory.create(&ModuleConfig::default()).unwrap();
        assert!(module.power_on().unwrap());
        (module, handle)
    }

    #[test]
    fn test_frames_only_during_inventory() {
        let (mut module, handle) = powered_module();
        handle.inject_frame(RawFrame::new("E200"));

        assert_eq!(module.read_frame().unwrap(), None);
        assert_eq!(handle.pending_reads(), 1);

        module.start_inventory().unwrap();
        assert_eq!(module.read_frame().unwrap(), Some(RawFrame::new("E200")));
        assert_eq!(module.read_frame().unwrap(), None);
    }

    #[test]
    fn test_injected_read_error() {
        let (mut module, handle) = powered_module();
        module.start_inventory().unwrap();
        handle.inject_read_error("crc mismatch");
        handle.inject_frame(RawFrame::new("E201"));

        assert!(module.read_frame().is_err());
        assert_eq!(module.read_frame().unwrap(), Some(RawFrame::new("E201")));
    }

    #[test]
    fn test_refuse_and_error_failures() {
        let (mut module, handle) = powered_module();

        handle.fail(Primitive::SetPower, Failure::Refuse);
        assert!(!module.set_power(20).unwrap());
        assert_eq!(handle.power_level(), 30);

        handle.fail(Primitive::Power, Failure::Error("timeout".into()));
        assert!(module.power().is_err());

        handle.clear_failures();
        assert!(module.set_power(20).unwrap());
        assert_eq!(module.power().unwrap(), 20);
    }

    #[test]
    fn test_call_log() {
        let (mut module, handle) = powered_module();
        module.set_read_mode(0, 0, 0, 0).unwrap();
        module.set_inventory_mode(1, false).unwrap();
        module.clear_config();

        assert_eq!(
            handle.calls(),
            vec![
                ModuleCall::PowerOn,
                ModuleCall::SetReadMode {
                    mode: 0,
                    start_addr: 0,
                    word_count: 0,
                    password: 0
                },
                ModuleCall::SetInventoryMode { mode: 1, flag: false },
                ModuleCall::ClearConfig,
            ]
        );
        assert_eq!(handle.count(&ModuleCall::PowerOn), 1);
    }

    #[test]
    fn test_create_failure() {
        let (factory, handle) = MockFactory::new();
        handle.fail(Primitive::Create, Failure::Error("no such device".into()));

        let err = factory.create(&ModuleConfig::default()).unwrap_err();
        assert!(matches!(err, HardwareError::InitializationFailed { .. }));
        assert_eq!(handle.created_count(), 0);
    }

    #[test]
    fn test_lifecycle_tracking() {
        let (factory, handle) = MockFactory::new();
        let module = factory.create(&ModuleConfig::new(uhf_core::ModuleType::Gx, true)).unwrap();

        assert_eq!(handle.created_count(), 1);
        assert_eq!(handle.live_count(), 1);
        assert_eq!(handle.creation_threads(), vec![thread::current().id()]);
        assert_eq!(handle.last_config().unwrap().baud_rate, 921_600);

        drop(module);
        assert_eq!(handle.live_count(), 0);
        assert_eq!(handle.drop_threads(), vec![thread::current().id()]);
    }

    #[test]
    fn test_boxed_module() {
        let (factory, handle) = MockFactory::new();
        let mut module: Box<dyn UhfModule> = Box::new(factory.create(&ModuleConfig::default()).unwrap());

        assert!(module.power_on().unwrap());
        assert_eq!(module.hardware_version().unwrap(), "MOCK-HW-1.0");
        handle.set_temperature("41");
        assert_eq!(module.temperature().unwrap(), "41");
    }
}
