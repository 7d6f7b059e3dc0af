//! Mock device implementations for testing and development.
//!
//! This module provides a simulated UHF module that can be controlled
//! programmatically without requiring physical hardware.

pub mod module;

pub use module::{Failure, MockFactory, MockModule, MockModuleHandle, ModuleCall, Primitive};
