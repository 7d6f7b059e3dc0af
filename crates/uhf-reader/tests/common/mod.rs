//! Common test utilities for reader integration tests.
//!
//! Every helper builds a [`UhfReader`] over the simulated module with a
//! zero settle period and a short poll interval, so lifecycle tests run in
//! milliseconds.

#![allow(dead_code)]

use std::time::Duration;

use tokio::time::timeout;
use uhf_hardware::mock::{MockFactory, MockModuleHandle};
use uhf_reader::{ReaderConfig, TagReading, TagStream, UhfReader};

/// Poll interval used by test readers.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Upper bound for waiting on a reading.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Standard test EPCs.
pub const EPC_1: &str = "E28011606000020A1B2C3D4E";
pub const EPC_2: &str = "E28011606000020A1B2C3D4F";

pub fn test_config() -> ReaderConfig {
    ReaderConfig::default()
        .with_settle_period(Duration::ZERO)
        .with_poll_interval(POLL_INTERVAL)
}

/// Reader over a fresh mock module.
pub fn create_reader() -> (UhfReader<MockFactory>, MockModuleHandle) {
    create_reader_with(test_config())
}

pub fn create_reader_with(config: ReaderConfig) -> (UhfReader<MockFactory>, MockModuleHandle) {
    let (factory, handle) = MockFactory::new();
    let reader = UhfReader::new(factory, config).expect("reader creation failed");
    (reader, handle)
}

/// Reader that is powered on and scanning.
pub async fn create_scanning_reader() -> (UhfReader<MockFactory>, MockModuleHandle) {
    let (reader, handle) = create_reader();
    assert!(reader.power_on().await.unwrap());
    assert!(reader.start_inventory(0).await.unwrap());
    (reader, handle)
}

/// Next reading, failing the test if none arrives in time.
pub async fn recv_reading(stream: &mut TagStream) -> TagReading {
    timeout(RECV_TIMEOUT, stream.recv())
        .await
        .expect("timed out waiting for a reading")
        .expect("tag stream ended")
}

/// Assert that the stream has ended (the subscriber was replaced or removed).
pub async fn assert_stream_ended(stream: &mut TagStream) {
    let next = timeout(RECV_TIMEOUT, stream.recv())
        .await
        .expect("timed out waiting for the stream to end");
    assert!(next.is_none(), "stream still open, got {next:?}");
}

/// Let the poll loop run a few iterations.
pub async fn let_poll_run() {
    tokio::time::sleep(POLL_INTERVAL * 6).await;
}
