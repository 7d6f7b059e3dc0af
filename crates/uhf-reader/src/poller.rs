//! The tag polling loop.
//!
//! While an inventory session is Scanning, one task repeatedly pulls a
//! buffered frame from the module, decodes it and hands the reading to the
//! [`EventSink`]. The device lock is taken for the read only, never across
//! the sleep between reads, so commands interleave freely with polling.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uhf_core::SessionState;
use uhf_hardware::{RawFrame, UhfModule};

use crate::decoder::decode;
use crate::lock::DeviceLock;
use crate::sink::{Delivery, EventSink};

/// Counters of one polling session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStats {
    pub iterations: u64,
    /// Iterations without a hardware read (no subscriber, or not scanning).
    pub skipped: u64,
    pub frames: u64,
    pub delivered: u64,
    /// Readings lost to a full or closed subscriber channel.
    pub dropped: u64,
    pub rejected: u64,
    pub read_errors: u64,
}

/// Handle to a running poll task.
#[derive(Debug)]
pub(crate) struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<PollStats>,
}

impl Poller {
    pub fn spawn<M: UhfModule + 'static>(
        device: DeviceLock<M>,
        sink: EventSink,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(device, sink, interval, cancel.clone()));
        Self { cancel, task }
    }

    /// Request the loop to exit without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel the loop and wait until it has exited.
    pub async fn stop(self) -> PollStats {
        self.cancel.cancel();
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Tag polling task failed");
                PollStats::default()
            }
        }
    }
}

enum Read {
    Skipped,
    Empty,
    Frame(RawFrame),
    Failed(String),
}

async fn poll_loop<M: UhfModule + 'static>(
    device: DeviceLock<M>,
    sink: EventSink,
    interval: Duration,
    cancel: CancellationToken,
) -> PollStats {
    let mut stats = PollStats::default();
    debug!(interval_ms = interval.as_millis() as u64, "Tag polling started");

    while !cancel.is_cancelled() {
        stats.iterations += 1;

        let subscribed = sink.has_subscriber();
        let read = device
            .run(move |core| {
                if !subscribed || core.state.session() != SessionState::Scanning {
                    return Read::Skipped;
                }
                match core.module.as_mut().map(|module| module.read_frame()) {
                    None => Read::Skipped,
                    Some(Ok(None)) => Read::Empty,
                    Some(Ok(Some(frame))) => Read::Frame(frame),
                    Some(Err(e)) => Read::Failed(e.to_string()),
                }
            })
            .await
            .unwrap_or_else(|e| Read::Failed(e.to_string()));

        match read {
            Read::Skipped => stats.skipped += 1,
            Read::Empty => {}
            Read::Failed(message) => {
                warn!(error = %message, "Failed to read tag buffer");
                stats.read_errors += 1;
            }
            Read::Frame(frame) => {
                stats.frames += 1;
                match decode(&frame) {
                    Ok(reading) => match sink.deliver(reading) {
                        Delivery::Delivered => stats.delivered += 1,
                        Delivery::NoSubscriber => {}
                        Delivery::Full | Delivery::Closed => stats.dropped += 1,
                    },
                    Err(rejection) => {
                        debug!(?frame, %rejection, "Rejected tag frame");
                        stats.rejected += 1;
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(?stats, "Tag polling stopped");
    stats
}
