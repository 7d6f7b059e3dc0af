//! Single-subscriber delivery of tag readings.
//!
//! The poll loop hands every decoded reading to the [`EventSink`], which
//! forwards it to the current subscriber's [`TagStream`] over a bounded
//! channel. The producer never blocks: a full channel drops the reading.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uhf_core::TagReading;

/// Outcome of one [`EventSink::deliver`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nobody is listening; the reading was discarded.
    NoSubscriber,
    /// The subscriber is not keeping up; the reading was discarded.
    Full,
    /// The subscriber went away; the slot has been cleared.
    Closed,
}

type Slot = Arc<Mutex<Option<mpsc::Sender<TagReading>>>>;

/// The subscriber slot, shared between the reader and its poll task.
#[derive(Debug, Clone)]
pub struct EventSink {
    slot: Slot,
    capacity: usize,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            capacity: capacity.max(1),
        }
    }

    /// Install a new subscriber, replacing and closing any previous one.
    pub fn subscribe(&self) -> TagStream {
        let (tx, rx) = mpsc::channel(self.capacity);
        if self.lock().replace(tx).is_some() {
            debug!("Replaced previous tag stream subscriber");
        }
        TagStream { rx }
    }

    /// Remove the subscriber. Returns whether one was installed.
    pub fn unsubscribe(&self) -> bool {
        self.lock().take().is_some()
    }

    /// Whether a live subscriber is installed.
    pub fn has_subscriber(&self) -> bool {
        self.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Forward one reading to the subscriber without blocking.
    pub fn deliver(&self, reading: TagReading) -> Delivery {
        let mut slot = self.lock();
        let Some(tx) = slot.as_ref() else {
            return Delivery::NoSubscriber;
        };

        match tx.try_send(reading) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(reading)) => {
                warn!(epc = %reading.epc, "Tag stream full, dropping reading");
                Delivery::Full
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Tag stream closed by subscriber");
                *slot = None;
                Delivery::Closed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<mpsc::Sender<TagReading>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The receiving end handed to a subscriber.
///
/// Ends (yields `None`) when the subscriber is replaced or removed.
///
/// ```
/// use futures::StreamExt;
/// use uhf_core::TagReading;
/// use uhf_reader::sink::EventSink;
///
/// # futures::executor::block_on(async {
/// let sink = EventSink::new(8);
/// let stream = sink.subscribe();
/// sink.deliver(TagReading::new("E200", -60).unwrap());
/// sink.unsubscribe();
///
/// let epcs: Vec<String> = stream.map(|r| r.epc).collect().await;
/// assert_eq!(epcs, vec!["E200".to_string()]);
/// # });
/// ```
#[derive(Debug)]
pub struct TagStream {
    rx: mpsc::Receiver<TagReading>,
}

impl TagStream {
    /// Wait for the next reading.
    pub async fn recv(&mut self) -> Option<TagReading> {
        self.rx.recv().await
    }

    /// Take a buffered reading without waiting.
    pub fn try_recv(&mut self) -> Option<TagReading> {
        self.rx.try_recv().ok()
    }
}

impl Stream for TagStream {
    type Item = TagReading;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
