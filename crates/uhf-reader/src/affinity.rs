//! Dedicated thread for module handle creation and destruction.
//!
//! Vendor libraries bind an internal timer to the thread that creates a
//! handle. [`AffinityThread`] is a single long-lived OS thread, started
//! with the reader, on which every handle is created and dropped. Work is
//! submitted as boxed closures; results come back over a oneshot channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::oneshot;
use tracing::{debug, error, warn};
use uhf_core::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A named worker thread that runs submitted jobs in order.
///
/// Dropping it closes the job queue, lets queued jobs finish and joins the
/// thread.
pub struct AffinityThread {
    sender: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    id: ThreadId,
    name: String,
}

impl AffinityThread {
    /// Start the thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::Init` if the OS refuses to spawn a thread.
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                for job in receiver {
                    // A panicking job drops its result sender, which the
                    // submitter observes as a platform error.
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("Affinity job panicked");
                    }
                }
                debug!("Affinity thread exiting");
            })
            .map_err(|e| Error::Init(format!("failed to spawn affinity thread: {e}")))?;

        let id = handle.thread().id();
        debug!(thread = %name, "Affinity thread started");

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            id,
            name,
        })
    }

    pub fn thread_id(&self) -> ThreadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `job` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Platform` if the thread has stopped.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::Platform("affinity thread stopped".to_string()))?;
        sender
            .send(Box::new(job))
            .map_err(|_| Error::Platform("affinity thread stopped".to_string()))
    }

    /// Run `job` on the thread and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Platform` if the thread has stopped or the job
    /// panicked.
    pub async fn run<R, F>(&self, job: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(move || {
            let _ = tx.send(job());
        })?;
        rx.await
            .map_err(|_| Error::Platform("affinity job did not complete".to_string()))
    }
}

impl Drop for AffinityThread {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if thread::current().id() == self.id {
                warn!("Affinity thread dropped from itself, not joining");
                return;
            }
            if handle.join().is_err() {
                error!(thread = %self.name, "Affinity thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for AffinityThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityThread")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}
