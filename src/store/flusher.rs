//! store::flusher
//!
//! Background thread that runs the store's flush on a fixed interval.
//!
//! The worker owns nothing but a flush callback and the receiving end of a
//! control channel. It wakes every `interval` via `recv_timeout`; a stop
//! message or a dropped sender ends the loop. The final flush on shutdown is
//! the store's job, not the worker's, so it also happens when no worker was
//! ever started.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use tracing::{debug, error};

/// Name given to the flush thread.
pub const FLUSH_THREAD_NAME: &str = "claim-flush";

enum Control {
    Stop,
}

/// Handle to a running flush thread.
#[derive(Debug)]
pub struct FlushWorker {
    control: Option<Sender<Control>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl FlushWorker {
    /// Spawn the worker. `flush` is called once per interval.
    pub fn spawn<F>(interval: Duration, mut flush: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (control_tx, control_rx) = crossbeam_channel::bounded::<Control>(1);

        let handle = thread::Builder::new()
            .name(FLUSH_THREAD_NAME.into())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "flush worker started");
                loop {
                    match control_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => flush(),
                        Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("flush worker stopped");
            })?;

        Ok(Self {
            control: Some(control_tx),
            handle: Some(handle),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it. Safe to call more than once.
    ///
    /// A flush already in progress is allowed to finish.
    pub fn stop(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Stop);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("flush worker panicked");
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
