//! Runner - Background Auto-Run Driver
//!
//! Owns a [`Simulator`] behind a mutex and polls it from one worker thread
//! until stopped, until the heap is `Complete`, or until a step fails. The
//! worker sleeps on a stop channel, so `stop()` returns without waiting out
//! a full poll interval.

use super::Simulator;
use crate::error::{Result, SimError};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Default pause between two polls of the simulator
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct Runner {
    sim: Arc<Mutex<Simulator>>,
    poll_interval: Duration,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Runner {
    pub fn new(sim: Simulator) -> Self {
        Self {
            sim: Arc::new(Mutex::new(sim)),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_tx: None,
            handle: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shared handle to the simulator
    pub fn simulator(&self) -> Arc<Mutex<Simulator>> {
        Arc::clone(&self.sim)
    }

    /// Whether the worker thread is alive
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arm the auto-run loop and spawn the worker
    ///
    /// Does nothing if the worker is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        self.reap();

        self.sim.lock().set_running(true);

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let sim = Arc::clone(&self.sim);
        let interval = self.poll_interval;

        let handle = std::thread::Builder::new()
            .name("gcsim-runner".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let mut sim = sim.lock();
                if !sim.is_running() {
                    break;
                }
                if let Err(err) = sim.poll() {
                    log::error!("auto-run stopped: {}", err);
                    sim.set_running(false);
                    break;
                }
            })
            .map_err(|e| SimError::InvalidState {
                expected: "runner thread".to_string(),
                actual: e.to_string(),
            })?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the worker and pause the simulator, cancelling any hold
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        self.reap();
        self.sim.lock().set_running(false);
    }

    /// Block until the worker exits on its own
    ///
    /// Returns immediately when no worker was started.
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("runner thread panicked");
            }
        }
        self.stop_tx = None;
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("runner thread panicked");
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}
