//! Background update worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};

use crate::cancel::CancellationToken;
use crate::error::Error;

const WORKER_NAME: &str = "mpu6050-updater";
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Lifecycle of the background updater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdaterState {
    /// No worker is running.
    Stopped,
    /// A worker is updating the fusion state.
    Running,
    /// Stop was requested; the worker has not exited yet.
    Stopping,
}

impl UpdaterState {
    const fn bits(self) -> u64 {
        match self {
            Self::Stopped => 0,
            Self::Running => 1,
            Self::Stopping => 2,
        }
    }

    const fn from_bits(bits: u64) -> Self {
        match bits {
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Background updater settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Upper bound on fusion ticks per second; `None` runs back to back.
    pub max_update_rate_hz: Option<u32>,
    /// How long stop and close wait for the worker to exit.
    pub join_timeout: Duration,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdaterConfig {
    /// Creates the default settings: unthrottled, 500 ms join timeout.
    pub const fn new() -> Self {
        Self {
            max_update_rate_hz: None,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    /// Caps the update rate. Pass `None` to run unthrottled.
    #[must_use]
    pub const fn with_max_update_rate_hz(mut self, rate_hz: Option<u32>) -> Self {
        self.max_update_rate_hz = rate_hz;
        self
    }

    /// Sets the bounded join timeout used on stop.
    #[must_use]
    pub const fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub(crate) fn validate(self) -> Result<(), Error> {
        if self.max_update_rate_hz == Some(0) {
            return Err(Error::InvalidArgument("max update rate must be non-zero"));
        }
        Ok(())
    }

    /// Minimum time between ticks, if throttled.
    pub(crate) fn period(self) -> Option<Duration> {
        self.max_update_rate_hz
            .filter(|rate| *rate > 0)
            .map(|rate| Duration::from_nanos(1_000_000_000 / u64::from(rate)))
    }
}

/// Updater state tagged with the worker generation that owns it.
///
/// A detached worker that exits late must not overwrite the state of a
/// worker started after it.
#[derive(Debug, Default)]
pub(crate) struct StatusCell(AtomicU64);

impl StatusCell {
    const STATE_BITS: u32 = 8;
    const STATE_MASK: u64 = (1 << Self::STATE_BITS) - 1;

    pub(crate) fn get(&self) -> UpdaterState {
        UpdaterState::from_bits(self.0.load(Ordering::Acquire) & Self::STATE_MASK)
    }

    /// Starts a new generation in the running state and returns its id.
    ///
    /// Callers serialize `begin` behind the worker slot lock.
    pub(crate) fn begin(&self) -> u64 {
        let prev = self.0.load(Ordering::Acquire);
        let generation = (prev >> Self::STATE_BITS).wrapping_add(1);
        self.0.store(Self::pack(generation, UpdaterState::Running), Ordering::Release);
        generation
    }

    /// Moves `generation` to `state`; ignored if a newer generation exists.
    pub(crate) fn set(&self, generation: u64, state: UpdaterState) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current >> Self::STATE_BITS == generation).then_some(Self::pack(generation, state))
            });
    }

    /// Returns a guard that moves `generation` to stopped when dropped,
    /// including during a panic.
    pub(crate) const fn stopped_on_exit(&self, generation: u64) -> StoppedOnExit<'_> {
        StoppedOnExit {
            status: self,
            generation,
        }
    }

    const fn pack(generation: u64, state: UpdaterState) -> u64 {
        (generation << Self::STATE_BITS) | state.bits()
    }
}

/// Marks one worker generation stopped on drop.
pub(crate) struct StoppedOnExit<'a> {
    status: &'a StatusCell,
    generation: u64,
}

impl Drop for StoppedOnExit<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("{WORKER_NAME} generation {} panicked", self.generation);
        }
        self.status.set(self.generation, UpdaterState::Stopped);
    }
}

/// Handle to a running worker thread.
pub(crate) struct Worker {
    handle: JoinHandle<()>,
    done: Receiver<()>,
    stop: CancellationToken,
    generation: u64,
}

impl Worker {
    /// Spawns the named worker thread running `body` until it returns.
    pub(crate) fn spawn<F>(generation: u64, body: F) -> Result<Self, Error>
    where
        F: FnOnce(&CancellationToken) + Send + 'static,
    {
        let stop = CancellationToken::new();
        let worker_stop = stop.clone();
        // The sender is dropped when the thread body returns, which is what
        // `stop` waits on.
        let (done_tx, done) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || {
                let _done = done_tx;
                body(&worker_stop);
            })
            .map_err(|err| {
                error!("failed to spawn {WORKER_NAME}: {err}");
                Error::ThreadSpawn
            })?;
        debug!("{WORKER_NAME} generation {generation} started");
        Ok(Self {
            handle,
            done,
            stop,
            generation,
        })
    }

    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once the thread has exited.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Requests a stop and waits up to `timeout` for the thread to exit.
    ///
    /// On timeout the still-running worker is handed back so the caller can
    /// keep track of it.
    pub(crate) fn stop(self, timeout: Duration) -> Result<(), Self> {
        self.stop.cancel();
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join();
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "{WORKER_NAME} did not stop within {timeout:?}; generation {} left running",
                    self.generation
                );
                Err(self)
            }
        }
    }

    fn join(self) {
        if self.handle.join().is_err() {
            error!("{WORKER_NAME} generation {} panicked", self.generation);
        }
        debug!("{WORKER_NAME} generation {} joined", self.generation);
    }
}
