//! MPU-6050 driver implementation.
//!
//! All register access goes through one mutex, shared by caller threads and
//! the background updater. The fused state is published through a separate
//! lock-free cell, so snapshot readers never wait on the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};

use crate::calibration::{CalibrationConfig, CalibrationOffsets, run_calibration};
use crate::cancel::CancellationToken;
use crate::config::{Config, DlpfConfig};
use crate::data::Axes;
use crate::device::DeviceCore;
use crate::error::Error;
use crate::fusion::{FusionEngine, FusionState};
use crate::interface::{I2cInterface, Interface, Mpu6050Address};
use crate::snapshot::SnapshotCell;
use crate::updater::{StatusCell, UpdaterConfig, UpdaterState, Worker};

/// MPU-6050 6-axis IMU driver with a background attitude updater.
///
/// Every method takes `&self`; the driver can be shared between threads.
pub struct Mpu6050<I>
where
    I: Interface + Send + 'static,
{
    shared: Arc<Shared<I>>,
    worker: Mutex<Option<Worker>>,
    updater_config: UpdaterConfig,
}

/// I2C type alias for the MPU-6050 driver.
pub type Mpu6050I2c<I2C> = Mpu6050<I2cInterface<I2C>>;

struct DeviceState<I> {
    core: DeviceCore<I>,
    engine: FusionEngine,
    offsets: CalibrationOffsets,
}

struct Shared<I> {
    device: Mutex<Option<DeviceState<I>>>,
    snapshot: SnapshotCell,
    lifetime: CancellationToken,
    closed: AtomicBool,
    status: StatusCell,
    last_error: Mutex<Option<Error>>,
}

impl<I> Shared<I>
where
    I: Interface,
{
    /// Runs `op` under the device lock.
    ///
    /// Once the device is closed, whichever caller releases the lock last
    /// drops the bus.
    fn with_device<R>(
        &self,
        op: impl FnOnce(&mut DeviceState<I>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let result = {
            let mut guard = self.device.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_mut() {
                Some(state) => op(state),
                None => Err(Error::Closed),
            }
        };
        if self.closed.load(Ordering::SeqCst) && self.try_take_device().is_some() {
            debug!("bus released after close");
        }
        result
    }

    fn try_take_device(&self) -> Option<DeviceState<I>> {
        match self.device.try_lock() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Reads one sample, advances the filter and publishes the result.
    fn tick(&self, clock_start: Option<Instant>) -> Result<Arc<FusionState>, Error> {
        self.with_device(|device| {
            let sample = device.core.read_scaled_sample()?;
            if let Some(start) = clock_start {
                device.engine.restart_clock(start);
            }
            let state = device.engine.tick(sample, device.offsets, Instant::now());
            Ok(self.snapshot.publish(state))
        })
    }

    fn record_error(&self, err: Error) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    fn clear_error(&self) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn run_updater<I>(
    shared: &Shared<I>,
    stop: &CancellationToken,
    generation: u64,
    started: Instant,
    period: Option<Duration>,
) where
    I: Interface,
{
    let _stopped = shared.status.stopped_on_exit(generation);
    let mut clock_start = Some(started);
    while !stop.is_cancelled() {
        match shared.tick(clock_start.take()) {
            Ok(_) => {}
            Err(Error::Closed) => {
                debug!("device closed; updater exiting");
                break;
            }
            Err(err) => {
                error!("fusion update failed, stopping updater: {err}");
                shared.record_error(err);
                break;
            }
        }
        if let Some(period) = period
            && stop.sleep(period).is_err()
        {
            break;
        }
    }
}

impl<I2C> Mpu6050<I2cInterface<I2C>>
where
    I2C: I2c + Send + 'static,
{
    /// Opens the device at the primary address with default settings.
    pub fn new_i2c(i2c: I2C) -> Result<Self, Error> {
        Self::new(I2cInterface::primary(i2c))
    }

    /// Opens the device at `address` with a custom configuration.
    pub fn with_i2c_config(
        i2c: I2C,
        address: Mpu6050Address,
        config: Config,
        updater_config: UpdaterConfig,
    ) -> Result<Self, Error> {
        Self::with_config(
            I2cInterface::new(i2c, address.addr()),
            config,
            updater_config,
        )
    }

    /// Closes the device and hands back the I2C bus, if it could be reclaimed.
    pub fn release_i2c(self) -> Option<I2C> {
        self.release().map(I2cInterface::release)
    }
}

impl<I> Mpu6050<I>
where
    I: Interface + Send + 'static,
{
    /// Opens the device with default settings.
    pub fn new(interface: I) -> Result<Self, Error> {
        Self::with_config(interface, Config::default(), UpdaterConfig::default())
    }

    /// Opens the device and applies `config` to the hardware.
    ///
    /// `WHO_AM_I` is read first. Unless the check is turned off with
    /// [`Config::with_who_am_i_check`], any value other than `0x68` fails
    /// with [`Error::WrongDevice`] before anything is written. Some clone
    /// parts report `0x70`, `0x72` or `0x98` and need the check disabled.
    ///
    /// Every register write is read back; a mismatch fails with
    /// [`Error::HardwareFault`].
    pub fn with_config(
        interface: I,
        config: Config,
        updater_config: UpdaterConfig,
    ) -> Result<Self, Error> {
        updater_config.validate()?;
        let mut core = DeviceCore::new(interface, config);
        core.initialize_hardware()?;
        info!(
            "mpu6050 ready, sample rate {} Hz",
            core.config().sample_rate_hz()
        );

        let device = DeviceState {
            core,
            engine: FusionEngine::new(),
            offsets: CalibrationOffsets::default(),
        };
        Ok(Self {
            shared: Arc::new(Shared {
                device: Mutex::new(Some(device)),
                snapshot: SnapshotCell::default(),
                lifetime: CancellationToken::new(),
                closed: AtomicBool::new(false),
                status: StatusCell::default(),
                last_error: Mutex::new(None),
            }),
            worker: Mutex::new(None),
            updater_config,
        })
    }

    /// Returns the current sensor configuration.
    pub fn config(&self) -> Result<Config, Error> {
        self.shared.with_device(|device| Ok(device.core.config()))
    }

    /// Returns the background updater settings.
    pub const fn updater_config(&self) -> UpdaterConfig {
        self.updater_config
    }

    /// Sets the digital low-pass filter (0..=7).
    ///
    /// Out-of-range values fail with [`Error::InvalidArgument`] before any
    /// register access.
    pub fn set_dlpf_config(&self, value: u8) -> Result<(), Error> {
        let dlpf = DlpfConfig::try_from(value)?;
        self.shared
            .with_device(|device| device.core.set_dlpf_config(dlpf))?;
        debug!("dlpf set to {dlpf:?}");
        Ok(())
    }

    /// Sets the sample rate divider.
    pub fn set_sample_rate_divider(&self, divider: u8) -> Result<(), Error> {
        self.shared
            .with_device(|device| device.core.set_sample_rate_divider(divider))?;
        debug!("sample rate divider set to {divider}");
        Ok(())
    }

    /// Returns the sensor sample rate in hertz.
    pub fn sample_rate_hz(&self) -> Result<f64, Error> {
        Ok(self.config()?.sample_rate_hz())
    }

    /// Reads acceleration in g. No calibration offsets are applied.
    pub fn read_scaled_accelerometer_values(&self) -> Result<Axes, Error> {
        self.shared
            .with_device(|device| device.core.read_scaled_accel())
    }

    /// Reads angular rate in deg/s. No calibration offsets are applied.
    pub fn read_scaled_gyroscope_values(&self) -> Result<Axes, Error> {
        self.shared.with_device(|device| device.core.read_scaled_gyro())
    }

    /// Reads the die temperature in degrees Celsius.
    pub fn read_temperature_celsius(&self) -> Result<f64, Error> {
        self.shared
            .with_device(|device| device.core.read_temperature_celsius())
    }

    /// Estimates gyroscope bias with the default timing (about 10 s).
    ///
    /// The device lock is held for the whole run, which pauses the
    /// background updater. [`close`](Self::close) interrupts the run.
    pub fn calibrate_sensors(&self) -> Result<CalibrationOffsets, Error> {
        self.calibrate_sensors_with(CalibrationConfig::default(), &self.shared.lifetime)
    }

    /// Estimates gyroscope bias with custom timing, cancellable via `token`.
    ///
    /// On success the offsets replace the previous ones. An interrupted run
    /// leaves the previous offsets in place.
    pub fn calibrate_sensors_with(
        &self,
        config: CalibrationConfig,
        token: &CancellationToken,
    ) -> Result<CalibrationOffsets, Error> {
        self.shared.with_device(|device| {
            let offsets = run_calibration(&mut device.core, config, token)?;
            device.offsets = offsets;
            Ok(offsets)
        })
    }

    /// Returns the gyroscope offsets applied during fusion.
    pub fn calibration_offsets(&self) -> Result<CalibrationOffsets, Error> {
        self.shared.with_device(|device| Ok(device.offsets))
    }

    /// Runs one fusion tick on the calling thread and returns the new state.
    ///
    /// The returned state is the one this call computed, even if the
    /// background updater has published a newer one since.
    pub fn update(&self) -> Result<Arc<FusionState>, Error> {
        self.shared.tick(None)
    }

    /// Returns the latest fused state. Never blocks.
    pub fn snapshot(&self) -> Arc<FusionState> {
        self.shared.snapshot.load()
    }

    /// Accelerometer tilt angles in degrees.
    pub fn accel_angles(&self) -> Axes {
        self.snapshot().accel_angle
    }

    /// Integrated gyroscope angles in degrees.
    pub fn gyro_angles(&self) -> Axes {
        self.snapshot().gyro_angle
    }

    /// Complementary-filter angles in degrees.
    pub fn filtered_angles(&self) -> Axes {
        self.snapshot().filtered_angle
    }

    /// Offset-corrected angular rates in deg/s.
    pub fn gyro_angular_speeds(&self) -> Axes {
        self.snapshot().gyro_speed
    }

    /// Starts the background updater. Does nothing if it is already running.
    ///
    /// If an earlier worker is still winding down, waits for it up to the
    /// join timeout. A worker that is still alive after that (for example
    /// one stuck in a bus call after [`stop_updating`](Self::stop_updating)
    /// timed out) fails the start with [`Error::TeardownTimeout`], and no
    /// second worker is spawned.
    pub fn start_updating(&self) -> Result<(), Error> {
        if self.shared.lifetime.is_cancelled() {
            return Err(Error::Closed);
        }
        let mut slot = self.lock_worker();
        if let Some(previous) = slot.take() {
            if self.shared.status.get() == UpdaterState::Running && !previous.is_finished() {
                *slot = Some(previous);
                return Ok(());
            }
            let timeout = self.updater_config.join_timeout;
            if let Err(previous) = previous.stop(timeout) {
                warn!("previous updater still running; not starting another");
                *slot = Some(previous);
                return Err(Error::TeardownTimeout(timeout));
            }
        }

        self.shared.clear_error();
        let generation = self.shared.status.begin();
        let shared = Arc::clone(&self.shared);
        let started = Instant::now();
        let period = self.updater_config.period();
        let worker = Worker::spawn(generation, move |stop| {
            run_updater(&shared, stop, generation, started, period);
        });
        match worker {
            Ok(worker) => {
                *slot = Some(worker);
                info!("background updater started");
                Ok(())
            }
            Err(err) => {
                self.shared.status.set(generation, UpdaterState::Stopped);
                Err(err)
            }
        }
    }

    /// Stops the background updater and waits for it to exit.
    ///
    /// Fails with [`Error::TeardownTimeout`] if the worker does not exit
    /// within the join timeout. The worker then stays in the stopping state
    /// and exits on its own; calling this again waits for it once more.
    pub fn stop_updating(&self) -> Result<(), Error> {
        let mut slot = self.lock_worker();
        let Some(worker) = slot.take() else {
            return Ok(());
        };
        let generation = worker.generation();
        let timeout = self.updater_config.join_timeout;
        self.shared.status.set(generation, UpdaterState::Stopping);
        if let Err(worker) = worker.stop(timeout) {
            *slot = Some(worker);
            return Err(Error::TeardownTimeout(timeout));
        }
        self.shared.status.set(generation, UpdaterState::Stopped);
        info!("background updater stopped");
        Ok(())
    }

    /// Returns the background updater state.
    pub fn updater_state(&self) -> UpdaterState {
        self.shared.status.get()
    }

    /// Returns the error that stopped the last worker, if any.
    pub fn last_worker_error(&self) -> Option<Error> {
        *self
            .shared
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stops the updater and releases the bus. Safe to call more than once.
    ///
    /// Returns within the join timeout even if a bus call is stuck; the bus
    /// is then dropped as soon as that call returns. The last snapshot stays
    /// readable.
    pub fn close(&self) {
        drop(self.shutdown());
    }

    /// Closes the device and hands back the interface, if it could be
    /// reclaimed.
    pub fn release(self) -> Option<I> {
        self.shutdown().map(|device| device.core.release())
    }

    fn shutdown(&self) -> Option<DeviceState<I>> {
        self.shared.lifetime.cancel();
        if let Err(err) = self.stop_updating() {
            warn!("closing with the updater still running: {err}");
        }
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return None;
        }
        let device = self.shared.try_take_device();
        if device.is_some() {
            info!("mpu6050 closed");
        } else {
            warn!("mpu6050 closed while the bus is busy; releasing it after the pending call");
        }
        device
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I> Drop for Mpu6050<I>
where
    I: Interface + Send + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}
