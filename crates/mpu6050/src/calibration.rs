//! Gyroscope bias calibration.

use std::time::Duration;

use log::{debug, info};

use crate::cancel::CancellationToken;
use crate::device::DeviceCore;
use crate::error::Error;
use crate::interface::Interface;

/// Gyroscope bias offsets in deg/s, subtracted from every fused rate.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CalibrationOffsets {
    /// X-axis bias.
    pub x: f64,
    /// Y-axis bias.
    pub y: f64,
    /// Z-axis bias.
    pub z: f64,
}

impl CalibrationOffsets {
    /// Creates offsets from per-axis biases.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Timing of a calibration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationConfig {
    /// Time to let the device settle before sampling.
    pub settle: Duration,
    /// Number of gyroscope samples to average.
    pub samples: u32,
    /// Delay between consecutive samples.
    pub interval: Duration,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationConfig {
    /// Creates the default timing: 5 s settle, then 50 samples 100 ms apart.
    pub const fn new() -> Self {
        Self {
            settle: Duration::from_secs(5),
            samples: 50,
            interval: Duration::from_millis(100),
        }
    }

    /// Sets the settle time.
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Sets the number of samples.
    #[must_use]
    pub const fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Sets the delay between samples.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Averages stationary gyroscope samples into bias offsets.
///
/// A cancelled run returns [`Error::InterruptedOperation`] and yields no
/// partial result.
pub(crate) fn run_calibration<I>(
    core: &mut DeviceCore<I>,
    config: CalibrationConfig,
    token: &CancellationToken,
) -> Result<CalibrationOffsets, Error>
where
    I: Interface,
{
    if config.samples == 0 {
        return Err(Error::InvalidArgument("calibration needs at least one sample"));
    }

    info!("calibrating gyroscope, keep the device still");
    token.sleep(config.settle)?;

    let (mut sum_x, mut sum_y, mut sum_z) = (0.0, 0.0, 0.0);
    for index in 0..config.samples {
        if index > 0 {
            token.sleep(config.interval)?;
        } else {
            token.check()?;
        }
        let gyro = core.read_scaled_gyro()?;
        debug!("calibration sample {index}: {gyro:?}");
        sum_x += gyro.x;
        sum_y += gyro.y;
        sum_z += gyro.z;
    }

    let count = f64::from(config.samples);
    let offsets = CalibrationOffsets::new(sum_x / count, sum_y / count, sum_z / count);
    info!(
        "gyroscope offsets: x={:.3} y={:.3} z={:.3} deg/s",
        offsets.x, offsets.y, offsets.z
    );
    Ok(offsets)
}
