//! Configuration helpers for the MPU-6050.

pub(crate) mod common;

pub use common::{AccelRange, DlpfConfig, GyroRange};

use crate::data::scale::{accel_lsb_per_g, gyro_lsb_per_dps};

/// MPU-6050 configuration settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Digital low-pass filter setting.
    pub dlpf: DlpfConfig,
    /// Sample rate divider (SMPLRT_DIV).
    pub sample_rate_divider: u8,
    /// Accelerometer full-scale range.
    pub accel_range: AccelRange,
    /// Gyroscope full-scale range.
    pub gyro_range: GyroRange,
    /// Reject devices whose `WHO_AM_I` is not `0x68` when opening.
    pub who_am_i_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates the default configuration (DLPF 6, divider 0, +/-2 g,
    /// +/-250 deg/s, `WHO_AM_I` checked).
    pub const fn new() -> Self {
        Self {
            dlpf: DlpfConfig::DEFAULT,
            sample_rate_divider: 0,
            accel_range: AccelRange::G2,
            gyro_range: GyroRange::Dps250,
            who_am_i_check: true,
        }
    }

    /// Sets the digital low-pass filter.
    #[must_use]
    pub const fn with_dlpf(mut self, dlpf: DlpfConfig) -> Self {
        self.dlpf = dlpf;
        self
    }

    /// Sets the sample rate divider.
    #[must_use]
    pub const fn with_sample_rate_divider(mut self, divider: u8) -> Self {
        self.sample_rate_divider = divider;
        self
    }

    /// Sets the accelerometer range.
    #[must_use]
    pub const fn with_accel_range(mut self, range: AccelRange) -> Self {
        self.accel_range = range;
        self
    }

    /// Sets the gyroscope range.
    #[must_use]
    pub const fn with_gyro_range(mut self, range: GyroRange) -> Self {
        self.gyro_range = range;
        self
    }

    /// Enables or disables the `WHO_AM_I` identity check on open.
    ///
    /// Disable it for compatible parts that report another identifier.
    #[must_use]
    pub const fn with_who_am_i_check(mut self, enabled: bool) -> Self {
        self.who_am_i_check = enabled;
        self
    }

    /// Returns the sensor sample rate in hertz.
    ///
    /// `gyro_output_rate / (1 + SMPLRT_DIV)`, where the gyro output rate is
    /// 8 kHz with the filter bypassed (DLPF 0 or 7) and 1 kHz otherwise.
    pub fn sample_rate_hz(self) -> f64 {
        f64::from(self.dlpf.gyro_output_rate_hz()) / (1.0 + f64::from(self.sample_rate_divider))
    }

    /// Accelerometer sensitivity in LSB/g.
    pub fn accel_sensitivity(self) -> f64 {
        accel_lsb_per_g(self.accel_range)
    }

    /// Gyroscope sensitivity in LSB/(deg/s).
    pub fn gyro_sensitivity(self) -> f64 {
        gyro_lsb_per_dps(self.gyro_range)
    }
}
