//! Scaling helpers for raw sensor data.

use crate::config::common::{AccelRange, GyroRange};

/// Temperature sensitivity in LSB per degree Celsius.
pub const TEMPERATURE_LSB_PER_CELSIUS: f64 = 340.0;
/// Temperature reading at a raw count of zero.
pub const TEMPERATURE_OFFSET_CELSIUS: f64 = 36.53;

/// Returns the accelerometer sensitivity in LSB/g.
pub const fn accel_lsb_per_g(range: AccelRange) -> f64 {
    match range {
        AccelRange::G2 => 16_384.0,
        AccelRange::G4 => 8_192.0,
        AccelRange::G8 => 4_096.0,
        AccelRange::G16 => 2_048.0,
    }
}

/// Returns the gyroscope sensitivity in LSB/(deg/s).
pub const fn gyro_lsb_per_dps(range: GyroRange) -> f64 {
    match range {
        GyroRange::Dps250 => 131.0,
        GyroRange::Dps500 => 65.5,
        GyroRange::Dps1000 => 32.8,
        GyroRange::Dps2000 => 16.4,
    }
}

/// Converts a raw TEMP_OUT count to degrees Celsius.
pub fn temperature_celsius(raw: i16) -> f64 {
    f64::from(raw) / TEMPERATURE_LSB_PER_CELSIUS + TEMPERATURE_OFFSET_CELSIUS
}
