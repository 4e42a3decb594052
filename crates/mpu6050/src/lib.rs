//! Blocking driver for the InvenSense MPU-6050 6-axis IMU (accelerometer +
//! gyroscope + temperature) with gyroscope calibration and a
//! complementary-filter attitude estimate.
//!
//! The driver talks to the device through the blocking `embedded-hal` I2C
//! trait. A background thread keeps a fused orientation estimate up to date,
//! and any number of threads can read it without touching the bus.
//!
//! # Quick start (I2C)
//!
//! ```rust,no_run
//! use ph_mpu6050::Mpu6050;
//! # use embedded_hal::i2c::I2c;
//! #
//! # fn example<I2C: I2c + Send + 'static>(i2c: I2C) -> Result<(), ph_mpu6050::Error> {
//! let imu = Mpu6050::new_i2c(i2c)?;
//! imu.calibrate_sensors()?;
//! imu.start_updating()?;
//!
//! let angles = imu.filtered_angles();
//! println!("x={:.1} y={:.1} z={:.1}", angles.x, angles.y, angles.z);
//!
//! imu.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Fusion
//!
//! Each tick reads one accelerometer and gyroscope sample, derives tilt about
//! X and Y from gravity, integrates the offset-corrected angular rate and
//! blends the two with weight [`COMPLEMENTARY_ALPHA`]. Yaw is not observable
//! from the accelerometer; the filtered Z angle is pure gyro integration and
//! drifts.
//!
//! # Snapshots
//!
//! [`Mpu6050::snapshot`] returns the latest [`FusionState`] as an `Arc`. All
//! fields of one snapshot come from the same sample, and reading never blocks,
//! even while calibration holds the bus.
//!
//! # Teardown
//!
//! [`Mpu6050::close`] (also run on drop) stops the updater with a bounded
//! wait and releases the bus. If the worker is stuck inside a bus call, the
//! bus is dropped as soon as that call returns.
//!
//! # Scaling helpers
//!
//! Use [`accel_lsb_per_g`], [`gyro_lsb_per_dps`] and [`temperature_celsius`]
//! to convert raw counts to physical units.

#![deny(missing_docs)]
#![forbid(unsafe_code)]
// Clippy lint levels live here.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::float_cmp
)]

mod calibration;
mod cancel;
mod config;
mod data;
mod device;
mod driver;
mod error;
mod fusion;
mod interface;
mod register;
mod snapshot;
mod updater;

#[cfg(test)]
mod testing;

// Interface layer
pub use interface::{I2cInterface, Interface, Mpu6050Address};

// Configuration
pub use config::{AccelRange, Config, DlpfConfig, GyroRange};

// Driver
pub use driver::{Mpu6050, Mpu6050I2c};
pub use updater::{UpdaterConfig, UpdaterState};

// Calibration and fusion
pub use calibration::{CalibrationConfig, CalibrationOffsets};
pub use cancel::CancellationToken;
pub use fusion::{COMPLEMENTARY_ALPHA, FusionState, accel_angle_x, accel_angle_y};

// Data types
pub use data::{AccelRaw, Axes, GyroRaw, ScaledSample};
pub use data::{accel_lsb_per_g, gyro_lsb_per_dps, temperature_celsius};

// Errors
pub use error::{Error, ErrorKind};
