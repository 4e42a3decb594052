//! Tilt monitor for an MPU-6050 on a Linux I2C bus.
//!
//! Opens the sensor on `/dev/i2c-1`, calibrates the gyroscope, starts the
//! background updater and logs the fused angles twice a second. Keep the
//! board still during the first ten seconds.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use linux_embedded_hal::I2cdev;
use log::{info, warn};
use ph_mpu6050::{Config, DlpfConfig, Mpu6050Address, Mpu6050I2c, UpdaterConfig};

/// I2C bus device node.
const I2C_BUS: &str = "/dev/i2c-1";
/// Interval between log lines.
const REPORT_INTERVAL: Duration = Duration::from_millis(500);
/// Number of reports before shutting down.
const REPORT_COUNT: u32 = 120;
/// Caps the updater so it does not saturate a core.
const MAX_UPDATE_RATE_HZ: u32 = 500;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let i2c = I2cdev::new(I2C_BUS).with_context(|| format!("opening {I2C_BUS}"))?;
    let config = Config::new().with_dlpf(DlpfConfig::Bw44Hz);
    let updater = UpdaterConfig::new().with_max_update_rate_hz(Some(MAX_UPDATE_RATE_HZ));
    let imu = Mpu6050I2c::with_i2c_config(i2c, Mpu6050Address::Primary, config, updater)
        .context("initializing MPU-6050")?;
    info!(
        "MPU-6050 ready on {I2C_BUS}, sample rate {} Hz",
        imu.sample_rate_hz()?
    );
    info!("temperature {:.1} C", imu.read_temperature_celsius()?);

    let offsets = imu.calibrate_sensors().context("calibrating gyroscope")?;
    info!(
        "gyro offsets x={:.3} y={:.3} z={:.3} deg/s",
        offsets.x, offsets.y, offsets.z
    );

    imu.start_updating().context("starting updater")?;
    for _ in 0..REPORT_COUNT {
        thread::sleep(REPORT_INTERVAL);
        if let Some(err) = imu.last_worker_error() {
            warn!("updater stopped: {err}");
            break;
        }
        let state = imu.snapshot();
        info!(
            "filtered x={:7.2} y={:7.2} z={:7.2} | accel x={:7.2} y={:7.2} | gyro z={:7.2} deg/s",
            state.filtered_angle.x,
            state.filtered_angle.y,
            state.filtered_angle.z,
            state.accel_angle.x,
            state.accel_angle.y,
            state.gyro_speed.z
        );
    }

    imu.close();
    Ok(())
}
