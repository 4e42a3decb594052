//! Device core operations for the MPU-6050.

use log::{debug, warn};

use crate::config::{Config, DlpfConfig};
use crate::data::{AXIS_BLOCK_LEN, AccelRaw, Axes, GyroRaw, ScaledSample, temperature_celsius};
use crate::error::Error;
use crate::interface::Interface;
use crate::register::{Register, int_enable, pwr_mgmt_1, pwr_mgmt_2, who_am_i};

pub(crate) struct DeviceCore<I> {
    interface: I,
    config: Config,
}

impl<I> DeviceCore<I>
where
    I: Interface,
{
    pub(crate) const fn new(interface: I, config: Config) -> Self {
        Self { interface, config }
    }

    pub(crate) const fn config(&self) -> Config {
        self.config
    }

    /// Verifies the device and applies the stored configuration.
    pub(crate) fn initialize_hardware(&mut self) -> Result<(), Error> {
        self.verify_device()?;
        self.write_verified(Register::PwrMgmt1, pwr_mgmt_1::WAKE)?;
        self.write_verified(Register::SmplrtDiv, self.config.sample_rate_divider)?;
        self.write_verified(Register::Config, self.config.dlpf.config_value())?;
        self.write_verified(
            Register::GyroConfig,
            self.config.gyro_range.gyro_config_value(),
        )?;
        self.write_verified(
            Register::AccelConfig,
            self.config.accel_range.accel_config_value(),
        )?;
        self.write_verified(Register::IntEnable, int_enable::NONE)?;
        self.write_verified(Register::PwrMgmt2, pwr_mgmt_2::ALL_ACTIVE)?;
        debug!(
            "mpu6050 initialized: dlpf={:?} div={} accel={:?} gyro={:?}",
            self.config.dlpf,
            self.config.sample_rate_divider,
            self.config.accel_range,
            self.config.gyro_range
        );
        Ok(())
    }

    pub(crate) fn verify_device(&mut self) -> Result<(), Error> {
        let who = self.read_reg(Register::WhoAmI)?;
        if who != who_am_i::EXPECTED {
            if self.config.who_am_i_check {
                return Err(Error::WrongDevice(who));
            }
            warn!("WHO_AM_I is {who:#04x}, not an MPU-6050; continuing unchecked");
        }
        Ok(())
    }

    pub(crate) fn set_dlpf_config(&mut self, dlpf: DlpfConfig) -> Result<(), Error> {
        self.write_verified(Register::Config, dlpf.config_value())?;
        self.config.dlpf = dlpf;
        Ok(())
    }

    pub(crate) fn set_sample_rate_divider(&mut self, divider: u8) -> Result<(), Error> {
        self.write_verified(Register::SmplrtDiv, divider)?;
        self.config.sample_rate_divider = divider;
        Ok(())
    }

    pub(crate) fn read_accel_raw(&mut self) -> Result<AccelRaw, Error> {
        let mut buffer = [0u8; AXIS_BLOCK_LEN];
        self.read_regs(Register::AccelXoutH, &mut buffer)?;
        Ok(AccelRaw::from_be_bytes(buffer))
    }

    pub(crate) fn read_gyro_raw(&mut self) -> Result<GyroRaw, Error> {
        let mut buffer = [0u8; AXIS_BLOCK_LEN];
        self.read_regs(Register::GyroXoutH, &mut buffer)?;
        Ok(GyroRaw::from_be_bytes(buffer))
    }

    /// Reads acceleration in g.
    ///
    /// Z is reported with its sign inverted, so a board lying flat with the
    /// package facing up reads about -1 g on Z. Tilt angles are derived from
    /// this frame.
    pub(crate) fn read_scaled_accel(&mut self) -> Result<Axes, Error> {
        let raw = self.read_accel_raw()?;
        let accel = raw.scaled(self.config.accel_sensitivity());
        Ok(Axes::new(accel.x, accel.y, -accel.z))
    }

    /// Reads angular rate in deg/s, without bias correction.
    pub(crate) fn read_scaled_gyro(&mut self) -> Result<Axes, Error> {
        let raw = self.read_gyro_raw()?;
        Ok(raw.scaled(self.config.gyro_sensitivity()))
    }

    pub(crate) fn read_scaled_sample(&mut self) -> Result<ScaledSample, Error> {
        let accel = self.read_scaled_accel()?;
        let gyro = self.read_scaled_gyro()?;
        Ok(ScaledSample { accel, gyro })
    }

    pub(crate) fn read_temperature_celsius(&mut self) -> Result<f64, Error> {
        let mut buffer = [0u8; 2];
        self.read_regs(Register::TempOutH, &mut buffer)?;
        Ok(temperature_celsius(i16::from_be_bytes(buffer)))
    }

    pub(crate) fn release(self) -> I {
        self.interface
    }

    /// Writes `value` and reads it back; a mismatch is a hardware fault.
    pub(crate) fn write_verified(&mut self, reg: Register, value: u8) -> Result<(), Error> {
        self.write_reg(reg, value)?;
        let actual = self.read_reg(reg)?;
        if actual != value {
            return Err(Error::HardwareFault {
                register: reg.addr(),
                expected: value,
                actual,
            });
        }
        Ok(())
    }

    pub(crate) fn read_reg(&mut self, reg: Register) -> Result<u8, Error> {
        self.interface.read_reg(reg.addr())
    }

    pub(crate) fn read_regs(&mut self, reg: Register, buffer: &mut [u8]) -> Result<(), Error> {
        self.interface.read_regs(reg.addr(), buffer)
    }

    pub(crate) fn write_reg(&mut self, reg: Register, value: u8) -> Result<(), Error> {
        self.interface.write_reg(reg.addr(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccelRange, GyroRange};
    use crate::testing::MockInterface;

    #[test]
    fn initialize_writes_registers_in_order() {
        let interface = MockInterface::default();
        let config = Config::new()
            .with_sample_rate_divider(4)
            .with_accel_range(AccelRange::G4)
            .with_gyro_range(GyroRange::Dps500);
        let mut core = DeviceCore::new(interface.clone(), config);

        core.initialize_hardware().expect("initialize");

        let expected = [
            (Register::PwrMgmt1.addr(), 0x00),
            (Register::SmplrtDiv.addr(), 4),
            (Register::Config.addr(), 6),
            (Register::GyroConfig.addr(), 0x08),
            (Register::AccelConfig.addr(), 0x08),
            (Register::IntEnable.addr(), 0x00),
            (Register::PwrMgmt2.addr(), 0x00),
        ];
        assert_eq!(interface.writes(), expected);
        // WHO_AM_I plus one read-back per write.
        assert_eq!(interface.read_count(), 1 + expected.len());
    }

    #[test]
    fn initialize_rejects_unknown_device() {
        let interface = MockInterface::default().with_reg(Register::WhoAmI.addr(), 0x70);
        let mut core = DeviceCore::new(interface.clone(), Config::new());

        assert_eq!(core.initialize_hardware(), Err(Error::WrongDevice(0x70)));
        assert_eq!(interface.write_count(), 0);
    }

    #[test]
    fn write_verified_reports_mismatch() {
        let interface = MockInterface::default().with_stuck_reg(Register::Config.addr(), 0x00);
        let mut core = DeviceCore::new(interface, Config::new());

        let err = core.set_dlpf_config(DlpfConfig::Bw44Hz).unwrap_err();
        assert_eq!(
            err,
            Error::HardwareFault {
                register: Register::Config.addr(),
                expected: 3,
                actual: 0,
            }
        );
        assert_eq!(core.config().dlpf, DlpfConfig::DEFAULT);
    }

    #[test]
    fn scaled_reads_use_configured_sensitivity() {
        let interface = MockInterface::default();
        interface.set_accel([8192, -16384, 16384]);
        interface.set_gyro([262, 0, -131]);
        let mut core = DeviceCore::new(interface, Config::new());

        let sample = core.read_scaled_sample().expect("sample");
        assert_eq!(sample.accel, Axes::new(0.5, -1.0, -1.0));
        assert_eq!(sample.gyro, Axes::new(2.0, 0.0, -1.0));
    }

    #[test]
    fn accel_z_is_inverted_but_raw_is_not() {
        let interface = MockInterface::default();
        interface.set_accel([0, 0, 16384]);
        let mut core = DeviceCore::new(interface.clone(), Config::new());

        assert_eq!(core.read_accel_raw().expect("raw").z, 16384);
        assert_eq!(core.read_scaled_accel().expect("accel"), Axes::new(0.0, 0.0, -1.0));

        interface.set_accel([0, 0, -8192]);
        assert_eq!(core.read_scaled_accel().expect("accel"), Axes::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn temperature_reads_big_endian_word() {
        let interface = MockInterface::default();
        interface.set_temperature(-3400);
        let mut core = DeviceCore::new(interface, Config::new());

        let celsius = core.read_temperature_celsius().expect("temperature");
        assert!((celsius - 26.53).abs() < 1e-9);
    }
}
