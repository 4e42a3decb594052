//! MPU-6050 register definitions.
//!
//! Only the registers the driver touches are listed, plus the bit masks used
//! to build their values. Addresses follow the MPU-6000/6050 register map
//! (RM-MPU-6000A-00, rev 4.2).

#![allow(dead_code)] // Bit masks are listed in full; not every field is written.

/// MPU-6050 register addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Sample rate divider.
    SmplrtDiv = 0x19,
    /// Configuration (FSYNC + digital low-pass filter).
    Config = 0x1A,
    /// Gyroscope configuration (self-test + full-scale range).
    GyroConfig = 0x1B,
    /// Accelerometer configuration (self-test + full-scale range).
    AccelConfig = 0x1C,
    /// Interrupt enable.
    IntEnable = 0x38,
    /// Accelerometer X-axis high byte (start of the 6-byte accel block).
    AccelXoutH = 0x3B,
    /// Temperature high byte.
    TempOutH = 0x41,
    /// Gyroscope X-axis high byte (start of the 6-byte gyro block).
    GyroXoutH = 0x43,
    /// Power management 1 (sleep, cycle, clock source).
    PwrMgmt1 = 0x6B,
    /// Power management 2 (per-axis standby).
    PwrMgmt2 = 0x6C,
    /// Device identifier.
    WhoAmI = 0x75,
}

impl Register {
    /// Returns the register address.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Expected values for WHO_AM_I.
pub mod who_am_i {
    /// WHO_AM_I reports bits [6:1] of the I2C address, independent of AD0.
    pub const EXPECTED: u8 = 0x68;
}

/// CONFIG register bits.
pub mod config {
    /// External frame sync mask.
    pub const EXT_SYNC_SET_MASK: u8 = 0b0011_1000;
    /// Digital low-pass filter selection mask.
    pub const DLPF_CFG_MASK: u8 = 0b0000_0111;
}

/// GYRO_CONFIG register bits.
pub mod gyro_config {
    /// X-axis self-test.
    pub const XG_ST: u8 = 0b1000_0000;
    /// Y-axis self-test.
    pub const YG_ST: u8 = 0b0100_0000;
    /// Z-axis self-test.
    pub const ZG_ST: u8 = 0b0010_0000;
    /// Full-scale selection mask.
    pub const FS_SEL_MASK: u8 = 0b0001_1000;
    /// Full-scale selection shift.
    pub const FS_SEL_SHIFT: u8 = 3;
}

/// ACCEL_CONFIG register bits.
pub mod accel_config {
    /// X-axis self-test.
    pub const XA_ST: u8 = 0b1000_0000;
    /// Y-axis self-test.
    pub const YA_ST: u8 = 0b0100_0000;
    /// Z-axis self-test.
    pub const ZA_ST: u8 = 0b0010_0000;
    /// Full-scale selection mask.
    pub const AFS_SEL_MASK: u8 = 0b0001_1000;
    /// Full-scale selection shift.
    pub const AFS_SEL_SHIFT: u8 = 3;
}

/// INT_ENABLE register bits.
pub mod int_enable {
    /// All interrupt sources disabled.
    pub const NONE: u8 = 0;
    /// FIFO overflow interrupt.
    pub const FIFO_OFLOW_EN: u8 = 0b0001_0000;
    /// I2C master interrupt sources.
    pub const I2C_MST_INT_EN: u8 = 0b0000_1000;
    /// Data ready interrupt.
    pub const DATA_RDY_EN: u8 = 0b0000_0001;
}

/// PWR_MGMT_1 register bits.
pub mod pwr_mgmt_1 {
    /// Device reset.
    pub const DEVICE_RESET: u8 = 0b1000_0000;
    /// Sleep mode.
    pub const SLEEP: u8 = 0b0100_0000;
    /// Low-power accelerometer cycle mode.
    pub const CYCLE: u8 = 0b0010_0000;
    /// Disable the temperature sensor.
    pub const TEMP_DIS: u8 = 0b0000_1000;
    /// Clock source selection mask (0 = internal 8 MHz oscillator).
    pub const CLKSEL_MASK: u8 = 0b0000_0111;
    /// Awake, internal oscillator.
    pub const WAKE: u8 = 0;
}

/// PWR_MGMT_2 register bits.
pub mod pwr_mgmt_2 {
    /// Low-power wake-up frequency mask.
    pub const LP_WAKE_CTRL_MASK: u8 = 0b1100_0000;
    /// Per-axis standby mask (XA, YA, ZA, XG, YG, ZG).
    pub const STBY_MASK: u8 = 0b0011_1111;
    /// All axes active.
    pub const ALL_ACTIVE: u8 = 0;
}
