//! I2C address definitions for the MPU-6050.

/// MPU-6050 I2C addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mpu6050Address {
    /// Primary address: 0x68 (AD0 = low).
    Primary,
    /// Secondary address: 0x69 (AD0 = high).
    Secondary,
}

impl Mpu6050Address {
    /// Returns the 7-bit I2C address.
    pub const fn addr(self) -> u8 {
        match self {
            Self::Primary => 0x68,
            Self::Secondary => 0x69,
        }
    }
}

impl Default for Mpu6050Address {
    fn default() -> Self {
        Self::Primary
    }
}
