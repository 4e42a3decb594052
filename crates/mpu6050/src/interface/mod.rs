//! Interface abstraction for register I/O.

pub(crate) mod address;
pub(crate) mod i2c;

pub use address::Mpu6050Address;
pub use i2c::I2cInterface;

use crate::error::Error;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Minimal blocking register I/O for the device core.
///
/// Every call blocks the calling thread until the bus transaction completes.
/// The driver serializes all calls behind one mutex, so implementations never
/// see concurrent access.
pub trait Interface: sealed::Sealed {
    /// Reads a single register.
    fn read_reg(&mut self, reg: u8) -> Result<u8, Error>;
    /// Reads a contiguous block of registers into `buffer`.
    fn read_regs(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error>;
    /// Writes a single register.
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error>;
}
