//! Error type for the MPU-6050 driver.

use std::time::Duration;

/// Error type for MPU-6050 operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A precondition was violated before any register I/O was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The device has been closed and its bus released.
    #[error("device is closed")]
    Closed,
    /// Bus communication error (I2C NACK, arbitration loss, etc.).
    #[error("bus communication error")]
    Bus,
    /// `WHO_AM_I` returned something other than an MPU-6050 identifier.
    #[error("unexpected WHO_AM_I value {0:#04x}")]
    WrongDevice(u8),
    /// A register did not hold the value just written to it.
    #[error("register {register:#04x} read back {actual:#04x}, expected {expected:#04x}")]
    HardwareFault {
        /// Register address.
        register: u8,
        /// Value that was written.
        expected: u8,
        /// Value that was read back.
        actual: u8,
    },
    /// The operating system refused to start the updater thread.
    #[error("failed to spawn the updater thread")]
    ThreadSpawn,
    /// A blocking operation was cancelled before it completed.
    #[error("operation interrupted")]
    InterruptedOperation,
    /// The background updater did not stop within the join timeout.
    #[error("updater did not stop within {0:?}")]
    TeardownTimeout(Duration),
}

/// Coarse classification of [`Error`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Precondition violation; no I/O was performed.
    InvalidArgument,
    /// The bus, the device or the host platform misbehaved.
    HardwareFault,
    /// A blocking call was cancelled.
    InterruptedOperation,
    /// A bounded join during teardown expired.
    TeardownTimeout,
}

impl Error {
    /// Returns the taxonomy bucket for this error.
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::Closed => ErrorKind::InvalidArgument,
            Self::Bus | Self::WrongDevice(_) | Self::HardwareFault { .. } | Self::ThreadSpawn => {
                ErrorKind::HardwareFault
            }
            Self::InterruptedOperation => ErrorKind::InterruptedOperation,
            Self::TeardownTimeout(_) => ErrorKind::TeardownTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_collapse_variants() {
        assert_eq!(Error::Closed.kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::Bus.kind(), ErrorKind::HardwareFault);
        assert_eq!(Error::WrongDevice(0x70).kind(), ErrorKind::HardwareFault);
        assert_eq!(
            Error::TeardownTimeout(Duration::from_millis(500)).kind(),
            ErrorKind::TeardownTimeout
        );
    }

    #[test]
    fn hardware_fault_message_names_register() {
        let err = Error::HardwareFault {
            register: 0x1A,
            expected: 0x03,
            actual: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "register 0x1a read back 0x00, expected 0x03"
        );
    }
}
