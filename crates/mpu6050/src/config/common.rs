use crate::error::Error;
use crate::register::{accel_config, config, gyro_config};

/// Gyroscope output rate when the digital low-pass filter is bypassed.
pub(crate) const GYRO_OUTPUT_RATE_UNFILTERED_HZ: u32 = 8_000;
/// Gyroscope output rate when the digital low-pass filter is active.
pub(crate) const GYRO_OUTPUT_RATE_FILTERED_HZ: u32 = 1_000;

/// Digital low-pass filter setting (CONFIG.DLPF_CFG).
///
/// Bandwidths are listed as accelerometer / gyroscope. Settings 0 and 7 leave
/// the gyroscope unfiltered, which raises its output rate to 8 kHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DlpfConfig {
    /// 260 Hz / 256 Hz.
    Bw260Hz,
    /// 184 Hz / 188 Hz.
    Bw184Hz,
    /// 94 Hz / 98 Hz.
    Bw94Hz,
    /// 44 Hz / 42 Hz.
    Bw44Hz,
    /// 21 Hz / 20 Hz.
    Bw21Hz,
    /// 10 Hz / 10 Hz.
    Bw10Hz,
    /// 5 Hz / 5 Hz.
    Bw5Hz,
    /// Reserved setting; the gyroscope runs unfiltered at 8 kHz.
    Reserved,
}

impl DlpfConfig {
    /// Default filter setting applied at initialization.
    pub const DEFAULT: Self = Self::Bw5Hz;

    /// Returns the CONFIG.DLPF_CFG bits.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bw260Hz => 0,
            Self::Bw184Hz => 1,
            Self::Bw94Hz => 2,
            Self::Bw44Hz => 3,
            Self::Bw21Hz => 4,
            Self::Bw10Hz => 5,
            Self::Bw5Hz => 6,
            Self::Reserved => 7,
        }
    }

    /// Returns the internal gyroscope output rate for this setting.
    pub const fn gyro_output_rate_hz(self) -> u32 {
        match self {
            Self::Bw260Hz | Self::Reserved => GYRO_OUTPUT_RATE_UNFILTERED_HZ,
            _ => GYRO_OUTPUT_RATE_FILTERED_HZ,
        }
    }

    /// Builds the CONFIG register value (FSYNC disabled).
    pub(crate) const fn config_value(self) -> u8 {
        self.bits() & config::DLPF_CFG_MASK
    }
}

impl Default for DlpfConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for DlpfConfig {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Bw260Hz),
            1 => Ok(Self::Bw184Hz),
            2 => Ok(Self::Bw94Hz),
            3 => Ok(Self::Bw44Hz),
            4 => Ok(Self::Bw21Hz),
            5 => Ok(Self::Bw10Hz),
            6 => Ok(Self::Bw5Hz),
            7 => Ok(Self::Reserved),
            _ => Err(Error::InvalidArgument("DLPF config must be in 0..=7")),
        }
    }
}

/// Accelerometer full-scale range selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccelRange {
    /// +/-2 g range.
    G2,
    /// +/-4 g range.
    G4,
    /// +/-8 g range.
    G8,
    /// +/-16 g range.
    G16,
}

impl AccelRange {
    /// Returns the full-scale range in g.
    pub const fn g(self) -> u16 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }

    /// Returns the AFS_SEL bits.
    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::G2 => 0b00,
            Self::G4 => 0b01,
            Self::G8 => 0b10,
            Self::G16 => 0b11,
        }
    }

    /// Builds the ACCEL_CONFIG register value (self-test off).
    pub(crate) const fn accel_config_value(self) -> u8 {
        (self.bits() << accel_config::AFS_SEL_SHIFT) & accel_config::AFS_SEL_MASK
    }
}

impl Default for AccelRange {
    fn default() -> Self {
        Self::G2
    }
}

/// Gyroscope full-scale range selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GyroRange {
    /// +/-250 deg/s.
    Dps250,
    /// +/-500 deg/s.
    Dps500,
    /// +/-1000 deg/s.
    Dps1000,
    /// +/-2000 deg/s.
    Dps2000,
}

impl GyroRange {
    /// Returns the full-scale range in degrees per second.
    pub const fn dps(self) -> u16 {
        match self {
            Self::Dps250 => 250,
            Self::Dps500 => 500,
            Self::Dps1000 => 1000,
            Self::Dps2000 => 2000,
        }
    }

    /// Returns the FS_SEL bits.
    pub(crate) const fn bits(self) -> u8 {
        match self {
            Self::Dps250 => 0b00,
            Self::Dps500 => 0b01,
            Self::Dps1000 => 0b10,
            Self::Dps2000 => 0b11,
        }
    }

    /// Builds the GYRO_CONFIG register value (self-test off).
    pub(crate) const fn gyro_config_value(self) -> u8 {
        (self.bits() << gyro_config::FS_SEL_SHIFT) & gyro_config::FS_SEL_MASK
    }
}

impl Default for GyroRange {
    fn default() -> Self {
        Self::Dps250
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlpf_round_trips_through_bits() {
        for value in 0u8..=7 {
            let dlpf = DlpfConfig::try_from(value).expect("in range");
            assert_eq!(dlpf.bits(), value);
        }
    }

    #[test]
    fn dlpf_rejects_out_of_range() {
        for value in [8u8, 9, 0x80, u8::MAX] {
            assert!(matches!(
                DlpfConfig::try_from(value),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn gyro_output_rate_tracks_filter_bypass() {
        assert_eq!(DlpfConfig::Bw260Hz.gyro_output_rate_hz(), 8_000);
        assert_eq!(DlpfConfig::Reserved.gyro_output_rate_hz(), 8_000);
        assert_eq!(DlpfConfig::Bw94Hz.gyro_output_rate_hz(), 1_000);
        assert_eq!(DlpfConfig::Bw5Hz.gyro_output_rate_hz(), 1_000);
    }

    #[test]
    fn range_register_values() {
        assert_eq!(AccelRange::G2.accel_config_value(), 0x00);
        assert_eq!(AccelRange::G16.accel_config_value(), 0x18);
        assert_eq!(GyroRange::Dps250.gyro_config_value(), 0x00);
        assert_eq!(GyroRange::Dps1000.gyro_config_value(), 0x10);
    }
}
