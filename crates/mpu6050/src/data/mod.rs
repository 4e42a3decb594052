//! Sensor data readout helpers.

pub(crate) mod scale;

pub use scale::{accel_lsb_per_g, gyro_lsb_per_dps, temperature_celsius};

/// Length of the accelerometer and gyroscope output blocks.
pub(crate) const AXIS_BLOCK_LEN: usize = 6;

/// Three-axis value in engineering units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Axes {
    /// X-axis component.
    pub x: f64,
    /// Y-axis component.
    pub y: f64,
    /// Z-axis component.
    pub z: f64,
}

impl Axes {
    /// All-zero value.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new three-axis value.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the components as an `[x, y, z]` array.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Axes {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Raw accelerometer sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AccelRaw {
    /// X-axis raw count.
    pub x: i16,
    /// Y-axis raw count.
    pub y: i16,
    /// Z-axis raw count.
    pub z: i16,
}

impl AccelRaw {
    pub(crate) fn from_be_bytes(bytes: [u8; AXIS_BLOCK_LEN]) -> Self {
        let [x, y, z] = words_from_be_bytes(bytes);
        Self { x, y, z }
    }

    /// Converts to g using the given sensitivity in LSB/g.
    pub fn scaled(self, lsb_per_g: f64) -> Axes {
        Axes::new(
            f64::from(self.x) / lsb_per_g,
            f64::from(self.y) / lsb_per_g,
            f64::from(self.z) / lsb_per_g,
        )
    }
}

/// Raw gyroscope sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GyroRaw {
    /// X-axis raw count.
    pub x: i16,
    /// Y-axis raw count.
    pub y: i16,
    /// Z-axis raw count.
    pub z: i16,
}

impl GyroRaw {
    pub(crate) fn from_be_bytes(bytes: [u8; AXIS_BLOCK_LEN]) -> Self {
        let [x, y, z] = words_from_be_bytes(bytes);
        Self { x, y, z }
    }

    /// Converts to deg/s using the given sensitivity in LSB/(deg/s).
    pub fn scaled(self, lsb_per_dps: f64) -> Axes {
        Axes::new(
            f64::from(self.x) / lsb_per_dps,
            f64::from(self.y) / lsb_per_dps,
            f64::from(self.z) / lsb_per_dps,
        )
    }
}

/// One accelerometer + gyroscope reading in engineering units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScaledSample {
    /// Acceleration in g.
    pub accel: Axes,
    /// Angular rate in deg/s.
    pub gyro: Axes,
}

fn words_from_be_bytes(bytes: [u8; AXIS_BLOCK_LEN]) -> [i16; 3] {
    [
        i16::from_be_bytes([bytes[0], bytes[1]]),
        i16::from_be_bytes([bytes[2], bytes[3]]),
        i16::from_be_bytes([bytes[4], bytes[5]]),
    ]
}
