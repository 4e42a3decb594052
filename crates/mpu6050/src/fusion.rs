//! Complementary-filter attitude estimation.
//!
//! Each tick combines one accelerometer/gyroscope sample into a new
//! [`FusionState`]. Tilt about X and Y comes from the gravity vector, the
//! integrated gyroscope rate supplies short-term motion, and the two are
//! blended with a fixed weight of [`COMPLEMENTARY_ALPHA`]. The accelerometer
//! cannot observe yaw, so the Z tilt angle is always zero and the filtered Z
//! angle follows gyroscope integration alone.

use std::f64::consts::PI;
use std::time::Instant;

use crate::calibration::CalibrationOffsets;
use crate::data::{Axes, ScaledSample};

/// Weight given to the gyroscope-propagated angle in the complementary filter.
pub const COMPLEMENTARY_ALPHA: f64 = 0.96;

const RAD_TO_DEG: f64 = 180.0 / PI;

/// Fused orientation estimate published once per update tick.
///
/// Every field of one value comes from the same sample and the same `dt`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FusionState {
    /// Acceleration in g.
    pub accel: Axes,
    /// Tilt angles from the accelerometer, in degrees (Z is always 0).
    pub accel_angle: Axes,
    /// Offset-corrected angular rate in deg/s.
    pub gyro_speed: Axes,
    /// Integrated gyroscope angle in degrees. Drifts over time.
    pub gyro_angle: Axes,
    /// Complementary-filter angle in degrees.
    pub filtered_angle: Axes,
    /// Seconds elapsed since the previous tick.
    pub dt: f64,
    /// Update counter; 0 for the initial all-zero state.
    pub tick: u64,
}

/// Accelerometer tilt about the X axis, in degrees within `[0, 360)`.
pub fn accel_angle_x(accel: Axes) -> f64 {
    let Axes { x: ax, y: ay, z: az } = accel;
    let r = ay.atan2(ax.hypot(az));
    let (delta, negate) = if ay >= 0.0 {
        if az >= 0.0 { (0.0, false) } else { (180.0, true) }
    } else if az <= 0.0 {
        (180.0, true)
    } else {
        (360.0, false)
    };
    let r = if negate { -r } else { r };
    r * RAD_TO_DEG + delta
}

/// Accelerometer tilt about the Y axis, in degrees within `[0, 360)`.
pub fn accel_angle_y(accel: Axes) -> f64 {
    let Axes { x: ax, y: ay, z: az } = accel;
    let denom = ay.hypot(az);
    // Zero gravity vector; -0.0 / 0.0 would be NaN.
    let t = if denom == 0.0 && ax == 0.0 { 0.0 } else { -ax / denom };
    let delta = if ax <= 0.0 {
        if az >= 0.0 { 0.0 } else { 180.0 }
    } else if az <= 0.0 {
        180.0
    } else {
        360.0
    };
    let negate = (ax > 0.0 && az <= 0.0) || (ax <= 0.0 && az < 0.0);
    let t = if negate { -t } else { t };
    t.atan() * RAD_TO_DEG + delta
}

/// Runs the filter over successive samples.
#[derive(Debug, Default)]
pub(crate) struct FusionEngine {
    state: FusionState,
    last_update: Option<Instant>,
}

impl FusionEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resets the tick clock so the next tick measures from `now`.
    pub(crate) fn restart_clock(&mut self, now: Instant) {
        self.last_update = Some(now);
    }

    /// Advances the filter using the time elapsed since the last tick.
    pub(crate) fn tick(
        &mut self,
        sample: ScaledSample,
        offsets: CalibrationOffsets,
        now: Instant,
    ) -> FusionState {
        let dt = self
            .last_update
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
        self.last_update = Some(now);
        self.step(sample, offsets, dt)
    }

    /// Advances the filter by `dt` seconds.
    pub(crate) fn step(
        &mut self,
        sample: ScaledSample,
        offsets: CalibrationOffsets,
        dt: f64,
    ) -> FusionState {
        let prev = self.state;
        let accel_angle = Axes::new(
            accel_angle_x(sample.accel),
            accel_angle_y(sample.accel),
            0.0,
        );
        let rate = Axes::new(
            sample.gyro.x - offsets.x,
            sample.gyro.y - offsets.y,
            sample.gyro.z - offsets.z,
        );
        let gyro_angle = Axes::new(
            prev.gyro_angle.x + rate.x * dt,
            prev.gyro_angle.y + rate.y * dt,
            prev.gyro_angle.z + rate.z * dt,
        );
        let filtered_angle = Axes::new(
            blend(prev.filtered_angle.x + rate.x * dt, accel_angle.x),
            blend(prev.filtered_angle.y + rate.y * dt, accel_angle.y),
            prev.filtered_angle.z + rate.z * dt,
        );

        self.state = FusionState {
            accel: sample.accel,
            accel_angle,
            gyro_speed: rate,
            gyro_angle,
            filtered_angle,
            dt,
            tick: prev.tick.wrapping_add(1),
        };
        self.state
    }
}

fn blend(propagated: f64, measured: f64) -> f64 {
    COMPLEMENTARY_ALPHA * propagated + (1.0 - COMPLEMENTARY_ALPHA) * measured
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn accel(x: f64, y: f64, z: f64) -> Axes {
        Axes::new(x, y, z)
    }

    #[test]
    fn x_angle_covers_each_quadrant() {
        assert!(close(accel_angle_x(accel(0.0, 0.0, 1.0)), 0.0));
        assert!(close(accel_angle_x(accel(0.0, 0.5, 0.5)), 45.0));
        assert!(close(accel_angle_x(accel(0.0, 0.5, -0.5)), 135.0));
        assert!(close(accel_angle_x(accel(0.0, -0.5, -0.5)), 225.0));
        assert!(close(accel_angle_x(accel(0.0, -0.5, 0.5)), 315.0));
    }

    #[test]
    fn y_angle_follows_quadrant_table() {
        assert!(close(accel_angle_y(accel(0.0, 0.0, 1.0)), 0.0));
        assert!(close(accel_angle_y(accel(0.5, 0.0, 0.5)), 315.0));
        assert!(close(accel_angle_y(accel(0.5, 0.0, -0.5)), 225.0));
        assert!(close(accel_angle_y(accel(-0.5, 0.0, -0.5)), 135.0));
        assert!(close(accel_angle_y(accel(-0.5, 0.0, 0.5)), 45.0));
    }

    #[test]
    fn tilt_angles_stay_within_one_turn() {
        let steps = [-1.0, -0.7, -0.25, 0.0, 0.25, 0.7, 1.0];
        for &x in &steps {
            for &y in &steps {
                for &z in &steps {
                    let a = accel(x, y, z);
                    for angle in [accel_angle_x(a), accel_angle_y(a)] {
                        assert!((0.0..360.0).contains(&angle), "{a:?} -> {angle}");
                    }
                }
            }
        }
    }

    #[test]
    fn zero_gravity_vector_stays_finite() {
        assert!(accel_angle_x(Axes::ZERO).is_finite());
        assert!(accel_angle_y(Axes::ZERO).is_finite());
    }

    #[test]
    fn filtered_angle_converges_to_tilt() {
        let sample = ScaledSample {
            accel: accel(0.0, 0.5, 0.5),
            gyro: Axes::ZERO,
        };
        let target = 45.0;
        let mut engine = FusionEngine::new();
        let mut expected = 0.0;

        for _ in 0..300 {
            let state = engine.step(sample, CalibrationOffsets::default(), 0.01);
            expected = COMPLEMENTARY_ALPHA * expected + (1.0 - COMPLEMENTARY_ALPHA) * target;
            assert!(close(state.filtered_angle.x, expected));
            assert!(close(state.accel_angle.z, 0.0));
        }
        assert!((expected - target).abs() < 0.01);
    }

    #[test]
    fn gyro_rate_is_offset_corrected_and_integrated() {
        let sample = ScaledSample {
            accel: accel(0.0, 0.0, 1.0),
            gyro: Axes::new(12.0, -3.0, 7.0),
        };
        let offsets = CalibrationOffsets::new(2.0, -3.0, 1.0);
        let mut engine = FusionEngine::new();

        engine.step(sample, offsets, 0.5);
        let state = engine.step(sample, offsets, 0.5);

        assert_eq!(state.gyro_speed, Axes::new(10.0, 0.0, 6.0));
        assert_eq!(state.gyro_angle, Axes::new(10.0, 0.0, 6.0));
        assert_eq!(state.filtered_angle.z, state.gyro_angle.z);
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn first_tick_has_zero_dt() {
        let sample = ScaledSample {
            accel: accel(0.0, 0.0, 1.0),
            gyro: Axes::new(100.0, 100.0, 100.0),
        };
        let mut engine = FusionEngine::new();
        let start = Instant::now();

        let first = engine.tick(sample, CalibrationOffsets::default(), start);
        assert_eq!(first.dt, 0.0);
        assert_eq!(first.gyro_angle, Axes::ZERO);

        let second = engine.tick(
            sample,
            CalibrationOffsets::default(),
            start + Duration::from_millis(10),
        );
        assert!(close(second.dt, 0.01));
        assert!(close(second.gyro_angle.z, 1.0));
    }

    #[test]
    fn restart_clock_measures_from_start() {
        let sample = ScaledSample::default();
        let mut engine = FusionEngine::new();
        let start = Instant::now();
        engine.restart_clock(start);

        let state = engine.tick(
            sample,
            CalibrationOffsets::default(),
            start + Duration::from_millis(4),
        );
        assert!(close(state.dt, 0.004));
        assert_eq!(engine.state, state);
    }
}
