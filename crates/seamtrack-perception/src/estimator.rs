//! Gradient & Pose Estimator.
//!
//! Turns two filtered sensor heights into a local slope and predicts the next
//! TCP pose by first-order extrapolation:
//!
//! ```text
//! slope       = (f2 - f1) / (x2 - x1)
//! z_predicted = f1 + slope * (tcp.x - x1)
//! next.z      = z_predicted + target_offset
//! next.x      = tcp.x + step_size
//! ```
//!
//! The prediction is made at the *current* TCP x, not at the sensor x.  The
//! estimator is a pure transform: it never touches sensor state.
//!
//! # Example
//!
//! ```rust
//! use seamtrack_perception::estimator::{PoseEstimator, SensorReadings};
//! use seamtrack_types::{Pose, RayHit};
//!
//! let estimator = PoseEstimator::new(5.0, 0.5);
//! let current = Pose::from_slope(0.0, 15.0, 0.0);
//! let hit = |x: f64| RayHit { x, z: 10.0, range: 5.0, intersected: true };
//! let readings = SensorReadings {
//!     sensor1_hit: hit(5.0),
//!     sensor2_hit: hit(10.0),
//!     filtered1: 10.0,
//!     filtered2: 10.0,
//!     sensor_variance: 0.0,
//!     output_variance: 0.0,
//! };
//!
//! let floor = |_x: f64| 10.0;
//! let (next, diag) = estimator.estimate(&current, &readings, &floor);
//! assert_eq!(next.x, 0.5);
//! assert_eq!(next.z, 15.0);
//! assert_eq!(diag.slope, 0.0);
//! assert_eq!(diag.tracking_error, 0.0);
//! ```

use seamtrack_types::{Diagnostics, Pose, RayHit};

use crate::surface::Surface;

/// Substitute for a zero horizontal separation between the two hits.
pub const MIN_SENSOR_SEPARATION: f64 = 1e-9;

/// One step's worth of sensor evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    pub sensor1_hit: RayHit,
    pub sensor2_hit: RayHit,
    pub filtered1: f64,
    pub filtered2: f64,
    /// Pooled raw-history variance, passed through to the diagnostics.
    pub sensor_variance: f64,
    /// Pooled filter-output variance, passed through to the diagnostics.
    pub output_variance: f64,
}

/// Feedforward pose predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEstimator {
    target_offset: f64,
    step_size: f64,
}

impl PoseEstimator {
    pub fn new(target_offset: f64, step_size: f64) -> Self {
        Self {
            target_offset,
            step_size,
        }
    }

    /// Slope between the two filtered readings.
    ///
    /// A zero separation is replaced by [`MIN_SENSOR_SEPARATION`], which keeps
    /// the result finite (if large).
    pub fn slope(readings: &SensorReadings) -> f64 {
        let mut dx = readings.sensor2_hit.x - readings.sensor1_hit.x;
        if dx == 0.0 {
            dx = MIN_SENSOR_SEPARATION;
        }
        (readings.filtered2 - readings.filtered1) / dx
    }

    /// Tracking error of `pose` against ground truth.
    pub fn tracking_error<S: Surface + ?Sized>(&self, pose: &Pose, surface: &S) -> f64 {
        pose.z - (surface.height(pose.x) + self.target_offset)
    }

    /// Predict the next pose from `current` and this step's readings.
    ///
    /// `surface` is consulted only for the tracking-error diagnostic.
    pub fn estimate<S: Surface + ?Sized>(
        &self,
        current: &Pose,
        readings: &SensorReadings,
        surface: &S,
    ) -> (Pose, Diagnostics) {
        let slope = Self::slope(readings);
        let z_predicted =
            readings.filtered1 + slope * (current.x - readings.sensor1_hit.x);
        let next = Pose::from_slope(
            current.x + self.step_size,
            z_predicted + self.target_offset,
            slope,
        );

        let diagnostics = Diagnostics {
            slope,
            tracking_error: self.tracking_error(current, surface),
            sensor1_range: readings.sensor1_hit.range,
            sensor2_range: readings.sensor2_hit.range,
            sensor_variance: readings.sensor_variance,
            output_variance: readings.output_variance,
        };
        (next, diagnostics)
    }
}
