//! `seamtrack-types` – shared value types for the seam-tracking stack.
//!
//! Everything that crosses a crate boundary lives here: the planar [`Vec2`],
//! the tool-center-point [`Pose`], a single sensor [`RayHit`], the per-step
//! [`Diagnostics`] bundle and [`StepResult`], plus the [`TrackError`] enum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Vec2
// ────────────────────────────────────────────────────────────────────────────

/// A vector in the X/Z plane.  `x` runs along the traverse, `z` is height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub z: f64,
}

impl Vec2 {
    /// Create a new vector.
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.z * k)
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.z * rhs.z
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.z)
    }

    /// Unit vector in the same direction.  The zero vector is returned
    /// unchanged.
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n == 0.0 { self } else { self.scale(1.0 / n) }
    }

    /// Rotate 90° clockwise: `(x, z) → (z, -x)`.
    pub fn perpendicular(self) -> Self {
        Self::new(self.z, -self.x)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// Tool-center-point pose.
///
/// `tangent` and `normal` are orthonormal and `normal.z <= 0`, so rays cast
/// along the normal always head toward the surface.  Poses are values: each
/// step produces a new one instead of mutating the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub z: f64,
    pub tangent: Vec2,
    pub normal: Vec2,
}

impl Pose {
    /// Build a pose at `(x, z)` whose frame follows a local surface `slope`.
    ///
    /// The tangent is `normalize([1, slope])`; the normal is the tangent
    /// rotated 90° clockwise, flipped if that leaves it pointing upward.
    pub fn from_slope(x: f64, z: f64, slope: f64) -> Self {
        let tangent = Vec2::new(1.0, slope).normalized();
        let mut normal = tangent.perpendicular();
        if normal.z > 0.0 {
            normal = normal.scale(-1.0);
        }
        Self {
            x,
            z,
            tangent,
            normal,
        }
    }

    /// The TCP position as a vector.
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Where a rigidly mounted sensor sits: `lead` units ahead along the
    /// tangent.
    pub fn mount(&self, lead: f64) -> Vec2 {
        self.position().add(self.tangent.scale(lead))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensor geometry and step output
// ────────────────────────────────────────────────────────────────────────────

/// Where a sensor ray met the surface.
///
/// When the ray exhausts its search length without crossing the surface,
/// `intersected` is `false`, `range == max_length`, and `(x, z)` is the raw
/// end point of the ray.  That is a degraded reading, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub x: f64,
    pub z: f64,
    /// Arc length travelled from the sensor mount.
    pub range: f64,
    pub intersected: bool,
}

/// Read-only scalars reported alongside each step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Estimated local surface slope (dz/dx).
    pub slope: f64,
    /// `pose.z - (height(pose.x) + target_offset)` for the pose that was
    /// sensed.  Uses ground truth; never fed back into control.
    pub tracking_error: f64,
    pub sensor1_range: f64,
    pub sensor2_range: f64,
    /// Population variance of the pooled raw two-sensor history.
    pub sensor_variance: f64,
    /// Population variance of the pooled filter outputs.
    pub output_variance: f64,
}

/// Everything a consumer needs to display one step.
///
/// All geometry is as of the pose that was *sensed* this step, i.e. before
/// the freshly estimated pose was committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Steps since the last reset, counted before this one.
    pub step_index: u64,
    pub pose: Pose,
    pub sensor1_mount: Vec2,
    pub sensor2_mount: Vec2,
    pub sensor1_hit: RayHit,
    pub sensor2_hit: RayHit,
    pub filtered1: f64,
    pub filtered2: f64,
    pub diagnostics: Diagnostics,
    pub did_reset: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised by the tracking core.
///
/// Runtime geometry edge cases degrade instead of failing; only caller bugs
/// surface here.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl TrackError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_orthonormal(p: &Pose) {
        assert!((p.tangent.norm() - 1.0).abs() < EPS);
        assert!((p.normal.norm() - 1.0).abs() < EPS);
        assert!(p.tangent.dot(p.normal).abs() < EPS);
        assert!(p.normal.z <= 0.0);
    }

    #[test]
    fn flat_slope_gives_axis_aligned_frame() {
        let p = Pose::from_slope(0.0, 15.0, 0.0);
        assert_eq!(p.tangent, Vec2::new(1.0, 0.0));
        assert_eq!(p.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn frame_is_orthonormal_for_any_slope() {
        for slope in [-1e6, -12.0, -1.0, -0.3, 0.0, 0.25, 1.0, 7.5, 1e6] {
            let p = Pose::from_slope(1.0, 2.0, slope);
            assert_orthonormal(&p);
        }
    }

    #[test]
    fn tangent_follows_slope_sign() {
        let up = Pose::from_slope(0.0, 0.0, 1.0);
        assert!(up.tangent.z > 0.0);
        let down = Pose::from_slope(0.0, 0.0, -1.0);
        assert!(down.tangent.z < 0.0);
        // Normal tilts forward (+x) on a rising slope, backward on a falling one.
        assert!(up.normal.x > 0.0);
        assert!(down.normal.x < 0.0);
    }

    #[test]
    fn mount_sits_ahead_along_tangent() {
        let p = Pose::from_slope(2.0, 3.0, 0.0);
        assert_eq!(p.mount(5.0), Vec2::new(7.0, 3.0));

        let tilted = Pose::from_slope(0.0, 0.0, 1.0);
        let m = tilted.mount(2.0_f64.sqrt());
        assert!((m.x - 1.0).abs() < EPS);
        assert!((m.z - 1.0).abs() < EPS);
    }

    #[test]
    fn normalized_zero_vector_is_unchanged() {
        assert_eq!(Vec2::default().normalized(), Vec2::default());
    }

    #[test]
    fn step_result_roundtrip() {
        let pose = Pose::from_slope(1.0, 15.0, 0.0);
        let hit = RayHit {
            x: 6.0,
            z: 10.0,
            range: 5.0,
            intersected: true,
        };
        let result = StepResult {
            step_index: 3,
            pose,
            sensor1_mount: pose.mount(5.0),
            sensor2_mount: pose.mount(10.0),
            sensor1_hit: hit,
            sensor2_hit: hit,
            filtered1: 10.0,
            filtered2: 10.5,
            diagnostics: Diagnostics::default(),
            did_reset: false,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: StepResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }

    #[test]
    fn track_error_display_names_field() {
        let err = TrackError::invalid("step_size", "must be positive");
        let msg = err.to_string();
        assert!(msg.contains("step_size"));
        assert!(msg.contains("must be positive"));
    }
}
