//! Surface Oracle.
//!
//! The only source of ground truth in the system: a pure, continuous mapping
//! from a horizontal coordinate to surface height.  Anything implementing
//! [`Surface`] can be tracked, including plain closures.
//!
//! # Example
//!
//! ```rust
//! use seamtrack_perception::surface::{Surface, SurfaceProfile};
//!
//! let sine = SurfaceProfile::Sine { amplitude: 5.0, frequency: 0.1, offset: 10.0 };
//! assert!((sine.height(0.0) - 10.0).abs() < 1e-12);
//!
//! let ramp = |x: f64| 0.5 * x;
//! assert!((ramp.slope_at(3.0, 0.1) - 0.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Step used by the symmetric finite difference when a pose must be
/// grounded in the true surface slope.
pub const GROUND_TRUTH_SLOPE_EPS: f64 = 0.1;

/// A height field `z = height(x)`.
pub trait Surface {
    fn height(&self, x: f64) -> f64;

    /// Symmetric finite-difference slope
    /// `(height(x + eps) - height(x - eps)) / (2 eps)`.
    fn slope_at(&self, x: f64, eps: f64) -> f64 {
        (self.height(x + eps) - self.height(x - eps)) / (2.0 * eps)
    }
}

impl<F> Surface for F
where
    F: Fn(f64) -> f64,
{
    fn height(&self, x: f64) -> f64 {
        self(x)
    }
}

/// Built-in, serde-configurable surface profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SurfaceProfile {
    /// `amplitude * sin(frequency * x) + offset`
    Sine {
        amplitude: f64,
        frequency: f64,
        offset: f64,
    },
    /// Constant height.
    Flat { height: f64 },
}

impl Default for SurfaceProfile {
    fn default() -> Self {
        Self::Sine {
            amplitude: 5.0,
            frequency: 0.1,
            offset: 10.0,
        }
    }
}

impl Surface for SurfaceProfile {
    fn height(&self, x: f64) -> f64 {
        match *self {
            Self::Sine {
                amplitude,
                frequency,
                offset,
            } => amplitude * (frequency * x).sin() + offset,
            Self::Flat { height } => height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_reference_sine() {
        let s = SurfaceProfile::default();
        assert!((s.height(0.0) - 10.0).abs() < 1e-12);
        // Peak at k·x = π/2.
        let peak_x = std::f64::consts::FRAC_PI_2 / 0.1;
        assert!((s.height(peak_x) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn flat_profile_is_constant() {
        let s = SurfaceProfile::Flat { height: 10.0 };
        for x in [-100.0, 0.0, 3.7, 1e6] {
            assert_eq!(s.height(x), 10.0);
        }
        assert_eq!(s.slope_at(42.0, GROUND_TRUTH_SLOPE_EPS), 0.0);
    }

    #[test]
    fn finite_difference_tracks_analytic_slope() {
        let s = SurfaceProfile::default();
        for x in [0.0_f64, 7.0, 23.5, 60.0] {
            let analytic = 5.0 * 0.1 * (0.1 * x).cos();
            let numeric = s.slope_at(x, GROUND_TRUTH_SLOPE_EPS);
            assert!((numeric - analytic).abs() < 1e-3, "x={x}");
        }
    }

    #[test]
    fn closures_are_surfaces() {
        let step = |x: f64| if x < 0.0 { 0.0 } else { 1.0 };
        assert_eq!(step.height(-1.0), 0.0);
        assert_eq!(step.height(1.0), 1.0);
    }

    #[test]
    fn profile_deserializes_from_tagged_json() {
        let json = r#"{"kind":"flat","height":3.5}"#;
        let s: SurfaceProfile = serde_json::from_str(json).unwrap();
        assert_eq!(s, SurfaceProfile::Flat { height: 3.5 });
    }
}
