//! Ray Caster.
//!
//! Marches a ray from a sensor mount along a unit direction and reports the
//! first sample that lies on or below the surface.  Samples are taken at
//! arc-length offsets `r = i * step` for `i = 0, 1, …` while `r < max_length`.
//!
//! A hit's height is snapped to the exact surface height at the sample's x so
//! the reading never penetrates the surface.  Coarse stepping therefore biases
//! the hit point further along the ray, never into the material.
//!
//! If nothing is crossed within `max_length`, the end point of the ray is
//! returned with `intersected = false` and `range == max_length`.  Callers
//! keep going with that degraded reading.
//!
//! # Example
//!
//! ```rust
//! use seamtrack_perception::raycast::RayCaster;
//! use seamtrack_types::Vec2;
//!
//! let caster = RayCaster::new(0.1, 50.0);
//! let floor = |_x: f64| 10.0;
//! let hit = caster.cast(&floor, Vec2::new(5.0, 15.0), Vec2::new(0.0, -1.0));
//! assert!(hit.intersected);
//! assert_eq!(hit.z, 10.0);
//! assert!((hit.range - 5.0).abs() < 1e-9);
//! ```

use seamtrack_types::{RayHit, Vec2};
use tracing::debug;

use crate::surface::Surface;

/// Sampling parameters for ray marching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCaster {
    step: f64,
    max_length: f64,
}

impl RayCaster {
    /// `step` and `max_length` are expected to be positive and finite; the
    /// traverse configuration validates them before a caster is built.
    pub fn new(step: f64, max_length: f64) -> Self {
        Self { step, max_length }
    }

    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Cast a ray from `origin` along the unit vector `direction`.
    pub fn cast<S: Surface + ?Sized>(&self, surface: &S, origin: Vec2, direction: Vec2) -> RayHit {
        let mut i: u64 = 0;
        loop {
            let r = i as f64 * self.step;
            if r >= self.max_length {
                break;
            }
            let p = origin.add(direction.scale(r));
            let ground = surface.height(p.x);
            if p.z <= ground {
                return RayHit {
                    x: p.x,
                    z: ground,
                    range: r,
                    intersected: true,
                };
            }
            i += 1;
        }

        let end = origin.add(direction.scale(self.max_length));
        debug!(
            origin_x = origin.x,
            origin_z = origin.z,
            max_length = self.max_length,
            "ray exhausted search length without crossing the surface"
        );
        RayHit {
            x: end.x,
            z: end.z,
            range: self.max_length,
            intersected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceProfile;

    const DOWN: Vec2 = Vec2 { x: 0.0, z: -1.0 };

    #[test]
    fn straight_down_onto_flat_surface() {
        let caster = RayCaster::new(0.1, 50.0);
        let flat = SurfaceProfile::Flat { height: 10.0 };
        let hit = caster.cast(&flat, Vec2::new(5.0, 15.0), DOWN);
        assert!(hit.intersected);
        assert_eq!(hit.x, 5.0);
        assert_eq!(hit.z, 10.0);
        assert!((hit.range - 5.0).abs() < 1e-9);
    }

    #[test]
    fn origin_below_surface_hits_at_zero_range() {
        let caster = RayCaster::new(0.1, 50.0);
        let flat = |_x: f64| 10.0;
        let hit = caster.cast(&flat, Vec2::new(0.0, 9.0), DOWN);
        assert!(hit.intersected);
        assert_eq!(hit.range, 0.0);
        assert_eq!(hit.z, 10.0);
    }

    #[test]
    fn hit_height_is_snapped_to_surface() {
        // 0.3 steps from z = 15 land at 10.2, 9.9, … – the sample at 9.9
        // crosses, and its height is replaced by the exact surface height.
        let caster = RayCaster::new(0.3, 50.0);
        let flat = |_x: f64| 10.0;
        let hit = caster.cast(&flat, Vec2::new(0.0, 15.0), DOWN);
        assert!(hit.intersected);
        assert_eq!(hit.z, 10.0);
        assert!(hit.range > 5.0);
    }

    #[test]
    fn coarse_steps_overshoot_along_the_ray() {
        let surface = SurfaceProfile::default();
        let dir = Vec2::new(0.6, -0.8);
        let origin = Vec2::new(10.0, 25.0);
        let fine = RayCaster::new(0.01, 50.0).cast(&surface, origin, dir);
        let coarse = RayCaster::new(1.0, 50.0).cast(&surface, origin, dir);
        assert!(fine.intersected && coarse.intersected);
        assert!(coarse.range >= fine.range);
    }

    #[test]
    fn unreachable_surface_returns_degraded_hit() {
        let caster = RayCaster::new(0.5, 20.0);
        let far_below = |_x: f64| -1000.0;
        let hit = caster.cast(&far_below, Vec2::new(1.0, 0.0), DOWN);
        assert!(!hit.intersected);
        assert_eq!(hit.range, 20.0);
        assert_eq!(hit.x, 1.0);
        assert_eq!(hit.z, -20.0);
    }

    #[test]
    fn ray_pointing_away_never_crosses() {
        let caster = RayCaster::new(0.1, 5.0);
        let flat = |_x: f64| 0.0;
        let hit = caster.cast(&flat, Vec2::new(0.0, 1.0), Vec2::new(0.0, 1.0));
        assert!(!hit.intersected);
        assert_eq!(hit.range, caster.max_length());
    }
}
