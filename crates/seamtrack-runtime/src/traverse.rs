//! [`Traverse`] – the perceive–estimate–act state machine.
//!
//! Owns the one live tracking state: the current pose, both sensor
//! histories, and the path walked since the last reset.  Each call to
//! [`Traverse::step`] runs exactly one cycle:
//!
//! 1. Place both sensor mounts ahead of the TCP along the *current* tangent.
//! 2. Cast both rays along the *current* normal.
//! 3. Perturb and filter both hits, updating the histories.
//! 4. Estimate the slope and predict the next pose.
//! 5. Append the current position to the path.
//! 6. If the predicted x reaches the boundary, reset to the start pose,
//!    grounded in the true surface slope; otherwise commit the prediction.
//!
//! Sensing at step k therefore uses the pose produced at step k-1.  The
//! returned [`StepResult`] describes the pose that was sensed, before commit.
//!
//! # Example
//!
//! ```rust
//! use seamtrack_perception::{NoiseSource, SurfaceProfile};
//! use seamtrack_runtime::traverse::{Traverse, TraverseConfig};
//!
//! let config = TraverseConfig { noise_std: 0.0, ..TraverseConfig::default() };
//! let mut traverse = Traverse::new(
//!     SurfaceProfile::Flat { height: 10.0 },
//!     config,
//!     NoiseSource::seeded(1),
//! )
//! .unwrap();
//!
//! let result = traverse.step();
//! assert_eq!(result.pose.z, 15.0);
//! assert_eq!(traverse.pose().x, 0.5);
//! ```

use rand::Rng;
use rand::rngs::StdRng;
use seamtrack_perception::estimator::{PoseEstimator, SensorReadings};
use seamtrack_perception::filter::{
    NoiseSource, SensorHistory, pooled_output_variance, pooled_reading_variance,
};
use seamtrack_perception::raycast::RayCaster;
use seamtrack_perception::surface::{GROUND_TRUTH_SLOPE_EPS, Surface};
use seamtrack_types::{Pose, StepResult, TrackError, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed parameters of a traverse.  Defaults reproduce the reference rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseConfig {
    /// Standoff the TCP keeps above the surface.
    pub target_offset: f64,
    /// Near and far sensor leads along the tangent.
    pub lead_distances: [f64; 2],
    /// Forward motion per step.
    pub step_size: f64,
    /// Standard deviation of the additive Gaussian range noise.
    pub noise_std: f64,
    /// Moving-average window per sensor.
    pub smoothing_window: usize,
    /// Arc-length resolution of the ray march.
    pub ray_step: f64,
    /// Longest distance a ray searches before giving up.
    pub ray_max_length: f64,
    pub start_x: f64,
    /// A predicted x at or beyond this value restarts the traverse.
    pub boundary_x: f64,
    /// Initial state of the live smoothing toggle.
    pub smoothing_enabled: bool,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            target_offset: 5.0,
            lead_distances: [5.0, 10.0],
            step_size: 0.5,
            noise_std: 0.2,
            smoothing_window: 5,
            ray_step: 0.1,
            ray_max_length: 50.0,
            start_x: 0.0,
            boundary_x: 100.0,
            smoothing_enabled: true,
        }
    }
}

/// Most samples a single ray may take before giving up.
pub const MAX_RAY_SAMPLES: f64 = 1e7;

impl TraverseConfig {
    /// Reject parameters that indicate a caller bug.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TrackError> {
        positive("step_size", self.step_size)?;
        positive("ray_step", self.ray_step)?;
        positive("ray_max_length", self.ray_max_length)?;
        let samples = self.ray_max_length / self.ray_step;
        if samples > MAX_RAY_SAMPLES {
            return Err(TrackError::invalid(
                "ray_step",
                format!(
                    "{} over {} needs {samples:.0} samples per ray, limit is {MAX_RAY_SAMPLES:.0}",
                    self.ray_step, self.ray_max_length
                ),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(TrackError::invalid("smoothing_window", "must be at least 1"));
        }
        let [near, far] = self.lead_distances;
        positive("lead_distances", near)?;
        positive("lead_distances", far)?;
        if near == far {
            return Err(TrackError::invalid(
                "lead_distances",
                format!("leads must differ, both are {near}"),
            ));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(TrackError::invalid(
                "noise_std",
                format!("must be finite and non-negative, got {}", self.noise_std),
            ));
        }
        finite("target_offset", self.target_offset)?;
        finite("start_x", self.start_x)?;
        finite("boundary_x", self.boundary_x)?;
        if self.boundary_x <= self.start_x {
            return Err(TrackError::invalid(
                "boundary_x",
                format!(
                    "must lie beyond start_x ({}), got {}",
                    self.start_x, self.boundary_x
                ),
            ));
        }
        Ok(())
    }
}

fn positive(field: &str, v: f64) -> Result<(), TrackError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TrackError::invalid(
            field,
            format!("must be positive and finite, got {v}"),
        ))
    }
}

fn finite(field: &str, v: f64) -> Result<(), TrackError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TrackError::invalid(field, format!("must be finite, got {v}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Traverse
// ─────────────────────────────────────────────────────────────────────────────

/// The live tracking state and its step transition.
///
/// Generic over the surface being tracked and the random generator feeding
/// the sensor noise, so tests can pin both.
pub struct Traverse<S: Surface, R: Rng = StdRng> {
    surface: S,
    config: TraverseConfig,
    caster: RayCaster,
    estimator: PoseEstimator,
    noise: NoiseSource<R>,
    pose: Pose,
    history1: SensorHistory,
    history2: SensorHistory,
    path: Vec<Vec2>,
    /// Live toggle; survives resets.
    smoothing_enabled: bool,
    steps_since_reset: u64,
    traverses_completed: u64,
}

impl<S: Surface, R: Rng> Traverse<S, R> {
    /// Validate `config` and place the TCP at the start of the surface.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] if `config` fails
    /// [`TraverseConfig::validate`].
    pub fn new(surface: S, config: TraverseConfig, noise: NoiseSource<R>) -> Result<Self, TrackError> {
        config.validate()?;

        let caster = RayCaster::new(config.ray_step, config.ray_max_length);
        let estimator = PoseEstimator::new(config.target_offset, config.step_size);
        let pose = start_pose(&surface, &config);

        debug!(
            start_x = config.start_x,
            boundary_x = config.boundary_x,
            step_size = config.step_size,
            window = config.smoothing_window,
            "traverse initialised"
        );

        Ok(Self {
            caster,
            estimator,
            noise,
            pose,
            history1: SensorHistory::new(config.smoothing_window),
            history2: SensorHistory::new(config.smoothing_window),
            path: Vec::new(),
            smoothing_enabled: config.smoothing_enabled,
            steps_since_reset: 0,
            traverses_completed: 0,
            surface,
            config,
        })
    }

    /// Advance by exactly one perceive–estimate–act cycle.
    pub fn step(&mut self) -> StepResult {
        let pose = self.pose;
        let [lead1, lead2] = self.config.lead_distances;

        // Sensors ride on the current pose, not on the one about to be
        // estimated.
        let mount1 = pose.mount(lead1);
        let mount2 = pose.mount(lead2);
        let hit1 = self.caster.cast(&self.surface, mount1, pose.normal);
        let hit2 = self.caster.cast(&self.surface, mount2, pose.normal);

        let noise_std = self.config.noise_std;
        let smoothing = self.smoothing_enabled;
        let filtered1 = self
            .history1
            .observe(hit1.z, noise_std, smoothing, &mut self.noise);
        let filtered2 = self
            .history2
            .observe(hit2.z, noise_std, smoothing, &mut self.noise);

        let readings = SensorReadings {
            sensor1_hit: hit1,
            sensor2_hit: hit2,
            filtered1,
            filtered2,
            sensor_variance: pooled_reading_variance(&self.history1, &self.history2),
            output_variance: pooled_output_variance(&self.history1, &self.history2),
        };
        let (next, diagnostics) = self.estimator.estimate(&pose, &readings, &self.surface);

        self.path.push(pose.position());
        let step_index = self.steps_since_reset;

        debug!(
            step = step_index,
            x = pose.x,
            z = pose.z,
            slope = diagnostics.slope,
            tracking_error = diagnostics.tracking_error,
            smoothing,
            "traverse step"
        );

        let did_reset = next.x >= self.config.boundary_x;
        if did_reset {
            info!(
                steps = step_index + 1,
                next_x = next.x,
                boundary_x = self.config.boundary_x,
                "boundary reached; restarting traverse"
            );
            self.reset();
            self.traverses_completed += 1;
        } else {
            self.pose = next;
            self.steps_since_reset += 1;
        }

        StepResult {
            step_index,
            pose,
            sensor1_mount: mount1,
            sensor2_mount: mount2,
            sensor1_hit: hit1,
            sensor2_hit: hit2,
            filtered1,
            filtered2,
            diagnostics,
            did_reset,
        }
    }

    /// Enable or disable smoothing.  Applies from the next step's output on.
    pub fn set_smoothing_enabled(&mut self, enabled: bool) {
        self.smoothing_enabled = enabled;
    }

    pub fn smoothing_enabled(&self) -> bool {
        self.smoothing_enabled
    }

    /// The pose the next step will sense from.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// TCP positions visited since the last reset, oldest first.
    pub fn path_history(&self) -> &[Vec2] {
        &self.path
    }

    /// Current sizes of the two sensor histories.
    pub fn history_lens(&self) -> (usize, usize) {
        (self.history1.len(), self.history2.len())
    }

    pub fn steps_since_reset(&self) -> u64 {
        self.steps_since_reset
    }

    /// Number of boundary resets performed so far.
    pub fn traverses_completed(&self) -> u64 {
        self.traverses_completed
    }

    pub fn config(&self) -> &TraverseConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Ground-truth tracking error of the current pose.
    pub fn tracking_error(&self) -> f64 {
        self.estimator.tracking_error(&self.pose, &self.surface)
    }

    fn reset(&mut self) {
        self.history1.clear();
        self.history2.clear();
        self.path.clear();
        self.pose = start_pose(&self.surface, &self.config);
        self.steps_since_reset = 0;
    }
}

/// Start pose at the configured standoff, oriented along the true slope.
fn start_pose<S: Surface + ?Sized>(surface: &S, config: &TraverseConfig) -> Pose {
    let x = config.start_x;
    let slope = surface.slope_at(x, GROUND_TRUTH_SLOPE_EPS);
    Pose::from_slope(x, surface.height(x) + config.target_offset, slope)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
