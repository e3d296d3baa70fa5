//! Noise & Smoothing Filter.
//!
//! Each sensor owns a [`SensorHistory`]: a count-based FIFO of its most
//! recent noisy readings, capacity `W`.  Every observation
//!
//! 1. perturbs the raw intersection height with zero-mean Gaussian noise
//!    drawn from a [`NoiseSource`],
//! 2. pushes the noisy value, evicting the oldest once the window is full,
//! 3. emits either the mean of the whole window (smoothing on) or the noisy
//!    value itself (smoothing off).
//!
//! The window is updated in both modes so that turning smoothing on later
//! resumes with the readings already gathered.
//!
//! # Example
//!
//! ```rust
//! use seamtrack_perception::filter::{NoiseSource, SensorHistory};
//!
//! let mut noise = NoiseSource::seeded(7);
//! let mut history = SensorHistory::new(3);
//!
//! for raw in [1.0, 2.0, 3.0, 4.0] {
//!     history.observe(raw, 0.0, true, &mut noise);
//! }
//! assert_eq!(history.len(), 3);
//! assert!((history.mean().unwrap() - 3.0).abs() < 1e-12);
//! ```

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

// ────────────────────────────────────────────────────────────────────────────
// NoiseSource
// ────────────────────────────────────────────────────────────────────────────

/// Injectable Gaussian noise generator.
///
/// Seed it for reproducible runs; draws are the only non-determinism in a
/// traverse.
#[derive(Debug, Clone)]
pub struct NoiseSource<R: Rng = StdRng> {
    rng: R,
}

impl NoiseSource<StdRng> {
    /// Deterministic source: the same seed yields the same draws.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> NoiseSource<R> {
    /// Wrap an arbitrary generator.
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One draw from `N(0, std²)`.  Exactly `0.0` when `std == 0`.
    pub fn gaussian(&mut self, std: f64) -> f64 {
        if std == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * std
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SensorHistory
// ────────────────────────────────────────────────────────────────────────────

/// Bounded FIFO of one sensor's recent noisy readings, plus the filter
/// outputs it emitted for them.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    window: usize,
    readings: VecDeque<f64>,
    outputs: VecDeque<f64>,
}

impl SensorHistory {
    /// Create an empty history holding at most `window` readings.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            readings: VecDeque::with_capacity(window + 1),
            outputs: VecDeque::with_capacity(window + 1),
        }
    }

    /// Perturb `raw_height`, record it, and return the filtered height.
    pub fn observe<R: Rng>(
        &mut self,
        raw_height: f64,
        noise_std: f64,
        smoothing_enabled: bool,
        noise: &mut NoiseSource<R>,
    ) -> f64 {
        let noisy = raw_height + noise.gaussian(noise_std);
        push_bounded(&mut self.readings, noisy, self.window);

        let filtered = if smoothing_enabled {
            // The window holds at least `noisy` at this point.
            self.mean().unwrap_or(noisy)
        } else {
            noisy
        };
        push_bounded(&mut self.outputs, filtered, self.window);
        filtered
    }

    /// Arithmetic mean of the current window, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        mean(self.readings.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Noisy readings, oldest first.
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().copied()
    }

    /// Emitted filter outputs, oldest first.
    pub fn outputs(&self) -> impl Iterator<Item = f64> + '_ {
        self.outputs.iter().copied()
    }

    /// Forget everything.  Used when a traverse restarts.
    pub fn clear(&mut self) {
        self.readings.clear();
        self.outputs.clear();
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, window: usize) {
    buf.push_back(value);
    while buf.len() > window {
        buf.pop_front();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pooled statistics
// ────────────────────────────────────────────────────────────────────────────

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Population variance of all values yielded by `values`; `0.0` when empty.
pub fn population_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let Some(mu) = mean(values.clone()) else {
        return 0.0;
    };
    let (sq, n) = values.fold((0.0, 0usize), |(s, n), v| (s + (v - mu).powi(2), n + 1));
    sq / n as f64
}

/// Variance of both sensors' raw windows pooled together.
pub fn pooled_reading_variance(a: &SensorHistory, b: &SensorHistory) -> f64 {
    population_variance(a.readings.iter().chain(b.readings.iter()).copied())
}

/// Variance of both sensors' emitted outputs pooled together.
pub fn pooled_output_variance(a: &SensorHistory, b: &SensorHistory) -> f64 {
    population_variance(a.outputs.iter().chain(b.outputs.iter()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let mut a = NoiseSource::seeded(42);
        let mut b = NoiseSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.gaussian(0.2), b.gaussian(0.2));
        }
    }

    #[test]
    fn zero_std_is_exactly_zero() {
        let mut noise = NoiseSource::seeded(1);
        for _ in 0..10 {
            assert_eq!(noise.gaussian(0.0), 0.0);
        }
    }

    #[test]
    fn draws_have_roughly_the_requested_spread() {
        let mut noise = NoiseSource::seeded(3);
        let draws: Vec<f64> = (0..20_000).map(|_| noise.gaussian(2.0)).collect();
        let var = population_variance(draws.iter().copied());
        let mu = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!(mu.abs() < 0.1, "mean {mu}");
        assert!((var - 4.0).abs() < 0.3, "variance {var}");
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut noise = NoiseSource::seeded(0);
        let mut h = SensorHistory::new(3);
        for raw in [1.0, 2.0, 3.0, 4.0, 5.0] {
            h.observe(raw, 0.0, true, &mut noise);
        }
        assert_eq!(h.readings().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn length_is_min_of_observations_and_window() {
        let mut noise = NoiseSource::seeded(5);
        let mut h = SensorHistory::new(4);
        for n in 1..=10 {
            h.observe(0.0, 0.3, false, &mut noise);
            assert_eq!(h.len(), n.min(4));
        }
    }

    #[test]
    fn smoothing_on_emits_window_mean() {
        let mut noise = NoiseSource::seeded(0);
        let mut h = SensorHistory::new(2);
        assert_eq!(h.observe(2.0, 0.0, true, &mut noise), 2.0);
        assert_eq!(h.observe(4.0, 0.0, true, &mut noise), 3.0);
        assert_eq!(h.observe(8.0, 0.0, true, &mut noise), 6.0);
    }

    #[test]
    fn smoothing_off_emits_raw_but_still_records() {
        let mut noise = NoiseSource::seeded(0);
        let mut h = SensorHistory::new(3);
        assert_eq!(h.observe(1.0, 0.0, false, &mut noise), 1.0);
        assert_eq!(h.observe(5.0, 0.0, false, &mut noise), 5.0);
        assert_eq!(h.len(), 2);

        // Re-enabling resumes with the accumulated context.
        assert_eq!(h.observe(3.0, 0.0, true, &mut noise), 3.0);
        assert_eq!(h.observe(7.0, 0.0, true, &mut noise), 5.0);
    }

    #[test]
    fn noisy_smoothing_off_equals_raw_plus_draw() {
        let mut reference = NoiseSource::seeded(11);
        let expected = 10.0 + reference.gaussian(0.2);

        let mut noise = NoiseSource::seeded(11);
        let mut h = SensorHistory::new(5);
        assert_eq!(h.observe(10.0, 0.2, false, &mut noise), expected);
    }

    #[test]
    fn clear_empties_readings_and_outputs() {
        let mut noise = NoiseSource::seeded(0);
        let mut h = SensorHistory::new(3);
        h.observe(1.0, 0.1, true, &mut noise);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.outputs().count(), 0);
        assert!(h.mean().is_none());
    }

    #[test]
    fn pooled_variance_of_empty_histories_is_zero() {
        let a = SensorHistory::new(5);
        let b = SensorHistory::new(5);
        assert_eq!(pooled_reading_variance(&a, &b), 0.0);
        assert_eq!(pooled_output_variance(&a, &b), 0.0);
    }

    #[test]
    fn pooled_variance_spans_both_sensors() {
        let mut noise = NoiseSource::seeded(0);
        let mut a = SensorHistory::new(5);
        let mut b = SensorHistory::new(5);
        a.observe(1.0, 0.0, false, &mut noise);
        b.observe(3.0, 0.0, false, &mut noise);
        // Pooled {1, 3}: mean 2, population variance 1.
        assert!((pooled_reading_variance(&a, &b) - 1.0).abs() < 1e-12);
    }
}
