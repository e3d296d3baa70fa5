//! Running statistics and one-line step summaries for the terminal.

use colored::Colorize;
use seamtrack_types::StepResult;

/// Aggregates diagnostics over a batch of steps.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunStats {
    pub steps: u64,
    pub resets: u64,
    /// Steps where at least one ray exhausted its search length.
    pub degraded: u64,
    sum_abs_error: f64,
    max_abs_error: f64,
    sum_output_variance: f64,
}

impl RunStats {
    pub fn record(&mut self, r: &StepResult) {
        let err = r.diagnostics.tracking_error.abs();
        self.steps += 1;
        self.sum_abs_error += err;
        self.max_abs_error = self.max_abs_error.max(err);
        self.sum_output_variance += r.diagnostics.output_variance;
        if r.did_reset {
            self.resets += 1;
        }
        if !r.sensor1_hit.intersected || !r.sensor2_hit.intersected {
            self.degraded += 1;
        }
    }

    pub fn mean_abs_error(&self) -> f64 {
        self.per_step(self.sum_abs_error)
    }

    pub fn max_abs_error(&self) -> f64 {
        self.max_abs_error
    }

    pub fn mean_output_variance(&self) -> f64 {
        self.per_step(self.sum_output_variance)
    }

    fn per_step(&self, total: f64) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            total / self.steps as f64
        }
    }
}

/// Compact status line for a single step.
pub fn step_line(r: &StepResult) -> String {
    let d = &r.diagnostics;
    let mut line = format!(
        "#{:<4} x={:>7.2} z={:>7.3}  grad={:>8.4}  err={:>7.3}  var={:>7.4}  beams={:>5.2}/{:>5.2}",
        r.step_index,
        r.pose.x,
        r.pose.z,
        d.slope,
        d.tracking_error,
        d.sensor_variance,
        d.sensor1_range,
        d.sensor2_range,
    );
    if !r.sensor1_hit.intersected || !r.sensor2_hit.intersected {
        line.push_str(&format!("  {}", "no-hit".yellow()));
    }
    if r.did_reset {
        line.push_str(&format!("  {}", "RESET".magenta().bold()));
    }
    line
}

/// Multi-line summary printed after a batch.
pub fn summary(stats: &RunStats) -> String {
    format!(
        "  steps: {}   resets: {}   degraded: {}\n  mean |err|: {:.4}   max |err|: {:.4}   mean output var: {:.5}",
        stats.steps,
        stats.resets,
        stats.degraded,
        stats.mean_abs_error(),
        stats.max_abs_error(),
        stats.mean_output_variance(),
    )
}
