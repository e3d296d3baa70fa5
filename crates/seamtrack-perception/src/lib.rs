//! `seamtrack-perception` – sensing and estimation for surface tracking.
//!
//! Turns the ground-truth surface and two noisy look-ahead range sensors
//! into a local slope estimate and the next tool-center-point pose.
//!
//! # Modules
//!
//! - [`surface`] – [`Surface`][surface::Surface]: the height-field oracle,
//!   with the configurable [`SurfaceProfile`][surface::SurfaceProfile].
//! - [`raycast`] – [`RayCaster`][raycast::RayCaster]: marches a sensor ray
//!   until it crosses the surface, degrading gracefully when it does not.
//! - [`filter`] – [`SensorHistory`][filter::SensorHistory] and
//!   [`NoiseSource`][filter::NoiseSource]: Gaussian noise injection and
//!   bounded-window smoothing.
//! - [`estimator`] – [`PoseEstimator`][estimator::PoseEstimator]: slope,
//!   tangent/normal and feedforward pose prediction from two readings.

pub mod estimator;
pub mod filter;
pub mod raycast;
pub mod surface;

pub use estimator::{PoseEstimator, SensorReadings};
pub use filter::{NoiseSource, SensorHistory};
pub use raycast::RayCaster;
pub use surface::{Surface, SurfaceProfile};
