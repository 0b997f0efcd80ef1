//! Biceps curl repetition counting from pose landmarks.
//!
//! [`geometry::elbow_angle`] turns shoulder/elbow/wrist positions into an
//! elbow angle and [`reps::RepCounter`] turns the angle stream into reps.
//! [`session`] wires both to a frame source and a pose estimator.

pub mod config;
pub mod geometry;
pub mod landmarks;
pub mod report;
pub mod reps;
pub mod session;
pub mod store;
pub mod trace;

#[cfg(feature = "camera")]
pub mod camera;
#[cfg(feature = "camera")]
pub mod inference;
#[cfg(feature = "camera")]
pub mod overlay;
