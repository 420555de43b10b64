//! Utility helpers for tests.
//!
//! Deterministic stand-ins for the collaborators the behaviour controllers
//! are driven through, plus a capture for simulation error events.

pub mod creature;
pub mod errors;
pub mod scripted_world;

pub use creature::{agent_rig, RecordingAnimation, TestCreature};
pub use errors::{install_error_observer, CapturedErrors};
pub use scripted_world::ScriptedWorld;

use glam::Vec3;

/// Shorthand for a point on the ground plane.
///
/// # Examples
/// ```
/// use test_utils::ground;
/// assert_eq!(ground(1.0, 2.0), glam::Vec3::new(1.0, 0.0, 2.0));
/// ```
pub fn ground(x: f32, z: f32) -> Vec3 {
    Vec3::new(x, 0.0, z)
}
