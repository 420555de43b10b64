//! Formation slot maths for following agents.
use glam::Vec3;

use crate::entity::{AnchorState, FormationSlot};
use crate::numeric::{count_to_f32, sibling_count};
use crate::vector_math::{flatten, rotate_yaw, safe_normalize};

/// Angular offset, in radians, of `slot` within a fan of `spread_degrees`
/// either side of straight behind the anchor.
///
/// Siblings are spaced evenly across the fan; a lone agent sits directly
/// behind.
///
/// # Examples
/// ```
/// use menagerie::behaviour::slot_angle;
/// use menagerie::entity::FormationSlot;
/// assert_eq!(slot_angle(FormationSlot { index: 0, count: 1 }, 30.0), 0.0);
/// let left = slot_angle(FormationSlot { index: 0, count: 3 }, 30.0);
/// assert!((left + 30_f32.to_radians()).abs() < 1e-6);
/// ```
#[must_use]
pub fn slot_angle(slot: FormationSlot, spread_degrees: f32) -> f32 {
    let count = sibling_count(slot.count);
    if count == 1 {
        return 0.0;
    }
    let spread = spread_degrees.to_radians();
    let index = slot.index.min(count - 1);
    -spread + count_to_f32(index) * (2.0 * spread / count_to_f32(count - 1))
}

/// World position of `slot` behind `anchor`.
#[must_use]
pub fn slot_position(anchor: &AnchorState, slot: FormationSlot, radius: f32, spread_degrees: f32) -> Vec3 {
    let mut behind = safe_normalize(flatten(-anchor.forward));
    if behind == Vec3::ZERO {
        behind = Vec3::NEG_Z;
    }
    anchor.position + rotate_yaw(behind, slot_angle(slot, spread_degrees)) * radius
}

/// Interval-refreshed slot target with follow hysteresis.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct FormationTracker {
    until_refresh: f32,
    target: Option<Vec3>,
    active: bool,
}

impl FormationTracker {
    /// Returns the cached slot, recomputing it once the interval elapses.
    ///
    /// A moving anchor drags its slot along, so `anchor_moving` bypasses the
    /// cache and recomputes every call.
    pub(super) fn target(
        &mut self,
        dt: f32,
        interval: f32,
        anchor_moving: bool,
        compute: impl FnOnce() -> Vec3,
    ) -> Vec3 {
        self.until_refresh -= dt;
        match self.target {
            Some(target) if !anchor_moving && self.until_refresh > 0.0 => target,
            _ => {
                let target = compute();
                self.target = Some(target);
                self.until_refresh = interval;
                target
            }
        }
    }

    pub(super) const fn is_active(&self) -> bool {
        self.active
    }

    pub(super) fn start(&mut self) {
        self.active = true;
    }

    pub(super) fn settle(&mut self) {
        self.active = false;
    }

    /// Drops the cached slot so the next query recomputes it.
    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn anchor_facing_z() -> AnchorState {
        AnchorState {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            moving: false,
        }
    }

    #[rstest]
    #[case(0, 3, -30.0)]
    #[case(1, 3, 0.0)]
    #[case(2, 3, 30.0)]
    #[case(1, 2, 30.0)]
    #[case(9, 3, 30.0)]
    fn slots_spread_evenly(#[case] index: usize, #[case] count: usize, #[case] degrees: f32) {
        let angle = slot_angle(FormationSlot { index, count }, 30.0);
        assert_relative_eq!(angle, degrees.to_radians(), epsilon = 1e-5);
    }

    #[rstest]
    fn zero_siblings_is_treated_as_one() {
        assert_relative_eq!(slot_angle(FormationSlot { index: 0, count: 0 }, 30.0), 0.0);
    }

    #[rstest]
    fn lone_slot_sits_behind_anchor() {
        let position = slot_position(&anchor_facing_z(), FormationSlot::default(), 2.0, 30.0);
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(position.z, -2.0, epsilon = 1e-5);
    }

    #[rstest]
    fn anchor_without_facing_uses_negative_z() {
        let anchor = AnchorState {
            forward: Vec3::ZERO,
            ..anchor_facing_z()
        };
        let position = slot_position(&anchor, FormationSlot::default(), 1.0, 30.0);
        assert_relative_eq!(position.z, -1.0, epsilon = 1e-5);
    }

    #[rstest]
    fn tracker_refreshes_on_interval() {
        let mut tracker = FormationTracker::default();
        let mut calls = 0;
        for _ in 0..10 {
            tracker.target(0.1, 0.5, false, || {
                calls += 1;
                Vec3::ZERO
            });
        }
        assert_eq!(calls, 2);
    }

    #[rstest]
    fn tracker_recomputes_every_tick_while_anchor_moves() {
        let mut tracker = FormationTracker::default();
        let mut calls = 0;
        for step in 0..10 {
            let slot = tracker.target(0.1, 0.5, true, || {
                calls += 1;
                Vec3::new(count_to_f32(step), 0.0, 0.0)
            });
            assert_relative_eq!(slot.x, count_to_f32(step));
        }
        assert_eq!(calls, 10);
        tracker.target(0.1, 0.5, false, || {
            calls += 1;
            Vec3::ZERO
        });
        assert_eq!(calls, 10);
    }
}
