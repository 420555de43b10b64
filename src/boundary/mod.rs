//! Arena boundary queries shared by every agent.
//!
//! A [`BoundaryOracle`] is built once from the configured regions and handed
//! to each controller behind an `Arc`. A point is safe only when it is inside
//! every region. With no regions registered the answer comes from the
//! configured [`EmptyRegionPolicy`], and the first such answer is logged at
//! warn level so a missing arena setup never goes unnoticed.

mod region;

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{BOUNDARY_BISECTION_STEPS, PATH_SAMPLE_STEP};

pub use region::BoundaryRegion;

/// Answer given by an oracle that has no regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRegionPolicy {
    /// Every point is safe. Agents may wander unbounded.
    #[default]
    FailOpen,
    /// No point is safe. Agents stay where they are.
    FailClosed,
}

/// Answers "may an agent stand here?" for a set of regions.
#[derive(Debug, Default)]
pub struct BoundaryOracle {
    regions: Vec<BoundaryRegion>,
    policy: EmptyRegionPolicy,
    warned_empty: AtomicBool,
}

impl BoundaryOracle {
    /// Builds an oracle over `regions`.
    #[must_use]
    pub fn new(regions: Vec<BoundaryRegion>, policy: EmptyRegionPolicy) -> Self {
        Self {
            regions,
            policy,
            warned_empty: AtomicBool::new(false),
        }
    }

    /// An oracle with no regions that treats every point as safe.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(Vec::new(), EmptyRegionPolicy::FailOpen)
    }

    /// Adds a region, returning the extended oracle.
    #[must_use]
    pub fn with_region(mut self, region: BoundaryRegion) -> Self {
        self.regions.push(region);
        self
    }

    /// The registered regions.
    #[must_use]
    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    /// Policy applied when no regions are registered.
    #[must_use]
    pub const fn policy(&self) -> EmptyRegionPolicy {
        self.policy
    }

    fn empty_answer(&self) -> bool {
        let answer = self.policy == EmptyRegionPolicy::FailOpen;
        if self.warned_empty.swap(true, Ordering::Relaxed) {
            debug!("boundary oracle has no regions; answering {answer}");
        } else {
            warn!(
                "boundary oracle has no regions registered; {:?} policy answers {answer} for every point",
                self.policy
            );
        }
        answer
    }

    /// Whether `point` is strictly inside every region after margins.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use menagerie::boundary::{BoundaryOracle, BoundaryRegion, EmptyRegionPolicy};
    /// let oracle = BoundaryOracle::new(
    ///     vec![BoundaryRegion::circle(Vec3::ZERO, 5.0)],
    ///     EmptyRegionPolicy::FailOpen,
    /// );
    /// assert!(oracle.is_safe(Vec3::new(4.0, 0.0, 0.0)));
    /// assert!(!oracle.is_safe(Vec3::new(5.0, 0.0, 0.0)));
    /// ```
    #[must_use]
    pub fn is_safe(&self, point: Vec3) -> bool {
        if self.regions.is_empty() {
            return self.empty_answer();
        }
        self.regions.iter().all(|region| region.contains(point))
    }

    /// Furthest safe point on the segment `from -> towards`.
    ///
    /// `from` is assumed safe; when it is not, `from` is returned unchanged.
    /// The search bisects the segment [`BOUNDARY_BISECTION_STEPS`] times.
    #[must_use]
    pub fn closest_safe_point(&self, from: Vec3, towards: Vec3) -> Vec3 {
        if self.is_safe(towards) {
            return towards;
        }
        if !self.is_safe(from) {
            debug!("closest_safe_point called from unsafe origin {from}");
            return from;
        }
        let mut safe = 0.0_f32;
        let mut unsafe_t = 1.0_f32;
        for _ in 0..BOUNDARY_BISECTION_STEPS {
            let mid = (safe + unsafe_t) * 0.5;
            if self.is_safe(from.lerp(towards, mid)) {
                safe = mid;
            } else {
                unsafe_t = mid;
            }
        }
        from.lerp(towards, safe)
    }

    /// Whether every sample along `from -> to`, spaced
    /// [`PATH_SAMPLE_STEP`] apart, is safe. Both endpoints are checked.
    #[must_use]
    pub fn is_path_safe(&self, from: Vec3, to: Vec3) -> bool {
        let delta = to - from;
        let length = delta.length();
        if !length.is_finite() {
            return false;
        }
        let direction = delta.normalize_or_zero();
        let mut travelled = 0.0_f32;
        while travelled < length {
            if !self.is_safe(from + direction * travelled) {
                return false;
            }
            travelled += PATH_SAMPLE_STEP;
        }
        self.is_safe(to)
    }
}
