//! Geometry of a single arena region.
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::vector_math::horizontal_distance;

/// Immutable region agents must stay inside, measured on the XZ plane.
///
/// Containment is strict and the region is shrunk inward by `margin`, so a
/// point exactly on the shrunken edge is outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BoundaryRegion {
    /// Disc around `center`.
    Circle {
        /// Centre of the disc; its Y is ignored.
        center: Vec3,
        /// Radius before the margin is applied.
        radius: f32,
        /// Inward safety margin.
        #[serde(default)]
        margin: f32,
    },
    /// Axis-aligned rectangle around `center`.
    Box {
        /// Centre of the rectangle; its Y is ignored.
        center: Vec3,
        /// Half-extents along X (`x`) and Z (`y`).
        half_extents: Vec2,
        /// Inward safety margin.
        #[serde(default)]
        margin: f32,
    },
}

impl BoundaryRegion {
    /// Disc region without a margin.
    #[must_use]
    pub const fn circle(center: Vec3, radius: f32) -> Self {
        Self::Circle {
            center,
            radius,
            margin: 0.0,
        }
    }

    /// Rectangular region without a margin.
    #[must_use]
    pub const fn rect(center: Vec3, half_extents: Vec2) -> Self {
        Self::Box {
            center,
            half_extents,
            margin: 0.0,
        }
    }

    /// Returns the region with its margin replaced.
    #[must_use]
    pub const fn with_margin(self, new_margin: f32) -> Self {
        match self {
            Self::Circle { center, radius, .. } => Self::Circle {
                center,
                radius,
                margin: new_margin,
            },
            Self::Box {
                center,
                half_extents,
                ..
            } => Self::Box {
                center,
                half_extents,
                margin: new_margin,
            },
        }
    }

    /// Whether `point` lies strictly inside the region shrunk by its margin.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Circle {
                center,
                radius,
                margin,
            } => horizontal_distance(center, point) < radius - margin,
            Self::Box {
                center,
                half_extents,
                margin,
            } => {
                (point.x - center.x).abs() < half_extents.x - margin
                    && (point.z - center.z).abs() < half_extents.y - margin
            }
        }
    }
}
