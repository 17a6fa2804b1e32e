//! Chain segments and joint limits

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use super::{Euler, EulerAxis};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The rotation limits of a single joint.
///
/// A joint can only rotate about the axes where `min < max`, axes with `min == max` are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub min: Euler,
    pub max: Euler,
}

/// A rigid link in the kinematic chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Index of the parent segment in the chain, `None` for the root.
    pub(crate) parent: Option<usize>,

    /// Rest-pose endpoint of the segment relative to its parent's endpoint.
    ///
    /// Units: meters
    pub(crate) offset_m: Vector3<f64>,

    pub(crate) limits: JointLimits,

    /// The current rotation of the segment about its joint.
    pub(crate) rotation: Euler,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointLimits {
    pub fn new(min: Euler, max: Euler) -> Self {
        Self { min, max }
    }

    /// Build limits from `[heading, pitch, bank]` arrays in degrees.
    pub fn from_degrees(min_deg: [f64; 3], max_deg: [f64; 3]) -> Self {
        Self {
            min: Euler::from_degrees(min_deg[0], min_deg[1], min_deg[2]),
            max: Euler::from_degrees(max_deg[0], max_deg[1], max_deg[2]),
        }
    }

    /// Limits which allow no rotation at all.
    pub fn fixed() -> Self {
        Self {
            min: Euler::IDENTITY,
            max: Euler::IDENTITY,
        }
    }

    /// Returns true if the limits are finite and `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && EulerAxis::ALL
                .iter()
                .all(|a| self.min.get(*a) <= self.max.get(*a))
    }

    /// The axes about which this joint can move.
    pub fn free_axes(&self) -> impl Iterator<Item = EulerAxis> + '_ {
        EulerAxis::ALL
            .iter()
            .copied()
            .filter(move |a| self.min.get(*a) < self.max.get(*a))
    }

    /// Clamp a rotation into these limits.
    pub fn clamp(&self, rotation: &Euler) -> Euler {
        rotation.clamped(&self.min, &self.max)
    }

    /// Returns true if the rotation lies within these limits.
    pub fn contains(&self, rotation: &Euler) -> bool {
        rotation.within(&self.min, &self.max)
    }
}

impl Segment {
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn offset_m(&self) -> &Vector3<f64> {
        &self.offset_m
    }

    pub fn length_m(&self) -> f64 {
        self.offset_m.norm()
    }

    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    pub fn rotation(&self) -> &Euler {
        &self.rotation
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
