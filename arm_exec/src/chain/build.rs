//! Chain construction and rotation commits

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;
use serde::Serialize;
use std::ops::Index;

// Internal
use super::{ChainError, Euler, JointLimits, Segment};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered sequence of segments from the root to the end effector.
///
/// Segment 0 is always the root, which has zero offset and a fixed identity rotation. Every other
/// segment is a moving joint, the parent of segment `i` is segment `i - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    segments: Vec<Segment>,
}

/// One rotation per moving joint of a chain, in chain order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SolvedPose(Vec<Euler>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Chain {
    /// Build a chain with one moving joint per entry in `lengths_m`.
    ///
    /// Each segment extends along its local +Y axis by its length. `limits[i]` is the rotation
    /// range of joint `i`. Every joint starts at its limit-clamped identity rotation.
    pub fn build(lengths_m: &[f64], limits: &[JointLimits]) -> Result<Self, ChainError> {
        if lengths_m.is_empty() {
            return Err(ChainError::NoJoints);
        }

        if lengths_m.len() != limits.len() {
            return Err(ChainError::LengthLimitMismatch {
                lengths: lengths_m.len(),
                limits: limits.len(),
            });
        }

        let mut segments = Vec::with_capacity(lengths_m.len() + 1);

        segments.push(Segment {
            parent: None,
            offset_m: Vector3::zeros(),
            limits: JointLimits::fixed(),
            rotation: Euler::IDENTITY,
        });

        for (i, (length_m, lim)) in lengths_m.iter().zip(limits.iter()).enumerate() {
            if !length_m.is_finite() || *length_m < 0.0 {
                return Err(ChainError::InvalidLength {
                    joint: i,
                    length_m: *length_m,
                });
            }

            if !lim.is_valid() {
                return Err(ChainError::InvalidLimits { joint: i });
            }

            segments.push(Segment {
                parent: Some(i),
                offset_m: Vector3::new(0.0, *length_m, 0.0),
                limits: *lim,
                rotation: lim.clamp(&Euler::IDENTITY),
            });
        }

        Ok(Self { segments })
    }

    /// Commit a solved pose into the joints' rotation slots.
    ///
    /// The pose must contain exactly one rotation per joint, each within that joint's limits. On
    /// error the chain is left unchanged.
    pub fn apply_rotation(&mut self, pose: &SolvedPose) -> Result<(), ChainError> {
        if pose.len() != self.num_joints() {
            return Err(ChainError::PoseLengthMismatch {
                expected: self.num_joints(),
                found: pose.len(),
            });
        }

        for (i, (seg, rot)) in self.joints().iter().zip(pose.iter()).enumerate() {
            if !seg.limits.contains(rot) {
                return Err(ChainError::RotationOutOfLimits { joint: i });
            }
        }

        for (seg, rot) in self.segments[1..].iter_mut().zip(pose.iter()) {
            seg.rotation = *rot;
        }

        trace!("Chain rotations updated: {:?}", pose);

        Ok(())
    }

    /// All segments including the root.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The moving segments, excluding the root.
    pub fn joints(&self) -> &[Segment] {
        &self.segments[1..]
    }

    pub fn root(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn num_joints(&self) -> usize {
        self.segments.len() - 1
    }

    /// The current rotation of every joint.
    pub fn rotations(&self) -> SolvedPose {
        SolvedPose(self.joints().iter().map(|s| s.rotation).collect())
    }

    /// Sum of all segment lengths. No target farther than this from the root can be reached.
    ///
    /// Units: meters
    pub fn total_reach_m(&self) -> f64 {
        self.segments.iter().map(|s| s.length_m()).sum()
    }
}

impl SolvedPose {
    pub fn new(rotations: Vec<Euler>) -> Self {
        Self(rotations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Euler> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Euler] {
        &self.0
    }
}

impl Index<usize> for SolvedPose {
    type Output = Euler;

    fn index(&self, index: usize) -> &Euler {
        &self.0[index]
    }
}

impl From<Vec<Euler>> for SolvedPose {
    fn from(rotations: Vec<Euler>) -> Self {
        Self(rotations)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn default_limits() -> Vec<JointLimits> {
        vec![
            JointLimits::from_degrees([0.0, -70.0, 0.0], [0.0, 70.0, 0.0]),
            JointLimits::from_degrees([0.0, 0.0, -70.0], [0.0, 0.0, 0.0]),
            JointLimits::from_degrees([0.0, 0.0, -120.0], [0.0, 0.0, -90.0]),
        ]
    }

    #[test]
    fn test_build_chain() {
        let chain = Chain::build(&[0.3, 0.8, 0.8], &default_limits()).unwrap();

        assert_eq!(chain.num_joints(), 3);
        assert_eq!(chain.num_segments(), 4);
        assert_eq!(*chain.root().rotation(), Euler::IDENTITY);
        assert_eq!(chain.root().offset_m().norm(), 0.0);
        assert!(chain.root().is_root());
        assert!((chain.total_reach_m() - 1.9).abs() < 1e-12);

        // Every joint starts inside its limits and is parented to the previous segment
        for (i, seg) in chain.joints().iter().enumerate() {
            assert_eq!(seg.parent(), Some(i));
            assert!(seg.limits().contains(seg.rotation()));
        }

        // The left joint cannot sit at identity so starts on its nearest limit
        assert!((chain.joints()[2].rotation().bank.to_degrees() + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(Chain::build(&[], &[]), Err(ChainError::NoJoints));
        assert_eq!(
            Chain::build(&[0.3, 0.8], &default_limits()),
            Err(ChainError::LengthLimitMismatch {
                lengths: 2,
                limits: 3
            })
        );
        assert_eq!(
            Chain::build(&[0.3, -0.8, 0.8], &default_limits()),
            Err(ChainError::InvalidLength {
                joint: 1,
                length_m: -0.8
            })
        );

        let mut limits = default_limits();
        limits[2] = JointLimits::from_degrees([0.0, 0.0, -90.0], [0.0, 0.0, -120.0]);
        assert_eq!(
            Chain::build(&[0.3, 0.8, 0.8], &limits),
            Err(ChainError::InvalidLimits { joint: 2 })
        );
    }

    #[test]
    fn test_apply_rotation() {
        let mut chain = Chain::build(&[0.3, 0.8, 0.8], &default_limits()).unwrap();

        let pose = SolvedPose::new(vec![
            Euler::from_degrees(0.0, 20.0, 0.0),
            Euler::from_degrees(0.0, 0.0, -30.0),
            Euler::from_degrees(0.0, 0.0, -100.0),
        ]);
        chain.apply_rotation(&pose).unwrap();
        assert_eq!(chain.rotations(), pose);
        assert_eq!(*chain.root().rotation(), Euler::IDENTITY);

        // Wrong length is rejected
        let short = SolvedPose::new(vec![Euler::IDENTITY]);
        assert_eq!(
            chain.apply_rotation(&short),
            Err(ChainError::PoseLengthMismatch {
                expected: 3,
                found: 1
            })
        );

        // Out of limits is rejected and leaves the chain untouched
        let bad = SolvedPose::new(vec![
            Euler::IDENTITY,
            Euler::IDENTITY,
            Euler::from_degrees(0.0, 0.0, 10.0),
        ]);
        assert_eq!(
            chain.apply_rotation(&bad),
            Err(ChainError::RotationOutOfLimits { joint: 2 })
        );
        assert_eq!(chain.rotations(), pose);
    }
}
