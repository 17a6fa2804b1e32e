//! Forward kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Point3, Rotation3};

// Internal
use super::{Chain, Euler};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// World-space placement of a single segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    /// Position of the segment's joint, i.e. the endpoint of its parent.
    pub origin: Point3<f64>,

    /// Position of the segment's endpoint.
    pub end: Point3<f64>,

    /// Accumulated orientation of the segment in the world frame.
    pub orientation: Rotation3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Chain {
    /// Compose the parent-to-child transforms using the chain's current rotations.
    ///
    /// Returns one transform per segment, root first.
    pub fn forward_transform(&self) -> Vec<JointTransform> {
        let rotations: Vec<Euler> = self.joints().iter().map(|s| s.rotation).collect();
        self.forward_transform_with(&rotations)
    }

    /// Compose the parent-to-child transforms using the given joint rotations instead of the
    /// chain's rotation slots. The chain itself is not modified.
    ///
    /// Joints without an entry in `joint_rotations` use their current rotation.
    pub fn forward_transform_with(&self, joint_rotations: &[Euler]) -> Vec<JointTransform> {
        let mut transforms: Vec<JointTransform> = Vec::with_capacity(self.num_segments());

        for (i, seg) in self.segments().iter().enumerate() {
            let rotation = match i {
                0 => seg.rotation,
                _ => *joint_rotations.get(i - 1).unwrap_or(&seg.rotation),
            };

            let (origin, parent_orientation) = match seg.parent {
                Some(p) => (transforms[p].end, transforms[p].orientation),
                None => (Point3::origin(), Rotation3::identity()),
            };

            let orientation = parent_orientation * rotation.to_rotation();

            transforms.push(JointTransform {
                origin,
                end: origin + orientation * seg.offset_m,
                orientation,
            });
        }

        transforms
    }

    /// World position of the end effector with the chain's current rotations.
    pub fn end_effector(&self) -> Point3<f64> {
        self.end_effector_with(&[])
    }

    /// World position of the end effector for the given joint rotations.
    pub fn end_effector_with(&self, joint_rotations: &[Euler]) -> Point3<f64> {
        match self.forward_transform_with(joint_rotations).last() {
            Some(t) => t.end,
            None => Point3::origin(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chain::{JointLimits, SolvedPose};

    fn chain() -> Chain {
        Chain::build(
            &[0.3, 0.8, 0.8],
            &[
                JointLimits::from_degrees([0.0, -70.0, 0.0], [0.0, 70.0, 0.0]),
                JointLimits::from_degrees([0.0, 0.0, -70.0], [0.0, 0.0, 0.0]),
                JointLimits::from_degrees([0.0, 0.0, -120.0], [0.0, 0.0, -90.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rest_pose() {
        let chain = chain();
        let t = chain.forward_transform();

        assert_eq!(t.len(), 4);
        assert_eq!(t[0].origin, Point3::origin());
        assert_eq!(t[0].end, Point3::origin());

        // Base and right point straight up, left starts bent 90 degrees towards +X
        assert!((t[1].end - Point3::new(0.0, 0.3, 0.0)).norm() < 1e-12);
        assert!((t[2].end - Point3::new(0.0, 1.1, 0.0)).norm() < 1e-12);
        assert!((t[3].end - Point3::new(0.8, 1.1, 0.0)).norm() < 1e-12);

        // Each joint sits on its parent's endpoint
        for i in 1..t.len() {
            assert_eq!(t[i].origin, t[i - 1].end);
        }
    }

    #[test]
    fn test_base_swivel() {
        let mut chain = chain();
        chain
            .apply_rotation(&SolvedPose::new(vec![
                Euler::from_degrees(0.0, 90.0, 0.0),
                Euler::IDENTITY,
                Euler::from_degrees(0.0, 0.0, -90.0),
            ]))
            .unwrap_err();

        // 90 degrees is outside the base limits so use 60 instead
        let pose = vec![
            Euler::from_degrees(0.0, 60.0, 0.0),
            Euler::IDENTITY,
            Euler::from_degrees(0.0, 0.0, -90.0),
        ];
        chain.apply_rotation(&SolvedPose::new(pose.clone())).unwrap();

        let end = chain.end_effector();
        let p = 60f64.to_radians();

        // The swivel rotates the horizontal reach about Y, leaving the height untouched
        assert!((end - Point3::new(0.8 * p.cos(), 1.1, -0.8 * p.sin())).norm() < 1e-12);
        assert_eq!(end, chain.end_effector_with(&pose));
    }
}
