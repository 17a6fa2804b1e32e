//! Limit-clamped cyclic coordinate descent solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Point3;

// Internal
use super::{Solution, Solver, SolverError, SolverParams};
use crate::chain::{Chain, Euler, EulerAxis, SolvedPose};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Solver which walks each free joint axis in turn, keeping any step which brings the end
/// effector closer to the target and halving the step size when no axis can improve.
///
/// The search is warm-started from the chain's current rotations, so successive nearby targets
/// converge quickly and the arm does not jump between equivalent solutions. Every trial rotation
/// is clamped into the joint's limits, so the result always respects them.
#[derive(Debug, Clone, Default)]
pub struct DescentSolver {
    params: SolverParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DescentSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }
}

impl Solver for DescentSolver {
    fn solve(&self, chain: &Chain, target: &Point3<f64>) -> Result<Solution, SolverError> {
        if chain.num_joints() == 0 {
            return Err(SolverError::NoJoints);
        }

        if !target.coords.iter().all(|c| c.is_finite()) {
            return Err(SolverError::NonFiniteTarget([target.x, target.y, target.z]));
        }

        let joints = chain.joints();

        // Scratch copy of the rotations, the chain itself is never touched
        let mut rots: Vec<Euler> = joints
            .iter()
            .map(|s| s.limits().clamp(s.rotation()))
            .collect();

        let free_axes: Vec<(usize, EulerAxis)> = joints
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.limits().free_axes().map(move |a| (i, a)))
            .collect();

        let dist = |r: &[Euler]| (chain.end_effector_with(r) - *target).norm();

        // Refine well past the tolerance so reached targets are placed accurately
        let exact_m = self.params.tolerance_m * 1e-3;

        let mut best_m = dist(rots.as_slice());
        let mut step_rad = self.params.initial_step_rad;
        let mut sweeps = 0;

        while best_m > exact_m
            && step_rad >= self.params.min_step_rad
            && sweeps < self.params.max_sweeps
        {
            let mut improved = false;

            for (j, axis) in free_axes.iter() {
                let limits = *joints[*j].limits();
                let current = rots[*j].get(*axis);
                let mut best_val = current;

                for dir in &[1.0f64, -1.0] {
                    let mut trial = rots[*j];
                    trial.set(*axis, current + dir * step_rad);
                    let trial = limits.clamp(&trial);

                    // Pinned against a limit in this direction
                    if trial.get(*axis) == current {
                        continue;
                    }

                    let saved = rots[*j];
                    rots[*j] = trial;
                    let d = dist(rots.as_slice());
                    rots[*j] = saved;

                    if d < best_m {
                        best_m = d;
                        best_val = trial.get(*axis);
                    }
                }

                if best_val != current {
                    rots[*j].set(*axis, best_val);
                    improved = true;
                }
            }

            if !improved {
                step_rad *= 0.5;
            }

            sweeps += 1;
        }

        let reached = best_m <= self.params.tolerance_m;

        debug!(
            "Solve for {:?}: reached={} dist={:.6} m after {} sweeps (final step {:.2e} rad)",
            target, reached, best_m, sweeps, step_rad
        );

        Ok(Solution {
            reached,
            pose: SolvedPose::new(rots),
            distance_m: best_m,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chain::JointLimits;

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

    fn assert_within_limits(chain: &Chain, pose: &SolvedPose) {
        assert_eq!(pose.len(), chain.num_joints());
        for (seg, rot) in chain.joints().iter().zip(pose.iter()) {
            assert!(seg.limits().contains(rot), "{:?} outside {:?}", rot, seg.limits());
        }
    }

    #[test]
    fn test_reachable_target() {
        let chain = chain();
        let before = chain.clone();
        let target = Point3::new(0.8, 1.1, 0.0);

        let sol = DescentSolver::default().solve(&chain, &target).unwrap();

        assert!(sol.reached);
        assert!(sol.distance_m <= 0.01);
        assert_within_limits(&chain, &sol.pose);
        assert!((chain.end_effector_with(sol.pose.as_slice()) - target).norm() <= 0.01);

        // Solving never touches the chain
        assert_eq!(chain, before);
    }

    #[test]
    fn test_recovers_known_pose() {
        let chain = chain();

        // Pick a pose inside the limits and solve for where it puts the end effector
        let pose = vec![
            Euler::from_degrees(0.0, 20.0, 0.0),
            Euler::from_degrees(0.0, 0.0, -30.0),
            Euler::from_degrees(0.0, 0.0, -100.0),
        ];
        let target = chain.end_effector_with(&pose);

        let sol = DescentSolver::default().solve(&chain, &target).unwrap();

        assert!(sol.reached, "distance {} m", sol.distance_m);
        assert_within_limits(&chain, &sol.pose);
    }

    #[test]
    fn test_unreachable_targets() {
        let chain = chain();
        let solver = DescentSolver::default();

        // The root itself is closer than the folded arm can reach
        let sol = solver.solve(&chain, &Point3::origin()).unwrap();
        assert!(!sol.reached);
        assert!(sol.distance_m > 0.01);
        assert_within_limits(&chain, &sol.pose);

        // Beyond the total reach
        let sol = solver.solve(&chain, &Point3::new(2.0, 2.0, 2.0)).unwrap();
        assert!(!sol.reached);
        assert!(sol.distance_m > 0.0);
        assert_within_limits(&chain, &sol.pose);
    }

    #[test]
    fn test_non_finite_target() {
        match DescentSolver::default().solve(&chain(), &Point3::new(f64::NAN, 0.0, 0.0)) {
            Err(SolverError::NonFiniteTarget(_)) => (),
            r => panic!("Expected a non-finite target error, got {:?}", r),
        }
    }
}
