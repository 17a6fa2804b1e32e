//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::{eqpt::servo::{ServoCommand, NUM_SERVOS}, tc::Target};
use log::{debug, warn};
use nalgebra::Point3;
use serde::Serialize;

// Internal
use super::{map_to_servo, ArmCtrlError, Params};
use crate::{
    chain::{Chain, SolvedPose},
    solver::{DescentSolver, Solver},
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) chain: Option<Chain>,

    solver: Box<dyn Solver + Send>,

    pub(crate) report: StatusReport,
}

/// Input data to Arm Control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// The target to move the arm to.
    pub target: Target,
}

/// Output of Arm Control for a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmOutput {
    /// The pose committed into the chain.
    pub pose: SolvedPose,

    /// Servo demands for the pose.
    pub servo: ServoCommand,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// True if the solver placed the end effector within tolerance of the target.
    pub reached: bool,

    /// Distance left between the end effector and the target.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Servos whose demands had to be clamped into range, in `ServoId::ALL` order.
    pub clamped: [bool; NUM_SERVOS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = &'static str;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = ArmOutput;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;

        self.solver = Box::new(DescentSolver::new(params.solver.clone()));
        self.chain = Some(Chain::build(
            &params.segment_lengths_m,
            &params.joint_limits(),
        )?);
        self.params = params;

        Ok(())
    }

    /// Solve for the target, commit the pose and map it to servo demands.
    ///
    /// Targets which cannot be reached are not an error, the best pose the solver found is
    /// committed and `reached` is cleared in the status report.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let chain = self.chain.as_mut().ok_or(ArmCtrlError::NotInitialised)?;
        let t = &input_data.target;

        let solution = self.solver.solve(chain, &Point3::new(t.x, t.y, t.z))?;

        if !solution.reached {
            warn!(
                "Target ({:.3}, {:.3}, {:.3}) not reached, {:.3} m away, using best effort pose",
                t.x, t.y, t.z, solution.distance_m
            );
        }

        chain.apply_rotation(&solution.pose)?;

        let mapped = map_to_servo(&solution.pose, t.claw)?;

        if mapped.clamped.iter().any(|c| *c) {
            debug!("Servo demands clamped into range: {:?}", mapped.clamped);
        }

        self.report = StatusReport {
            reached: solution.reached,
            distance_m: solution.distance_m,
            clamped: mapped.clamped,
        };

        Ok((
            ArmOutput {
                pose: solution.pose,
                servo: mapped.cmd,
            },
            self.report,
        ))
    }
}

impl ArmCtrl {
    /// Create an uninitialised module using the default solver.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
            chain: None,
            solver: Box::new(DescentSolver::default()),
            report: StatusReport::default(),
        }
    }

    /// Create an initialised module from already loaded parameters.
    pub fn from_params(params: Params) -> Result<Self, ArmCtrlError> {
        let chain = Chain::build(&params.segment_lengths_m, &params.joint_limits())?;

        Ok(Self {
            solver: Box::new(DescentSolver::new(params.solver.clone())),
            chain: Some(chain),
            params,
            report: StatusReport::default(),
        })
    }

    /// Replace the solver used for subsequent targets.
    pub fn with_solver<S: Solver + Send + 'static>(mut self, solver: S) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The chain with the rotations of the last committed pose, or `None` before
    /// initialisation.
    pub fn chain(&self) -> Option<&Chain> {
        self.chain.as_ref()
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

impl Default for ArmCtrl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::{Solution, SolverError};
    use arm_if::eqpt::servo::SERVO_MAX_DEG;

    fn in_range(cmd: &ServoCommand) -> bool {
        cmd.iter().all(|(_, a)| a <= SERVO_MAX_DEG)
    }

    #[test]
    fn test_uninitialised() {
        let mut arm = ArmCtrl::new();
        match arm.proc(&InputData::default()) {
            Err(ArmCtrlError::NotInitialised) => (),
            r => panic!("Expected not initialised error, got {:?}", r),
        }
    }

    #[test]
    fn test_reachable_target() {
        let mut arm = ArmCtrl::from_params(Params::default()).unwrap();

        let (out, report) = arm
            .proc(&InputData {
                target: Target::new(0.8, 1.1, 0.0, 45.0),
            })
            .unwrap();

        assert!(report.reached);
        assert!(report.distance_m <= 0.01);
        assert!(in_range(&out.servo));
        assert_eq!(out.servo.claw, 45);

        // The pose is committed into the chain
        let chain = arm.chain().unwrap();
        assert_eq!(chain.rotations(), out.pose);
        assert!((chain.end_effector() - Point3::new(0.8, 1.1, 0.0)).norm() <= 0.01);
    }

    #[test]
    fn test_unreachable_target() {
        let mut arm = ArmCtrl::from_params(Params::default()).unwrap();

        let (out, report) = arm
            .proc(&InputData {
                target: Target::new(0.0, 0.0, 0.0, 45.0),
            })
            .unwrap();

        assert!(!report.reached);
        assert!(in_range(&out.servo));
        assert_eq!(arm.chain().unwrap().rotations(), out.pose);
    }

    /// Solver which always returns the same pose, to check the pose is used as given.
    struct FixedSolver(SolvedPose);

    impl Solver for FixedSolver {
        fn solve(&self, _: &Chain, _: &Point3<f64>) -> Result<Solution, SolverError> {
            Ok(Solution {
                reached: false,
                pose: self.0.clone(),
                distance_m: 1.0,
            })
        }
    }

    #[test]
    fn test_custom_solver() {
        use crate::chain::Euler;

        let pose = SolvedPose::new(vec![
            Euler::IDENTITY,
            Euler::IDENTITY,
            Euler::from_degrees(0.0, 0.0, -90.0),
        ]);
        let mut arm = ArmCtrl::from_params(Params::default())
            .unwrap()
            .with_solver(FixedSolver(pose.clone()));

        let (out, report) = arm.proc(&InputData::default()).unwrap();

        assert_eq!(out.pose, pose);
        assert_eq!(out.servo.left, 180);
        assert!(!report.reached);
        assert_eq!(*arm.report(), report);
    }
}
