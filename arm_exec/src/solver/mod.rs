//! # Inverse kinematics solver module
//!
//! A solver takes a chain and a target point and returns one rotation per joint which best places
//! the end effector at the target. Solvers never modify the chain, committing a solution is done
//! with [`Chain::apply_rotation`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod descent;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// Internal
use crate::chain::{Chain, SolvedPose};
pub use descent::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// True if the end effector was placed within the solver's tolerance of the target. If false
    /// `pose` is the best approximation found.
    pub reached: bool,

    /// One rotation per joint, each within that joint's limits.
    pub pose: SolvedPose,

    /// Remaining distance between the end effector and the target.
    ///
    /// Units: meters
    pub distance_m: f64,
}

/// Parameters shared by the solvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverParams {
    /// Distance from the target within which it is considered reached.
    ///
    /// Units: meters
    pub tolerance_m: f64,

    /// Maximum number of sweeps over all joint axes before giving up.
    pub max_sweeps: usize,

    /// First step size tried on each axis.
    ///
    /// Units: radians
    pub initial_step_rad: f64,

    /// The search stops once the step size has shrunk below this.
    ///
    /// Units: radians
    pub min_step_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while solving.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SolverError {
    #[error("Cannot solve a chain with no moving joints")]
    NoJoints,

    #[error("The target contains a non-finite coordinate: {0:?}")]
    NonFiniteTarget([f64; 3]),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Trait providing a unified API for inverse kinematics solvers.
pub trait Solver {
    /// Find the joint rotations which best place the end effector of `chain` at `target`.
    ///
    /// The returned pose has exactly `chain.num_joints()` rotations, each within its joint's
    /// limits.
    fn solve(&self, chain: &Chain, target: &Point3<f64>) -> Result<Solution, SolverError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            tolerance_m: 0.01,
            max_sweeps: 5000,
            initial_step_rad: 0.5,
            min_step_rad: 1e-6,
        }
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn solve(&self, chain: &Chain, target: &Point3<f64>) -> Result<Solution, SolverError> {
        (**self).solve(chain, target)
    }
}
