//! # Arm control module
//!
//! Turns targets into joint rotations and servo demands. Each cycle solves the chain for the
//! target, commits the solved pose into the chain and maps it onto the servo angle range.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod servo_map;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use servo_map::*;
pub use state::*;

use crate::{chain::ChainError, solver::SolverError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of moving joints on the arm (base, right, left).
pub const NUM_JOINTS: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Could not load the ArmCtrl parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Could not build the arm's kinematic chain: {0}")]
    ChainError(#[from] ChainError),

    #[error("Could not solve for the target: {0}")]
    SolverError(#[from] SolverError),

    #[error("Expected a pose with {expected} rotations to map to the servos, found {found}")]
    PoseLengthMismatch { expected: usize, found: usize },

    #[error("ArmCtrl has not been initialised")]
    NotInitialised,
}
