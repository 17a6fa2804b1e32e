//! # Kinematic chain module
//!
//! Describes the physical geometry of the arm: an ordered sequence of rigid segments from a fixed
//! root to the end effector, each with a fixed offset, bounded rotation limits and a
//! current-rotation slot.
//!
//! The geometry and limits are fixed when the chain is built. The only way to change the chain
//! afterwards is [`Chain::apply_rotation`], which commits a solved pose into the rotation slots.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod build;
mod euler;
mod fk;
mod segment;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use build::*;
pub use euler::*;
pub use fk::*;
pub use segment::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when checking that a rotation lies within its limits.
///
/// Units: radians
pub const LIMIT_TOLERANCE_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building or updating a chain.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChainError {
    #[error("A chain needs at least one moving joint")]
    NoJoints,

    #[error("Got {lengths} segment lengths but {limits} joint limits")]
    LengthLimitMismatch { lengths: usize, limits: usize },

    #[error("Segment length for joint {joint} must be finite and non-negative, found {length_m}")]
    InvalidLength { joint: usize, length_m: f64 },

    #[error("Joint {joint} has a minimum rotation greater than its maximum rotation")]
    InvalidLimits { joint: usize },

    #[error("Expected a pose with {expected} rotations, found {found}")]
    PoseLengthMismatch { expected: usize, found: usize },

    #[error("Rotation of joint {joint} lies outside the joint's limits")]
    RotationOutOfLimits { joint: usize },
}
