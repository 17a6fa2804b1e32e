//! # Arm interface crate.
//!
//! Provides the data types which are passed between the producers, the control loop and the
//! equipment of the arm.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Target and key command definitions, i.e. what producers ask the arm to do
pub mod tc;

/// Demand definitions for equipment (like the servos)
pub mod eqpt;
