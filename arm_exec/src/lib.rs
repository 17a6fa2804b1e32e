//! # Arm library.
//!
//! This library allows the executables and benchmarks in the workspace to access items defined
//! inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic chain - geometry and joint limits of the arm, with forward kinematics
pub mod chain;

/// Inverse kinematics solvers - find joint rotations which place the end effector at a target
pub mod solver;

/// Arm control module - solves targets and maps the resulting pose to servo demands
pub mod arm_ctrl;

/// Target channel - coalescing hand-off of targets from the producers to the control loop
pub mod target_chan;

/// Control loop - consumes targets and fans the result out to actuation and visualisation
pub mod ctrl_loop;

/// Servo controller - drives the servos through PWM driver boards
pub mod servo_ctrl;

/// Visualisation - scene graph mirroring the arm and the render loop
pub mod vis;

/// Drawing - turns vector paths into targets
pub mod draw;

/// Interactive terminal input
pub mod input;
