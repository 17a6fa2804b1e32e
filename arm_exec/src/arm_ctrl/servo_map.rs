//! Mapping from solved joint rotations to servo angles
//!
//! The servos are mounted so that their angles do not line up with the joint rotations of the
//! chain. The base servo is centred at 90 degrees. The right servo is mounted mirrored. The left
//! servo drives its segment through a linkage from the right side, so its angle depends on the
//! right servo's angle as well as the left joint's rotation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::eqpt::servo::{ServoCommand, NUM_SERVOS, SERVO_MAX_DEG, SERVO_MIN_DEG};
use util::maths::clamp;

// Internal
use super::{ArmCtrlError, NUM_JOINTS};
use crate::chain::SolvedPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Servo angles before rounding and clamping, in `ServoId::ALL` order.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawServoAngles(pub [f64; NUM_SERVOS]);

/// A servo command along with which servos had to be clamped into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedServos {
    pub cmd: ServoCommand,

    /// True for each servo (in `ServoId::ALL` order) whose raw angle lay outside the hardware
    /// range.
    pub clamped: [bool; NUM_SERVOS],
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the unclamped servo angles for a pose.
pub fn raw_servo_angles(pose: &SolvedPose, claw_deg: f64) -> Result<RawServoAngles, ArmCtrlError> {
    if pose.len() != NUM_JOINTS {
        return Err(ArmCtrlError::PoseLengthMismatch {
            expected: NUM_JOINTS,
            found: pose.len(),
        });
    }

    let base = 90.0 + pose[0].pitch.to_degrees();
    let right = 180.0 - (90.0 + pose[1].bank.to_degrees());

    // Uses the unclamped right angle
    let left_raw = -(180.0 - (right - pose[2].bank.to_degrees()));
    let left = 180.0 - left_raw;

    Ok(RawServoAngles([base, right, left, claw_deg]))
}

/// Map a pose and claw demand to a servo command.
///
/// Every angle is rounded to the nearest degree and clamped into
/// `[SERVO_MIN_DEG, SERVO_MAX_DEG]`.
pub fn map_to_servo(pose: &SolvedPose, claw_deg: f64) -> Result<MappedServos, ArmCtrlError> {
    let raw = raw_servo_angles(pose, claw_deg)?;

    let mut angles = [0u8; NUM_SERVOS];
    let mut clamped = [false; NUM_SERVOS];

    for (i, a) in raw.0.iter().enumerate() {
        let (deg, was_clamped) = to_servo_deg(*a);
        angles[i] = deg;
        clamped[i] = was_clamped;
    }

    Ok(MappedServos {
        cmd: ServoCommand {
            base: angles[0],
            right: angles[1],
            left: angles[2],
            claw: angles[3],
        },
        clamped,
    })
}

/// Round and clamp a single angle into the servo range.
pub fn to_servo_deg(angle_deg: f64) -> (u8, bool) {
    let min = SERVO_MIN_DEG as f64;
    let max = SERVO_MAX_DEG as f64;

    if angle_deg.is_nan() {
        return (SERVO_MIN_DEG, true);
    }

    let rounded = angle_deg.round();
    let limited = clamp(&rounded, &min, &max);

    (limited as u8, limited != rounded)
}
