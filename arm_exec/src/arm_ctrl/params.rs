//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_if::tc::Target;
use serde::{Deserialize, Serialize};

use super::NUM_JOINTS;
use crate::chain::JointLimits;
use crate::solver::SolverParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Length of each moving segment, base first.
    ///
    /// Units: meters
    pub segment_lengths_m: [f64; NUM_JOINTS],

    // ---- CAPABILITIES ----
    /// Minimum rotation of each joint as `[heading, pitch, bank]`.
    ///
    /// Units: degrees
    pub min_rot_deg: [[f64; 3]; NUM_JOINTS],

    /// Maximum rotation of each joint as `[heading, pitch, bank]`.
    ///
    /// Units: degrees
    pub max_rot_deg: [[f64; 3]; NUM_JOINTS],

    // ---- SOLVER ----
    #[serde(default)]
    pub solver: SolverParams,

    // ---- CONTROL LOOP ----
    /// Time given to the servos to reach a new pose before the next target is taken. A newly
    /// published target cuts the wait short.
    ///
    /// Units: milliseconds
    pub settle_delay_ms: u64,

    /// If false, servo demands for targets the solver could not reach are not sent to the
    /// hardware. The visualisation is always updated.
    pub actuate_unreachable: bool,

    /// Target published at start-up.
    #[serde(default)]
    pub initial_target: Target,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Joint limits in radians, one per joint.
    pub fn joint_limits(&self) -> Vec<JointLimits> {
        self.min_rot_deg
            .iter()
            .zip(self.max_rot_deg.iter())
            .map(|(min, max)| JointLimits::from_degrees(*min, *max))
            .collect()
    }
}

impl Default for Params {
    /// Geometry and limits of the standard MeArm.
    fn default() -> Self {
        Self {
            segment_lengths_m: [0.3, 0.8, 0.8],
            min_rot_deg: [[0.0, -70.0, 0.0], [0.0, 0.0, -70.0], [0.0, 0.0, -120.0]],
            max_rot_deg: [[0.0, 70.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, -90.0]],
            solver: SolverParams::default(),
            settle_delay_ms: 500,
            actuate_unreachable: true,
            initial_target: Target::default(),
        }
    }
}
