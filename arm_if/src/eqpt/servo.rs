//! # Servo Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of servos on the arm.
pub const NUM_SERVOS: usize = 4;

/// Lowest angle a servo can be commanded to.
///
/// Units: degrees
pub const SERVO_MIN_DEG: u8 = 0;

/// Highest angle a servo can be commanded to.
///
/// Units: degrees
pub const SERVO_MAX_DEG: u8 = 180;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all servos on the arm, in chain order followed by the claw.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ServoId {
    Base,
    Right,
    Left,
    Claw,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Angle demands for every servo on the arm.
///
/// All angles are in the hardware range `[SERVO_MIN_DEG, SERVO_MAX_DEG]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCommand {
    pub base: u8,
    pub right: u8,
    pub left: u8,
    pub claw: u8,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ServoId {
    /// All servo IDs in dispatch order.
    pub const ALL: [ServoId; NUM_SERVOS] =
        [ServoId::Base, ServoId::Right, ServoId::Left, ServoId::Claw];

    /// Index of the servo in `ServoId::ALL`.
    pub fn index(&self) -> usize {
        match self {
            ServoId::Base => 0,
            ServoId::Right => 1,
            ServoId::Left => 2,
            ServoId::Claw => 3,
        }
    }

    /// The name of the servo as used by the hardware configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ServoId::Base => "base",
            ServoId::Right => "right",
            ServoId::Left => "left",
            ServoId::Claw => "claw",
        }
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ServoCommand {
    /// Get the demanded angle for a particular servo.
    pub fn angle_deg(&self, id: ServoId) -> u8 {
        match id {
            ServoId::Base => self.base,
            ServoId::Right => self.right,
            ServoId::Left => self.left,
            ServoId::Claw => self.claw,
        }
    }

    /// Iterate over `(id, angle)` pairs in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = (ServoId, u8)> + '_ {
        ServoId::ALL.iter().map(move |id| (*id, self.angle_deg(*id)))
    }
}

impl Default for ServoCommand {
    /// All servos centred.
    fn default() -> Self {
        Self {
            base: 90,
            right: 90,
            left: 90,
            claw: 90,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_iter_order() {
        let cmd = ServoCommand {
            base: 1,
            right: 2,
            left: 3,
            claw: 4,
        };

        let pairs: Vec<(ServoId, u8)> = cmd.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (ServoId::Base, 1),
                (ServoId::Right, 2),
                (ServoId::Left, 3),
                (ServoId::Claw, 4)
            ]
        );

        for id in ServoId::ALL.iter() {
            assert_eq!(ServoId::ALL[id.index()], *id);
        }
    }
}
