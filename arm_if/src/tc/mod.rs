//! # Target module
//!
//! Targets are the positions producers ask the arm to move to. They are produced either by
//! interactive key input or by replaying a drawing path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target for the end effector of the arm.
///
/// Positions are in the arm's normalised work-volume coordinates, with the root of the arm at the
/// origin and `y` pointing up along the first segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Openness of the claw, passed straight through to the claw servo.
    ///
    /// Units: degrees
    pub claw: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A discrete adjustment requested by a single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCmd {
    XDec,
    XInc,
    YDec,
    YInc,
    ZDec,
    ZInc,
    ClawDec,
    ClawInc,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Target {
    pub fn new(x: f64, y: f64, z: f64, claw: f64) -> Self {
        Self { x, y, z, claw }
    }

    /// The position part of the target as an `[x, y, z]` array.
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Apply a key command to this target, moving the relevant field by `delta`.
    pub fn apply_key(&mut self, cmd: KeyCmd, delta: f64) {
        match cmd {
            KeyCmd::XDec => self.x -= delta,
            KeyCmd::XInc => self.x += delta,
            KeyCmd::YDec => self.y -= delta,
            KeyCmd::YInc => self.y += delta,
            KeyCmd::ZDec => self.z -= delta,
            KeyCmd::ZInc => self.z += delta,
            KeyCmd::ClawDec => self.claw -= delta,
            KeyCmd::ClawInc => self.claw += delta,
        }
    }
}

impl Default for Target {
    /// The start-up target, comfortably inside the default arm's reach.
    fn default() -> Self {
        Self {
            x: 0.8,
            y: 1.1,
            z: 0.0,
            claw: 45.0,
        }
    }
}

impl KeyCmd {
    /// Map a key to its command, or `None` if the key is not bound.
    ///
    /// Bindings follow vi movement keys: `h`/`l` for x, `j`/`k` for y, `i`/`m` for z and `-`/`+`
    /// for the claw.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'h' => Some(KeyCmd::XDec),
            'l' => Some(KeyCmd::XInc),
            'j' => Some(KeyCmd::YDec),
            'k' => Some(KeyCmd::YInc),
            'i' => Some(KeyCmd::ZDec),
            'm' => Some(KeyCmd::ZInc),
            '-' => Some(KeyCmd::ClawDec),
            '+' => Some(KeyCmd::ClawInc),
            _ => None,
        }
    }
}
