//! Euler angle rotations for chain segments

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};

// Internal
use super::LIMIT_TOLERANCE_RAD;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A three axis rotation.
///
/// Heading is about the X axis, pitch about Y and bank about Z. The rotation matrix is
/// `Rz(bank) * Ry(pitch) * Rx(heading)`.
///
/// Units: radians
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub heading: f64,
    pub pitch: f64,
    pub bank: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One of the three axes of an [`Euler`] rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EulerAxis {
    Heading,
    Pitch,
    Bank,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EulerAxis {
    pub const ALL: [EulerAxis; 3] = [EulerAxis::Heading, EulerAxis::Pitch, EulerAxis::Bank];
}

impl Euler {
    /// The identity rotation.
    pub const IDENTITY: Euler = Euler {
        heading: 0.0,
        pitch: 0.0,
        bank: 0.0,
    };

    pub fn new(heading: f64, pitch: f64, bank: f64) -> Self {
        Self {
            heading,
            pitch,
            bank,
        }
    }

    /// Build a rotation from angles given in degrees.
    pub fn from_degrees(heading_deg: f64, pitch_deg: f64, bank_deg: f64) -> Self {
        Self {
            heading: heading_deg.to_radians(),
            pitch: pitch_deg.to_radians(),
            bank: bank_deg.to_radians(),
        }
    }

    /// Get the `[heading, pitch, bank]` angles in degrees.
    pub fn to_degrees(&self) -> [f64; 3] {
        [
            self.heading.to_degrees(),
            self.pitch.to_degrees(),
            self.bank.to_degrees(),
        ]
    }

    /// Get the rotation matrix for this rotation.
    pub fn to_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.heading, self.pitch, self.bank)
    }

    pub fn get(&self, axis: EulerAxis) -> f64 {
        match axis {
            EulerAxis::Heading => self.heading,
            EulerAxis::Pitch => self.pitch,
            EulerAxis::Bank => self.bank,
        }
    }

    pub fn set(&mut self, axis: EulerAxis, value: f64) {
        match axis {
            EulerAxis::Heading => self.heading = value,
            EulerAxis::Pitch => self.pitch = value,
            EulerAxis::Bank => self.bank = value,
        }
    }

    /// Clamp each axis of this rotation component-wise into `[min, max]`.
    pub fn clamped(&self, min: &Euler, max: &Euler) -> Euler {
        Euler {
            heading: clamp(&self.heading, &min.heading, &max.heading),
            pitch: clamp(&self.pitch, &min.pitch, &max.pitch),
            bank: clamp(&self.bank, &min.bank, &max.bank),
        }
    }

    /// Returns true if every axis lies within `[min, max]`, allowing for `LIMIT_TOLERANCE_RAD`
    /// of floating point slack.
    pub fn within(&self, min: &Euler, max: &Euler) -> bool {
        EulerAxis::ALL.iter().all(|a| {
            let v = self.get(*a);
            v >= min.get(*a) - LIMIT_TOLERANCE_RAD && v <= max.get(*a) + LIMIT_TOLERANCE_RAD
        })
    }

    /// Returns true if every axis is a finite number.
    pub fn is_finite(&self) -> bool {
        self.heading.is_finite() && self.pitch.is_finite() && self.bank.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_axis_convention() {
        let up = Vector3::new(0.0, 1.0, 0.0);

        // Bank swings a segment lying along Y in the XY plane, negative bank towards +X
        let v = Euler::from_degrees(0.0, 0.0, -90.0).to_rotation() * up;
        assert!((v - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);

        // Pitch spins about the segment's own axis, so leaves it alone
        let v = Euler::from_degrees(0.0, 45.0, 0.0).to_rotation() * up;
        assert!((v - up).norm() < 1e-12);

        // Heading tips the segment towards +Z
        let v = Euler::from_degrees(90.0, 0.0, 0.0).to_rotation() * up;
        assert!((v - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_clamped_within() {
        let min = Euler::from_degrees(0.0, -70.0, 0.0);
        let max = Euler::from_degrees(0.0, 70.0, 0.0);

        let r = Euler::from_degrees(10.0, 80.0, -5.0);
        assert!(!r.within(&min, &max));

        let c = r.clamped(&min, &max);
        assert!(c.within(&min, &max));
        assert_eq!(c, max);
    }
}
