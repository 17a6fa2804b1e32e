//! Simulated servo driver
//!
//! Records the last duty cycle set on each channel and logs every change, so the rest of the
//! software can run on a machine without driver boards attached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use std::collections::HashMap;

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels on a simulated board, matching the PCA9685.
pub const NUM_SIM_CHANNELS: u8 = 16;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SimServoDriver {
    board: usize,

    duty_cycles: HashMap<u8, f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServoDriver {
    pub fn new(board: usize) -> Self {
        Self {
            board,
            duty_cycles: HashMap::new(),
        }
    }

    /// The last duty cycle set on a channel, if any.
    pub fn duty_cycle(&self, channel: u8) -> Option<f64> {
        self.duty_cycles.get(&channel).copied()
    }
}

impl ServoDriver for SimServoDriver {
    type Channel = u8;

    fn channel_from_index(index: u8) -> Result<Self::Channel, ServoError> {
        match index < NUM_SIM_CHANNELS {
            true => Ok(index),
            false => Err(ServoError::InvalidChannel(index)),
        }
    }

    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError> {
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ServoError::InvalidDutyCycle(duty_cycle));
        }

        trace!(
            "[sim board {}] channel {} duty cycle {:.4}",
            self.board,
            channel,
            duty_cycle
        );

        self.duty_cycles.insert(channel, duty_cycle);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_driver() {
        let mut d = SimServoDriver::new(0);

        assert_eq!(d.duty_cycle(3), None);
        d.set_duty_cycle(3, 0.5).unwrap();
        assert_eq!(d.duty_cycle(3), Some(0.5));

        match d.set_duty_cycle(3, 1.5) {
            Err(ServoError::InvalidDutyCycle(_)) => (),
            _ => panic!("Expected an invalid duty cycle error"),
        }
        assert_eq!(d.duty_cycle(3), Some(0.5));

        assert!(SimServoDriver::channel_from_index(15).is_ok());
        assert!(SimServoDriver::channel_from_index(16).is_err());
    }
}
