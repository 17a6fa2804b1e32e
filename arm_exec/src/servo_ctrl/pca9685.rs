//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Channel, Pca9685};

use super::{ControllerConfig, ServoDriver, ServoError};
use crate::ctrl_loop::ActuationSink;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of counts in one PWM period.
const MAX_PWM: u16 = 4096;

/// Frequency of the PCA9685's internal oscillator.
///
/// Units: Hertz
const OSC_CLOCK_HZ: f64 = 25_000_000.0;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Channel = Channel;

    fn channel_from_index(index: u8) -> Result<Self::Channel, ServoError> {
        Ok(match index {
            0 => Channel::C0,
            1 => Channel::C1,
            2 => Channel::C2,
            3 => Channel::C3,
            4 => Channel::C4,
            5 => Channel::C5,
            6 => Channel::C6,
            7 => Channel::C7,
            8 => Channel::C8,
            9 => Channel::C9,
            10 => Channel::C10,
            11 => Channel::C11,
            12 => Channel::C12,
            13 => Channel::C13,
            14 => Channel::C14,
            15 => Channel::C15,
            _ => return Err(ServoError::InvalidChannel(index)),
        })
    }

    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError> {
        // If the duty cycle is out of range return an error
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ServoError::InvalidDutyCycle(duty_cycle));
        }

        // The pulse starts at count 0 and ends at the off count, which must be below MAX_PWM
        let off = ((duty_cycle * (MAX_PWM as f64)).round() as u16).min(MAX_PWM - 1);

        match self.set_channel_on_off(channel, 0, off) {
            Ok(_) => Ok(()),
            Err(pwm_pca9685::Error::I2C(_)) => Err(ServoError::I2c),
            Err(_) => Err(ServoError::InvalidDutyCycle(duty_cycle)),
        }
    }
}

/// Prescale register value which runs the PWM at the given frequency.
pub fn prescale(pwm_freq_hz: f64) -> u8 {
    let p = (OSC_CLOCK_HZ / (MAX_PWM as f64 * pwm_freq_hz)).round() - 1.0;

    // The chip does not accept prescale values below 3
    p.max(3.0).min(u8::MAX as f64) as u8
}

/// Open every configured board on the Raspberry Pi's I2C bus and wrap them in a controller.
#[cfg(all(target_arch = "arm", target_os = "linux"))]
pub(super) fn from_config(
    config: ControllerConfig,
) -> Result<Box<dyn ActuationSink + Send>, ServoError> {
    use log::info;
    use rppal::i2c::I2c;

    let mut drivers = Vec::with_capacity(config.board_addresses.len());

    for address in config.board_addresses.iter() {
        let i2c = I2c::new().map_err(|e| ServoError::BusOpenError(e.to_string()))?;

        let mut board = Pca9685::new(i2c, *address).map_err(|_| ServoError::I2c)?;
        board
            .set_prescale(prescale(config.pwm_freq_hz))
            .map_err(|_| ServoError::I2c)?;
        board.enable().map_err(|_| ServoError::I2c)?;

        info!("PCA9685 board at {:#04x} enabled", address);

        drivers.push(board);
    }

    Ok(Box::new(super::ServoCtrl::new(drivers, config)?))
}

/// The PCA9685 backend needs the Raspberry Pi's I2C bus.
#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
pub(super) fn from_config(
    config: ControllerConfig,
) -> Result<Box<dyn ActuationSink + Send>, ServoError> {
    Err(ServoError::BackendUnavailable(config.backend))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prescale() {
        assert_eq!(prescale(50.0), 121);

        // Datasheet example
        assert_eq!(prescale(200.0), 0x1E);

        // Out of range frequencies saturate
        assert_eq!(prescale(1e6), 3);
        assert_eq!(prescale(1.0), 255);
    }

    #[test]
    fn test_channel_from_index() {
        type Driver = Pca9685<NoBus>;

        assert!(matches!(Driver::channel_from_index(0), Ok(Channel::C0)));
        assert!(matches!(Driver::channel_from_index(15), Ok(Channel::C15)));
        match Driver::channel_from_index(16) {
            Err(ServoError::InvalidChannel(16)) => (),
            _ => panic!("Expected an invalid channel error"),
        }
    }

    /// Bus type used only to name the driver type in tests.
    struct NoBus;

    impl Write for NoBus {
        type Error = ();

        fn write(&mut self, _: u8, _: &[u8]) -> Result<(), ()> {
            Err(())
        }
    }

    impl WriteRead for NoBus {
        type Error = ();

        fn write_read(&mut self, _: u8, _: &[u8], _: &mut [u8]) -> Result<(), ()> {
            Err(())
        }
    }
}
