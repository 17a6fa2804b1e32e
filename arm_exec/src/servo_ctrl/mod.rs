//! # Servo Controller Module
//!
//! This module provides a unified servo control interface which can abstract over different types
//! of servo driver boards.
//!
//! Each named servo on the arm is assigned a board, a channel on that board and the pulse widths
//! which correspond to its 0 and 180 degree positions. Angle demands are converted into duty
//! cycles from those pulse widths and the PWM frequency of the boards.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

/// Simulated [`ServoDriver`] for running without hardware.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::eqpt::servo::{ServoCommand, ServoId, SERVO_MAX_DEG, SERVO_MIN_DEG};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use util::maths::lin_map;

use crate::ctrl_loop::ActuationSink;
pub use sim::SimServoDriver;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {
    /// The type that the underlying driver uses for channel identification
    type Channel;

    /// Convert a channel number from the configuration into the driver's channel type.
    fn channel_from_index(index: u8) -> Result<Self::Channel, ServoError>;

    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Servo controller driving every servo on the arm through a set of driver boards.
pub struct ServoCtrl<D>
where
    D: ServoDriver,
{
    drivers: Vec<D>,

    config: ControllerConfig,
}

/// Configuration of the servo controller, loaded from `servo_ctrl.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ControllerConfig {
    /// Which driver to use.
    pub backend: Backend,

    /// I2C addresses of the driver boards, the board index in [`ServoConfig`] is an index into
    /// this list.
    pub board_addresses: Vec<u8>,

    /// PWM frequency all boards are run at.
    ///
    /// Units: Hertz
    pub pwm_freq_hz: f64,

    /// Per-servo configuration.
    pub servos: ServoSet<ServoConfig>,
}

/// One value per servo on the arm.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ServoSet<T> {
    pub base: T,
    pub right: T,
    pub left: T,
    pub claw: T,
}

/// Configuration of a single positional servo.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ServoConfig {
    /// Index of the board the servo is connected to.
    pub board: usize,

    /// Channel on the board the servo is connected to.
    pub channel: u8,

    /// Pulse width for the servo's 0 degree position.
    ///
    /// Units: microseconds
    pub min_pulse_us: f64,

    /// Pulse width for the servo's 180 degree position.
    ///
    /// Units: microseconds
    pub max_pulse_us: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0, got {0}")]
    InvalidDutyCycle(f64),

    #[error("Channel {0} does not exist on the driver board")]
    InvalidChannel(u8),

    #[error("Servo {servo} is assigned to board {board} but only {num_boards} boards are configured")]
    InvalidBoard {
        servo: ServoId,
        board: usize,
        num_boards: usize,
    },

    #[error("Servo {0} has an invalid pulse width range")]
    InvalidPulseRange(ServoId),

    #[error("The PWM frequency must be positive, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("The {0:?} servo backend is not available on this platform")]
    BackendUnavailable(Backend),

    #[error("Could not open the I2C bus: {0}")]
    BusOpenError(String),
}

/// Available servo driver backends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Log demands instead of driving hardware.
    Sim,

    /// PCA9685 boards on the Raspberry Pi's I2C bus.
    Pca9685,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D> ServoCtrl<D>
where
    D: ServoDriver,
{
    /// Create a new servo controller.
    ///
    /// ## Arguments
    /// - `drivers` - A vector of initialised [`ServoDriver`] boards, one per board address
    /// - `config` - A configuration for the servos managed by this controller
    pub fn new(drivers: Vec<D>, config: ControllerConfig) -> Result<Self, ServoError> {
        if !config.pwm_freq_hz.is_finite() || config.pwm_freq_hz <= 0.0 {
            return Err(ServoError::InvalidFrequency(config.pwm_freq_hz));
        }

        for id in ServoId::ALL.iter() {
            let servo = config.servos.get(*id);

            if servo.board >= drivers.len() {
                return Err(ServoError::InvalidBoard {
                    servo: *id,
                    board: servo.board,
                    num_boards: drivers.len(),
                });
            }

            D::channel_from_index(servo.channel)?;

            let period_us = config.period_us();
            let pulses_valid = [servo.min_pulse_us, servo.max_pulse_us]
                .iter()
                .all(|p| p.is_finite() && *p >= 0.0 && *p <= period_us);
            if !pulses_valid {
                return Err(ServoError::InvalidPulseRange(*id));
            }
        }

        Ok(Self { drivers, config })
    }

    /// Move a single servo to an angle.
    pub fn move_to(&mut self, id: ServoId, angle_deg: u8) -> Result<(), ServoError> {
        let servo = *self.config.servos.get(id);
        let duty_cycle = self.config.duty_cycle(&servo, angle_deg);

        debug!(
            "Servo {} -> {} deg (board {}, channel {}, duty {:.4})",
            id, angle_deg, servo.board, servo.channel, duty_cycle
        );

        let channel = D::channel_from_index(servo.channel)?;

        self.drivers[servo.board].set_duty_cycle(channel, duty_cycle)
    }

    pub fn drivers(&self) -> &[D] {
        &self.drivers
    }
}

impl<D> ActuationSink for ServoCtrl<D>
where
    D: ServoDriver,
{
    /// Move every servo to its demanded angle.
    ///
    /// All servos are attempted even if one fails, the first error is returned.
    fn actuate(&mut self, cmd: &ServoCommand) -> Result<(), ServoError> {
        let mut result = Ok(());

        for (id, angle_deg) in cmd.iter() {
            if let Err(e) = self.move_to(id, angle_deg) {
                warn!("Failed to move servo {}: {}", id, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }
}

impl ControllerConfig {
    /// Period of the PWM signal.
    ///
    /// Units: microseconds
    pub fn period_us(&self) -> f64 {
        1e6 / self.pwm_freq_hz
    }

    /// Duty cycle which holds a servo at an angle.
    pub fn duty_cycle(&self, servo: &ServoConfig, angle_deg: u8) -> f64 {
        let angle_deg = angle_deg.min(SERVO_MAX_DEG);

        let pulse_us = lin_map(
            (SERVO_MIN_DEG as f64, SERVO_MAX_DEG as f64),
            (servo.min_pulse_us, servo.max_pulse_us),
            angle_deg as f64,
        );

        pulse_us / self.period_us()
    }
}

impl<T> ServoSet<T> {
    pub fn get(&self, id: ServoId) -> &T {
        match id {
            ServoId::Base => &self.base,
            ServoId::Right => &self.right,
            ServoId::Left => &self.left,
            ServoId::Claw => &self.claw,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create the actuation sink selected by the configuration.
///
/// The simulated backend is always available. The PCA9685 backend is only available on the
/// Raspberry Pi.
pub fn from_config(
    config: ControllerConfig,
) -> Result<Box<dyn ActuationSink + Send>, ServoError> {
    info!(
        "Initialising {:?} servo backend with {} board(s) at {} Hz",
        config.backend,
        config.board_addresses.len(),
        config.pwm_freq_hz
    );

    match config.backend {
        Backend::Sim => {
            let drivers = (0..config.board_addresses.len())
                .map(SimServoDriver::new)
                .collect();

            Ok(Box::new(ServoCtrl::new(drivers, config)?))
        }
        Backend::Pca9685 => pca9685::from_config(config),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> ControllerConfig {
        let servo = |channel| ServoConfig {
            board: 0,
            channel,
            min_pulse_us: 500.0,
            max_pulse_us: 2500.0,
        };

        ControllerConfig {
            backend: Backend::Sim,
            board_addresses: vec![0x40],
            pwm_freq_hz: 50.0,
            servos: ServoSet {
                base: servo(0),
                right: servo(1),
                left: servo(2),
                claw: servo(3),
            },
        }
    }

    #[test]
    fn test_duty_cycle() {
        let config = config();
        let servo = config.servos.base;

        // 20 ms period at 50 Hz
        assert!((config.period_us() - 20_000.0).abs() < 1e-9);
        assert!((config.duty_cycle(&servo, 0) - 0.025).abs() < 1e-12);
        assert!((config.duty_cycle(&servo, 90) - 0.075).abs() < 1e-12);
        assert!((config.duty_cycle(&servo, 180) - 0.125).abs() < 1e-12);
        assert!((config.duty_cycle(&servo, 255) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_actuate() {
        let mut ctrl = ServoCtrl::new(vec![SimServoDriver::new(0)], config()).unwrap();

        ctrl.actuate(&ServoCommand {
            base: 0,
            right: 90,
            left: 180,
            claw: 45,
        })
        .unwrap();

        let d = &ctrl.drivers()[0];
        assert!((d.duty_cycle(0).unwrap() - 0.025).abs() < 1e-12);
        assert!((d.duty_cycle(1).unwrap() - 0.075).abs() < 1e-12);
        assert!((d.duty_cycle(2).unwrap() - 0.125).abs() < 1e-12);
        assert!((d.duty_cycle(3).unwrap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        let mut c = config();
        c.servos.claw.board = 1;
        match ServoCtrl::new(vec![SimServoDriver::new(0)], c) {
            Err(ServoError::InvalidBoard { servo, board, num_boards }) => {
                assert_eq!(servo, ServoId::Claw);
                assert_eq!(board, 1);
                assert_eq!(num_boards, 1);
            }
            _ => panic!("Expected an invalid board error"),
        }

        let mut c = config();
        c.servos.left.channel = 16;
        match ServoCtrl::new(vec![SimServoDriver::new(0)], c) {
            Err(ServoError::InvalidChannel(16)) => (),
            _ => panic!("Expected an invalid channel error"),
        }

        let mut c = config();
        c.servos.right.max_pulse_us = 30_000.0;
        match ServoCtrl::new(vec![SimServoDriver::new(0)], c) {
            Err(ServoError::InvalidPulseRange(ServoId::Right)) => (),
            _ => panic!("Expected an invalid pulse range error"),
        }
    }

    #[test]
    fn test_load_config() {
        let c: ControllerConfig = util::params::from_str(
            r#"
            backend = "sim"
            board_addresses = [0x40]
            pwm_freq_hz = 50.0

            [servos.base]
            board = 0
            channel = 0
            min_pulse_us = 500.0
            max_pulse_us = 2500.0

            [servos.right]
            board = 0
            channel = 1
            min_pulse_us = 500.0
            max_pulse_us = 2500.0

            [servos.left]
            board = 0
            channel = 2
            min_pulse_us = 500.0
            max_pulse_us = 2500.0

            [servos.claw]
            board = 0
            channel = 3
            min_pulse_us = 500.0
            max_pulse_us = 2500.0
            "#,
        )
        .unwrap();

        assert_eq!(c.backend, Backend::Sim);
        assert_eq!(c.servos, config().servos);

        let mut sink = from_config(c).unwrap();
        sink.actuate(&ServoCommand::default()).unwrap();
    }

    #[test]
    fn test_workspace_params_file() {
        let path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../params/servo_ctrl.toml");
        let c: ControllerConfig = util::params::load_from_path(path).unwrap();

        assert_eq!(c.backend, Backend::Pca9685);
        assert_eq!(c.servos, config().servos);
    }
}
