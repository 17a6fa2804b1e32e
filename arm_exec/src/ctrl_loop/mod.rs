//! # Control loop module
//!
//! The single consumer of the target channel. For each target it solves, maps and then fans the
//! result out to an actuation sink (the servos) and a visualisation sink (the scene), in that
//! order, before waiting for the next target.
//!
//! Targets published while a cycle is in progress coalesce in the channel, so the loop always
//! works on the most recent target and never falls behind the producers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::{eqpt::servo::ServoCommand, tc::Target};
use log::{info, trace, warn};
use serde::Serialize;
use std::time::Duration;

// Internal
use crate::{
    arm_ctrl::{ArmCtrl, ArmCtrlError, ArmOutput, InputData, StatusReport},
    chain::Euler,
    servo_ctrl::ServoError,
    target_chan::TargetChannel,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which physically moves the arm.
pub trait ActuationSink {
    /// Move every servo to the angle given in the command.
    fn actuate(&mut self, cmd: &ServoCommand) -> Result<(), ServoError>;
}

/// Something which displays the arm.
///
/// Joint indices are in chain order, excluding the root.
pub trait VisSink {
    /// Set the rotation of a single joint.
    fn set_joint_rotation(&mut self, joint: usize, rotation: &Euler);

    /// Move the target marker to a position in the arm's work-volume coordinates.
    fn set_marker_position(&mut self, position: [f64; 3]);

    /// Called once all joints and the marker have been set for a cycle.
    fn update(&mut self) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop, owning the arm model and both sinks.
pub struct ControlLoop<A, V> {
    arm: ArmCtrl,

    actuation: A,

    vis: V,

    state: LoopState,

    /// Wait after each actuation to let the servos settle, cut short by a new target.
    settle_delay: Duration,

    actuate_unreachable: bool,

    archiver: Option<Archiver>,

    last_record: Option<CycleRecord>,

    num_cycles: u64,
}

/// Result of processing a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub target: Target,

    pub output: ArmOutput,

    pub status: StatusReport,

    /// True if the servo command was accepted by the actuation sink.
    pub actuated: bool,
}

/// Flat per-cycle archive record.
#[derive(Debug, Clone, Copy, Serialize)]
struct CycleRecord {
    time_s: f64,
    target_x: f64,
    target_y: f64,
    target_z: f64,
    target_claw: f64,
    reached: bool,
    distance_m: f64,
    base_deg: u8,
    right_deg: u8,
    left_deg: u8,
    claw_deg: u8,
    actuated: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// State of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for a target.
    Idle,

    /// Solving and dispatching a target.
    Actuating,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A, V> ControlLoop<A, V>
where
    A: ActuationSink,
    V: VisSink,
{
    /// Create a new loop around an initialised arm.
    ///
    /// The settle delay and unreachable target policy are taken from the arm's parameters.
    pub fn new(arm: ArmCtrl, actuation: A, vis: V) -> Self {
        let settle_delay = Duration::from_millis(arm.params().settle_delay_ms);
        let actuate_unreachable = arm.params().actuate_unreachable;

        Self {
            arm,
            actuation,
            vis,
            state: LoopState::Idle,
            settle_delay,
            actuate_unreachable,
            archiver: None,
            last_record: None,
            num_cycles: 0,
        }
    }

    /// Override the settle delay, zero disables it.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Archive one record per cycle.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Run until the channel is closed and drained.
    ///
    /// Errors in a single cycle are logged and the loop carries on with the next target. Returns
    /// the number of cycles run.
    pub fn run(&mut self, chan: &TargetChannel) -> u64 {
        info!("Control loop started");

        loop {
            self.set_state(LoopState::Idle);

            let target = match chan.recv() {
                Some(t) => t,
                None => break,
            };

            let report = match self.process(target) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Could not process target {:?}: {}", target, e);
                    continue;
                }
            };

            if let Some(settle) = self.settle_time(&report) {
                if chan.wait_pending(settle) {
                    trace!("Settle wait cut short");
                }
            }
        }

        info!(
            "Target channel closed, control loop stopping after {} cycles",
            self.num_cycles
        );

        self.num_cycles
    }

    /// Solve for a single target and dispatch the result to both sinks.
    pub fn process(&mut self, target: Target) -> Result<CycleReport, ArmCtrlError> {
        self.set_state(LoopState::Actuating);

        let (output, status) = self.arm.proc(&InputData { target })?;
        self.num_cycles += 1;

        let angles_deg: Vec<[f64; 3]> = output.pose.iter().map(|r| r.to_degrees()).collect();
        info!(
            "Target ({:.3}, {:.3}, {:.3}, claw {:.1}) -> angles {:.1?} -> servos {:?}",
            target.x, target.y, target.z, target.claw, angles_deg, output.servo
        );

        // Actuation first, then visualisation
        let actuated = if status.reached || self.actuate_unreachable {
            match self.actuation.actuate(&output.servo) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Actuation failed: {}", e);
                    false
                }
            }
        } else {
            warn!("Target not reached, servos left where they are");
            false
        };

        for (i, rot) in output.pose.iter().enumerate() {
            self.vis.set_joint_rotation(i, rot);
        }
        self.vis.set_marker_position(target.position());
        self.vis.update();

        self.last_record = Some(CycleRecord {
            time_s: session::try_get_elapsed_seconds().unwrap_or(0.0),
            target_x: target.x,
            target_y: target.y,
            target_z: target.z,
            target_claw: target.claw,
            reached: status.reached,
            distance_m: status.distance_m,
            base_deg: output.servo.base,
            right_deg: output.servo.right,
            left_deg: output.servo.left,
            claw_deg: output.servo.claw,
            actuated,
        });

        if let Err(e) = self.write() {
            warn!("Could not archive the control cycle: {}", e);
        }

        self.set_state(LoopState::Idle);

        Ok(CycleReport {
            target,
            output,
            status,
            actuated,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn arm(&self) -> &ArmCtrl {
        &self.arm
    }

    pub fn actuation(&self) -> &A {
        &self.actuation
    }

    pub fn vis(&self) -> &V {
        &self.vis
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Time to give the servos after a cycle, `None` if nothing was sent to them.
    fn settle_time(&self, report: &CycleReport) -> Option<Duration> {
        match report.actuated && self.settle_delay > Duration::from_secs(0) {
            true => Some(self.settle_delay),
            false => None,
        }
    }

    fn set_state(&mut self, state: LoopState) {
        if self.state != state {
            trace!("Control loop {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

impl<A, V> Archived for ControlLoop<A, V> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match (self.archiver.as_mut(), self.last_record) {
            (Some(a), Some(r)) => a.serialise(r),
            _ => Ok(()),
        }
    }
}

impl ActuationSink for () {
    fn actuate(&mut self, _cmd: &ServoCommand) -> Result<(), ServoError> {
        Ok(())
    }
}

impl VisSink for () {
    fn set_joint_rotation(&mut self, _joint: usize, _rotation: &Euler) {}

    fn set_marker_position(&mut self, _position: [f64; 3]) {}
}

impl<T: ActuationSink + ?Sized> ActuationSink for Box<T> {
    fn actuate(&mut self, cmd: &ServoCommand) -> Result<(), ServoError> {
        (**self).actuate(cmd)
    }
}

impl<T: VisSink + ?Sized> VisSink for Box<T> {
    fn set_joint_rotation(&mut self, joint: usize, rotation: &Euler) {
        (**self).set_joint_rotation(joint, rotation)
    }

    fn set_marker_position(&mut self, position: [f64; 3]) {
        (**self).set_marker_position(position)
    }

    fn update(&mut self) {
        (**self).update()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::Params;
    use arm_if::eqpt::servo::SERVO_MAX_DEG;
    use std::{sync::Arc, thread};

    #[derive(Default)]
    struct RecordingActuator {
        cmds: Vec<ServoCommand>,
        fail: bool,
    }

    impl ActuationSink for RecordingActuator {
        fn actuate(&mut self, cmd: &ServoCommand) -> Result<(), ServoError> {
            self.cmds.push(*cmd);
            match self.fail {
                true => Err(ServoError::I2c),
                false => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingVis {
        joints: Vec<(usize, Euler)>,
        markers: Vec<[f64; 3]>,
        updates: usize,
    }

    impl VisSink for RecordingVis {
        fn set_joint_rotation(&mut self, joint: usize, rotation: &Euler) {
            self.joints.push((joint, *rotation));
        }

        fn set_marker_position(&mut self, position: [f64; 3]) {
            self.markers.push(position);
        }

        fn update(&mut self) {
            self.updates += 1;
        }
    }

    fn control_loop(params: Params) -> ControlLoop<RecordingActuator, RecordingVis> {
        ControlLoop::new(
            ArmCtrl::from_params(params).unwrap(),
            RecordingActuator::default(),
            RecordingVis::default(),
        )
    }

    fn in_range(cmd: &ServoCommand) -> bool {
        cmd.iter().all(|(_, a)| a <= SERVO_MAX_DEG)
    }

    #[test]
    fn test_end_to_end() {
        let mut cl = control_loop(Params::default());

        // Reachable
        let r = cl.process(Target::new(0.8, 1.1, 0.0, 45.0)).unwrap();
        assert!(r.status.reached);
        assert!(r.actuated);
        assert!(in_range(&r.output.servo));
        assert_eq!(cl.state(), LoopState::Idle);

        // Unreachable, still actuated with the best effort pose
        let r = cl.process(Target::new(0.0, 0.0, 0.0, 45.0)).unwrap();
        assert!(!r.status.reached);
        assert!(r.actuated);
        assert!(in_range(&r.output.servo));

        // Both sinks saw both cycles
        assert_eq!(cl.actuation().cmds.len(), 2);
        assert_eq!(cl.vis().updates, 2);
        assert_eq!(cl.vis().joints.len(), 6);
        assert_eq!(cl.vis().markers, vec![[0.8, 1.1, 0.0], [0.0, 0.0, 0.0]]);
        assert_eq!(cl.num_cycles(), 2);

        // The visualised pose matches the actuated one
        let last_pose: Vec<Euler> = cl.vis().joints[3..].iter().map(|(_, r)| *r).collect();
        assert_eq!(last_pose.as_slice(), r.output.pose.as_slice());
    }

    #[test]
    fn test_unreachable_not_actuated() {
        let mut cl = control_loop(Params {
            actuate_unreachable: false,
            ..Params::default()
        });

        let r = cl.process(Target::new(2.0, 2.0, 2.0, 0.0)).unwrap();

        assert!(!r.status.reached);
        assert!(!r.actuated);
        assert!(cl.actuation().cmds.is_empty());

        // The visualisation still follows
        assert_eq!(cl.vis().updates, 1);
        assert_eq!(cl.vis().markers, vec![[2.0, 2.0, 2.0]]);
    }

    #[test]
    fn test_actuation_failure_does_not_stop() {
        let mut cl = ControlLoop::new(
            ArmCtrl::from_params(Params::default()).unwrap(),
            RecordingActuator {
                cmds: vec![],
                fail: true,
            },
            RecordingVis::default(),
        );

        let r = cl.process(Target::default()).unwrap();
        assert!(!r.actuated);
        assert_eq!(cl.vis().updates, 1);

        let r = cl.process(Target::default()).unwrap();
        assert!(!r.actuated);
        assert_eq!(cl.actuation().cmds.len(), 2);
    }

    #[test]
    fn test_settle_only_after_actuation() {
        let mut cl = control_loop(Params {
            actuate_unreachable: false,
            ..Params::default()
        })
        .with_settle_delay(Duration::from_millis(500));

        let r = cl.process(Target::new(0.8, 1.1, 0.0, 45.0)).unwrap();
        assert!(r.actuated);
        assert_eq!(cl.settle_time(&r), Some(Duration::from_millis(500)));

        // Unreachable and not sent to the servos, so nothing to wait for
        let r = cl.process(Target::new(2.0, 2.0, 2.0, 45.0)).unwrap();
        assert!(!r.actuated);
        assert_eq!(cl.settle_time(&r), None);

        // A failed actuation moved nothing either
        cl.actuation.fail = true;
        let r = cl.process(Target::new(0.8, 1.1, 0.0, 45.0)).unwrap();
        assert!(!r.actuated);
        assert_eq!(cl.settle_time(&r), None);

        // No delay configured
        let cl = cl.with_settle_delay(Duration::from_secs(0));
        let r = CycleReport {
            actuated: true,
            ..r
        };
        assert_eq!(cl.settle_time(&r), None);
    }

    #[test]
    fn test_run_until_closed() {
        let chan = Arc::new(TargetChannel::new());

        let handle = {
            let chan = chan.clone();
            thread::spawn(move || {
                let mut cl = control_loop(Params::default())
                    .with_settle_delay(Duration::from_millis(10));
                let n = cl.run(&chan);
                (n, cl)
            })
        };

        chan.publish(Target::new(0.8, 1.1, 0.0, 10.0));
        thread::sleep(Duration::from_millis(100));
        chan.publish(Target::new(0.7, 1.0, 0.1, 20.0));
        chan.close();

        let (n, cl) = handle.join().unwrap();

        // The final target is always processed, earlier ones may be coalesced
        assert!(n >= 1 && n <= 2);
        assert_eq!(cl.actuation().cmds.last().map(|c| c.claw), Some(20));
        assert_eq!(cl.vis().markers.last(), Some(&[0.7, 1.0, 0.1]));
        assert_eq!(cl.state(), LoopState::Idle);
    }

    #[test]
    fn test_archive() {
        let path = std::env::temp_dir().join("mearm_ctrl_loop_archive_test.csv");

        {
            let mut cl = control_loop(Params::default())
                .with_archiver(Archiver::from_file_path(&path).unwrap());
            cl.process(Target::new(0.8, 1.1, 0.0, 45.0)).unwrap();
            cl.process(Target::new(0.0, 0.0, 0.0, 45.0)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time_s,target_x,target_y,target_z,target_claw,reached"));
        assert!(lines[1].contains(",true,"));
        assert!(lines[2].contains(",false,"));

        std::fs::remove_file(&path).ok();
    }
}
