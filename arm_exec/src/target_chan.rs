//! # Target channel
//!
//! A single-slot, latest-value-wins hand-off between any number of target producers and the one
//! control loop consuming them.
//!
//! Publishing never blocks and never grows: a new target overwrites any target which has not yet
//! been received. Receiving blocks until a target is pending and returns the most recent one, so
//! intermediate targets published while the consumer was busy are never observed.
//!
//! [`TargetState`] sits in front of the channel and owns the logical "current target" which key
//! input adjusts relatively. Its lock covers only the read-modify-publish of that accumulator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::tc::{KeyCmd, Target};
use log::trace;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Coalescing capacity-1 channel of targets.
#[derive(Debug, Default)]
pub struct TargetChannel {
    slot: Mutex<Slot>,
    cvar: Condvar,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<Target>,
    closed: bool,

    /// Number of targets overwritten before they were received.
    superseded: u64,
}

/// Owner of the logical current target, shared between the producers.
#[derive(Debug)]
pub struct TargetState {
    target: Mutex<Target>,
    chan: Arc<TargetChannel>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a target, replacing any target which has not been received yet.
    ///
    /// Never blocks beyond the slot lock. Targets published after the channel is closed are
    /// dropped.
    pub fn publish(&self, target: Target) {
        let mut slot = self.lock();

        if slot.closed {
            trace!("Target {:?} published after close, dropping", target);
            return;
        }

        if slot.pending.replace(target).is_some() {
            slot.superseded += 1;
        }

        drop(slot);
        self.cvar.notify_all();
    }

    /// Block until a target is pending and take it.
    ///
    /// Returns `None` once the channel has been closed and no target is pending.
    pub fn recv(&self) -> Option<Target> {
        let mut slot = self.lock();

        loop {
            if let Some(t) = slot.pending.take() {
                return Some(t);
            }

            if slot.closed {
                return None;
            }

            slot = self
                .cvar
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Take the pending target if there is one, without blocking.
    pub fn try_recv(&self) -> Option<Target> {
        self.lock().pending.take()
    }

    /// Wait up to `timeout` for a target to become pending, without taking it.
    ///
    /// Returns true early if a target is pending or the channel is closed, false if the timeout
    /// elapsed with nothing pending.
    pub fn wait_pending(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();

        loop {
            if slot.pending.is_some() || slot.closed {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            slot = self
                .cvar
                .wait_timeout(slot, deadline - now)
                .map(|(s, _)| s)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    /// Close the channel, waking the consumer. A target already pending can still be received.
    pub fn close(&self) {
        self.lock().closed = true;
        self.cvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of targets which were overwritten before the consumer received them.
    pub fn num_superseded(&self) -> u64 {
        self.lock().superseded
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panicking producer cannot leave the slot half-written, so poisoning is ignored
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TargetState {
    pub fn new(initial: Target, chan: Arc<TargetChannel>) -> Self {
        Self {
            target: Mutex::new(initial),
            chan,
        }
    }

    /// Modify the current target and publish the result.
    ///
    /// The accumulator lock is held across the modification and the publish, so concurrent
    /// producers publish in the same order as they modify.
    pub fn update<F>(&self, f: F) -> Target
    where
        F: FnOnce(&mut Target),
    {
        let mut target = self.lock();
        f(&mut target);
        self.chan.publish(*target);
        *target
    }

    /// Apply a key command to the current target and publish the result.
    pub fn apply_key(&self, cmd: KeyCmd, delta: f64) -> Target {
        self.update(|t| t.apply_key(cmd, delta))
    }

    /// Replace the current target and publish it.
    pub fn set(&self, target: Target) -> Target {
        self.update(|t| *t = target)
    }

    /// Publish the current target again without changing it.
    pub fn republish(&self) -> Target {
        self.update(|_| ())
    }

    /// Copy of the current target.
    pub fn snapshot(&self) -> Target {
        *self.lock()
    }

    pub fn channel(&self) -> &Arc<TargetChannel> {
        &self.chan
    }

    fn lock(&self) -> MutexGuard<'_, Target> {
        self.target.lock().unwrap_or_else(|e| e.into_inner())
    }
}
