//! # Interactive input
//!
//! Line-buffered terminal input: nothing happens until a line is entered with Enter. Every
//! character of the entered line is then one key event, so `lll` followed by Enter moves three
//! steps along +x. Each key is applied and published on its own, the control loop only sees the
//! latest. The `window` visualisation feeds its key presses through [`parse_key`] one at a time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use arm_if::tc::KeyCmd;
use log::{debug, info};
use rustyline::{error::ReadlineError, DefaultEditor};

// Internal
use crate::target_chan::TargetState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Step applied to the target for each key press.
pub const KEY_DELTA: f64 = 0.02;

/// Key which stops the input loop.
pub const QUIT_KEY: char = 'q';

const PROMPT: &str = "mearm> ";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A single key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyEvent {
    Cmd(KeyCmd),
    Quit,
    Unbound(char),
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Could not read from the terminal: {0}")]
    ReadlineError(#[from] ReadlineError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The event for a single key.
pub fn parse_key(key: char) -> KeyEvent {
    match (key, KeyCmd::from_key(key)) {
        (QUIT_KEY, _) => KeyEvent::Quit,
        (_, Some(cmd)) => KeyEvent::Cmd(cmd),
        (_, None) => KeyEvent::Unbound(key),
    }
}

/// Split an entered line into key events, ignoring whitespace.
pub fn parse_line(line: &str) -> Vec<KeyEvent> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(parse_key)
        .collect()
}

/// Apply a single key event to the target.
///
/// Returns true if the event asked to quit.
pub fn apply_event(state: &TargetState, event: KeyEvent) -> bool {
    match event {
        KeyEvent::Cmd(cmd) => {
            let t = state.apply_key(cmd, KEY_DELTA);
            debug!("{:?} -> target {:?}", cmd, t);
            false
        }
        KeyEvent::Quit => true,
        KeyEvent::Unbound(c) => {
            debug!("Key '{}' is not bound", c);
            false
        }
    }
}

/// Apply the keys of a line to the target in order.
///
/// Returns true if the line asked to quit, keys after the quit key are ignored.
pub fn apply_line(state: &TargetState, line: &str) -> bool {
    parse_line(line).into_iter().any(|e| apply_event(state, e))
}

/// Read keys from the terminal until the quit key, Ctrl-C or Ctrl-D.
pub fn terminal_loop(state: &TargetState) -> Result<(), InputError> {
    let mut rl = DefaultEditor::new()?;

    info!(
        "Keys: h/l x-/x+, j/k y-/y+, i/m z-/z+, -/+ claw-/claw+, {} to quit",
        QUIT_KEY
    );

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if apply_line(state, &line) {
                    break;
                }
                info!("Target: {:?}", state.snapshot());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    info!("Input finished");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::target_chan::TargetChannel;
    use arm_if::tc::Target;
    use std::sync::Arc;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("l k\tx q"),
            vec![
                KeyEvent::Cmd(KeyCmd::XInc),
                KeyEvent::Cmd(KeyCmd::YInc),
                KeyEvent::Unbound('x'),
                KeyEvent::Quit,
            ]
        );
        assert!(parse_line("").is_empty());
        assert_eq!(parse_key('m'), KeyEvent::Cmd(KeyCmd::ZInc));
        assert_eq!(parse_key(QUIT_KEY), KeyEvent::Quit);
    }

    #[test]
    fn test_apply_line() {
        let chan = Arc::new(TargetChannel::new());
        let state = TargetState::new(Target::new(0.0, 0.0, 0.0, 45.0), chan.clone());

        assert!(!apply_line(&state, "lll+"));
        let t = state.snapshot();
        assert!((t.x - 3.0 * KEY_DELTA).abs() < 1e-12);
        assert!((t.claw - (45.0 + KEY_DELTA)).abs() < 1e-12);

        // Only the latest target is pending
        assert_eq!(chan.try_recv(), Some(t));
        assert_eq!(chan.num_superseded(), 3);

        // Keys after quit are ignored
        assert!(apply_line(&state, "hqhh"));
        assert!((state.snapshot().x - 2.0 * KEY_DELTA).abs() < 1e-12);
    }
}
