//! Processing module interface
//!
//! A module is initialised once from its parameters and then processed cyclically, each cycle
//! turning one set of input data into output data plus a status report. `arm_ctrl` is the
//! module run by every executable in the workspace.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The internal state of a processing module.
pub trait State {
    /// Data needed to initialise the module, usually the path to its parameter file.
    type InitData;
    type InitError;

    /// Data consumed by one processing cycle.
    type InputData;
    /// Data produced by one processing cycle.
    type OutputData;
    /// Diagnostics for one processing cycle, cleared at the start of each cycle.
    type StatusReport;
    type ProcError;

    /// Initialise the module within the current session.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one processing cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
