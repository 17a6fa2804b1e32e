//! # Equipment Interface
//!
//! This module defines the interface structures which are sent to the arm's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod servo;
