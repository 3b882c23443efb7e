//! Per-tick safety checks.
//!
//! - [`saturation`]: escalates sustained lateral saturation to a warning
//!   event for the next tick.
//! - [`sanitize`]: replaces non-finite inputs and outputs and reports them as
//!   [`ControlFault`](pilot_common::controls::fault::ControlFault) flags.

pub mod sanitize;
pub mod saturation;
