//! State machines of the control core.
//!
//! - [`engagement`]: top-level actuation permission, driven by the event set.
//! - [`longitudinal`]: Off / PID / Stopping / Starting transition function.

pub mod engagement;
pub mod longitudinal;
