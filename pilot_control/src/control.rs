//! Control engine root.
//!
//! Shared building blocks for both axes: speed-scheduled PID, first-order
//! filters, the bicycle vehicle model, and the longitudinal loop built on
//! top of them.

pub mod filters;
pub mod longitudinal;
pub mod pid;
pub mod vehicle_model;
