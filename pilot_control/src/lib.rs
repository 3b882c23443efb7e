//! # Pilot Control Core
//!
//! Supervisory real-time control core of a driver-assistance stack. Once per
//! fixed tick it decides whether actuation is permitted and, if so, computes
//! the steering and acceleration commands for that tick.
//!
//! ## Tick Pipeline
//!
//! 1. **Ingest**: one immutable [`TickInputs`](pilot_common::controls::snapshot::TickInputs)
//!    per tick ([`ingest`]).
//! 2. **Event Set**: collaborator events plus last tick's supervisor warning.
//! 3. **Engagement**: Disabled / PreEnabled / Enabled / SoftDisabling /
//!    Overriding ([`state::engagement`]).
//! 4. **Longitudinal**: Off / PID / Stopping / Starting + acceleration PID
//!    ([`control::longitudinal`]).
//! 5. **Lateral**: one of PID, INDI, LQR, torque, angle or a blend
//!    ([`lateral`]).
//! 6. **Supervisor**: saturation warnings for the next tick ([`safety`]).
//! 7. **Publish**: the command handed by value to a sink ([`publish`]).
//!
//! [`cycle::ControlsCore`] runs steps 2-7 for one tick;
//! [`cycle::CycleRunner`] paces it.
//!
//! ## No Allocation In The Tick
//!
//! Controller state is sized at construction. Events live in a fixed-capacity
//! `heapless::Vec`. Configuration reloads parse on the refresher's cadence and
//! are swapped in only while Disabled.

pub mod config;
pub mod control;
pub mod cycle;
pub mod ingest;
pub mod lateral;
pub mod publish;
pub mod safety;
pub mod state;
