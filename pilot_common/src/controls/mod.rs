//! Types exchanged between the control core and its collaborators.
//!
//! - [`snapshot`] - per-tick inputs (vehicle state, plans, live parameters)
//! - [`events`] - named events and their categories
//! - [`state`] - engagement and longitudinal state enums
//! - [`command`] - the actuator command and lateral debug records
//! - [`config`] - tuning document for the control core
//! - [`fault`] - per-tick local fault flags
//! - [`interp`] - breakpoint tables

pub mod command;
pub mod config;
pub mod events;
pub mod fault;
pub mod interp;
pub mod snapshot;
pub mod state;
