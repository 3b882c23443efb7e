//! Pilot Common Library
//!
//! Shared constants, per-tick data types, event definitions and configuration
//! loading for the pilot control workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Tick timing and control-law constants
//! - [`config`] - Configuration loading traits and types
//! - [`controls`] - Snapshot, event, state, command and tuning types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use pilot_common::prelude::*;
//!
//! let mut events = EventSet::new();
//! events.add(EventName::ButtonEnable);
//! assert!(events.contains(EventType::ENABLE));
//! ```

pub mod config;
pub mod consts;
pub mod controls;
pub mod prelude;
