//! Named events and the per-tick event set.
//!
//! Collaborators raise events by name. Each name maps through a fixed table
//! to one or more categories ([`EventType`]); the engagement machine only
//! ever asks which categories are present.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_EVENTS_PER_TICK;

// ─── Categories ─────────────────────────────────────────────────────

bitflags! {
    /// Event categories. Not mutually exclusive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventType: u16 {
        /// Driver requested engagement.
        const ENABLE                = 0x0001;
        /// Engagement must pass through PreEnabled first.
        const PRE_ENABLE            = 0x0002;
        /// Driver steering input takes precedence.
        const OVERRIDE_LATERAL      = 0x0004;
        /// Driver pedal input takes precedence.
        const OVERRIDE_LONGITUDINAL = 0x0008;
        /// Engagement is not allowed this tick.
        const NO_ENTRY              = 0x0010;
        /// Informational alert, no control-flow effect.
        const WARNING               = 0x0020;
        /// Driver disengaged.
        const USER_DISABLE          = 0x0040;
        /// Graceful disengagement with a recovery window.
        const SOFT_DISABLE          = 0x0080;
        /// Forced disengagement, no grace period.
        const IMMEDIATE_DISABLE     = 0x0100;
        /// Persistent condition shown while disengaged.
        const PERMANENT             = 0x0200;
    }
}

impl EventType {
    /// Categories that force Disabled from any engaged state.
    pub const DISABLE_MASK: Self = Self::from_bits_truncate(
        Self::USER_DISABLE.bits() | Self::IMMEDIATE_DISABLE.bits(),
    );

    /// Either override category.
    pub const OVERRIDE_MASK: Self = Self::from_bits_truncate(
        Self::OVERRIDE_LATERAL.bits() | Self::OVERRIDE_LONGITUDINAL.bits(),
    );
}

impl Default for EventType {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Names ──────────────────────────────────────────────────────────

/// Events a collaborator may raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    // engagement requests
    ButtonEnable,
    PcmEnable,
    PreEnableStandstill,

    // driver disengagement
    ButtonCancel,
    PcmDisable,
    PedalPressed,
    BrakeHold,
    ParkBrake,
    WrongGear,
    WrongCarMode,
    WrongCruiseMode,
    ReverseGear,

    // overrides
    GasPressedOverride,
    SteerOverride,

    // soft disable
    SteerTempUnavailable,
    SteerTimeLimit,
    DoorOpen,
    SeatbeltNotLatched,
    EspDisabled,
    LowBattery,
    CommIssue,
    ControlsLagging,
    CalibrationInvalid,
    SensorDataInvalid,
    Overheat,
    ParamsdTemporaryError,

    // immediate disable
    SteerUnavailable,
    ControlsMismatch,
    CanError,
    AccFaulted,
    EspActive,
    CruiseDisabled,
    PlannerError,
    RelayMalfunction,
    ParamsdPermanentError,

    // entry blockers
    ControlsInitializing,
    BelowEngageSpeed,
    LowSpeedLockout,
    ResumeBlocked,
    SpeedTooHigh,

    // warnings
    SteerTempUnavailableSilent,
    BelowSteerSpeed,
    DriverDistracted,
    DriverUnresponsive,
    SteerSaturated,
    Fcw,
}

impl EventName {
    /// Category table.
    pub const fn types(self) -> EventType {
        use EventName::*;
        const NE: u16 = EventType::NO_ENTRY.bits();
        const UD: u16 = EventType::USER_DISABLE.bits();
        const SD: u16 = EventType::SOFT_DISABLE.bits();
        const ID: u16 = EventType::IMMEDIATE_DISABLE.bits();
        const PM: u16 = EventType::PERMANENT.bits();
        const WN: u16 = EventType::WARNING.bits();

        let bits = match self {
            ButtonEnable | PcmEnable => EventType::ENABLE.bits(),
            PreEnableStandstill => EventType::PRE_ENABLE.bits(),

            PcmDisable => UD,
            ButtonCancel | PedalPressed | BrakeHold | ParkBrake | WrongGear | WrongCarMode
            | WrongCruiseMode => UD | NE,
            ReverseGear => UD | NE | PM,

            GasPressedOverride => EventType::OVERRIDE_LONGITUDINAL.bits(),
            SteerOverride => EventType::OVERRIDE_LATERAL.bits(),

            SteerTempUnavailable | SteerTimeLimit | DoorOpen | SeatbeltNotLatched
            | EspDisabled | LowBattery | CommIssue | ControlsLagging | ParamsdTemporaryError => {
                SD | NE
            }
            CalibrationInvalid | SensorDataInvalid | Overheat => SD | NE | PM,

            CruiseDisabled => ID,
            ControlsMismatch | EspActive | PlannerError => ID | NE,
            SteerUnavailable | CanError | AccFaulted | RelayMalfunction
            | ParamsdPermanentError => ID | NE | PM,

            ControlsInitializing | BelowEngageSpeed | ResumeBlocked => NE,
            LowSpeedLockout => NE | PM,
            SpeedTooHigh => WN | NE,

            SteerTempUnavailableSilent | BelowSteerSpeed | DriverDistracted
            | DriverUnresponsive | SteerSaturated => WN,
            Fcw => PM,
        };
        EventType::from_bits_truncate(bits)
    }
}

// ─── Event Set ──────────────────────────────────────────────────────

/// Events present in one tick. Fixed capacity, no heap allocation.
///
/// Serializes as a plain list of event names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSet {
    names: heapless::Vec<EventName, MAX_EVENTS_PER_TICK>,
}

impl EventSet {
    /// Empty set.
    pub const fn new() -> Self {
        Self {
            names: heapless::Vec::new(),
        }
    }

    /// Add an event. Duplicates are ignored.
    ///
    /// Returns `false` if the set is full and the event was dropped.
    pub fn add(&mut self, name: EventName) -> bool {
        if self.names.contains(&name) {
            return true;
        }
        self.names.push(name).is_ok()
    }

    /// Add every event of `other`. Returns `false` if any was dropped.
    pub fn extend_from(&mut self, other: &EventSet) -> bool {
        let mut all = true;
        for name in other.iter() {
            all &= self.add(name);
        }
        all
    }

    /// True if any event in the set carries a category in `ty`.
    #[inline]
    pub fn contains(&self, ty: EventType) -> bool {
        self.names.iter().any(|n| n.types().intersects(ty))
    }

    /// True if the named event is present.
    #[inline]
    pub fn has(&self, name: EventName) -> bool {
        self.names.contains(&name)
    }

    /// Union of the categories of every event.
    pub fn types(&self) -> EventType {
        self.names
            .iter()
            .fold(EventType::empty(), |acc, n| acc | n.types())
    }

    pub fn iter(&self) -> impl Iterator<Item = EventName> + '_ {
        self.names.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl FromIterator<EventName> for EventSet {
    fn from_iter<I: IntoIterator<Item = EventName>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.add(name);
        }
        set
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
