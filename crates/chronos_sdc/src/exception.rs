//! Path exceptions and their incremental evaluation state.
//!
//! An [`ExceptionPath`] is a false-path, multicycle, path-delay,
//! group-path, or loop-break constraint with -from/-thru/-to point sets.
//! The search does not match whole paths; it carries per-tag
//! [`ExceptionState`]s that record "the next -thru this exception is
//! waiting for" and advances them edge by edge.

use crate::clock::ClockId;
use chronos_common::{Delay, Ident, MinMax, RiseFall};
use chronos_network::{InstanceId, PinId};
use serde::{Deserialize, Serialize};

/// Index of an exception within the owning [`Sdc`](crate::Sdc).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ExceptionId(u32);

impl ExceptionId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A -from/-thru/-to point set: pins, clocks, and instances, with an
/// optional transition filter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExceptionPt {
    /// Matching pins.
    pub pins: Vec<PinId>,
    /// Matching clocks (for -from/-to clock sets).
    pub clocks: Vec<ClockId>,
    /// Matching instances (any pin of the instance matches).
    pub instances: Vec<InstanceId>,
    /// Transition filter; `None` matches both.
    pub rf: Option<RiseFall>,
}

impl ExceptionPt {
    /// A point set of one pin.
    pub fn pin(pin: PinId) -> Self {
        Self {
            pins: vec![pin],
            ..Self::default()
        }
    }

    /// A point set of one clock.
    pub fn clock(clock: ClockId) -> Self {
        Self {
            clocks: vec![clock],
            ..Self::default()
        }
    }

    /// Returns `true` when `(pin, rf)` is in the set.
    pub fn matches_pin(&self, pin: PinId, instance: InstanceId, rf: RiseFall) -> bool {
        if let Some(filter) = self.rf {
            if filter != rf {
                return false;
            }
        }
        self.pins.contains(&pin) || self.instances.contains(&instance)
    }

    /// Returns `true` when `clock` is in the set.
    pub fn matches_clock(&self, clock: Option<ClockId>) -> bool {
        match clock {
            Some(clock) => self.clocks.contains(&clock),
            None => false,
        }
    }

    /// Returns `true` when the set names nothing.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty() && self.clocks.is_empty() && self.instances.is_empty()
    }
}

/// What an exception does to the paths it matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// `set_false_path`: matched paths are not analyzed.
    FalsePath,
    /// `set_multicycle_path`: the capture edge moves by a cycle count.
    MulticyclePath {
        /// Setup cycle count, if constrained.
        setup: Option<u32>,
        /// Hold cycle count, if constrained.
        hold: Option<u32>,
    },
    /// `set_max_delay` / `set_min_delay`.
    PathDelay {
        /// Which side the delay bounds.
        min_max: MinMax,
        /// The bound, seconds.
        delay: Delay,
        /// `-ignore_clock_latency`.
        ignore_clk_latency: bool,
    },
    /// `group_path -name`: reporting group assignment.
    GroupPath {
        /// The group name.
        name: Ident,
    },
    /// A loop-break exception created for a feedback loop.
    Loop,
    /// A transient -from/-thru/-to report filter.
    Filter,
}

impl ExceptionKind {
    /// Match priority; higher wins when several exceptions complete on
    /// one path.
    pub fn priority(&self) -> u32 {
        match self {
            ExceptionKind::Filter => 5000,
            ExceptionKind::FalsePath | ExceptionKind::Loop => 4000,
            ExceptionKind::PathDelay { .. } => 3000,
            ExceptionKind::MulticyclePath { .. } => 2000,
            ExceptionKind::GroupPath { .. } => 1000,
        }
    }
}

/// One path exception.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExceptionPath {
    /// What the exception does.
    pub kind: ExceptionKind,
    /// Start point set, if any.
    pub from: Option<ExceptionPt>,
    /// Intermediate point sets, in order.
    pub thrus: Vec<ExceptionPt>,
    /// End point set, if any.
    pub to: Option<ExceptionPt>,
    /// Which analysis side the exception applies to; `None` is both.
    pub min_max: Option<MinMax>,
}

impl ExceptionPath {
    /// Returns `true` when the exception applies on `min_max`.
    pub fn matches_min_max(&self, min_max: MinMax) -> bool {
        self.min_max.is_none() || self.min_max == Some(min_max)
    }

    /// Match priority of the exception.
    pub fn priority(&self) -> u32 {
        self.kind.priority()
    }
}

/// Incremental progress of one exception along one path: the index of the
/// next -thru the path is waiting for. States live on tags; equal states
/// merge when tags are interned.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ExceptionState {
    /// The exception being tracked.
    pub exception: ExceptionId,
    /// Index of the next pending -thru set (== thru count when all
    /// traversed).
    pub next_thru: u32,
}

impl ExceptionState {
    /// The initial state of `exception`.
    pub fn start(exception: ExceptionId) -> Self {
        Self {
            exception,
            next_thru: 0,
        }
    }

    /// The state after the pending -thru matched.
    pub fn next_state(self) -> Self {
        Self {
            exception: self.exception,
            next_thru: self.next_thru + 1,
        }
    }
}
