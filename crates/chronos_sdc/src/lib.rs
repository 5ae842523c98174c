//! Timing constraint index for the Chronos timing analyzer.
//!
//! The [`Sdc`] holds the constraint state a front-end constraint reader
//! populates: clock definitions (ideal, propagated, generated), I/O delays,
//! path exceptions with incremental [`ExceptionState`] evaluation, disabled
//! edges and case analysis, clock latencies/insertions/uncertainties, and
//! derating. [`Variables`] carries the analysis-mode switches, and
//! [`scene`] defines the corner/scene/mode axes every derived quantity is
//! tagged with.

#![warn(missing_docs)]

pub mod clock;
pub mod exception;
pub mod io_delay;
pub mod scene;
pub mod sdc;
pub mod variables;

pub use clock::{Clock, ClockEdge, ClockId, ClockUncertainties};
pub use exception::{
    ExceptionId, ExceptionKind, ExceptionPath, ExceptionPt, ExceptionState,
};
pub use io_delay::{InputDelay, InputDelayId, OutputDelay, RiseFallMinMax};
pub use scene::{Corner, Mode, Scene};
pub use sdc::Sdc;
pub use variables::{CrprMode, Variables};
