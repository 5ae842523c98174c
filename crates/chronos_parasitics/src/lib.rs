//! Interconnect parasitics for the Chronos timing analyzer.
//!
//! A [`ParasiticNetwork`] is the resistor/capacitor graph annotated on one
//! net for one analysis corner. The [`reduce`] module collapses it into a
//! driving-point model an external delay calculator consumes: a π model with
//! per-load Elmore delays, or a π model with per-load two-pole/two-residue
//! approximations.
//!
//! - [`model`] — RC network storage, node identity, build interface, edits
//! - [`reduced`] — π / π-Elmore / π-pole-residue result types
//! - [`reduce`] — O'Brien–Savarino moment reduction and RICE moment matching

#![warn(missing_docs)]

pub mod model;
pub mod reduce;
pub mod reduced;

pub use model::{
    NodeIdent, ParasiticNetwork, ParasiticNode, ParasiticNodeId, Parasitics,
    ParasiticCapacitor, ParasiticResistor,
};
pub use reduce::{reduce_to_pi_elmore, reduce_to_pi_pole_residue, PinCapFn};
pub use reduced::{PiElmore, PiModel, PiPoleResidue, PoleResidue, Reduced};
