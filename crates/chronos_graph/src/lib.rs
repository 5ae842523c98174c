//! Timing graph for the Chronos static timing analyzer.
//!
//! The [`Graph`] is a per-pin directed graph of timing [`Vertex`]s and
//! [`Edge`]s. One vertex per non-bidirect pin; bidirect pins get a load
//! vertex and a driver vertex. Edges carry a [`TimingRole`], the timing
//! arcs between the endpoint transitions, and per-(arc, corner, min/max)
//! delays with an "annotated" lock protecting externally supplied values
//! from recomputation.
//!
//! The [`delay_calc`] module defines the `DelayCalc` collaborator seam and
//! a lumped-capacitance reference implementation that consumes the reduced
//! driving-point parasitics.

#![warn(missing_docs)]

pub mod delay_calc;
pub mod graph;
pub mod ids;

pub use delay_calc::{find_delays, DcalcContext, DelayCalc, LumpedCapDelayCalc};
pub use graph::{BfsIndex, Edge, EdgeArc, Graph, Vertex};
pub use ids::{EdgeId, VertexId};
pub use chronos_network::TimingRole;
