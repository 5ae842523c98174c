//! Gate-level netlist and library data model for the Chronos timing analyzer.
//!
//! This crate supplies the *network* collaborator the timing core consumes:
//! arena-stored instances, pins, and nets with connectivity queries, plus the
//! library view of each cell ([`LibertyCell`], [`LibertyPort`],
//! [`TimingArcSet`]) that drives timing-arc construction and pin capacitance
//! lookup. The front end that reads netlist and library files populates this
//! model; the timing core references objects by opaque ID only.

#![warn(missing_docs)]

pub mod arena;
pub mod ids;
pub mod liberty;
pub mod network;
pub mod role;

pub use arena::{Arena, ArenaId};
pub use ids::{CellId, InstanceId, NetId, PinId, PortId};
pub use liberty::{
    unate_arcs, ArcModel, LibertyCell, LibertyLibrary, LibertyPort, PortDirection, TimingArc,
    TimingArcSet, TimingSense,
};
pub use network::{Instance, Net, Network, Pin};
pub use role::TimingRole;
