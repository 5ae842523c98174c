//! Library cell view: ports, capacitances, and timing arc sets.
//!
//! A [`LibertyCell`] describes one library cell: its ports with
//! per-(corner, rise/fall, min/max) capacitance, and the timing arc sets
//! between port pairs that the graph builder turns into edges. Delay-table
//! interpolation is out of scope; each arc carries a per-corner linear
//! [`ArcModel`] that the reference delay calculator consumes.

use crate::arena::Arena;
use crate::ids::{CellId, PortId};
use crate::role::TimingRole;
use chronos_common::{Delay, Ident, MinMax, RiseFall};
use serde::{Deserialize, Serialize};

/// The direction of a cell port or top-level port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// An input port.
    Input,
    /// An output port.
    Output,
    /// A bidirectional port.
    Bidirect,
    /// An internal port (not externally connectable).
    Internal,
}

impl PortDirection {
    /// Returns `true` for input or bidirect.
    pub fn is_any_input(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::Bidirect)
    }

    /// Returns `true` for output or bidirect.
    pub fn is_any_output(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::Bidirect)
    }

    /// Returns `true` for bidirect.
    pub fn is_bidirect(self) -> bool {
        self == PortDirection::Bidirect
    }

    /// Returns `true` for internal.
    pub fn is_internal(self) -> bool {
        self == PortDirection::Internal
    }
}

/// The unateness of a timing arc set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TimingSense {
    /// Output transition follows the input transition.
    PositiveUnate,
    /// Output transition opposes the input transition.
    NegativeUnate,
    /// Output may transition either way.
    NonUnate,
}

/// A per-corner linear delay model: `delay = intrinsic + resistance * load`.
///
/// Stands in for the external delay-table interpolation; the reference
/// delay calculator also derives the output slew from the same pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcModel {
    /// Fixed delay component in seconds.
    pub intrinsic: Delay,
    /// Load-dependent slope in seconds per farad.
    pub resistance: Delay,
}

/// A single (from-transition, to-transition) pair inside a [`TimingArcSet`],
/// carrying per-corner delay model references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingArc {
    /// Transition at the arc's source pin.
    pub from_rf: RiseFall,
    /// Transition at the arc's destination pin.
    pub to_rf: RiseFall,
    /// Delay model per corner. A single entry applies to all corners.
    pub models: Vec<ArcModel>,
}

impl TimingArc {
    /// The delay model for the given corner, falling back to the last
    /// entry when the library carries fewer corners than the analysis.
    pub fn model(&self, corner: usize) -> ArcModel {
        self.models
            .get(corner)
            .or_else(|| self.models.last())
            .copied()
            .unwrap_or_default()
    }
}

/// A set of timing arcs between one (from-port, to-port) pair with a
/// common role and sense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingArcSet {
    /// Source port within the owning cell.
    pub from_port: PortId,
    /// Destination port within the owning cell.
    pub to_port: PortId,
    /// What this arc set models.
    pub role: TimingRole,
    /// Unateness of the set.
    pub sense: TimingSense,
    /// The per-transition arcs.
    pub arcs: Vec<TimingArc>,
}

impl TimingArcSet {
    /// Returns the indices of the (at most two) arcs leaving `from_rf`,
    /// one per destination transition.
    pub fn arcs_from(&self, from_rf: RiseFall) -> (Option<usize>, Option<usize>) {
        let mut rise = None;
        let mut fall = None;
        for (i, arc) in self.arcs.iter().enumerate() {
            if arc.from_rf == from_rf {
                match arc.to_rf {
                    RiseFall::Rise => rise = Some(i),
                    RiseFall::Fall => fall = Some(i),
                }
            }
        }
        (rise, fall)
    }
}

/// Builds the two arcs of a fully unate arc set with a single model.
pub fn unate_arcs(sense: TimingSense, model: ArcModel) -> Vec<TimingArc> {
    let to_rf = |from: RiseFall| match sense {
        TimingSense::NegativeUnate => from.opposite(),
        _ => from,
    };
    RiseFall::both()
        .into_iter()
        .map(|from_rf| TimingArc {
            from_rf,
            to_rf: to_rf(from_rf),
            models: vec![model],
        })
        .collect()
}

/// A port of a library cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibertyPort {
    /// Port name within the cell (e.g., `A`, `Y`, `CK`).
    pub name: Ident,
    /// Port direction.
    pub direction: PortDirection,
    /// Capacitance per corner, indexed `[rf][min_max]`. A single entry
    /// applies to all corners.
    pub caps: Vec<[[f32; 2]; 2]>,
    /// Liberty `pulse_clock` sense, if this port shapes a pulse clock.
    pub pulse_clk_sense: Option<RiseFall>,
    /// Internal clock-network delay absorbed by a macro cell, indexed
    /// `[rf][min_max]`.
    pub clk_tree_delays: [[f32; 2]; 2],
}

impl LibertyPort {
    /// Creates an input or output port with a uniform capacitance.
    pub fn new(name: Ident, direction: PortDirection, cap: f32) -> Self {
        Self {
            name,
            direction,
            caps: vec![[[cap; 2]; 2]],
            pulse_clk_sense: None,
            clk_tree_delays: [[0.0; 2]; 2],
        }
    }

    /// Port capacitance for the given corner, transition, and min/max side.
    pub fn capacitance(&self, corner: usize, rf: RiseFall, min_max: MinMax) -> f32 {
        let per_corner = self
            .caps
            .get(corner)
            .or_else(|| self.caps.last())
            .copied()
            .unwrap_or_default();
        per_corner[rf.index()][min_max.index()]
    }

    /// Returns `true` when all rise/fall/min/max capacitances are equal.
    pub fn capacitance_is_one_value(&self) -> bool {
        self.caps.iter().all(|c| {
            let v = c[0][0];
            c[0][1] == v && c[1][0] == v && c[1][1] == v
        })
    }

    /// Clock-network delay absorbed inside a macro cell.
    ///
    /// The slew argument is accepted for interface parity with table-driven
    /// libraries; the stored value is slew-independent.
    pub fn clk_tree_delay(&self, _slew: Delay, rf: RiseFall, min_max: MinMax) -> Delay {
        self.clk_tree_delays[rf.index()][min_max.index()]
    }
}

/// A library cell: ports plus the timing arc sets between them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibertyCell {
    /// Cell name (e.g., `BUFX2`, `DFFRX1`).
    pub name: Ident,
    /// `true` for macro cells whose internal clock tree is absorbed.
    pub is_macro: bool,
    /// The cell's ports.
    pub ports: Arena<PortId, LibertyPort>,
    /// Timing arc sets between port pairs.
    pub arc_sets: Vec<TimingArcSet>,
}

impl LibertyCell {
    /// Creates an empty cell.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            is_macro: false,
            ports: Arena::new(),
            arc_sets: Vec::new(),
        }
    }

    /// Adds a port and returns its ID.
    pub fn add_port(&mut self, port: LibertyPort) -> PortId {
        self.ports.alloc(port)
    }

    /// Finds a port by name.
    pub fn find_port(&self, name: Ident) -> Option<PortId> {
        self.ports
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(id, _)| id)
    }

    /// Adds a timing arc set.
    pub fn add_arc_set(&mut self, set: TimingArcSet) {
        self.arc_sets.push(set);
    }

    /// Iterates arc sets arriving at `to_port`.
    pub fn arc_sets_to(&self, to_port: PortId) -> impl Iterator<Item = &TimingArcSet> {
        self.arc_sets.iter().filter(move |s| s.to_port == to_port)
    }

    /// Returns `true` if any arc set clocked by `port` is a register or
    /// latch clock-to-output set.
    pub fn is_clock_port(&self, port: PortId) -> bool {
        self.arc_sets
            .iter()
            .any(|s| s.from_port == port && (s.role.is_reg_clk_to_q() || s.role.is_timing_check()))
    }
}

/// A collection of library cells.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LibertyLibrary {
    /// The cells of the library.
    pub cells: Arena<CellId, LibertyCell>,
}

impl LibertyLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, cell: LibertyCell) -> CellId {
        self.cells.alloc(cell)
    }

    /// Finds a cell by name.
    pub fn find_cell(&self, name: Ident) -> Option<CellId> {
        self.cells
            .iter()
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronos_common::Interner;

    fn buf_cell(interner: &Interner) -> LibertyCell {
        let mut cell = LibertyCell::new(interner.get_or_intern("BUFX2"));
        let a = cell.add_port(LibertyPort::new(
            interner.get_or_intern("A"),
            PortDirection::Input,
            1e-15,
        ));
        let y = cell.add_port(LibertyPort::new(
            interner.get_or_intern("Y"),
            PortDirection::Output,
            0.0,
        ));
        cell.add_arc_set(TimingArcSet {
            from_port: a,
            to_port: y,
            role: TimingRole::Combinational,
            sense: TimingSense::PositiveUnate,
            arcs: unate_arcs(
                TimingSense::PositiveUnate,
                ArcModel {
                    intrinsic: 100e-12,
                    resistance: 0.0,
                },
            ),
        });
        cell
    }

    #[test]
    fn direction_predicates() {
        assert!(PortDirection::Input.is_any_input());
        assert!(PortDirection::Bidirect.is_any_input());
        assert!(PortDirection::Bidirect.is_any_output());
        assert!(!PortDirection::Output.is_any_input());
        assert!(PortDirection::Internal.is_internal());
    }

    #[test]
    fn unate_arcs_positive() {
        let arcs = unate_arcs(TimingSense::PositiveUnate, ArcModel::default());
        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].from_rf, arcs[0].to_rf);
        assert_eq!(arcs[1].from_rf, arcs[1].to_rf);
    }

    #[test]
    fn unate_arcs_negative() {
        let arcs = unate_arcs(TimingSense::NegativeUnate, ArcModel::default());
        assert_eq!(arcs[0].to_rf, arcs[0].from_rf.opposite());
    }

    #[test]
    fn arcs_from_pairs() {
        let interner = Interner::new();
        let cell = buf_cell(&interner);
        let set = &cell.arc_sets[0];
        let (rise, fall) = set.arcs_from(RiseFall::Rise);
        // Positive-unate buffer: rise -> rise only.
        assert!(rise.is_some());
        assert!(fall.is_none());
        assert_eq!(set.arcs[rise.unwrap()].to_rf, RiseFall::Rise);
    }

    #[test]
    fn find_port_by_name() {
        let interner = Interner::new();
        let cell = buf_cell(&interner);
        assert!(cell.find_port(interner.get_or_intern("A")).is_some());
        assert!(cell.find_port(interner.get_or_intern("Z")).is_none());
    }

    #[test]
    fn port_capacitance_corner_fallback() {
        let interner = Interner::new();
        let port = LibertyPort::new(interner.get_or_intern("A"), PortDirection::Input, 2e-15);
        // Only one corner stored; corner 3 falls back to it.
        assert_eq!(port.capacitance(3, RiseFall::Rise, MinMax::Max), 2e-15);
        assert!(port.capacitance_is_one_value());
    }

    #[test]
    fn port_capacitance_split_values() {
        let interner = Interner::new();
        let mut port = LibertyPort::new(interner.get_or_intern("A"), PortDirection::Input, 1e-15);
        port.caps[0][RiseFall::Fall.index()][MinMax::Max.index()] = 3e-15;
        assert!(!port.capacitance_is_one_value());
        assert_eq!(port.capacitance(0, RiseFall::Fall, MinMax::Max), 3e-15);
        assert_eq!(port.capacitance(0, RiseFall::Rise, MinMax::Max), 1e-15);
    }

    #[test]
    fn arc_model_corner_fallback() {
        let arc = TimingArc {
            from_rf: RiseFall::Rise,
            to_rf: RiseFall::Rise,
            models: vec![ArcModel {
                intrinsic: 1e-12,
                resistance: 2.0,
            }],
        };
        assert_eq!(arc.model(5).intrinsic, 1e-12);
    }

    #[test]
    fn clock_port_detection() {
        let interner = Interner::new();
        let mut cell = LibertyCell::new(interner.get_or_intern("DFFX1"));
        let ck = cell.add_port(LibertyPort::new(
            interner.get_or_intern("CK"),
            PortDirection::Input,
            1e-15,
        ));
        let q = cell.add_port(LibertyPort::new(
            interner.get_or_intern("Q"),
            PortDirection::Output,
            0.0,
        ));
        cell.add_arc_set(TimingArcSet {
            from_port: ck,
            to_port: q,
            role: TimingRole::RegClkToQ,
            sense: TimingSense::NonUnate,
            arcs: unate_arcs(TimingSense::PositiveUnate, ArcModel::default()),
        });
        assert!(cell.is_clock_port(ck));
        assert!(!cell.is_clock_port(q));
    }

    #[test]
    fn library_find_cell() {
        let interner = Interner::new();
        let mut lib = LibertyLibrary::new();
        lib.add_cell(buf_cell(&interner));
        assert!(lib.find_cell(interner.get_or_intern("BUFX2")).is_some());
        assert!(lib.find_cell(interner.get_or_intern("NANDX1")).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let interner = Interner::new();
        let cell = buf_cell(&interner);
        let json = serde_json::to_string(&cell).unwrap();
        let back: LibertyCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ports.len(), 2);
        assert_eq!(back.arc_sets.len(), 1);
    }
}
