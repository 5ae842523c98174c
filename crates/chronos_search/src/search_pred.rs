//! Predicates deciding which vertices and edges a traversal may use.

use chronos_graph::{EdgeId, Graph, VertexId};
use chronos_network::{Network, TimingRole};
use chronos_sdc::Sdc;

/// Traversal predicate options. The levelizer searches through latch
/// data-to-output edges (they must still be ordered); the arrival search
/// handles them specially; the required search never crosses them.
#[derive(Clone, Copy, Debug)]
pub struct SearchPred {
    /// Traverse latch D→Q edges.
    pub search_thru_latches: bool,
    /// Traverse edges disabled as loop-breakers (dynamic loop breaking).
    pub search_thru_disabled_loops: bool,
}

impl SearchPred {
    /// The levelizer's predicate: order everything that could ever be
    /// searched.
    pub fn levelize() -> Self {
        Self {
            search_thru_latches: true,
            search_thru_disabled_loops: false,
        }
    }

    /// The search's predicate.
    pub fn search() -> Self {
        Self {
            search_thru_latches: true,
            search_thru_disabled_loops: false,
        }
    }

    /// The backward (required) predicate.
    pub fn backward() -> Self {
        Self {
            search_thru_latches: false,
            search_thru_disabled_loops: false,
        }
    }

    /// May a traversal start from (or continue out of) `vertex`?
    pub fn search_from(&self, graph: &Graph, sdc: &Sdc, vertex: VertexId) -> bool {
        let pin = graph.vertex(vertex).pin;
        !sdc.is_disabled_pin(pin) && sdc.case_value(pin).is_none()
    }

    /// May a traversal cross `edge`?
    pub fn search_thru(&self, graph: &Graph, network: &Network, sdc: &Sdc, edge: EdgeId) -> bool {
        let e = graph.edge(edge);
        if e.role.is_timing_check() {
            return false;
        }
        if e.role == TimingRole::LatchDtoQ && !self.search_thru_latches {
            return false;
        }
        if e.role == TimingRole::RegSetClr && !sdc.variables.preset_clr_arcs_enabled {
            return false;
        }
        if e.is_disabled_constraint {
            return false;
        }
        if e.is_disabled_loop && !self.search_thru_disabled_loops {
            return false;
        }
        if e.is_bidirect_inst_path && !sdc.variables.bidirect_inst_paths_enabled {
            // The load->driver hop of a top-level bidirect port is always
            // searchable; internal bidirect instance paths are gated.
            let pin = graph.vertex(e.from).pin;
            if !network.is_top_level_port(pin) {
                return false;
            }
        }
        let from_pin = graph.vertex(e.from).pin;
        let to_pin = graph.vertex(e.to).pin;
        !sdc.is_disabled_edge(from_pin, to_pin)
    }

    /// May a traversal end at (or continue into) `vertex`?
    pub fn search_to(&self, graph: &Graph, sdc: &Sdc, vertex: VertexId) -> bool {
        let pin = graph.vertex(vertex).pin;
        !sdc.is_disabled_pin(pin) && sdc.case_value(pin).is_none()
    }
}
