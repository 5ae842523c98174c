//! The analysis facade: owns the collaborators and sequences an update.
//!
//! `update_timing` runs the full pipeline: levelize, compute arc delays,
//! forward arrivals (looping passes for postponed latch outputs), then
//! backward requireds. Edits invalidate the affected derived state; the
//! next update recomputes only what the invalidation sets demand.

use crate::levelize::Levelize;
use crate::path_end::{visit_path_ends, PathEnd};
use crate::required::{endpoints, find_requireds};
use crate::search::{Search, SearchCtx};
use chronos_common::{Delay, Interner, MinMax, StaResult};
use chronos_diagnostics::DiagnosticSink;
use chronos_graph::{find_delays, Graph, LumpedCapDelayCalc, VertexId};
use chronos_network::{Network, NetId, PinId};
use chronos_parasitics::Parasitics;
use chronos_sdc::{Mode, Sdc};

/// The top-level static timing analyzer.
pub struct Sta {
    /// The netlist.
    pub network: Network,
    /// The timing graph built from it.
    pub graph: Graph,
    /// The constraints.
    pub sdc: Sdc,
    /// The analysis mode (scenes/corners).
    pub mode: Mode,
    /// Annotated parasitics and reductions.
    pub parasitics: Parasitics,
    /// The levelizer.
    pub levelize: Levelize,
    /// The search state.
    pub search: Search,
    /// The diagnostic sink.
    pub sink: DiagnosticSink,
    dcalc: LumpedCapDelayCalc,
    delays_valid: bool,
}

impl Sta {
    /// Builds an analyzer over a populated netlist.
    pub fn new(network: Network, sdc: Sdc, mode: Mode) -> Self {
        let corner_count = mode.scene_count();
        let graph = Graph::build(&network, corner_count);
        Self {
            network,
            graph,
            sdc,
            mode,
            parasitics: Parasitics::new(corner_count),
            levelize: Levelize::new(),
            search: Search::new(),
            sink: DiagnosticSink::new(),
            dcalc: LumpedCapDelayCalc,
            delays_valid: false,
        }
    }

    /// Number of worker threads for the parallel level dispatch.
    pub fn set_thread_count(&mut self, threads: usize) {
        self.search.thread_count = threads.max(1);
    }

    /// Brings arrivals and requireds up to date.
    pub fn update_timing(&mut self) -> StaResult<()> {
        self.levelize
            .ensure_levelized(&mut self.graph, &self.network, &mut self.sdc, &self.sink)?;
        if !self.delays_valid {
            find_delays(
                &mut self.graph,
                &self.network,
                &self.parasitics,
                &self.dcalc,
            );
            self.delays_valid = true;
        }
        let ctx = SearchCtx {
            network: &self.network,
            sdc: &self.sdc,
            mode: &self.mode,
        };
        self.search
            .find_all_arrivals(&mut self.graph, &ctx, &self.sink)?;
        find_requireds(&mut self.search, &mut self.graph, &ctx)?;
        Ok(())
    }

    /// Updates timing and collects every endpoint's path ends.
    pub fn find_path_ends(&mut self) -> StaResult<Vec<PathEnd>> {
        self.update_timing()?;
        let ctx = SearchCtx {
            network: &self.network,
            sdc: &self.sdc,
            mode: &self.mode,
        };
        let mut ends = Vec::new();
        let endpoint_set = endpoints(&mut self.search, &self.graph, &ctx);
        let mut sorted: Vec<VertexId> = endpoint_set.into_iter().collect();
        sorted.sort();
        for vertex in sorted {
            visit_path_ends(&self.search, &self.graph, &ctx, vertex, &mut |end| {
                ends.push(*end);
            });
        }
        Ok(ends)
    }

    /// The worst endpoint slack on one side, with its endpoint vertex.
    pub fn worst_slack(&mut self, min_max: MinMax) -> StaResult<Option<(Delay, VertexId)>> {
        let ends = self.find_path_ends()?;
        let mut worst: Option<(Delay, VertexId)> = None;
        for end in ends {
            if end.min_max != min_max || end.is_unconstrained() {
                continue;
            }
            let slack = end.slack(&self.search);
            if worst.map_or(true, |(w, _)| slack < w) {
                worst = Some((slack, end.path.vertex));
            }
        }
        Ok(worst)
    }

    /// Total negative slack: the sum of each endpoint's worst violating
    /// slack on one side.
    pub fn total_negative_slack(&mut self, min_max: MinMax) -> StaResult<Delay> {
        let ends = self.find_path_ends()?;
        let mut per_endpoint: std::collections::HashMap<VertexId, Delay> =
            std::collections::HashMap::new();
        for end in ends {
            if end.min_max != min_max || end.is_unconstrained() {
                continue;
            }
            let slack = end.slack(&self.search);
            per_endpoint
                .entry(end.path.vertex)
                .and_modify(|s| *s = s.min(slack))
                .or_insert(slack);
        }
        Ok(per_endpoint.values().filter(|&&s| s < 0.0).sum())
    }

    /// The hierarchical name of a vertex's pin.
    pub fn vertex_name(&self, vertex: VertexId, interner: &Interner) -> String {
        self.network
            .path_name(self.graph.vertex(vertex).pin, interner)
    }

    // ---- edit hooks ------------------------------------------------------

    /// Hook before a pin is disconnected: preserves parasitic topology
    /// and invalidates downstream results.
    pub fn disconnect_pin_before(&mut self, pin: PinId) {
        self.parasitics.disconnect_pin_before(pin, &self.network);
        if let Some((load, drvr)) = self.graph.pin_vertices(pin) {
            self.search.arrival_invalid(load);
            self.search.required_invalid(load);
            self.search.endpoint_invalid(load);
            if let Some(drvr) = drvr {
                self.search.arrival_invalid(drvr);
            }
        }
        self.delays_valid = false;
    }

    /// Hook after a load pin's capacitance changes.
    pub fn load_pin_capacitance_changed(&mut self, pin: PinId) {
        self.parasitics
            .load_pin_capacitance_changed(pin, &self.network);
        self.delays_valid = false;
        if let Some(net) = self.network.pin_net(pin) {
            for drvr in self.network.drivers(net) {
                if let Some(v) = self.graph.pin_drvr_vertex(drvr) {
                    self.search.arrival_invalid(v);
                }
            }
        }
    }

    /// Deletes the parasitics of a net (and everything derived from
    /// them).
    pub fn delete_parasitics(&mut self, net: NetId) {
        self.parasitics.delete_network(net, &self.network);
        self.delays_valid = false;
    }

    /// Discards all derived timing (the only supported cancellation).
    pub fn cancel(&mut self) {
        self.search.clear(&mut self.graph);
    }

    /// Clears the report filter and every filtered arrival.
    pub fn delete_filter(&mut self) {
        self.sdc.clear_filter();
        self.search.delete_filtered_arrivals(&mut self.graph);
    }
}
