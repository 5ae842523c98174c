//! The forward search: tagged arrivals on every vertex.
//!
//! Arrivals propagate along a level-ordered BFS. Each vertex visit
//! enumerates fanin paths, mutates their tags across the edge (advancing
//! exception states, updating clock histories), merges same-tag arrivals
//! by min/max, prunes CRPR-hopeless tags, seeds arrivals that originate at
//! the vertex, and publishes the result as an interned tag group plus a
//! dense path array.
//!
//! Vertex visits are pure with respect to shared state (interning is
//! internally synchronized), so a level's visits run in parallel with
//! `rayon` and their results are applied sequentially; behavior is
//! identical with one worker.

use crate::bfs::BfsQueue;
use crate::clk_info::{ClkInfo, ClkInfoId};
use crate::intern::InternTable;
use crate::latches;
use crate::path::{Path, PathRef, PathTable};
use crate::search_pred::SearchPred;
use crate::tag::{sibling_index, Tag, TagId};
use crate::tag_group::{TagGroup, TagGroupBldr, TagGroupId};
use chronos_common::{fuzzy_equal, Delay, InternalError, MinMax, RiseFall, StaResult};
use chronos_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use chronos_graph::{BfsIndex, EdgeId, Graph, VertexId};
use chronos_network::{Network, PinId, TimingRole};
use chronos_sdc::{ExceptionKind, ExceptionState, InputDelayId, Mode, Sdc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Latch output evaluation passes before giving up on convergence.
pub const LATCH_PASS_LIMIT: usize = 5;

/// Read-only collaborator bundle for one search operation.
pub struct SearchCtx<'a> {
    /// The netlist.
    pub network: &'a Network,
    /// The constraint index.
    pub sdc: &'a Sdc,
    /// The analysis mode (scenes/corners).
    pub mode: &'a Mode,
}

/// The result of one vertex visit, applied sequentially after the
/// parallel compute phase.
struct VisitResult {
    vertex: VertexId,
    bldr: TagGroupBldr,
    changed: bool,
    is_latch_data: bool,
    postponed: bool,
}

/// The search state: interned tags/clock infos/tag groups, per-vertex
/// path arrays, the BFS queues, and the invalidation sets.
pub struct Search {
    /// Interned arrival tags (rise/fall sibling pairs).
    pub tags: InternTable<Tag>,
    /// Interned clock histories.
    pub clk_infos: InternTable<ClkInfo>,
    /// Interned per-vertex tag groups.
    pub tag_groups: InternTable<TagGroup>,
    /// Per-vertex path arrays.
    pub paths: PathTable,
    pred: SearchPred,
    arrival_queue: BfsQueue,
    required_queue: BfsQueue,
    pub(crate) invalid_arrivals: HashSet<VertexId>,
    pub(crate) invalid_requireds: HashSet<VertexId>,
    arrivals_seeded: bool,
    arrivals_exist: bool,
    pub(crate) requireds_seeded: bool,
    pub(crate) requireds_exist: bool,
    pending_latch_outputs: HashSet<VertexId>,
    filtered_arrivals: HashSet<VertexId>,
    pub(crate) endpoints: Option<HashSet<VertexId>>,
    pub(crate) invalid_endpoints: HashSet<VertexId>,
    tag_overflow: AtomicBool,
    /// Visit a level's vertices with rayon when more than one worker is
    /// configured.
    pub thread_count: usize,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    /// Creates an empty search.
    pub fn new() -> Self {
        Self {
            tags: InternTable::new(),
            clk_infos: InternTable::new(),
            tag_groups: InternTable::new(),
            paths: PathTable::new(),
            pred: SearchPred::search(),
            arrival_queue: BfsQueue::forward(BfsIndex::Arrival),
            required_queue: BfsQueue::backward(BfsIndex::Required),
            invalid_arrivals: HashSet::new(),
            invalid_requireds: HashSet::new(),
            arrivals_seeded: false,
            arrivals_exist: false,
            requireds_seeded: false,
            requireds_exist: false,
            pending_latch_outputs: HashSet::new(),
            filtered_arrivals: HashSet::new(),
            endpoints: None,
            invalid_endpoints: HashSet::new(),
            tag_overflow: AtomicBool::new(false),
            thread_count: 1,
        }
    }

    /// The search traversal predicate.
    pub fn pred(&self) -> &SearchPred {
        &self.pred
    }

    /// Returns `true` once arrivals exist.
    pub fn arrivals_exist(&self) -> bool {
        self.arrivals_exist
    }

    /// Returns `true` once requireds exist.
    pub fn requireds_exist(&self) -> bool {
        self.requireds_exist
    }

    // ---- invalidation ----------------------------------------------------

    /// Discards every derived result (the only supported cancellation).
    pub fn clear(&mut self, graph: &mut Graph) {
        self.arrival_queue.clear(graph);
        self.required_queue.clear(graph);
        self.invalid_arrivals.clear();
        self.invalid_requireds.clear();
        self.arrivals_seeded = false;
        self.arrivals_exist = false;
        self.requireds_seeded = false;
        self.requireds_exist = false;
        self.pending_latch_outputs.clear();
        self.filtered_arrivals.clear();
        self.endpoints = None;
        self.invalid_endpoints.clear();
        for v in graph.vertices().collect::<Vec<_>>() {
            graph.vertex_mut(v).tag_group_index = None;
        }
        self.paths.clear();
        self.tags.clear();
        self.clk_infos.clear();
        self.tag_groups.clear();
    }

    /// Invalidates all arrivals and requireds.
    pub fn arrivals_invalid(&mut self, graph: &mut Graph) {
        self.clear(graph);
    }

    /// Marks one vertex's arrival as stale; the next update reseeds it.
    pub fn arrival_invalid(&mut self, vertex: VertexId) {
        if self.arrivals_exist {
            self.invalid_arrivals.insert(vertex);
        }
    }

    /// Marks one vertex's required as stale.
    pub fn required_invalid(&mut self, vertex: VertexId) {
        if self.requireds_exist {
            self.invalid_requireds.insert(vertex);
        }
    }

    /// Marks every required stale.
    pub fn requireds_invalid(&mut self, graph: &mut Graph) {
        self.requireds_seeded = false;
        self.requireds_exist = false;
        self.invalid_requireds.clear();
        self.required_queue.clear(graph);
    }

    /// Notes an endpoint-set change at `vertex`.
    pub fn endpoint_invalid(&mut self, vertex: VertexId) {
        self.invalid_endpoints.insert(vertex);
    }

    /// Hook for vertex deletion: purge it from every queue and set.
    pub fn delete_vertex_before(&mut self, graph: &mut Graph, vertex: VertexId) {
        self.arrival_queue.remove(graph, vertex);
        self.required_queue.remove(graph, vertex);
        self.invalid_arrivals.remove(&vertex);
        self.invalid_requireds.remove(&vertex);
        self.pending_latch_outputs.remove(&vertex);
        self.filtered_arrivals.remove(&vertex);
        if let Some(endpoints) = &mut self.endpoints {
            endpoints.remove(&vertex);
        }
        self.paths.delete_paths(vertex);
    }

    // ---- interning helpers ----------------------------------------------

    /// Interns a clock history.
    pub fn find_clk_info(&self, clk_info: ClkInfo) -> ClkInfoId {
        // Clock infos share the tag index ceiling; overflow is caught at
        // tag interning.
        self.clk_infos.intern(clk_info).unwrap_or_else(|| {
            self.tag_overflow.store(true, Ordering::Relaxed);
            0
        })
    }

    /// Interns a tag (and its rise/fall sibling) and returns the index
    /// for `tag.rf`.
    pub fn find_tag(&self, tag: Tag) -> Option<TagId> {
        let rf = tag.rf;
        let (rise, fall) = if rf == RiseFall::Rise {
            (tag.clone(), tag.sibling())
        } else {
            (tag.sibling(), tag.clone())
        };
        match self.tags.intern_pair(rise, fall) {
            Some(base) => Some(sibling_index(base, rf)),
            None => {
                self.tag_overflow.store(true, Ordering::Relaxed);
                None
            }
        }
    }

    /// The tag value at `id`.
    pub fn tag(&self, id: TagId) -> Tag {
        self.tags.get(id)
    }

    /// The clock history value at `id`.
    pub fn clk_info(&self, id: ClkInfoId) -> ClkInfo {
        self.clk_infos.get(id)
    }

    /// The interned tag group of `vertex`, if it has arrivals.
    pub fn tag_group(&self, graph: &Graph, vertex: VertexId) -> Option<TagGroup> {
        graph
            .vertex(vertex)
            .tag_group_index
            .map(|id| self.tag_groups.get(id))
    }

    /// The tag equal to `tag` but with its clock history's CRPR path
    /// stripped, for pruning comparisons.
    pub fn tag_no_crpr(&self, tag: &Tag) -> Tag {
        let clk_info = self.clk_info(tag.clk_info);
        if clk_info.crpr_clk_path.is_none() {
            return tag.clone();
        }
        let stripped = self.find_clk_info(clk_info.without_crpr_clk_path());
        tag.with_clk_info(stripped)
    }

    /// Returns `true` when two tags match apart from their CRPR clock
    /// paths.
    pub fn tag_match_no_crpr(&self, a: TagId, b: TagId) -> bool {
        if a == b {
            return true;
        }
        let ta = self.tag(a);
        let tb = self.tag(b);
        self.tag_no_crpr(&ta) == self.tag_no_crpr(&tb)
    }

    // ---- derated delays --------------------------------------------------

    /// An edge arc's cached delay with the derate for its path class
    /// applied.
    pub fn derated_delay(
        &self,
        graph: &Graph,
        sdc: &Sdc,
        edge: EdgeId,
        arc: usize,
        corner: usize,
        min_max: MinMax,
        is_clk: bool,
    ) -> Delay {
        graph.arc_delay(edge, arc, corner, min_max) * sdc.derate(is_clk, min_max)
    }

    /// The launch time of a clock path: the traced arrival for propagated
    /// clocks, the modeled `edge + insertion + latency` for ideal ones
    /// (physical clock-tree delays are ignored in ideal mode).
    pub fn clk_path_arrival(&self, sdc: &Sdc, path: &Path, clk_info: &ClkInfo) -> Delay {
        match clk_info.clk_edge {
            Some(edge) if !clk_info.is_propagated => {
                sdc.clock_edge_time(edge) + clk_info.insertion + clk_info.latency
            }
            _ => path.arrival,
        }
    }

    // ---- tag mutation ----------------------------------------------------

    /// Advances a tag across an edge without clock-network bookkeeping.
    pub fn thru_tag(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        from_tag: &Tag,
        edge: EdgeId,
        to_rf: RiseFall,
    ) -> Option<TagId> {
        let e = graph.edge(edge);
        let from_pin = graph.vertex(e.from).pin;
        let to_pin = graph.vertex(e.to).pin;
        let to_is_reg_clk = graph.vertex(e.to).is_reg_clk;
        self.mutate_tag(
            ctx,
            from_tag,
            from_pin,
            false,
            to_pin,
            to_rf,
            false,
            to_is_reg_clk,
            from_tag.is_segment_start,
            from_tag.clk_info,
            from_tag.input_delay,
        )
    }

    /// Advances a clock-network tag across an edge, updating the clock
    /// history.
    #[allow(clippy::too_many_arguments)]
    pub fn thru_clk_tag(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        from_path: PathRef,
        from_tag: &Tag,
        to_propagates_clk: bool,
        edge: EdgeId,
        to_rf: RiseFall,
        arc_delay_min_max_eq: bool,
        min_max: MinMax,
    ) -> Option<TagId> {
        let e = graph.edge(edge);
        let from_pin = graph.vertex(e.from).pin;
        let to_pin = graph.vertex(e.to).pin;
        let role = e.role;
        let from_is_clk = from_tag.is_clk;
        let to_is_reg_clk = graph.vertex(e.to).is_reg_clk;
        let to_is_clk = from_is_clk
            && to_propagates_clk
            && (role == TimingRole::Wire || role == TimingRole::Combinational);
        let to_clk_info = self.thru_clk_info(
            graph,
            ctx,
            from_path,
            from_tag,
            edge,
            to_is_clk,
            arc_delay_min_max_eq,
            min_max,
        );
        self.mutate_tag(
            ctx,
            from_tag,
            from_pin,
            from_is_clk,
            to_pin,
            to_rf,
            to_is_clk,
            to_is_reg_clk,
            false,
            to_clk_info,
            None,
        )
    }

    /// Updates the clock history across an edge: propagated flag,
    /// generated-clock stamp, CRPR clock path, pulse sense, latency and
    /// uncertainty overrides.
    #[allow(clippy::too_many_arguments)]
    fn thru_clk_info(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        from_path: PathRef,
        from_tag: &Tag,
        edge: EdgeId,
        to_is_clk: bool,
        arc_delay_min_max_eq: bool,
        min_max: MinMax,
    ) -> ClkInfoId {
        let sdc = ctx.sdc;
        let e = graph.edge(edge);
        let from_vertex = e.from;
        let to_vertex = e.to;
        let to_pin = graph.vertex(to_vertex).pin;
        let from_clk_info = self.clk_info(from_tag.clk_info);
        let from_is_clk = from_tag.is_clk;
        let mut info = from_clk_info.clone();
        let mut changed = false;

        if !info.is_propagated && sdc.is_propagated_clock(to_pin) {
            info.is_propagated = true;
            changed = true;
        }

        // Distinguish generated-clock source paths at generated clock
        // roots so CRPR data can later attach to the history.
        if info.is_gen_clk_src_path
            && sdc.variables.crpr_enabled
            && sdc.is_leaf_pin_clock(to_pin)
        {
            info.gen_clk_src = Some(to_pin);
            changed = true;
        }

        let crpr_active = sdc.variables.crpr_enabled;
        if crpr_active
            // Stamp the crpr clk path for combinational paths leaving the
            // clock network and for wires into register clock pins.
            && ((from_is_clk && !to_is_clk && !graph.vertex(from_vertex).is_reg_clk)
                || (graph.vertex(to_vertex).is_reg_clk && arc_delay_min_max_eq))
        {
            info.crpr_clk_path = Some(from_path);
            changed = true;
        }

        // Propagate liberty pulse_clock sense through the fanout.
        if let Some(port) = ctx.network.liberty_port(to_pin) {
            if let Some(sense) = port.pulse_clk_sense {
                info.pulse_clk_sense = Some(sense);
                changed = true;
            }
        }

        // Pin latency has precedence over the clock's latency and ends
        // propagation.
        if let Some(clk_edge) = info.clk_edge {
            let clk_rf = clk_edge.rf;
            if let Some(latency) = sdc.clock_latency_pin(to_pin, clk_rf, min_max) {
                info.latency = latency;
                info.is_propagated = false;
                changed = true;
            }
        }

        if let Some(uncertainties) = sdc.clock_uncertainties_pin(to_pin) {
            info.uncertainties = Some(*uncertainties);
            changed = true;
        }

        if changed {
            self.find_clk_info(info)
        } else {
            from_tag.clk_info
        }
    }

    /// Finds the tag for a path going from `from_tag` through an edge to
    /// `(to_pin, to_rf)`. Advances exception states; `None` kills the
    /// path (completed false path or loop).
    #[allow(clippy::too_many_arguments)]
    pub fn mutate_tag(
        &self,
        ctx: &SearchCtx<'_>,
        from_tag: &Tag,
        from_pin: PinId,
        from_is_clk: bool,
        to_pin: PinId,
        to_rf: RiseFall,
        to_is_clk: bool,
        to_is_reg_clk: bool,
        to_is_segment_start: bool,
        to_clk_info: ClkInfoId,
        to_input_delay: Option<InputDelayId>,
    ) -> Option<TagId> {
        let sdc = ctx.sdc;
        let network = ctx.network;
        let min_max = from_tag.min_max;
        let to_instance = network.pin(to_pin).instance;

        let mut state_change = false;
        let mut new_states: Vec<ExceptionState> = Vec::new();
        for &state in &from_tag.states {
            let mut state = state;
            // One edge may traverse multiple pending -thru pins.
            while sdc.state_matches_next_thru(state, to_pin, to_instance, to_rf) {
                state = state.next_state();
                state_change = true;
            }
            let exception = sdc.exception(state.exception);
            match exception.kind {
                // A completed false path kills the tag, unless it rides a
                // clock: clocks carry the completed state to disable
                // downstream paths using the clock as data.
                ExceptionKind::FalsePath => {
                    if sdc.state_is_complete_to(state, to_pin, to_instance, to_rf, None)
                        && !from_is_clk
                    {
                        return None;
                    }
                    new_states.push(state);
                }
                ExceptionKind::Loop => {
                    if sdc.state_is_complete_to(state, to_pin, to_instance, to_rf, None) {
                        return None;
                    }
                    // Loop states die at register clock pins.
                    if to_is_reg_clk {
                        state_change = true;
                    } else {
                        new_states.push(state);
                    }
                }
                // Path-delay states die past their -to pin.
                ExceptionKind::PathDelay { .. } => {
                    let from_instance = network.pin(from_pin).instance;
                    if sdc.state_is_complete_to(
                        state,
                        from_pin,
                        from_instance,
                        from_tag.rf,
                        None,
                    ) && self.exception_has_to(sdc, state)
                    {
                        state_change = true;
                    } else {
                        new_states.push(state);
                    }
                }
                _ => new_states.push(state),
            }
        }

        // Pick up -thru exceptions that start on this edge.
        let started = sdc.exception_thru_states(to_pin, to_instance, to_rf, min_max);
        if !started.is_empty() {
            state_change = true;
            new_states.extend(started);
        }

        let from_clk_info = from_tag.clk_info;
        if !state_change
            && to_clk_info == from_clk_info
            && to_is_clk == from_tag.is_clk
            && from_tag.is_segment_start == to_is_segment_start
            && from_tag.input_delay == to_input_delay
        {
            // No identity change: the destination tag is the interned
            // rise/fall sibling.
            let from_id = self.tags.find(from_tag)?;
            return Some(sibling_index(from_id, to_rf));
        }

        let is_filter = self.states_carry_filter(sdc, &new_states);
        self.find_tag(Tag::new(
            from_tag.scene,
            to_rf,
            min_max,
            to_clk_info,
            to_is_clk,
            to_input_delay,
            to_is_segment_start,
            is_filter,
            new_states,
        ))
    }

    fn exception_has_to(&self, sdc: &Sdc, state: ExceptionState) -> bool {
        sdc.exception(state.exception).to.is_some()
    }

    fn states_carry_filter(&self, sdc: &Sdc, states: &[ExceptionState]) -> bool {
        match sdc.filter() {
            Some(filter) => states.iter().any(|s| s.exception == filter),
            None => false,
        }
    }

    // ---- seeding ---------------------------------------------------------

    /// Enqueues every vertex that originates arrivals.
    pub fn seed_arrivals(&mut self, graph: &mut Graph, ctx: &SearchCtx<'_>) {
        let mut vertices: HashSet<VertexId> = HashSet::new();
        self.find_clock_vertices(graph, ctx, &mut vertices);
        self.find_root_vertices(graph, ctx, &mut vertices);
        self.find_input_drvr_vertices(graph, ctx, &mut vertices);
        for v in vertices {
            self.arrival_queue.enqueue(graph, v);
        }
        self.arrivals_seeded = true;
    }

    fn find_clock_vertices(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertices: &mut HashSet<VertexId>,
    ) {
        for (_, clock) in ctx.sdc.clocks() {
            for &pin in &clock.leaf_pins {
                if let Some((load, drvr)) = graph.pin_vertices(pin) {
                    vertices.insert(load);
                    if let Some(drvr) = drvr {
                        vertices.insert(drvr);
                    }
                }
            }
        }
    }

    fn find_root_vertices(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertices: &mut HashSet<VertexId>,
    ) {
        for v in graph.vertices() {
            if self.is_srch_root(graph, ctx, v) {
                vertices.insert(v);
            }
        }
    }

    /// A search root has no enabled non-check fanin.
    pub fn is_srch_root(&self, graph: &Graph, ctx: &SearchCtx<'_>, vertex: VertexId) -> bool {
        if !self.pred.search_from(graph, ctx.sdc, vertex) {
            return false;
        }
        !graph.in_edges(vertex).into_iter().any(|edge| {
            let e = graph.edge(edge);
            !e.role.is_timing_check()
                && self.pred.search_from(graph, ctx.sdc, e.from)
                && self.pred.search_thru(graph, ctx.network, ctx.sdc, edge)
        })
    }

    fn find_input_drvr_vertices(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertices: &mut HashSet<VertexId>,
    ) {
        let top = ctx.network.top_instance();
        for &pin in &ctx.network.instance(top).pins {
            if ctx.network.direction(pin).is_any_input() {
                if let Some(v) = graph.pin_drvr_vertex(pin) {
                    vertices.insert(v);
                }
            }
        }
    }

    fn seed_invalid_arrivals(&mut self, graph: &mut Graph) {
        let invalid: Vec<VertexId> = self.invalid_arrivals.drain().collect();
        for v in invalid {
            self.arrival_queue.enqueue(graph, v);
        }
    }

    /// Seeds the arrivals that originate at `vertex` into `bldr`.
    fn seed_vertex_arrivals(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let pin = graph.vertex(vertex).pin;
        let is_clk_before_seed = bldr.has_clk_tag();

        if sdc.is_leaf_pin_clock(pin) {
            self.seed_clk_arrivals(graph, ctx, vertex, bldr);
        }
        if self.is_input_arrival_srch_start(graph, ctx, vertex) {
            self.seed_input_arrival(graph, ctx, vertex, false, bldr);
        }
        // Internal pins with input delays start new timing segments.
        if !ctx.network.is_top_level_port(pin)
            && !graph.vertex(vertex).is_bidirect_driver
            && sdc.has_input_delay(pin)
        {
            self.seed_input_arrival(graph, ctx, vertex, true, bldr);
        }
        let instance = ctx.network.pin(pin).instance;
        if sdc.is_path_delay_from(pin, instance)
            && !ctx.network.is_top_level_port(pin)
            && !sdc.is_leaf_pin_clock(pin)
        {
            // set_min/max_delay -from an internal pin.
            self.make_unclked_paths(ctx, pin, instance, false, true, bldr);
        }
        if self.is_srch_root(graph, ctx, vertex) {
            let is_reg_clk = graph.vertex(vertex).is_reg_clk;
            if is_reg_clk
                || (sdc.variables.unconstrained_paths && !ctx.network.is_top_level_port(pin))
            {
                self.make_unclked_paths(ctx, pin, instance, is_reg_clk, false, bldr);
            }
        }
        // A register clock pin with no declared clock gets an unclocked
        // segment-start tag so clk->q edges stay searchable (needed for
        // path delays from unclocked registers).
        if graph.vertex(vertex).is_reg_clk && !is_clk_before_seed && !bldr.has_clk_tag() {
            self.make_unclked_paths(ctx, pin, instance, true, false, bldr);
        }
    }

    fn is_input_arrival_srch_start(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
    ) -> bool {
        let pin = graph.vertex(vertex).pin;
        let direction = ctx.network.direction(pin);
        ctx.network.is_top_level_port(pin)
            && (direction == chronos_network::PortDirection::Input
                || (direction.is_bidirect() && graph.vertex(vertex).is_bidirect_driver))
    }

    fn seed_clk_arrivals(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let pin = graph.vertex(vertex).pin;
        let Some(clocks) = sdc.leaf_pin_clocks(pin) else {
            return;
        };
        for &clk in clocks {
            for scene in &ctx.mode.scenes {
                for min_max in MinMax::both() {
                    for rf in RiseFall::both() {
                        let clock = sdc.clock(clk);
                        let clk_edge = sdc.clock_edge(clk, rf);
                        if clock.is_generated && clock.master_clk.is_none() {
                            self.seed_clk_data_arrival(
                                ctx, pin, rf, clk, clk_edge, min_max, scene.index, bldr,
                            );
                        } else {
                            let insertion =
                                sdc.clock_insertion(clk, rf, min_max, min_max);
                            self.seed_clk_arrival(
                                ctx, pin, rf, clk, clk_edge, min_max, insertion, scene.index,
                                bldr,
                            );
                        }
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_clk_arrival(
        &self,
        ctx: &SearchCtx<'_>,
        pin: PinId,
        rf: RiseFall,
        clk: chronos_sdc::ClockId,
        clk_edge: chronos_sdc::ClockEdge,
        min_max: MinMax,
        insertion: Delay,
        scene: usize,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let clock = sdc.clock(clk);
        let mut is_propagated = false;
        let mut latency = 0.0;
        if let Some(pin_latency) = sdc.clock_latency_pin(pin, rf, min_max) {
            latency = pin_latency;
        } else {
            let clk_latency = sdc.clock_latency(clk, rf, min_max);
            if clk_latency != 0.0 {
                if sdc.is_propagated_clock(pin) {
                    is_propagated = true;
                } else {
                    latency = clk_latency;
                }
            } else {
                is_propagated = sdc.is_propagated_clock(pin) || clock.is_propagated;
            }
        }

        let uncertainties = sdc
            .clock_uncertainties_pin(pin)
            .copied()
            .or(clock.uncertainties);
        let pulse_clk_sense = ctx
            .network
            .liberty_port(pin)
            .and_then(|port| port.pulse_clk_sense);

        let clk_info = self.find_clk_info(ClkInfo {
            clk_edge: Some(clk_edge),
            clk_src: Some(pin),
            is_propagated,
            gen_clk_src: None,
            is_gen_clk_src_path: clock.is_generated,
            pulse_clk_sense,
            insertion,
            latency,
            uncertainties,
            min_max,
            crpr_clk_path: None,
        });

        // Only false paths -from apply on clock tree pins.
        let instance = ctx.network.pin(pin).instance;
        let states = sdc.exception_from_clk_states(pin, instance, rf, clk, min_max);
        let is_filter = self.states_carry_filter(sdc, &states);
        if let Some(tag) = self.find_tag(Tag::new(
            scene, rf, min_max, clk_info, true, None, false, is_filter, states,
        )) {
            let arrival = sdc.clock_edge_time(clk_edge) + insertion;
            bldr.merge_arrival(tag, arrival, min_max, None, None, 0, true, is_propagated, is_filter);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_clk_data_arrival(
        &self,
        ctx: &SearchCtx<'_>,
        pin: PinId,
        rf: RiseFall,
        clk: chronos_sdc::ClockId,
        clk_edge: chronos_sdc::ClockEdge,
        min_max: MinMax,
        scene: usize,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let clock = sdc.clock(clk);
        let instance = ctx.network.pin(pin).instance;
        let Some(states) =
            sdc.exception_from_states(pin, instance, rf, Some(clk), min_max)
        else {
            return;
        };
        let insertion = sdc.clock_insertion(clk, rf, min_max, min_max);
        let is_propagated = clock.is_propagated || sdc.is_propagated_clock(pin);
        let clk_info = self.find_clk_info(ClkInfo {
            clk_edge: Some(clk_edge),
            clk_src: Some(pin),
            is_propagated,
            gen_clk_src: None,
            is_gen_clk_src_path: false,
            pulse_clk_sense: None,
            insertion,
            latency: 0.0,
            uncertainties: clock.uncertainties,
            min_max,
            crpr_clk_path: None,
        });
        let is_filter = self.states_carry_filter(sdc, &states);
        if let Some(tag) = self.find_tag(Tag::new(
            scene, rf, min_max, clk_info, false, None, false, is_filter, states,
        )) {
            let arrival = sdc.clock_edge_time(clk_edge) + insertion;
            bldr.merge_arrival(tag, arrival, min_max, None, None, 0, false, false, is_filter);
        }
    }

    fn seed_input_arrival(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
        is_segment_start: bool,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let pin = graph.vertex(vertex).pin;
        if sdc.has_input_delay(pin) {
            for &id in sdc.input_delays_on(pin) {
                let input_delay = sdc.input_delay(id);
                // Arrivals wrt a clock arriving at this very pin are the
                // clock's own insertion; they seed as clocks instead.
                if let Some(clk_edge) = input_delay.clk_edge {
                    if sdc
                        .leaf_pin_clocks(pin)
                        .is_some_and(|clks| clks.contains(&clk_edge.clock))
                    {
                        continue;
                    }
                }
                self.seed_input_delay_arrival(
                    graph,
                    ctx,
                    pin,
                    id,
                    is_segment_start,
                    bldr,
                );
            }
        } else if !sdc.is_leaf_pin_clock(pin) {
            // Inputs without set_input_delay.
            let instance = ctx.network.pin(pin).instance;
            if sdc.variables.use_default_arrival_clock || sdc.variables.unconstrained_paths {
                self.make_unclked_paths(ctx, pin, instance, false, false, bldr);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_input_delay_arrival(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        pin: PinId,
        id: InputDelayId,
        is_segment_start: bool,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let input_delay = sdc.input_delay(id);
        if let Some(ref_pin) = input_delay.ref_pin {
            // Reference-pin input delays ride the reference pin's
            // computed clock arrival.
            let Some(ref_vertex) = graph.pin_load_vertex(ref_pin) else {
                return;
            };
            for (index, ref_path) in self.paths.paths(ref_vertex).iter().enumerate() {
                let _ = index;
                let ref_tag = self.tag(ref_path.tag);
                if !ref_tag.is_clk || ref_tag.rf != input_delay.ref_rf {
                    continue;
                }
                let ref_clk_info = self.clk_info(ref_tag.clk_info);
                if let Some(expected) = input_delay.clk_edge {
                    if ref_clk_info.clk_edge.map(|e| e.clock) != Some(expected.clock) {
                        continue;
                    }
                }
                let min_max = ref_tag.min_max;
                for rf in RiseFall::both() {
                    let Some(delay) = input_delay.delays.value(rf, min_max) else {
                        continue;
                    };
                    let arrival = ref_path.arrival + delay;
                    self.seed_input_delay_tag(
                        ctx,
                        pin,
                        rf,
                        ref_clk_info.clk_edge,
                        ref_clk_info.insertion,
                        ref_clk_info.latency,
                        id,
                        is_segment_start,
                        min_max,
                        ref_tag.scene,
                        arrival,
                        bldr,
                    );
                }
            }
            return;
        }

        let clk_edge = input_delay
            .clk_edge
            .or_else(|| {
                if sdc.variables.use_default_arrival_clock {
                    sdc.default_arrival_clock_edge()
                } else {
                    None
                }
            });
        for scene in &ctx.mode.scenes {
            for min_max in MinMax::both() {
                let mut clk_arrival = 0.0;
                let mut clk_insertion = 0.0;
                let mut clk_latency = 0.0;
                if let Some(edge) = clk_edge {
                    clk_arrival = sdc.clock_edge_time(edge);
                    let clk = edge.clock;
                    if !input_delay.source_latency_included {
                        clk_insertion =
                            sdc.clock_insertion(clk, edge.rf, min_max, min_max);
                        clk_arrival += clk_insertion;
                    }
                    if !sdc.clock(clk).is_propagated && !input_delay.network_latency_included {
                        clk_latency = sdc.clock_latency(clk, edge.rf, min_max);
                        clk_arrival += clk_latency;
                    }
                }
                for rf in RiseFall::both() {
                    let Some(delay) = input_delay.delays.value(rf, min_max) else {
                        continue;
                    };
                    self.seed_input_delay_tag(
                        ctx,
                        pin,
                        rf,
                        clk_edge,
                        clk_insertion,
                        clk_latency,
                        id,
                        is_segment_start,
                        min_max,
                        scene.index,
                        clk_arrival + delay,
                        bldr,
                    );
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_input_delay_tag(
        &self,
        ctx: &SearchCtx<'_>,
        pin: PinId,
        rf: RiseFall,
        clk_edge: Option<chronos_sdc::ClockEdge>,
        clk_insertion: Delay,
        clk_latency: Delay,
        input_delay: InputDelayId,
        is_segment_start: bool,
        min_max: MinMax,
        scene: usize,
        arrival: Delay,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        let instance = ctx.network.pin(pin).instance;
        let clk = clk_edge.map(|e| e.clock);
        let Some(states) = sdc.exception_from_states(pin, instance, rf, clk, min_max) else {
            return;
        };
        let (clk_src, is_propagated, uncertainties) = match clk_edge {
            Some(edge) => {
                let clock = sdc.clock(edge.clock);
                (
                    clock.default_pin(),
                    clock.is_propagated,
                    clock.uncertainties,
                )
            }
            None => (None, false, None),
        };
        let clk_info = self.find_clk_info(ClkInfo {
            clk_edge,
            clk_src,
            is_propagated,
            gen_clk_src: None,
            is_gen_clk_src_path: false,
            pulse_clk_sense: None,
            insertion: clk_insertion,
            latency: clk_latency,
            uncertainties,
            min_max,
            crpr_clk_path: None,
        });
        let is_filter = self.states_carry_filter(sdc, &states);
        if let Some(tag) = self.find_tag(Tag::new(
            scene,
            rf,
            min_max,
            clk_info,
            false,
            Some(input_delay),
            is_segment_start,
            is_filter,
            states,
        )) {
            bldr.merge_arrival(tag, arrival, min_max, None, None, 0, false, false, is_filter);
        }
    }

    fn make_unclked_paths(
        &self,
        ctx: &SearchCtx<'_>,
        pin: PinId,
        instance: chronos_network::InstanceId,
        is_segment_start: bool,
        require_exception: bool,
        bldr: &mut TagGroupBldr,
    ) {
        let sdc = ctx.sdc;
        for scene in &ctx.mode.scenes {
            for min_max in MinMax::both() {
                for rf in RiseFall::both() {
                    let Some(states) =
                        sdc.exception_from_states(pin, instance, rf, None, min_max)
                    else {
                        continue;
                    };
                    if require_exception && states.is_empty() {
                        continue;
                    }
                    let clk_info = self.find_clk_info(ClkInfo::unclocked(min_max));
                    let is_filter = self.states_carry_filter(sdc, &states);
                    if let Some(tag) = self.find_tag(Tag::new(
                        scene.index,
                        rf,
                        min_max,
                        clk_info,
                        false,
                        None,
                        is_segment_start,
                        is_filter,
                        states,
                    )) {
                        bldr.merge_arrival(
                            tag, 0.0, min_max, None, None, 0, false, false, is_filter,
                        );
                    }
                }
            }
        }
    }

    // ---- the vertex visit ------------------------------------------------

    /// Computes a vertex's arrivals from its fanin and seeds.
    fn visit_vertex(&self, graph: &Graph, ctx: &SearchCtx<'_>, vertex: VertexId) -> VisitResult {
        let mut bldr = TagGroupBldr::new();
        let mut bldr_no_crpr = TagGroupBldr::new();
        let crpr_active =
            ctx.sdc.variables.crpr_enabled && ctx.sdc.variables.crpr_path_pruning_enabled;
        let has_fanin_one = graph.has_fanin_one(vertex);

        let mut postponed = false;
        self.visit_fanin_paths(graph, ctx, vertex, &mut bldr, &mut bldr_no_crpr, &mut postponed);
        if crpr_active && bldr.has_propagated_clk() && !has_fanin_one {
            self.prune_crpr_arrivals(graph, ctx, &mut bldr, &bldr_no_crpr);
        }

        // Insert arrivals that originate here.
        self.seed_vertex_arrivals(graph, ctx, vertex, &mut bldr);

        let changed = self.arrivals_changed(graph, vertex, &bldr);
        let pin = graph.vertex(vertex).pin;
        let is_latch_data = graph.out_edges(vertex).into_iter().any(|e| {
            graph.edge(e).role == TimingRole::LatchDtoQ
        }) && !ctx.network.is_top_level_port(pin);

        VisitResult {
            vertex,
            bldr,
            changed,
            is_latch_data,
            postponed,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_fanin_paths(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
        bldr: &mut TagGroupBldr,
        bldr_no_crpr: &mut TagGroupBldr,
        postponed: &mut bool,
    ) {
        for edge in graph.in_edges(vertex) {
            let from = graph.edge(edge).from;
            if !self.pred.search_from(graph, ctx.sdc, from)
                || !self.pred.search_thru(graph, ctx.network, ctx.sdc, edge)
                || !self.pred.search_to(graph, ctx.sdc, vertex)
            {
                continue;
            }
            let from_paths = self.paths.paths(from);
            for (from_index, from_path) in from_paths.iter().enumerate() {
                let from_tag = self.tag(from_path.tag);
                let from_rf = from_tag.rf;
                let from_ref = PathRef {
                    vertex: from,
                    index: from_index as u32,
                };
                let (rise_arc, fall_arc) = graph.edge(edge).arcs_from(from_rf);
                for arc in [rise_arc, fall_arc].into_iter().flatten() {
                    self.visit_from_path(
                        graph, ctx, from_ref, from_path, &from_tag, edge, arc, bldr,
                        bldr_no_crpr, postponed,
                    );
                }
            }
        }
    }

    /// One (fanin path, arc) step: computes the destination tag and
    /// arrival and merges them.
    #[allow(clippy::too_many_arguments)]
    fn visit_from_path(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        from_ref: PathRef,
        from_path: &Path,
        from_tag: &Tag,
        edge: EdgeId,
        arc: usize,
        bldr: &mut TagGroupBldr,
        bldr_no_crpr: &mut TagGroupBldr,
        postponed: &mut bool,
    ) {
        let Some((to_tag, arc_delay, from_arrival)) =
            self.propagate_step(graph, ctx, from_ref, from_path, from_tag, edge, arc, postponed)
        else {
            return;
        };
        let min_max = from_tag.min_max;
        let to_arrival = from_arrival + arc_delay;
        let to_tag_value = self.tag(to_tag);
        let to_clk_info = self.clk_info(to_tag_value.clk_info);
        let to_is_clk = to_tag_value.is_clk;
        let merged = bldr.merge_arrival(
            to_tag,
            to_arrival,
            min_max,
            Some(from_ref),
            Some(edge),
            arc as u32,
            to_is_clk,
            to_is_clk && to_clk_info.is_propagated,
            to_tag_value.is_filter,
        );
        if merged && to_clk_info.has_crpr_clk_pin() && !to_is_clk {
            let no_crpr_tag = self.tag_no_crpr(&to_tag_value);
            if let Some(no_crpr_id) = self.find_tag(no_crpr_tag) {
                bldr_no_crpr.merge_arrival(
                    no_crpr_id,
                    to_arrival,
                    min_max,
                    Some(from_ref),
                    Some(edge),
                    arc as u32,
                    to_is_clk,
                    false,
                    to_tag_value.is_filter,
                );
            }
        }
    }

    /// Computes the destination tag, arc delay, and effective source
    /// arrival for one (fanin path, arc) step. `None` when the step
    /// produces no path (killed tag, postponed latch, infinite delay).
    /// Shared by the forward and backward searches.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn propagate_step(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        from_ref: PathRef,
        from_path: &Path,
        from_tag: &Tag,
        edge: EdgeId,
        arc: usize,
        postponed: &mut bool,
    ) -> Option<(TagId, Delay, Delay)> {
        let sdc = ctx.sdc;
        let e = graph.edge(edge);
        let role = e.role;
        let to_rf = e.arcs[arc].to_rf;
        let min_max = from_tag.min_max;
        let scene = from_tag.scene;
        let corner = ctx.mode.scenes[scene].corner;
        let from_clk_info = self.clk_info(from_tag.clk_info);
        let from_pin = graph.vertex(e.from).pin;
        let clk = from_clk_info.clock();

        let mut to_tag = None;
        let mut from_arrival = from_path.arrival;
        let mut arc_delay = 0.0;

        if role.is_reg_clk_to_q() {
            if clk.is_none() || !sdc.clk_stop_propagation(from_pin) {
                arc_delay =
                    self.derated_delay(graph, sdc, edge, arc, corner, min_max, false);
                // Macros built with propagated clocks absorb their clock
                // tree delay when used with ideal clocks.
                if let Some(clk) = clk {
                    if !sdc.clock(clk).is_propagated && !from_clk_info.is_propagated {
                        if let Some(port) = ctx.network.liberty_port(from_pin) {
                            let cell_is_macro = ctx
                                .network
                                .liberty_cell(ctx.network.pin(from_pin).instance)
                                .is_some_and(|c| c.is_macro);
                            if cell_is_macro {
                                let slew = graph.vertex(e.from).slew(
                                    corner,
                                    from_tag.rf,
                                    min_max,
                                );
                                arc_delay -=
                                    port.clk_tree_delay(slew, from_tag.rf, min_max);
                            }
                        }
                    }
                }
                // Propagate from unclocked reg clk pins (segment starts)
                // and from real clocks that have not crossed a D->Q yet.
                if (clk.is_none() && from_tag.is_segment_start)
                    || (clk.is_some() && from_tag.is_clk)
                {
                    let mut clk_info_id = from_tag.clk_info;
                    if sdc.variables.crpr_enabled && from_clk_info.crpr_clk_path.is_none() {
                        let mut info = from_clk_info.clone();
                        info.crpr_clk_path = Some(from_ref);
                        clk_info_id = self.find_clk_info(info);
                    }
                    let launched = Tag::new(
                        scene,
                        from_tag.rf,
                        min_max,
                        clk_info_id,
                        false,
                        None,
                        false,
                        from_tag.is_filter,
                        from_tag.states.clone(),
                    );
                    // Intern the launch tag so the no-change sibling
                    // lookup inside mutate_tag can find it.
                    if let Some(launched_id) = self.find_tag(launched) {
                        let launched = self.tag(launched_id);
                        to_tag = self.thru_tag(graph, ctx, &launched, edge, to_rf);
                    }
                    from_arrival = self.clk_path_arrival(sdc, from_path, &from_clk_info);
                }
            }
        } else if role == TimingRole::LatchDtoQ {
            if min_max == MinMax::Max && clk.is_some() {
                arc_delay =
                    self.derated_delay(graph, sdc, edge, arc, corner, min_max, false);
                match latches::latch_out_arrival(
                    self, graph, ctx, from_path, from_tag, edge, arc_delay,
                ) {
                    latches::LatchOut::Arrival { tag, arrival } => {
                        let latch_tag = self.tag(tag);
                        to_tag = self.thru_tag(graph, ctx, &latch_tag, edge, to_rf);
                        from_arrival = arrival - arc_delay;
                    }
                    latches::LatchOut::Postponed => {
                        // Re-evaluated on the next pass, once the enable
                        // clock arrival exists.
                        *postponed = true;
                        return None;
                    }
                    latches::LatchOut::None => return None,
                }
            }
        } else if from_tag.is_clk {
            // Propagate as a clock (or hand off to data at the tree edge).
            let to_pin = graph.vertex(e.to).pin;
            let to_propagates_clk = !sdc.clk_stop_propagation(to_pin)
                && (sdc.variables.clk_thru_tristate_enabled || !role.is_tristate());
            arc_delay = self.derated_delay(
                graph,
                sdc,
                edge,
                arc,
                corner,
                min_max,
                to_propagates_clk,
            );
            let arc_delay_opp = self.derated_delay(
                graph,
                sdc,
                edge,
                arc,
                corner,
                min_max.opposite(),
                to_propagates_clk,
            );
            let arc_delay_min_max_eq = fuzzy_equal(arc_delay, arc_delay_opp);
            to_tag = self.thru_clk_tag(
                graph,
                ctx,
                from_ref,
                from_tag,
                to_propagates_clk,
                edge,
                to_rf,
                arc_delay_min_max_eq,
                min_max,
            );
        } else {
            arc_delay = self.derated_delay(graph, sdc, edge, arc, corner, min_max, false);
            if arc_delay.is_finite() {
                to_tag = self.thru_tag(graph, ctx, from_tag, edge, to_rf);
            }
        }

        let to_tag = to_tag?;
        Some((to_tag, arc_delay, from_arrival))
    }

    /// Drops tags whose arrival can never be critical even after maximal
    /// CRPR relief: a sibling with a different clock path is better by
    /// more than the largest possible pessimism removal.
    fn prune_crpr_arrivals(
        &self,
        graph: &Graph,
        ctx: &SearchCtx<'_>,
        bldr: &mut TagGroupBldr,
        bldr_no_crpr: &TagGroupBldr,
    ) {
        let crpr = crate::crpr::CheckCrpr {
            search: self,
            graph,
            sdc: ctx.sdc,
        };
        let tags: Vec<TagId> = bldr.tags().collect();
        for tag_id in tags {
            let tag = self.tag(tag_id);
            let clk_info = self.clk_info(tag.clk_info);
            if tag.is_clk || !clk_info.has_crpr_clk_pin() {
                continue;
            }
            let min_max = tag.min_max;
            let no_crpr_tag = self.tag_no_crpr(&tag);
            let Some(no_crpr_id) = self.tags.find(&no_crpr_tag) else {
                continue;
            };
            let Some(best) = bldr_no_crpr.tag_match_path(no_crpr_id) else {
                continue;
            };
            let max_crpr = crpr.max_crpr(&clk_info);
            let relieved = match min_max {
                MinMax::Max => best.arrival - max_crpr,
                MinMax::Min => best.arrival + max_crpr,
            };
            let Some(entry) = bldr.tag_match_path(tag_id) else {
                continue;
            };
            if min_max.compare(relieved, entry.arrival) {
                bldr.remove(tag_id);
            }
        }
    }

    /// Compares a freshly built tag group against the stored arrivals.
    fn arrivals_changed(&self, graph: &Graph, vertex: VertexId, bldr: &TagGroupBldr) -> bool {
        let prev_paths = self.paths.paths(vertex);
        let Some(group) = self.tag_group(graph, vertex) else {
            return !bldr.is_empty();
        };
        if group.path_count() != bldr.path_count() {
            return true;
        }
        for (i, prev) in prev_paths.iter().enumerate() {
            let tag = group.tags[i];
            match bldr.tag_match_path(tag) {
                Some(pending) => {
                    if !fuzzy_equal(pending.arrival, prev.arrival)
                        || pending.prev_path != prev.prev_path
                        || pending.prev_edge != prev.prev_edge
                        || pending.prev_arc != prev.prev_arc
                    {
                        return true;
                    }
                }
                None => return true,
            }
        }
        false
    }

    /// Publishes a visit's arrivals: interns the group and lays out the
    /// dense path array.
    pub fn set_vertex_arrivals(
        &mut self,
        graph: &mut Graph,
        vertex: VertexId,
        bldr: &TagGroupBldr,
    ) -> StaResult<()> {
        if bldr.is_empty() {
            self.paths.delete_paths(vertex);
            graph.vertex_mut(vertex).tag_group_index = None;
            return Ok(());
        }
        let (group, mut paths, _) = bldr.make_group_and_paths();
        for path in &mut paths {
            let min_max = self.tag(path.tag).min_max;
            path.required = min_max.opposite().init_value();
        }
        let has_filter = group.has_filter_tag;
        let Some(group_id) = self.tag_groups.intern(group) else {
            return Err(InternalError::new("max tag group index exceeded"));
        };
        let _: TagGroupId = group_id;
        graph.vertex_mut(vertex).tag_group_index = Some(group_id);
        self.paths.set_paths(vertex, paths);
        if has_filter {
            self.filtered_arrivals.insert(vertex);
        }
        Ok(())
    }

    // ---- the level loop --------------------------------------------------

    /// Finds all arrivals: seeds, then runs the level-ordered search,
    /// looping passes until no latch outputs remain postponed.
    pub fn find_all_arrivals(
        &mut self,
        graph: &mut Graph,
        ctx: &SearchCtx<'_>,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        if !self.arrivals_seeded {
            self.seed_arrivals(graph, ctx);
        }
        self.seed_invalid_arrivals(graph);

        let mut pass = 1;
        loop {
            self.find_arrivals(graph, ctx, sink)?;
            if self.pending_latch_outputs.is_empty() || pass >= LATCH_PASS_LIMIT {
                break;
            }
            let pending: Vec<VertexId> = self.pending_latch_outputs.drain().collect();
            for v in pending {
                self.arrival_queue.enqueue(graph, v);
            }
            pass += 1;
        }
        self.arrivals_exist = true;
        Ok(())
    }

    fn find_arrivals(
        &mut self,
        graph: &mut Graph,
        ctx: &SearchCtx<'_>,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        while let Some((_level, vertices)) = self.arrival_queue.next_level(graph) {
            // Compute phase: all of one level, possibly in parallel.
            let results: Vec<VisitResult> = if self.thread_count > 1 {
                let graph_ref: &Graph = graph;
                vertices
                    .par_iter()
                    .map(|&v| self.visit_vertex(graph_ref, ctx, v))
                    .collect()
            } else {
                vertices
                    .iter()
                    .map(|&v| self.visit_vertex(graph, ctx, v))
                    .collect()
            };
            if self.tag_overflow.load(Ordering::Relaxed) {
                sink.emit(Diagnostic::critical(
                    DiagnosticCode::new(Category::Search, 510),
                    "max tag index exceeded",
                ));
                return Err(InternalError::new("max tag index exceeded"));
            }
            // Apply phase: sequential publication and fanout enqueue.
            for result in results {
                let vertex = result.vertex;
                if result.postponed {
                    self.pending_latch_outputs.insert(vertex);
                }
                if result.changed && result.is_latch_data {
                    for edge in graph.out_edges(vertex) {
                        if graph.edge(edge).role == TimingRole::LatchDtoQ {
                            self.pending_latch_outputs.insert(graph.edge(edge).to);
                        }
                    }
                }
                if result.changed {
                    let pred = self.pred;
                    self.arrival_queue
                        .enqueue_adjacent(graph, ctx.network, ctx.sdc, &pred, vertex);
                    self.enqueue_ref_pin_input_delays(graph, ctx, vertex);
                    self.set_vertex_arrivals(graph, vertex, &result.bldr)?;
                    self.constrained_requireds_invalid(graph, vertex);
                }
            }
        }
        Ok(())
    }

    // Pins with input delays referenced to this pin behave as if a timing
    // arc ran from the reference pin to them: re-enqueue on change.
    fn enqueue_ref_pin_input_delays(
        &mut self,
        graph: &mut Graph,
        ctx: &SearchCtx<'_>,
        vertex: VertexId,
    ) {
        let ref_pin = graph.vertex(vertex).pin;
        let delays: Vec<InputDelayId> = ctx.sdc.ref_pin_input_delays(ref_pin).to_vec();
        for id in delays {
            let pin = ctx.sdc.input_delay(id).pin;
            if let Some((load, drvr)) = graph.pin_vertices(pin) {
                self.arrival_queue.enqueue(graph, load);
                if let Some(drvr) = drvr {
                    self.arrival_queue.enqueue(graph, drvr);
                }
            }
        }
    }

    // A changed clock arrival moves the required time of every check it
    // constrains.
    fn constrained_requireds_invalid(&mut self, graph: &Graph, vertex: VertexId) {
        if self.requireds_exist {
            let mut to_invalidate = Vec::new();
            for edge in graph.out_edges(vertex) {
                if graph.edge(edge).role.is_timing_check() {
                    to_invalidate.push(graph.edge(edge).to);
                }
            }
            for v in to_invalidate {
                self.required_invalid(v);
            }
        }
    }

    // ---- filtered arrivals ----------------------------------------------

    /// The vertices holding filter-tagged arrivals.
    pub fn filtered_arrivals(&self) -> &HashSet<VertexId> {
        &self.filtered_arrivals
    }

    /// Deletes every filter-tagged arrival, walking only the recorded
    /// filtered-vertex set, and invalidates those vertices for the next
    /// update.
    pub fn delete_filtered_arrivals(&mut self, graph: &mut Graph) {
        let filtered: Vec<VertexId> = self.filtered_arrivals.drain().collect();
        for vertex in filtered {
            self.paths.delete_paths(vertex);
            graph.vertex_mut(vertex).tag_group_index = None;
            self.arrival_invalid(vertex);
        }
    }

    // ---- queue access for the required search ----------------------------

    pub(crate) fn required_queue_mut(&mut self) -> &mut BfsQueue {
        &mut self.required_queue
    }

    /// Enqueues stale-required vertices.
    pub(crate) fn seed_invalid_requireds(&mut self, graph: &mut Graph) {
        let invalid: Vec<VertexId> = self.invalid_requireds.drain().collect();
        for v in invalid {
            self.required_queue.enqueue(graph, v);
        }
    }
}
