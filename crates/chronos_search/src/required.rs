//! The backward search: required times and endpoint slacks.
//!
//! Endpoints seed requireds from their path ends; a level-ordered
//! backward BFS propagates `to.required − arc_delay` towards the sources,
//! with a [`RequiredCmp`] keeping the tightest required per path index.
//! Requireds never cross latch data-to-output edges. When a destination
//! tag was pruned by CRPR, a sibling tag differing only in its CRPR clock
//! path approximates the missing required.

use crate::path::PathRef;
use crate::path_end::{visit_path_ends, PathEnd};
use crate::search::{Search, SearchCtx};
use crate::search_pred::SearchPred;
use chronos_common::{Delay, MinMax, StaResult};
use chronos_graph::{Graph, VertexId};
use chronos_sdc::Sdc;
use std::collections::HashSet;

/// Accumulates the tightest required per path index during one vertex
/// visit.
#[derive(Clone, Debug, Default)]
pub struct RequiredCmp {
    requireds: Vec<Delay>,
    have_requireds: bool,
}

impl RequiredCmp {
    /// Creates an empty comparator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the comparator for `vertex`, initializing each slot to the
    /// identity for its tag's required side.
    pub fn requireds_init(&mut self, search: &Search, vertex: VertexId) {
        let paths = search.paths.paths(vertex);
        self.requireds.clear();
        self.requireds.reserve(paths.len());
        for path in paths {
            let min_max = search.tag(path.tag).min_max;
            self.requireds.push(min_max.opposite().init_value());
        }
        self.have_requireds = false;
    }

    /// Merges `required` into `path_index`, keeping the tighter value
    /// for `req_min_max` (the opposite of the arrival side).
    pub fn required_set(&mut self, path_index: usize, required: Delay, req_min_max: MinMax) {
        if req_min_max.compare(required, self.requireds[path_index]) {
            self.requireds[path_index] = required;
            self.have_requireds = true;
        }
    }

    /// The accumulated required at `path_index`.
    pub fn required(&self, path_index: usize) -> Delay {
        self.requireds[path_index]
    }

    /// Writes the accumulated requireds into the vertex's paths.
    /// Returns `true` when any value changed.
    pub fn requireds_save(&self, search: &mut Search, vertex: VertexId) -> bool {
        let mut changed = false;
        let paths = search.paths.paths_mut(vertex);
        for (i, path) in paths.iter_mut().enumerate() {
            let required = self.requireds[i];
            if path.required.to_bits() != required.to_bits() {
                path.required = required;
                changed = true;
            }
        }
        changed
    }
}

/// Returns `true` when `vertex` terminates timing paths: it has fanin and
/// carries checks, an output constraint, no searchable fanout, or an
/// unconstrained-endpoint condition.
pub fn is_endpoint(
    search: &Search,
    graph: &Graph,
    ctx: &SearchCtx<'_>,
    vertex: VertexId,
) -> bool {
    let sdc: &Sdc = ctx.sdc;
    let pred = search.pred();
    let has_fanin = graph.in_edges(vertex).into_iter().any(|edge| {
        let from = graph.edge(edge).from;
        pred.search_from(graph, sdc, from) && pred.search_thru(graph, ctx.network, sdc, edge)
    });
    if !has_fanin {
        // Check-only fanin still constrains the vertex.
        let has_check_fanin = graph
            .in_edges(vertex)
            .into_iter()
            .any(|edge| graph.edge(edge).role.is_timing_check());
        if !has_check_fanin {
            return false;
        }
    }
    let pin = graph.vertex(vertex).pin;
    let instance = ctx.network.pin(pin).instance;
    let has_fanout = graph.out_edges(vertex).into_iter().any(|edge| {
        let to = graph.edge(edge).to;
        pred.search_thru(graph, ctx.network, sdc, edge) && pred.search_to(graph, sdc, to)
    });
    graph.vertex(vertex).has_checks
        || sdc.is_constrained_end(pin, instance)
        || !has_fanout
        || (sdc.variables.unconstrained_paths && graph.vertex(vertex).is_reg_clk)
        || (sdc.variables.gated_clk_checks_enabled
            && graph.vertex(vertex).has_downstream_clk_pin)
}

/// The endpoint set, built on first use and patched incrementally from
/// the invalid-endpoint set.
pub fn endpoints(
    search: &mut Search,
    graph: &Graph,
    ctx: &SearchCtx<'_>,
) -> HashSet<VertexId> {
    if search.endpoints.is_none() {
        let mut set = HashSet::new();
        for v in graph.vertices() {
            if is_endpoint(search, graph, ctx, v) {
                set.insert(v);
            }
        }
        search.endpoints = Some(set);
    }
    if !search.invalid_endpoints.is_empty() {
        let invalid: Vec<VertexId> = search.invalid_endpoints.drain().collect();
        for v in invalid {
            let is_end = is_endpoint(search, graph, ctx, v);
            let endpoints = search.endpoints.as_mut().unwrap();
            if is_end {
                endpoints.insert(v);
            } else {
                endpoints.remove(&v);
            }
        }
    }
    search.endpoints.clone().unwrap()
}

/// Marks every vertex upstream of a register clock pin, bounding where
/// CRPR clock paths must be preserved.
pub fn ensure_downstream_clk_pins(search: &Search, graph: &mut Graph, ctx: &SearchCtx<'_>) {
    // Backward BFS from register clock pins.
    let mut worklist: Vec<VertexId> = graph
        .vertices()
        .filter(|&v| graph.vertex(v).is_reg_clk)
        .collect();
    let pred = *search.pred();
    while let Some(v) = worklist.pop() {
        if graph.vertex(v).has_downstream_clk_pin {
            continue;
        }
        graph.vertex_mut(v).has_downstream_clk_pin = true;
        for edge in graph.in_edges(v) {
            let from = graph.edge(edge).from;
            if pred.search_thru(graph, ctx.network, ctx.sdc, edge)
                && !graph.vertex(from).has_downstream_clk_pin
            {
                worklist.push(from);
            }
        }
    }
}

/// Seeds an endpoint's requireds from its path ends and enqueues its
/// fanin.
fn seed_required(
    search: &mut Search,
    graph: &mut Graph,
    ctx: &SearchCtx<'_>,
    vertex: VertexId,
) {
    let mut required_cmp = RequiredCmp::new();
    required_cmp.requireds_init(search, vertex);
    {
        let search_ref: &Search = search;
        let cmp = &mut required_cmp;
        visit_path_ends(search_ref, graph, ctx, vertex, &mut |end: &PathEnd| {
            if !end.is_unconstrained() {
                let req_min_max = end.min_max.opposite();
                cmp.required_set(end.path.index as usize, end.required, req_min_max);
            }
        });
    }
    if required_cmp.requireds_save(search, vertex) {
        // Back-propagate from the endpoint's fanin.
        let pred = SearchPred::backward();
        search
            .required_queue_mut()
            .enqueue_adjacent(graph, ctx.network, ctx.sdc, &pred, vertex);
    }
}

/// Finds required times for every vertex with arrivals.
pub fn find_requireds(
    search: &mut Search,
    graph: &mut Graph,
    ctx: &SearchCtx<'_>,
) -> StaResult<()> {
    if !search.requireds_seeded {
        ensure_downstream_clk_pins(search, graph, ctx);
        let ends = endpoints(search, graph, ctx);
        for vertex in ends {
            seed_required(search, graph, ctx, vertex);
        }
        search.requireds_seeded = true;
    }
    search.seed_invalid_requireds(graph);

    while let Some((_level, vertices)) = search.required_queue_mut().next_level(graph) {
        for vertex in vertices {
            visit_required(search, graph, ctx, vertex);
        }
    }
    search.requireds_exist = true;
    Ok(())
}

// One backward visit: fold fanout requireds and endpoint constraints into
// the vertex's paths.
fn visit_required(
    search: &mut Search,
    graph: &mut Graph,
    ctx: &SearchCtx<'_>,
    vertex: VertexId,
) {
    let mut required_cmp = RequiredCmp::new();
    required_cmp.requireds_init(search, vertex);

    let backward_pred = SearchPred::backward();
    {
        let search_ref: &Search = search;
        let paths = search_ref.paths.paths(vertex);
        for (from_index, from_path) in paths.iter().enumerate() {
            let from_tag = search_ref.tag(from_path.tag);
            let from_ref = PathRef {
                vertex,
                index: from_index as u32,
            };
            let min_max = from_tag.min_max;
            let req_min_max = min_max.opposite();
            for edge in graph.out_edges(vertex) {
                // Requireds do not cross latch D->Q edges.
                if !backward_pred.search_thru(graph, ctx.network, ctx.sdc, edge) {
                    continue;
                }
                let to_vertex = graph.edge(edge).to;
                if !backward_pred.search_to(graph, ctx.sdc, to_vertex) {
                    continue;
                }
                let (rise_arc, fall_arc) = graph.edge(edge).arcs_from(from_tag.rf);
                for arc in [rise_arc, fall_arc].into_iter().flatten() {
                    let mut postponed = false;
                    let Some((to_tag, arc_delay, _)) = search_ref.propagate_step(
                        graph,
                        ctx,
                        from_ref,
                        from_path,
                        &from_tag,
                        edge,
                        arc,
                        &mut postponed,
                    ) else {
                        continue;
                    };
                    let to_paths = search_ref.paths.paths(to_vertex);
                    let to_group = search_ref.tag_group(graph, to_vertex);
                    let to_index = to_group.as_ref().and_then(|g| g.path_index(to_tag));
                    match to_index {
                        Some(to_index) => {
                            let to_required = to_paths[to_index].required;
                            if to_required.is_finite() {
                                required_cmp.required_set(
                                    from_index,
                                    to_required - arc_delay,
                                    req_min_max,
                                );
                            }
                        }
                        None => {
                            // The arrival with this exact crpr clock path
                            // was pruned; approximate from a sibling that
                            // matches everything else.
                            if ctx.sdc.variables.crpr_approx_missing_requireds {
                                for to_path in to_paths {
                                    if search_ref.tag_match_no_crpr(to_path.tag, to_tag)
                                        && to_path.required.is_finite()
                                    {
                                        required_cmp.required_set(
                                            from_index,
                                            to_path.required - arc_delay,
                                            req_min_max,
                                        );
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        // Constraints at this vertex itself.
        if is_endpoint(search_ref, graph, ctx, vertex) {
            let cmp = &mut required_cmp;
            visit_path_ends(search_ref, graph, ctx, vertex, &mut |end: &PathEnd| {
                if !end.is_unconstrained() {
                    let req_min_max = end.min_max.opposite();
                    cmp.required_set(end.path.index as usize, end.required, req_min_max);
                }
            });
        }
    }

    let changed = required_cmp.requireds_save(search, vertex);
    if changed {
        // Continue upstream.
        let pred = SearchPred::backward();
        search
            .required_queue_mut()
            .enqueue_adjacent(graph, ctx.network, ctx.sdc, &pred, vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_cmp_keeps_tightest_setup() {
        let mut cmp = RequiredCmp {
            requireds: vec![MinMax::Min.init_value()],
            have_requireds: false,
        };
        // Setup requireds merge toward the minimum.
        cmp.required_set(0, 5e-9, MinMax::Min);
        cmp.required_set(0, 3e-9, MinMax::Min);
        cmp.required_set(0, 4e-9, MinMax::Min);
        assert_eq!(cmp.required(0), 3e-9);
    }

    #[test]
    fn required_cmp_keeps_tightest_hold() {
        let mut cmp = RequiredCmp {
            requireds: vec![MinMax::Max.init_value()],
            have_requireds: false,
        };
        // Hold requireds merge toward the maximum.
        cmp.required_set(0, 1e-9, MinMax::Max);
        cmp.required_set(0, 2e-9, MinMax::Max);
        assert_eq!(cmp.required(0), 2e-9);
    }
}
