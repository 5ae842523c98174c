//! Latch data-to-output arrivals with time borrowing.
//!
//! A transparent latch passes data while its enable is open. A data
//! arrival before the open edge leaves at the open edge (the output takes
//! the enable clock's history); a later arrival *borrows* from the open
//! phase and leaves when the data does (the output keeps the data clock's
//! history, so the borrow is visible downstream). If the enable's clock
//! arrival has not been computed yet, the output is postponed to the next
//! search pass.

use crate::path::{Path, PathRef};
use crate::search::{Search, SearchCtx};
use crate::tag::{Tag, TagId};
use chronos_common::{Delay, MinMax};
use chronos_graph::{EdgeId, Graph, VertexId};
use chronos_network::TimingRole;

/// The outcome of evaluating one latch D→Q arc.
pub enum LatchOut {
    /// The output arrival and its tag.
    Arrival {
        /// The output's tag (before traversing the D→Q arc's exception
        /// states).
        tag: TagId,
        /// The output arrival time (including the arc delay).
        arrival: Delay,
    },
    /// The enable clock arrival is not available yet; re-evaluate on the
    /// next pass.
    Postponed,
    /// No output arrival is produced (no usable enable).
    None,
}

/// The enable vertex of the latch driving `q_vertex`, found through its
/// enable-to-output edge.
pub fn latch_enable_vertex(graph: &Graph, q_vertex: VertexId) -> Option<VertexId> {
    graph
        .in_edges(q_vertex)
        .into_iter()
        .find(|&e| graph.edge(e).role == TimingRole::LatchEnToQ)
        .map(|e| graph.edge(e).from)
}

/// Computes the max-side output arrival of a latch D→Q arc.
pub fn latch_out_arrival(
    search: &Search,
    graph: &Graph,
    ctx: &SearchCtx<'_>,
    from_path: &Path,
    from_tag: &Tag,
    edge: EdgeId,
    arc_delay: Delay,
) -> LatchOut {
    let q_vertex = graph.edge(edge).to;
    let Some(en_vertex) = latch_enable_vertex(graph, q_vertex) else {
        return LatchOut::None;
    };

    // The open-edge arrival: the enable pin's max-side clock arrival in
    // the same scene.
    let mut open: Option<(PathRef, Delay, TagId)> = None;
    for (index, en_path) in search.paths.paths(en_vertex).iter().enumerate() {
        let en_tag = search.tag(en_path.tag);
        if en_tag.is_clk && en_tag.min_max == MinMax::Max && en_tag.scene == from_tag.scene {
            let better = match open {
                Some((_, arrival, _)) => en_path.arrival > arrival,
                None => true,
            };
            if better {
                open = Some((
                    PathRef {
                        vertex: en_vertex,
                        index: index as u32,
                    },
                    en_path.arrival,
                    en_path.tag,
                ));
            }
        }
    }
    let Some((en_ref, open_arrival, en_tag_id)) = open else {
        // The enable clock has not arrived yet (or never will); postpone
        // so a later pass can pick it up.
        return LatchOut::Postponed;
    };

    let data_arrival = from_path.arrival + arc_delay;
    if data_arrival > open_arrival {
        // Borrowing: the output tracks the data arrival and keeps the
        // data clock history.
        match search.tags.find(from_tag) {
            Some(tag) => LatchOut::Arrival {
                tag,
                arrival: data_arrival,
            },
            None => LatchOut::None,
        }
    } else {
        // Not borrowing: the output leaves at the open edge with the
        // enable clock's history.
        let en_tag = search.tag(en_tag_id);
        let mut en_clk_info = search.clk_info(en_tag.clk_info);
        if ctx.sdc.variables.crpr_enabled && en_clk_info.crpr_clk_path.is_none() {
            en_clk_info.crpr_clk_path = Some(en_ref);
        }
        let clk_info = search.find_clk_info(en_clk_info);
        let tag = Tag::new(
            from_tag.scene,
            from_tag.rf,
            MinMax::Max,
            clk_info,
            false,
            None,
            false,
            from_tag.is_filter,
            from_tag.states.clone(),
        );
        match search.find_tag(tag) {
            Some(tag) => LatchOut::Arrival {
                tag,
                arrival: open_arrival + arc_delay,
            },
            None => LatchOut::None,
        }
    }
}
