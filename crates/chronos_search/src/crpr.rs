//! Clock reconvergence pessimism removal.
//!
//! When the launch and capture clock paths of a check share a common
//! clock-network pin, the min/max delay spread of the shared prefix is
//! pessimism: the same silicon cannot simultaneously be fast for one path
//! and slow for the other. The check's margin is relaxed by the spread
//! observed at the deepest common pin.

use crate::clk_info::ClkInfo;
use crate::path::{Path, PathRef};
use crate::search::Search;
use chronos_common::{Delay, RiseFall};
use chronos_graph::Graph;
use chronos_network::PinId;
use chronos_sdc::{CrprMode, Sdc};

/// The CRPR calculator.
pub struct CheckCrpr<'a> {
    /// The search holding paths and interned tags.
    pub search: &'a Search,
    /// The timing graph.
    pub graph: &'a Graph,
    /// The constraint index (CRPR mode and enables).
    pub sdc: &'a Sdc,
}

impl<'a> CheckCrpr<'a> {
    /// The largest pessimism that could be removed for arrivals with this
    /// clock history: the min/max spread at its CRPR clock pin. Used to
    /// prune arrivals that lose even with full relief.
    pub fn max_crpr(&self, clk_info: &ClkInfo) -> Delay {
        match clk_info.crpr_clk_path {
            Some(path_ref) => self.crpr_arrival_diff(path_ref),
            None => 0.0,
        }
    }

    /// The CRPR credit for a check between `src_path` (the launching data
    /// path) and `tgt_clk_path` (the capturing clock path), with the
    /// divergence pin. Zero when the clock paths share no ancestor.
    pub fn check_crpr(
        &self,
        src_path: &Path,
        tgt_clk_path: PathRef,
    ) -> (Delay, Option<PinId>) {
        if !self.sdc.variables.crpr_enabled {
            return (0.0, None);
        }
        let src_tag = self.search.tag(src_path.tag);
        let src_clk_info = self.search.clk_info(src_tag.clk_info);
        let tgt_clk_info = match self.search.paths.path(tgt_clk_path) {
            Some(p) => self.search.clk_info(self.search.tag(p.tag).clk_info),
            None => return (0.0, None),
        };
        if !self.crpr_possible(&src_clk_info, &tgt_clk_info) {
            return (0.0, None);
        }
        let Some(src_clk_path) = src_clk_info.crpr_clk_path else {
            return (0.0, None);
        };
        self.find_crpr(src_clk_path, tgt_clk_path)
    }

    // Pessimism only cancels between related clocks.
    fn crpr_possible(&self, a: &ClkInfo, b: &ClkInfo) -> bool {
        match (a.clock(), b.clock()) {
            (Some(ca), Some(cb)) => {
                ca == cb
                    || self.sdc.clock(ca).master_clk == Some(cb)
                    || self.sdc.clock(cb).master_clk == Some(ca)
            }
            _ => false,
        }
    }

    fn find_crpr(
        &self,
        src_clk_path: PathRef,
        tgt_clk_path: PathRef,
    ) -> (Delay, Option<PinId>) {
        let src_chain = self.clk_path_chain(src_clk_path);
        let tgt_chain = self.clk_path_chain(tgt_clk_path);
        let same_transition = self.sdc.variables.crpr_mode == CrprMode::SameTransition;

        // Walk from the clock source towards the leaves while the chains
        // share pins; the last shared pin is the divergence point.
        let mut common: Option<(PathRef, PinId)> = None;
        for ((src_ref, src_pin, src_rf), (_tgt_ref, tgt_pin, tgt_rf)) in
            src_chain.iter().zip(tgt_chain.iter())
        {
            if src_pin != tgt_pin {
                break;
            }
            if same_transition && src_rf != tgt_rf {
                break;
            }
            common = Some((*src_ref, *src_pin));
        }
        match common {
            Some((path_ref, pin)) => (self.crpr_arrival_diff(path_ref), Some(pin)),
            None => (0.0, None),
        }
    }

    // The clock path from its source to `path_ref`, as (path, pin, rf)
    // triples ordered source-first.
    fn clk_path_chain(&self, path_ref: PathRef) -> Vec<(PathRef, PinId, RiseFall)> {
        let mut chain = Vec::new();
        let mut current = Some(path_ref);
        while let Some(path_ref) = current {
            let Some(path) = self.search.paths.path(path_ref) else {
                break;
            };
            let pin = self.graph.vertex(path_ref.vertex).pin;
            let rf = self.search.tag(path.tag).rf;
            chain.push((path_ref, pin, rf));
            current = path.prev_path;
        }
        chain.reverse();
        chain
    }

    /// The min/max arrival spread on one clock path: the difference
    /// between the path's arrival and the matching arrival computed on
    /// the opposite analysis side.
    pub fn crpr_arrival_diff(&self, path_ref: PathRef) -> Delay {
        let Some(path) = self.search.paths.path(path_ref) else {
            return 0.0;
        };
        let tag = self.search.tag(path.tag);
        let Some(other) = self.other_min_max_arrival(path_ref, &tag) else {
            return 0.0;
        };
        (path.arrival - other).abs()
    }

    // The arrival of the sibling path on the same vertex that differs
    // only by min/max (and possibly its CRPR clock path).
    fn other_min_max_arrival(&self, path_ref: PathRef, tag: &crate::tag::Tag) -> Option<Delay> {
        let opposite = tag.min_max.opposite();
        for path in self.search.paths.paths(path_ref.vertex) {
            let other_tag = self.search.tag(path.tag);
            if other_tag.min_max == opposite
                && other_tag.rf == tag.rf
                && other_tag.is_clk == tag.is_clk
                && other_tag.scene == tag.scene
            {
                let info = self.search.clk_info(other_tag.clk_info);
                let this_info = self.search.clk_info(tag.clk_info);
                if info.clk_edge == this_info.clk_edge {
                    return Some(path.arrival);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clk_info::ClkInfo;
    use crate::tag::Tag;
    use chronos_common::{Interner, MinMax};
    use chronos_network::{Network, PinId, PortDirection};
    use chronos_sdc::{ClockEdge, ClockId};

    // Builds a search with clock paths on two vertices sharing a prefix
    // vertex, with a min/max arrival spread at the shared pin.
    struct Fixture {
        search: Search,
        graph: Graph,
        sdc: Sdc,
        shared: chronos_graph::VertexId,
        left: chronos_graph::VertexId,
        right: chronos_graph::VertexId,
    }

    fn clk_tag(search: &Search, min_max: MinMax, clock: ClockId) -> crate::tag::TagId {
        let clk_info = search.find_clk_info(ClkInfo {
            clk_edge: Some(ClockEdge {
                clock,
                rf: chronos_common::RiseFall::Rise,
            }),
            clk_src: Some(PinId::from_raw(0)),
            is_propagated: true,
            ..ClkInfo::unclocked(min_max)
        });
        search
            .find_tag(Tag::new(
                0,
                chronos_common::RiseFall::Rise,
                min_max,
                clk_info,
                true,
                None,
                false,
                false,
                Vec::new(),
            ))
            .unwrap()
    }

    fn fixture() -> Fixture {
        let interner = Interner::new();
        let _network = Network::new(interner.get_or_intern("top"));
        let mut sdc = Sdc::new();
        let clk = sdc.make_clock(interner.get_or_intern("clk"), 10e-9);

        let mut graph = Graph::new(1);
        let shared = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        let left = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Input);
        let right = graph.make_pin_vertices(PinId::from_raw(2), PortDirection::Input);

        let mut search = Search::new();
        let tag_max = clk_tag(&search, MinMax::Max, clk);
        let tag_min = clk_tag(&search, MinMax::Min, clk);

        // Shared pin: max arrival 1.2ns, min arrival 1.0ns -> spread 0.2ns.
        search.paths.set_paths(
            shared,
            vec![
                crate::path::Path {
                    tag: tag_max,
                    arrival: 1.2e-9,
                    required: 0.0,
                    prev_path: None,
                    prev_edge: None,
                    prev_arc: 0,
                },
                crate::path::Path {
                    tag: tag_min,
                    arrival: 1.0e-9,
                    required: 0.0,
                    prev_path: None,
                    prev_edge: None,
                    prev_arc: 0,
                },
            ],
        );
        let shared_ref = PathRef {
            vertex: shared,
            index: 0,
        };
        for (v, arrival) in [(left, 2.0e-9_f32), (right, 2.5e-9)] {
            search.paths.set_paths(
                v,
                vec![crate::path::Path {
                    tag: tag_max,
                    arrival,
                    required: 0.0,
                    prev_path: Some(shared_ref),
                    prev_edge: None,
                    prev_arc: 0,
                }],
            );
        }
        Fixture {
            search,
            graph,
            sdc,
            shared,
            left,
            right,
        }
    }

    #[test]
    fn arrival_diff_at_shared_pin() {
        let f = fixture();
        let crpr = CheckCrpr {
            search: &f.search,
            graph: &f.graph,
            sdc: &f.sdc,
        };
        let diff = crpr.crpr_arrival_diff(PathRef {
            vertex: f.shared,
            index: 0,
        });
        assert!((diff - 0.2e-9).abs() < 1e-13, "diff = {diff}");
    }

    #[test]
    fn common_ancestor_found() {
        let f = fixture();
        let crpr = CheckCrpr {
            search: &f.search,
            graph: &f.graph,
            sdc: &f.sdc,
        };
        let (credit, pin) = crpr.find_crpr(
            PathRef {
                vertex: f.left,
                index: 0,
            },
            PathRef {
                vertex: f.right,
                index: 0,
            },
        );
        assert_eq!(pin, Some(PinId::from_raw(0)));
        assert!((credit - 0.2e-9).abs() < 1e-13);
    }

    #[test]
    fn disjoint_paths_no_crpr() {
        let f = fixture();
        let crpr = CheckCrpr {
            search: &f.search,
            graph: &f.graph,
            sdc: &f.sdc,
        };
        // A chain rooted at left vs one rooted at right: no shared
        // prefix (their chains start at different pins).
        let left_only = PathRef {
            vertex: f.left,
            index: 0,
        };
        // Truncate the right chain by making a fresh path with no prev.
        let mut paths = f.search.paths.paths(f.right).to_vec();
        paths[0].prev_path = None;
        let mut search2 = Search::new();
        // Rebuild minimal state in a fresh search sharing tag layout.
        let clk = ClockId::from_raw(0);
        let tag_max = clk_tag(&search2, MinMax::Max, clk);
        paths[0].tag = tag_max;
        search2.paths.set_paths(f.right, paths);
        search2.paths.set_paths(
            f.left,
            f.search.paths.paths(f.left).to_vec(),
        );
        let crpr2 = CheckCrpr {
            search: &search2,
            graph: &f.graph,
            sdc: &f.sdc,
        };
        let (credit, pin) = crpr2.find_crpr(
            left_only,
            PathRef {
                vertex: f.right,
                index: 0,
            },
        );
        let _ = crpr;
        assert_eq!(pin, None);
        assert_eq!(credit, 0.0);
    }

    #[test]
    fn max_crpr_uses_clk_info_path() {
        let f = fixture();
        let crpr = CheckCrpr {
            search: &f.search,
            graph: &f.graph,
            sdc: &f.sdc,
        };
        let mut info = ClkInfo::unclocked(MinMax::Max);
        info.crpr_clk_path = Some(PathRef {
            vertex: f.shared,
            index: 0,
        });
        assert!((crpr.max_crpr(&info) - 0.2e-9).abs() < 1e-13);
        assert_eq!(crpr.max_crpr(&ClkInfo::unclocked(MinMax::Max)), 0.0);
    }
}
