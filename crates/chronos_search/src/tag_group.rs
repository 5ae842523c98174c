//! Tag groups: the set of tags present on one vertex.
//!
//! Groups are interned across vertices, so structurally identical
//! vertices (same tags) share one group and one dense path-index layout.
//! The [`TagGroupBldr`] accumulates a vertex's arrivals during a visit and
//! is turned into an interned group plus a path array afterwards.

use crate::path::{Path, PathRef};
use crate::tag::TagId;
use chronos_common::{Delay, MinMax};
use chronos_graph::EdgeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of an interned [`TagGroup`].
pub type TagGroupId = u32;

/// The interned set of tags on a vertex. The position of a tag in the
/// sorted `tags` vector is its path index into the vertex's path array.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct TagGroup {
    /// The member tags, sorted.
    pub tags: Vec<TagId>,
    /// `true` when any member is a clock-network tag.
    pub has_clk_tag: bool,
    /// `true` when any member carries the report filter.
    pub has_filter_tag: bool,
    /// `true` when any member's clock history is propagated.
    pub has_propagated_clk: bool,
}

impl TagGroup {
    /// Number of paths a vertex with this group stores.
    pub fn path_count(&self) -> usize {
        self.tags.len()
    }

    /// The dense path index of `tag`, if it is a member.
    pub fn path_index(&self, tag: TagId) -> Option<usize> {
        self.tags.binary_search(&tag).ok()
    }

    /// Returns `true` when `tag` is a member.
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.path_index(tag).is_some()
    }
}

/// One pending arrival inside a [`TagGroupBldr`].
#[derive(Clone, Copy, Debug)]
pub struct PendingPath {
    /// Arrival time.
    pub arrival: Delay,
    /// Predecessor path.
    pub prev_path: Option<PathRef>,
    /// Edge traversed from the predecessor.
    pub prev_edge: Option<EdgeId>,
    /// Arc index within `prev_edge`.
    pub prev_arc: u32,
}

/// Accumulates the arrivals of one vertex visit, merging same-tag
/// arrivals by min/max.
#[derive(Clone, Debug, Default)]
pub struct TagGroupBldr {
    entries: HashMap<TagId, PendingPath>,
    has_clk_tag: bool,
    has_propagated_clk: bool,
    has_filter_tag: bool,
}

impl TagGroupBldr {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the builder for the next vertex.
    pub fn init(&mut self) {
        self.entries.clear();
        self.has_clk_tag = false;
        self.has_propagated_clk = false;
        self.has_filter_tag = false;
    }

    /// Returns `true` when no arrivals were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct tags recorded.
    pub fn path_count(&self) -> usize {
        self.entries.len()
    }

    /// The pending arrival for `tag`, if present.
    pub fn tag_match_path(&self, tag: TagId) -> Option<&PendingPath> {
        self.entries.get(&tag)
    }

    /// Records or overwrites the pending arrival for `tag`. The caller has
    /// already decided the min/max merge.
    #[allow(clippy::too_many_arguments)]
    pub fn set_match_path(
        &mut self,
        tag: TagId,
        arrival: Delay,
        prev_path: Option<PathRef>,
        prev_edge: Option<EdgeId>,
        prev_arc: u32,
        is_clk: bool,
        is_propagated_clk: bool,
        is_filter: bool,
    ) {
        self.entries.insert(
            tag,
            PendingPath {
                arrival,
                prev_path,
                prev_edge,
                prev_arc,
            },
        );
        self.has_clk_tag |= is_clk;
        self.has_propagated_clk |= is_propagated_clk;
        self.has_filter_tag |= is_filter;
    }

    /// Merges an arrival into the builder: keeps the better value per tag
    /// for `min_max`. Returns `true` when the entry changed.
    #[allow(clippy::too_many_arguments)]
    pub fn merge_arrival(
        &mut self,
        tag: TagId,
        arrival: Delay,
        min_max: MinMax,
        prev_path: Option<PathRef>,
        prev_edge: Option<EdgeId>,
        prev_arc: u32,
        is_clk: bool,
        is_propagated_clk: bool,
        is_filter: bool,
    ) -> bool {
        match self.entries.get(&tag) {
            Some(existing) if !min_max.compare(arrival, existing.arrival) => false,
            _ => {
                self.set_match_path(
                    tag,
                    arrival,
                    prev_path,
                    prev_edge,
                    prev_arc,
                    is_clk,
                    is_propagated_clk,
                    is_filter,
                );
                true
            }
        }
    }

    /// Drops the entry for `tag` (CRPR pruning).
    pub fn remove(&mut self, tag: TagId) {
        self.entries.remove(&tag);
    }

    /// The recorded tags, unsorted.
    pub fn tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.entries.keys().copied()
    }

    /// `true` when any recorded tag is a clock-network tag.
    pub fn has_clk_tag(&self) -> bool {
        self.has_clk_tag
    }

    /// `true` when any recorded tag has a propagated clock history.
    pub fn has_propagated_clk(&self) -> bool {
        self.has_propagated_clk
    }

    /// Builds the interned-group key and the path array laid out by the
    /// group's dense index, with requireds at their init values.
    pub fn make_group_and_paths(&self) -> (TagGroup, Vec<Path>, Vec<(TagId, PendingPath)>) {
        let mut tags: Vec<TagId> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        let group = TagGroup {
            tags: tags.clone(),
            has_clk_tag: self.has_clk_tag,
            has_filter_tag: self.has_filter_tag,
            has_propagated_clk: self.has_propagated_clk,
        };
        let mut ordered = Vec::with_capacity(tags.len());
        let paths = tags
            .iter()
            .map(|&tag| {
                let pending = self.entries[&tag];
                ordered.push((tag, pending));
                Path {
                    tag,
                    arrival: pending.arrival,
                    required: Delay::NAN,
                    prev_path: pending.prev_path,
                    prev_edge: pending.prev_edge,
                    prev_arc: pending.prev_arc,
                }
            })
            .collect();
        (group, paths, ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_path_index_is_sorted_position() {
        let group = TagGroup {
            tags: vec![2, 5, 9],
            ..TagGroup::default()
        };
        assert_eq!(group.path_count(), 3);
        assert_eq!(group.path_index(5), Some(1));
        assert_eq!(group.path_index(9), Some(2));
        assert_eq!(group.path_index(3), None);
        assert!(group.has_tag(2));
    }

    #[test]
    fn merge_keeps_better_max() {
        let mut bldr = TagGroupBldr::new();
        assert!(bldr.merge_arrival(1, 1e-9, MinMax::Max, None, None, 0, false, false, false));
        // Worse arrival loses.
        assert!(!bldr.merge_arrival(1, 0.5e-9, MinMax::Max, None, None, 0, false, false, false));
        // Better arrival wins.
        assert!(bldr.merge_arrival(1, 2e-9, MinMax::Max, None, None, 0, false, false, false));
        assert_eq!(bldr.tag_match_path(1).unwrap().arrival, 2e-9);
        assert_eq!(bldr.path_count(), 1);
    }

    #[test]
    fn merge_keeps_better_min() {
        let mut bldr = TagGroupBldr::new();
        bldr.merge_arrival(1, 1e-9, MinMax::Min, None, None, 0, false, false, false);
        assert!(bldr.merge_arrival(1, 0.2e-9, MinMax::Min, None, None, 0, false, false, false));
        assert_eq!(bldr.tag_match_path(1).unwrap().arrival, 0.2e-9);
    }

    #[test]
    fn group_layout_matches_paths() {
        let mut bldr = TagGroupBldr::new();
        bldr.merge_arrival(9, 3e-9, MinMax::Max, None, None, 0, false, false, false);
        bldr.merge_arrival(2, 1e-9, MinMax::Max, None, None, 0, true, true, false);
        let (group, paths, _) = bldr.make_group_and_paths();
        assert_eq!(group.tags, vec![2, 9]);
        assert!(group.has_clk_tag);
        assert!(group.has_propagated_clk);
        // paths[group.path_index(tag)] has that tag.
        for &tag in &group.tags {
            let index = group.path_index(tag).unwrap();
            assert_eq!(paths[index].tag, tag);
        }
        assert_eq!(paths[0].arrival, 1e-9);
        assert_eq!(paths[1].arrival, 3e-9);
    }

    #[test]
    fn identical_builders_make_equal_groups() {
        let mut a = TagGroupBldr::new();
        let mut b = TagGroupBldr::new();
        for bldr in [&mut a, &mut b] {
            bldr.merge_arrival(1, 1e-9, MinMax::Max, None, None, 0, false, false, false);
            bldr.merge_arrival(4, 2e-9, MinMax::Max, None, None, 0, false, false, false);
        }
        let (ga, _, _) = a.make_group_and_paths();
        let (gb, _, _) = b.make_group_and_paths();
        assert_eq!(ga, gb);
    }

    #[test]
    fn init_resets() {
        let mut bldr = TagGroupBldr::new();
        bldr.merge_arrival(1, 1e-9, MinMax::Max, None, None, 0, true, false, true);
        bldr.init();
        assert!(bldr.is_empty());
        assert!(!bldr.has_clk_tag());
    }
}
