//! Path records: one arrival (and its required time) per tag per vertex.

use crate::tag::TagId;
use chronos_common::Delay;
use chronos_graph::{EdgeId, VertexId};
use serde::{Deserialize, Serialize};

/// A stable reference to one path record: the vertex and its dense index
/// within the vertex's path array. Replaces the original pointer graph so
/// path arrays can relocate on growth.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PathRef {
    /// The vertex owning the path array.
    pub vertex: VertexId,
    /// Index into the vertex's path array.
    pub index: u32,
}

/// One arrival at a vertex: its time, the required time filled in by the
/// backward search, the predecessor path/edge/arc it came from, and its
/// tag.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Path {
    /// The arrival's interned tag.
    pub tag: TagId,
    /// Arrival time.
    pub arrival: Delay,
    /// Required time; starts at the min/max init value.
    pub required: Delay,
    /// The path this arrival came from.
    pub prev_path: Option<PathRef>,
    /// The edge traversed from the previous path.
    pub prev_edge: Option<EdgeId>,
    /// The arc index within `prev_edge`.
    pub prev_arc: u32,
}

/// Per-vertex path arrays, owned by the search.
///
/// The timing graph exposes the tag-group index on each vertex; the dense
/// arrays of [`Path`] records indexed by that group live here so the graph
/// stays free of search lifetimes.
#[derive(Clone, Debug, Default)]
pub struct PathTable {
    arrays: Vec<Option<Box<[Path]>>>,
}

impl PathTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, vertex: VertexId) -> &mut Option<Box<[Path]>> {
        let index = vertex.as_raw() as usize;
        if index >= self.arrays.len() {
            self.arrays.resize(index + 1, None);
        }
        &mut self.arrays[index]
    }

    /// The paths of `vertex`, empty when none have been stored.
    pub fn paths(&self, vertex: VertexId) -> &[Path] {
        self.arrays
            .get(vertex.as_raw() as usize)
            .and_then(|slot| slot.as_deref())
            .unwrap_or(&[])
    }

    /// Mutable access to the paths of `vertex`.
    pub fn paths_mut(&mut self, vertex: VertexId) -> &mut [Path] {
        self.slot(vertex).as_deref_mut().unwrap_or(&mut [])
    }

    /// Replaces the path array of `vertex`.
    pub fn set_paths(&mut self, vertex: VertexId, paths: Vec<Path>) {
        *self.slot(vertex) = Some(paths.into_boxed_slice());
    }

    /// Drops the path array of `vertex`.
    pub fn delete_paths(&mut self, vertex: VertexId) {
        if let Some(slot) = self.arrays.get_mut(vertex.as_raw() as usize) {
            *slot = None;
        }
    }

    /// Returns `true` when `vertex` has stored paths.
    pub fn has_paths(&self, vertex: VertexId) -> bool {
        !self.paths(vertex).is_empty()
    }

    /// Resolves a [`PathRef`].
    pub fn path(&self, path_ref: PathRef) -> Option<&Path> {
        self.paths(path_ref.vertex).get(path_ref.index as usize)
    }

    /// Drops every path array.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }
}
