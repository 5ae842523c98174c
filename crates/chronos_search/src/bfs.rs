//! Level-ordered BFS work queues.
//!
//! A [`BfsQueue`] buckets pending vertices by level. The search drains one
//! level completely before advancing, which is the ordering guarantee the
//! whole propagation rests on: all vertices of level L may be visited in
//! any order (or in parallel), but never interleaved with level L+1.
//! A per-vertex in-queue flag keeps enqueues idempotent. All queue
//! mutation happens in the sequential phase between level visits, so the
//! flag needs no lock; the parallel phase only reads.

use crate::search_pred::SearchPred;
use chronos_graph::{BfsIndex, Graph, VertexId};
use chronos_network::Network;
use chronos_sdc::Sdc;

/// A level-bucketed vertex queue, draining forward (ascending levels) or
/// backward (descending).
pub struct BfsQueue {
    bfs_index: BfsIndex,
    fwd: bool,
    buckets: Vec<Vec<VertexId>>,
    // Active level range; empty when first > last (forward) or
    // first < last (backward).
    first: i32,
    last: i32,
}

impl BfsQueue {
    /// Creates a forward (arrival) queue.
    pub fn forward(bfs_index: BfsIndex) -> Self {
        Self {
            bfs_index,
            fwd: true,
            buckets: Vec::new(),
            first: i32::MAX,
            last: 0,
        }
    }

    /// Creates a backward (required) queue.
    pub fn backward(bfs_index: BfsIndex) -> Self {
        Self {
            bfs_index,
            fwd: false,
            buckets: Vec::new(),
            first: i32::MIN,
            last: i32::MAX,
        }
    }

    fn reset_range(&mut self) {
        if self.fwd {
            self.first = i32::MAX;
            self.last = 0;
        } else {
            self.first = i32::MIN;
            self.last = i32::MAX;
        }
    }

    /// Returns `true` when no vertices are pending.
    pub fn is_empty(&self) -> bool {
        if self.fwd {
            self.first > self.last
        } else {
            self.first < self.last
        }
    }

    /// Enqueues `vertex` at its level, once.
    pub fn enqueue(&mut self, graph: &mut Graph, vertex: VertexId) {
        if graph.vertex(vertex).bfs_in_queue(self.bfs_index) {
            return;
        }
        let level = graph.vertex(vertex).level.max(0);
        let index = level as usize;
        if index >= self.buckets.len() {
            self.buckets.resize_with(index + 1, Vec::new);
        }
        graph
            .vertex_mut(vertex)
            .set_bfs_in_queue(self.bfs_index, true);
        self.buckets[index].push(vertex);
        if self.fwd {
            self.first = self.first.min(level);
            self.last = self.last.max(level);
        } else {
            self.first = self.first.max(level);
            self.last = self.last.min(level);
        }
    }

    /// Enqueues the search-adjacent vertices of `vertex`: fanout for a
    /// forward queue, fanin for a backward one.
    pub fn enqueue_adjacent(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &Sdc,
        pred: &SearchPred,
        vertex: VertexId,
    ) {
        if self.fwd {
            if pred.search_from(graph, sdc, vertex) {
                for edge in graph.out_edges(vertex) {
                    let to = graph.edge(edge).to;
                    if pred.search_thru(graph, network, sdc, edge)
                        && pred.search_to(graph, sdc, to)
                    {
                        self.enqueue(graph, to);
                    }
                }
            }
        } else if pred.search_to(graph, sdc, vertex) {
            for edge in graph.in_edges(vertex) {
                let from = graph.edge(edge).from;
                if pred.search_from(graph, sdc, from)
                    && pred.search_thru(graph, network, sdc, edge)
                {
                    self.enqueue(graph, from);
                }
            }
        }
    }

    /// Drains the next pending level and returns it with its vertices.
    pub fn next_level(&mut self, graph: &mut Graph) -> Option<(i32, Vec<VertexId>)> {
        loop {
            if self.is_empty() {
                self.reset_range();
                return None;
            }
            let level = self.first;
            let index = level as usize;
            let vertices = if index < self.buckets.len() {
                std::mem::take(&mut self.buckets[index])
            } else {
                Vec::new()
            };
            if self.fwd {
                self.first += 1;
            } else {
                self.first -= 1;
            }
            if !vertices.is_empty() {
                for &v in &vertices {
                    graph.vertex_mut(v).set_bfs_in_queue(self.bfs_index, false);
                }
                return Some((level, vertices));
            }
        }
    }

    /// Removes a vertex before deletion.
    pub fn remove(&mut self, graph: &mut Graph, vertex: VertexId) {
        if graph.vertex(vertex).bfs_in_queue(self.bfs_index) {
            let level = graph.vertex(vertex).level.max(0) as usize;
            if let Some(bucket) = self.buckets.get_mut(level) {
                bucket.retain(|&v| v != vertex);
            }
            graph
                .vertex_mut(vertex)
                .set_bfs_in_queue(self.bfs_index, false);
        }
    }

    /// Discards all pending work.
    pub fn clear(&mut self, graph: &mut Graph) {
        for bucket in &mut self.buckets {
            for &v in bucket.iter() {
                graph.vertex_mut(v).set_bfs_in_queue(self.bfs_index, false);
            }
            bucket.clear();
        }
        self.reset_range();
    }
}
