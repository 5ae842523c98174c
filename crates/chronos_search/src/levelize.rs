//! Levelization: topological level assignment and feedback-loop breaking.
//!
//! Levels order the BFS: every edge the search traverses satisfies
//! `from.level < to.level` (disabled loop edges excepted). Back edges are
//! found by an iterative DFS from the roots, recorded as [`GraphLoop`]s,
//! and disabled; levels are then assigned along a Kahn topological order
//! with a spacing of [`LEVEL_SPACE`] so incremental relevelization can
//! raise a vertex without renumbering its fanout.

use crate::search_pred::SearchPred;
use chronos_common::{InternalError, StaResult};
use chronos_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use chronos_graph::{EdgeId, Graph, VertexId};
use chronos_network::{Network, TimingRole};
use chronos_sdc::{ExceptionKind, ExceptionPath, ExceptionPt, Sdc};
use std::collections::{BTreeSet, HashSet};

/// Gap between adjacent levels.
pub const LEVEL_SPACE: i32 = 10;

/// Inclusive level ceiling; exceeding it is fatal.
pub const MAX_LEVEL: i32 = (1 << 24) - 1;

/// A recorded feedback loop: the edges from the loop entry back around to
/// the closing back edge.
#[derive(Clone, Debug)]
pub struct GraphLoop {
    /// The loop's edges, in path order; the last is the disabled back
    /// edge.
    pub edges: Vec<EdgeId>,
}

impl GraphLoop {
    /// Returns `true` when every loop edge is combinational or wire
    /// (a purely combinational feedback loop).
    pub fn is_combinational(&self, graph: &Graph) -> bool {
        self.edges.iter().all(|&e| {
            matches!(
                graph.edge(e).role,
                TimingRole::Wire
                    | TimingRole::Combinational
                    | TimingRole::TristateEnable
                    | TimingRole::TristateDisable
            )
        })
    }
}

/// The levelizer.
pub struct Levelize {
    pred: SearchPred,
    levelized: bool,
    levels_valid: bool,
    max_level: i32,
    level_space: i32,
    roots: BTreeSet<VertexId>,
    relevelize_from: BTreeSet<VertexId>,
    loops: Vec<GraphLoop>,
    loop_edges: HashSet<EdgeId>,
    disabled_loop_edges: HashSet<EdgeId>,
    latch_d_to_q_edges: HashSet<EdgeId>,
}

impl Default for Levelize {
    fn default() -> Self {
        Self::new()
    }
}

impl Levelize {
    /// Creates an unlevelized levelizer.
    pub fn new() -> Self {
        Self {
            pred: SearchPred::levelize(),
            levelized: false,
            levels_valid: false,
            max_level: 0,
            level_space: LEVEL_SPACE,
            roots: BTreeSet::new(),
            relevelize_from: BTreeSet::new(),
            loops: Vec::new(),
            loop_edges: HashSet::new(),
            disabled_loop_edges: HashSet::new(),
            latch_d_to_q_edges: HashSet::new(),
        }
    }

    /// Returns `true` once a full levelization has run.
    pub fn levelized(&self) -> bool {
        self.levelized
    }

    /// Returns `true` while the current levels are usable.
    pub fn levels_valid(&self) -> bool {
        self.levels_valid
    }

    /// The highest level assigned.
    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// The recorded feedback loops.
    pub fn loops(&self) -> &[GraphLoop] {
        &self.loops
    }

    /// Returns `true` when `edge` was disabled to break a loop.
    pub fn is_disabled_loop(&self, edge: EdgeId) -> bool {
        self.disabled_loop_edges.contains(&edge)
    }

    /// Levelizes if the levels are stale: incrementally when possible,
    /// from scratch otherwise.
    pub fn ensure_levelized(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &mut Sdc,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        if !self.levels_valid {
            if self.levelized {
                self.relevelize(graph, network, sdc, sink)?;
            } else {
                self.levelize(graph, network, sdc, sink)?;
            }
        }
        Ok(())
    }

    fn clear(&mut self, graph: &mut Graph) {
        self.levelized = false;
        self.levels_valid = false;
        self.roots.clear();
        self.relevelize_from.clear();
        for &edge in &self.disabled_loop_edges {
            graph.edge_mut(edge).is_disabled_loop = false;
        }
        self.disabled_loop_edges.clear();
        self.loops.clear();
        self.loop_edges.clear();
        self.max_level = 0;
    }

    /// Levelizes from scratch.
    pub fn levelize(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &mut Sdc,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        self.clear(graph);

        let vertices: Vec<VertexId> = graph.vertices().collect();
        for &v in &vertices {
            let vertex = graph.vertex_mut(v);
            vertex.visited = false;
            vertex.on_path = false;
            vertex.level = -1;
        }

        self.find_roots(graph, network, sdc, &vertices);
        self.find_back_edges(graph, network, sdc);
        let topo = self.find_topological_order(graph, network, sdc, &vertices);
        self.assign_levels(graph, network, sdc, &topo, sink)?;
        self.ensure_latch_levels(graph, sink)?;

        // Stranded vertices (constants, case-analysis islands) sit at
        // level zero.
        for &v in &vertices {
            let vertex = graph.vertex_mut(v);
            if vertex.level == -1 {
                vertex.level = 0;
            }
            vertex.visited = false;
            vertex.on_path = false;
        }
        self.relevelize_from.clear();
        self.levelized = true;
        self.levels_valid = true;
        Ok(())
    }

    fn find_roots(
        &mut self,
        graph: &Graph,
        network: &Network,
        sdc: &Sdc,
        vertices: &[VertexId],
    ) {
        self.roots.clear();
        for &v in vertices {
            if self.is_root(graph, network, sdc, v) {
                self.roots.insert(v);
            }
        }
    }

    // Root vertices have no enabled edges entering them, are not
    // themselves disabled, and have enabled fanout.
    fn is_root(&self, graph: &Graph, network: &Network, sdc: &Sdc, vertex: VertexId) -> bool {
        if !self.pred.search_to(graph, sdc, vertex) {
            return false;
        }
        for edge in graph.in_edges(vertex) {
            let from = graph.edge(edge).from;
            if self.pred.search_from(graph, sdc, from)
                && self.pred.search_thru(graph, network, sdc, edge)
            {
                return false;
            }
        }
        true
    }

    fn has_fanout(&self, graph: &Graph, network: &Network, sdc: &Sdc, vertex: VertexId) -> bool {
        if !self.pred.search_from(graph, sdc, vertex) {
            return false;
        }
        graph.out_edges(vertex).into_iter().any(|edge| {
            let to = graph.edge(edge).to;
            self.pred.search_thru(graph, network, sdc, edge)
                && self.pred.search_to(graph, sdc, to)
        })
    }

    // Non-recursive DFS to find back edges so the graph is acyclic.
    fn find_back_edges(&mut self, graph: &mut Graph, network: &Network, sdc: &mut Sdc) {
        let mut path: Vec<EdgeId> = Vec::new();
        let mut stack: Vec<(VertexId, Vec<EdgeId>, usize)> = Vec::new();

        // Roots are iterated in ID order so loop breaking is stable.
        let fanout_roots: Vec<VertexId> = self
            .roots
            .iter()
            .copied()
            .filter(|&v| self.has_fanout(graph, network, sdc, v))
            .collect();
        for v in fanout_roots {
            let vertex = graph.vertex_mut(v);
            vertex.visited = true;
            vertex.on_path = true;
            let out = graph.out_edges(v);
            stack.push((v, out, 0));
        }
        self.find_back_edges_dfs(graph, network, sdc, &mut path, &mut stack);
        self.find_cycle_back_edges(graph, network, sdc);
    }

    fn find_back_edges_dfs(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &mut Sdc,
        path: &mut Vec<EdgeId>,
        stack: &mut Vec<(VertexId, Vec<EdgeId>, usize)>,
    ) -> Vec<EdgeId> {
        let mut back_edges = Vec::new();
        loop {
            let (vertex, next_edge) = {
                let Some((vertex, edges, next)) = stack.last_mut() else {
                    break;
                };
                if *next < edges.len() {
                    let edge = edges[*next];
                    *next += 1;
                    (*vertex, Some(edge))
                } else {
                    (*vertex, None)
                }
            };
            match next_edge {
                Some(edge) => {
                    if self.pred.search_thru(graph, network, sdc, edge) {
                        let to = graph.edge(edge).to;
                        if !graph.vertex(to).visited {
                            let to_vertex = graph.vertex_mut(to);
                            to_vertex.visited = true;
                            to_vertex.on_path = true;
                            path.push(edge);
                            let out = graph.out_edges(to);
                            stack.push((to, out, 0));
                        } else if graph.vertex(to).on_path {
                            // Found a back edge (loop).
                            self.record_loop(graph, sdc, edge, path);
                            back_edges.push(edge);
                        }
                    }
                }
                None => {
                    stack.pop();
                    graph.vertex_mut(vertex).on_path = false;
                    if !path.is_empty() {
                        path.pop();
                    }
                }
            }
        }
        back_edges
    }

    // Find back edges in cycles that were not accessible from roots, and
    // add roots for them so downstream levelization can proceed.
    fn find_cycle_back_edges(&mut self, graph: &mut Graph, network: &Network, sdc: &mut Sdc) {
        let unvisited: Vec<VertexId> = graph
            .vertices()
            .filter(|&v| !graph.vertex(v).visited && self.pred.search_from(graph, sdc, v))
            .collect();
        for v in unvisited {
            if graph.vertex(v).visited {
                continue;
            }
            let vertex = graph.vertex_mut(v);
            vertex.visited = true;
            vertex.on_path = true;
            let mut path = Vec::new();
            let out = graph.out_edges(v);
            let mut stack = vec![(v, out, 0)];
            let back_edges = self.find_back_edges_dfs(graph, network, sdc, &mut path, &mut stack);
            for edge in back_edges {
                self.roots.insert(graph.edge(edge).from);
            }
        }
    }

    fn record_loop(&mut self, graph: &mut Graph, sdc: &mut Sdc, edge: EdgeId, path: &[EdgeId]) {
        // Skip the head of the path up to where the closing edge closes
        // the loop.
        let loop_pin = graph.vertex(graph.edge(edge).to).pin;
        let mut edges = Vec::new();
        let mut copy = false;
        for &path_edge in path {
            if graph.vertex(graph.edge(path_edge).from).pin == loop_pin {
                copy = true;
            }
            if copy {
                edges.push(path_edge);
                self.loop_edges.insert(path_edge);
            }
        }
        edges.push(edge);
        self.loop_edges.insert(edge);

        if sdc.variables.dynamic_loop_breaking {
            let thrus = edges
                .iter()
                .map(|&e| ExceptionPt::pin(graph.vertex(graph.edge(e).from).pin))
                .collect();
            sdc.make_exception(ExceptionPath {
                kind: ExceptionKind::Loop,
                from: None,
                thrus,
                to: None,
                min_max: None,
            });
        }

        self.loops.push(GraphLoop { edges });
        // Record disabled loop edges so they can be cleared without
        // traversing the entire graph to find them.
        self.disabled_loop_edges.insert(edge);
        graph.edge_mut(edge).is_disabled_loop = true;
    }

    fn find_topological_order(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &Sdc,
        vertices: &[VertexId],
    ) -> Vec<VertexId> {
        let mut in_degree: Vec<u32> = Vec::new();
        let mut degree_of = |v: VertexId, in_degree: &mut Vec<u32>| -> usize {
            let i = v.as_raw() as usize;
            if i >= in_degree.len() {
                in_degree.resize(i + 1, 0);
            }
            i
        };
        for &v in vertices {
            if !self.pred.search_from(graph, sdc, v) {
                continue;
            }
            for edge in graph.out_edges(v) {
                let to = graph.edge(edge).to;
                if self.pred.search_thru(graph, network, sdc, edge)
                    && self.pred.search_to(graph, sdc, to)
                {
                    let i = degree_of(to, &mut in_degree);
                    in_degree[i] += 1;
                }
                if graph.edge(edge).role == TimingRole::LatchDtoQ {
                    self.latch_d_to_q_edges.insert(edge);
                }
            }
        }

        // Seed from the roots plus any vertex left with no enabled fanin
        // (entry points uncovered by breaking a loop).
        let mut queue: std::collections::VecDeque<VertexId> = std::collections::VecDeque::new();
        let mut seeds: BTreeSet<VertexId> = self.roots.clone();
        for &v in vertices {
            let i = v.as_raw() as usize;
            let degree = in_degree.get(i).copied().unwrap_or(0);
            if degree == 0 && self.pred.search_to(graph, sdc, v) {
                seeds.insert(v);
            }
        }
        for &v in &seeds {
            queue.push_back(v);
        }
        self.roots = seeds;

        // Reuse the visited flag to keep the order duplicate-free.
        for &v in vertices {
            graph.vertex_mut(v).visited = false;
        }
        let mut topo = Vec::new();
        while let Some(v) = queue.pop_front() {
            if graph.vertex(v).visited {
                continue;
            }
            graph.vertex_mut(v).visited = true;
            topo.push(v);
            if self.pred.search_from(graph, sdc, v) {
                for edge in graph.out_edges(v) {
                    let to = graph.edge(edge).to;
                    if self.pred.search_thru(graph, network, sdc, edge)
                        && self.pred.search_to(graph, sdc, to)
                    {
                        let i = to.as_raw() as usize;
                        if let Some(d) = in_degree.get_mut(i) {
                            *d = d.saturating_sub(1);
                            if *d == 0 {
                                queue.push_back(to);
                            }
                        }
                    }
                }
            }
        }
        topo
    }

    fn assign_levels(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &Sdc,
        topo: &[VertexId],
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        let roots: Vec<VertexId> = self.roots.iter().copied().collect();
        for root in roots {
            self.set_level(graph, root, 0, sink)?;
        }
        for &v in topo {
            if graph.vertex(v).level != -1 && self.pred.search_from(graph, sdc, v) {
                let level = graph.vertex(v).level;
                for edge in graph.out_edges(v) {
                    let to = graph.edge(edge).to;
                    if self.pred.search_thru(graph, network, sdc, edge)
                        && self.pred.search_to(graph, sdc, to)
                    {
                        let to_level = graph.vertex(to).level;
                        self.set_level(graph, to, to_level.max(level + self.level_space), sink)?;
                    }
                }
            }
        }
        Ok(())
    }

    // A latch data input may not share its output's level: the output
    // arrival depends on the data arrival, so a parallel level scheduler
    // must order them.
    fn ensure_latch_levels(&mut self, graph: &mut Graph, sink: &DiagnosticSink) -> StaResult<()> {
        let latch_edges: Vec<EdgeId> = self.latch_d_to_q_edges.drain().collect();
        for edge in latch_edges {
            let from = graph.edge(edge).from;
            let to = graph.edge(edge).to;
            if graph.vertex(from).level == graph.vertex(to).level {
                let level = graph.vertex(from).level + self.level_space;
                self.set_level(graph, from, level, sink)?;
            }
        }
        Ok(())
    }

    fn set_level(
        &mut self,
        graph: &mut Graph,
        vertex: VertexId,
        level: i32,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        graph.vertex_mut(vertex).level = level;
        self.max_level = self.max_level.max(level);
        if level >= MAX_LEVEL {
            sink.emit(Diagnostic::critical(
                DiagnosticCode::new(Category::Levelize, 616),
                "maximum logic level exceeded",
            ));
            return Err(InternalError::new("maximum logic level exceeded"));
        }
        Ok(())
    }

    /// Invalidates all levels; the next `ensure_levelized` runs from
    /// scratch.
    pub fn invalid(&mut self) {
        if self.levelized {
            self.levelized = false;
            self.levels_valid = false;
        }
    }

    /// Invalidates the levels at and upstream of `vertex` (an edge was
    /// added into it).
    pub fn invalid_from(&mut self, graph: &Graph, vertex: VertexId) {
        if self.levelized {
            for edge in graph.in_edges(vertex) {
                self.relevelize_from.insert(graph.edge(edge).from);
            }
            self.relevelize_from.insert(vertex);
            self.levels_valid = false;
        }
    }

    /// Queues `vertex` for incremental relevelization.
    pub fn relevelize_from(&mut self, vertex: VertexId) {
        if self.levelized {
            self.relevelize_from.insert(vertex);
            self.levels_valid = false;
        }
    }

    /// Forgets `vertex` before it is deleted.
    pub fn delete_vertex_before(&mut self, vertex: VertexId) {
        if self.levelized {
            self.roots.remove(&vertex);
            self.relevelize_from.remove(&vertex);
        }
    }

    /// Reacts to an edge deletion: removing a loop edge forces a full
    /// relevelization because the recorded DFS path is gone.
    pub fn delete_edge_before(&mut self, edge: EdgeId) {
        if self.levelized && self.loop_edges.contains(&edge) {
            self.disabled_loop_edges.remove(&edge);
            self.levelized = false;
            self.levels_valid = false;
        }
    }

    // Incremental relevelization. Removed edges do NOT lower downstream
    // levels; the BFS only requires a vertex level above its
    // predecessors, so stale-high levels stay correct.
    fn relevelize(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &mut Sdc,
        sink: &DiagnosticSink,
    ) -> StaResult<()> {
        let seeds: Vec<VertexId> = self.relevelize_from.iter().copied().collect();
        for vertex in seeds {
            if self.pred.search_from(graph, sdc, vertex) {
                if self.is_root(graph, network, sdc, vertex) {
                    self.roots.insert(vertex);
                }
                let level = graph.vertex(vertex).level.max(0);
                let mut path_vertices = HashSet::new();
                let mut path = Vec::new();
                self.relevelize_visit(
                    graph,
                    network,
                    sdc,
                    sink,
                    vertex,
                    None,
                    level,
                    1,
                    &mut path_vertices,
                    &mut path,
                )?;
            }
        }
        self.ensure_latch_levels(graph, sink)?;
        self.levels_valid = true;
        self.relevelize_from.clear();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn relevelize_visit(
        &mut self,
        graph: &mut Graph,
        network: &Network,
        sdc: &mut Sdc,
        sink: &DiagnosticSink,
        vertex: VertexId,
        from: Option<EdgeId>,
        level: i32,
        level_space: i32,
        path_vertices: &mut HashSet<VertexId>,
        path: &mut Vec<EdgeId>,
    ) -> StaResult<()> {
        self.set_level(graph, vertex, level, sink)?;
        path_vertices.insert(vertex);
        if let Some(from) = from {
            path.push(from);
        }

        if self.pred.search_from(graph, sdc, vertex) {
            for edge in graph.out_edges(vertex) {
                let to = graph.edge(edge).to;
                if self.pred.search_thru(graph, network, sdc, edge)
                    && self.pred.search_to(graph, sdc, to)
                {
                    if path_vertices.contains(&to) {
                        // Back edges form feedback loops.
                        self.record_loop(graph, sdc, edge, path);
                    } else if graph.vertex(to).level <= level {
                        self.relevelize_visit(
                            graph,
                            network,
                            sdc,
                            sink,
                            to,
                            Some(edge),
                            level + level_space,
                            level_space,
                            path_vertices,
                            path,
                        )?;
                    }
                }
                if graph.edge(edge).role == TimingRole::LatchDtoQ {
                    self.latch_d_to_q_edges.insert(edge);
                }
            }
        }
        path_vertices.remove(&vertex);
        if from.is_some() {
            path.pop();
        }
        Ok(())
    }

    /// Debug validation: every enabled edge must go up-level (level-zero
    /// entry-less loops excepted). Returns `true` when the levels check
    /// out.
    pub fn check_levels(
        &self,
        graph: &Graph,
        network: &Network,
        sdc: &Sdc,
        sink: &DiagnosticSink,
    ) -> bool {
        let mut ok = true;
        for v in graph.vertices() {
            if !self.pred.search_to(graph, sdc, v) {
                continue;
            }
            let level = graph.vertex(v).level;
            for edge in graph.in_edges(v) {
                let from = graph.edge(edge).from;
                let from_level = graph.vertex(from).level;
                if self.pred.search_from(graph, sdc, from)
                    && self.pred.search_thru(graph, network, sdc, edge)
                    && from_level >= level
                    && !(from_level == 0 && level == 0)
                {
                    sink.emit(Diagnostic::warning(
                        DiagnosticCode::new(Category::Levelize, 617),
                        format!("level check failed {from_level} -> {level}"),
                    ));
                    ok = false;
                }
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronos_common::Interner;
    use chronos_graph::graph::wire_arcs;
    use chronos_network::{PinId, PortDirection};

    fn make_graph(pin_count: u32) -> (Graph, Network, Sdc, DiagnosticSink) {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        for i in 0..pin_count {
            network.make_top_port(
                interner.get_or_intern(&format!("p{i}")),
                PortDirection::Input,
            );
        }
        let graph = Graph::new(1);
        (graph, network, Sdc::new(), DiagnosticSink::new())
    }

    fn vertex(graph: &mut Graph, i: u32) -> VertexId {
        graph.make_pin_vertices(PinId::from_raw(i), PortDirection::Input)
    }

    #[test]
    fn chain_levels() {
        let (mut graph, network, mut sdc, sink) = make_graph(3);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        let c = vertex(&mut graph, 2);
        graph.make_edge(a, b, TimingRole::Wire, wire_arcs());
        graph.make_edge(b, c, TimingRole::Combinational, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert_eq!(graph.vertex(a).level, 0);
        assert_eq!(graph.vertex(b).level, 10);
        assert_eq!(graph.vertex(c).level, 20);
        assert_eq!(levelize.max_level(), 20);
        assert!(levelize.check_levels(&graph, &network, &sdc, &sink));
    }

    #[test]
    fn reconvergent_fanout_takes_max() {
        let (mut graph, network, mut sdc, sink) = make_graph(4);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        let c = vertex(&mut graph, 2);
        let d = vertex(&mut graph, 3);
        graph.make_edge(a, b, TimingRole::Wire, wire_arcs());
        graph.make_edge(b, c, TimingRole::Wire, wire_arcs());
        graph.make_edge(a, d, TimingRole::Wire, wire_arcs());
        graph.make_edge(c, d, TimingRole::Wire, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert_eq!(graph.vertex(d).level, 30);
    }

    #[test]
    fn isolated_loop_break() {
        // A -> B -> C -> A with no entry: the back edge C -> A is
        // disabled and the remaining chain levelizes A=0 B=10 C=20.
        let (mut graph, network, mut sdc, sink) = make_graph(3);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        let c = vertex(&mut graph, 2);
        graph.make_edge(a, b, TimingRole::Combinational, wire_arcs());
        graph.make_edge(b, c, TimingRole::Combinational, wire_arcs());
        let back = graph.make_edge(c, a, TimingRole::Combinational, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert!(graph.edge(back).is_disabled_loop);
        assert!(levelize.is_disabled_loop(back));
        assert_eq!(levelize.loops().len(), 1);
        assert_eq!(levelize.loops()[0].edges.len(), 3);
        assert!(levelize.loops()[0].is_combinational(&graph));
        assert_eq!(graph.vertex(a).level, 0);
        assert_eq!(graph.vertex(b).level, 10);
        assert_eq!(graph.vertex(c).level, 20);
    }

    #[test]
    fn entered_loop_break() {
        let (mut graph, network, mut sdc, sink) = make_graph(4);
        let input = vertex(&mut graph, 0);
        let a = vertex(&mut graph, 1);
        let b = vertex(&mut graph, 2);
        let c = vertex(&mut graph, 3);
        graph.make_edge(input, a, TimingRole::Wire, wire_arcs());
        graph.make_edge(a, b, TimingRole::Combinational, wire_arcs());
        graph.make_edge(b, c, TimingRole::Combinational, wire_arcs());
        let back = graph.make_edge(c, a, TimingRole::Combinational, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert!(graph.edge(back).is_disabled_loop);
        assert_eq!(graph.vertex(input).level, 0);
        assert_eq!(graph.vertex(a).level, 10);
        assert_eq!(graph.vertex(c).level, 30);
        // Every enabled edge goes up-level.
        assert!(levelize.check_levels(&graph, &network, &sdc, &sink));
    }

    #[test]
    fn latch_d_and_q_levels_differ() {
        let (mut graph, network, mut sdc, sink) = make_graph(2);
        let d = vertex(&mut graph, 0);
        let q = vertex(&mut graph, 1);
        graph.make_edge(d, q, TimingRole::LatchDtoQ, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert_ne!(graph.vertex(d).level, graph.vertex(q).level);
    }

    #[test]
    fn stranded_vertices_level_zero() {
        let (mut graph, network, mut sdc, sink) = make_graph(2);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        graph.make_edge(a, b, TimingRole::Wire, wire_arcs());
        let pin_b = graph.vertex(b).pin;
        // Case analysis silences b; it is stranded.
        sdc.set_case_value(pin_b, true);

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert_eq!(graph.vertex(b).level, 0);
    }

    #[test]
    fn incremental_relevelize_raises_only() {
        let (mut graph, network, mut sdc, sink) = make_graph(4);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        let c = vertex(&mut graph, 2);
        graph.make_edge(a, b, TimingRole::Wire, wire_arcs());
        graph.make_edge(b, c, TimingRole::Wire, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        let c_level = graph.vertex(c).level;

        // Splice a new vertex between b and c.
        let d = vertex(&mut graph, 3);
        graph.make_edge(b, d, TimingRole::Wire, wire_arcs());
        let e = graph.make_edge(d, c, TimingRole::Wire, wire_arcs());
        let _ = e;
        levelize.relevelize_from(b);
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();

        assert!(graph.vertex(d).level > graph.vertex(b).level);
        assert!(graph.vertex(c).level > graph.vertex(d).level);
        assert!(graph.vertex(c).level >= c_level);
    }

    #[test]
    fn dynamic_loop_breaking_makes_exceptions() {
        let (mut graph, network, mut sdc, sink) = make_graph(2);
        sdc.variables.dynamic_loop_breaking = true;
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        graph.make_edge(a, b, TimingRole::Combinational, wire_arcs());
        graph.make_edge(b, a, TimingRole::Combinational, wire_arcs());

        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        let fingerprint = sdc.fingerprint();
        // A loop exception was recorded.
        let mut sdc2 = Sdc::new();
        sdc2.variables.dynamic_loop_breaking = true;
        assert_ne!(fingerprint, sdc2.fingerprint());
    }

    #[test]
    fn invalid_forces_relevelize() {
        let (mut graph, network, mut sdc, sink) = make_graph(2);
        let a = vertex(&mut graph, 0);
        let b = vertex(&mut graph, 1);
        graph.make_edge(a, b, TimingRole::Wire, wire_arcs());
        let mut levelize = Levelize::new();
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert!(levelize.levels_valid());
        levelize.invalid();
        assert!(!levelize.levels_valid());
        levelize
            .ensure_levelized(&mut graph, &network, &mut sdc, &sink)
            .unwrap();
        assert!(levelize.levels_valid());
    }
}
