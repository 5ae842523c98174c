//! Timing graph storage: vertices, edges, slews, and arc delays.

use crate::ids::{EdgeId, VertexId};
use chronos_common::{Delay, MinMax, RiseFall};
use chronos_network::{
    ArcModel, Arena, Network, PinId, PortDirection, TimingArcSet, TimingRole,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which BFS a vertex's in-queue flag belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BfsIndex {
    /// The forward (arrival) search.
    Arrival,
    /// The backward (required) search.
    Required,
    /// Miscellaneous traversals (downstream-clk marking and the like).
    Other,
}

impl BfsIndex {
    /// Number of BFS queues a vertex tracks.
    pub const COUNT: usize = 3;

    /// Dense index.
    pub fn index(self) -> usize {
        match self {
            BfsIndex::Arrival => 0,
            BfsIndex::Required => 1,
            BfsIndex::Other => 2,
        }
    }
}

/// A per-direction node of the timing graph.
///
/// Levels start at −1 (unlevelized). Slews are stored per (corner, rf,
/// min/max) with an annotated bit per (rf, min/max) locking externally
/// supplied values against recomputation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    /// The owning pin.
    pub pin: PinId,
    /// Topological level; −1 when unlevelized.
    pub level: i32,
    /// DFS visited mark (levelizer use).
    pub visited: bool,
    /// DFS on-path mark (levelizer use).
    pub on_path: bool,
    /// `true` for the driver-side vertex of a bidirect pin.
    pub is_bidirect_driver: bool,
    /// `true` when the pin clocks a register or latch.
    pub is_reg_clk: bool,
    /// `true` when a timing check edge ends here.
    pub has_checks: bool,
    /// `true` when a register clock pin is downstream of this vertex.
    pub has_downstream_clk_pin: bool,
    /// Index of the interned tag group holding this vertex's arrivals,
    /// if any. Maintained by the search.
    pub tag_group_index: Option<u32>,
    bfs_in_queue: [bool; BfsIndex::COUNT],
    slews: Vec<[[Delay; 2]; 2]>,
    slew_annotated: [[bool; 2]; 2],
    in_edges: Vec<EdgeId>,
    out_edges: Vec<EdgeId>,
    removed: bool,
}

impl Vertex {
    fn new(pin: PinId, is_bidirect_driver: bool, corner_count: usize) -> Self {
        Self {
            pin,
            level: -1,
            visited: false,
            on_path: false,
            is_bidirect_driver,
            is_reg_clk: false,
            has_checks: false,
            has_downstream_clk_pin: false,
            tag_group_index: None,
            bfs_in_queue: [false; BfsIndex::COUNT],
            slews: vec![[[0.0; 2]; 2]; corner_count],
            slew_annotated: [[false; 2]; 2],
            in_edges: Vec::new(),
            out_edges: Vec::new(),
            removed: false,
        }
    }

    /// The BFS in-queue flag for `bfs`.
    pub fn bfs_in_queue(&self, bfs: BfsIndex) -> bool {
        self.bfs_in_queue[bfs.index()]
    }

    /// Sets the BFS in-queue flag for `bfs`.
    pub fn set_bfs_in_queue(&mut self, bfs: BfsIndex, in_queue: bool) {
        self.bfs_in_queue[bfs.index()] = in_queue;
    }

    /// The slew for `(corner, rf, min_max)`.
    pub fn slew(&self, corner: usize, rf: RiseFall, min_max: MinMax) -> Delay {
        self.slews[corner][rf.index()][min_max.index()]
    }

    /// Whether the slew for `(rf, min_max)` was externally annotated.
    pub fn slew_annotated(&self, rf: RiseFall, min_max: MinMax) -> bool {
        self.slew_annotated[rf.index()][min_max.index()]
    }
}

/// One (from-transition, to-transition) arc of an edge, with its
/// per-corner delay model. Wire arcs carry no model; their delay comes
/// from the reduced parasitic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeArc {
    /// Transition at the edge's source vertex.
    pub from_rf: RiseFall,
    /// Transition at the edge's destination vertex.
    pub to_rf: RiseFall,
    /// Delay model per corner; empty for wire arcs.
    pub models: Vec<ArcModel>,
}

impl EdgeArc {
    /// The delay model for `corner`, defaulting to zero for wire arcs.
    pub fn model(&self, corner: usize) -> ArcModel {
        self.models
            .get(corner)
            .or_else(|| self.models.last())
            .copied()
            .unwrap_or_default()
    }
}

/// A directed timing graph edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    /// Source vertex.
    pub from: VertexId,
    /// Destination vertex.
    pub to: VertexId,
    /// What this edge models.
    pub role: TimingRole,
    /// The per-transition arcs of this edge.
    pub arcs: Vec<EdgeArc>,
    /// Set by the levelizer on the back edge of a feedback loop.
    pub is_disabled_loop: bool,
    /// Set when a constraint disables this edge.
    pub is_disabled_constraint: bool,
    /// The implicit zero-delay path from a bidirect pin's load vertex to
    /// its driver vertex.
    pub is_bidirect_inst_path: bool,
    // Indexed [arc * corner_count * 2 + corner * 2 + min_max].
    arc_delays: Vec<Delay>,
    arc_delay_annotated: Vec<bool>,
    removed: bool,
}

impl Edge {
    /// Returns the indices of the (at most two) arcs leaving `from_rf`,
    /// one per destination transition.
    pub fn arcs_from(&self, from_rf: RiseFall) -> (Option<usize>, Option<usize>) {
        let mut rise = None;
        let mut fall = None;
        for (i, arc) in self.arcs.iter().enumerate() {
            if arc.from_rf == from_rf {
                match arc.to_rf {
                    RiseFall::Rise => rise = Some(i),
                    RiseFall::Fall => fall = Some(i),
                }
            }
        }
        (rise, fall)
    }
}

/// The timing graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Graph {
    vertices: Arena<VertexId, Vertex>,
    edges: Arena<EdgeId, Edge>,
    #[serde(skip)]
    pin_map: HashMap<PinId, (VertexId, Option<VertexId>)>,
    corner_count: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Graph {
    /// Creates an empty graph analyzed across `corner_count` corners.
    pub fn new(corner_count: usize) -> Self {
        Self {
            vertices: Arena::new(),
            edges: Arena::new(),
            pin_map: HashMap::new(),
            corner_count: corner_count.max(1),
        }
    }

    /// Number of analysis corners.
    pub fn corner_count(&self) -> usize {
        self.corner_count
    }

    /// Creates the vertex (or vertex pair, for bidirect pins) for `pin`.
    pub fn make_pin_vertices(&mut self, pin: PinId, direction: PortDirection) -> VertexId {
        let vertex = self
            .vertices
            .alloc(Vertex::new(pin, false, self.corner_count));
        let drvr = if direction.is_bidirect() {
            Some(
                self.vertices
                    .alloc(Vertex::new(pin, true, self.corner_count)),
            )
        } else {
            None
        };
        self.pin_map.insert(pin, (vertex, drvr));
        vertex
    }

    /// The load-side and (for bidirects) driver-side vertices of `pin`.
    pub fn pin_vertices(&self, pin: PinId) -> Option<(VertexId, Option<VertexId>)> {
        self.pin_map.get(&pin).copied()
    }

    /// The vertex that loads on `pin`'s net.
    pub fn pin_load_vertex(&self, pin: PinId) -> Option<VertexId> {
        self.pin_map.get(&pin).map(|&(load, _)| load)
    }

    /// The vertex that drives from `pin`: the driver vertex for bidirects,
    /// otherwise the pin's only vertex.
    pub fn pin_drvr_vertex(&self, pin: PinId) -> Option<VertexId> {
        self.pin_map.get(&pin).map(|&(load, drvr)| drvr.unwrap_or(load))
    }

    /// Creates an edge; its delay tables start unannotated at zero.
    pub fn make_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        role: TimingRole,
        arcs: Vec<EdgeArc>,
    ) -> EdgeId {
        let slots = arcs.len() * self.corner_count * MinMax::COUNT;
        let edge = self.edges.alloc(Edge {
            from,
            to,
            role,
            arcs,
            is_disabled_loop: false,
            is_disabled_constraint: false,
            is_bidirect_inst_path: false,
            arc_delays: vec![0.0; slots],
            arc_delay_annotated: vec![false; slots],
            removed: false,
        });
        self.vertices[from].out_edges.push(edge);
        self.vertices[to].in_edges.push(edge);
        edge
    }

    /// The vertex record.
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    /// The mutable vertex record.
    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v]
    }

    /// The edge record.
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e]
    }

    /// The mutable edge record.
    pub fn edge_mut(&mut self, e: EdgeId) -> &mut Edge {
        &mut self.edges[e]
    }

    /// Iterates live vertices.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .filter(|(_, v)| !v.removed)
            .map(|(id, _)| id)
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.values().filter(|v| !v.removed).count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().filter(|e| !e.removed).count()
    }

    /// The live edges into `v`.
    pub fn in_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertices[v]
            .in_edges
            .iter()
            .copied()
            .filter(|&e| !self.edges[e].removed)
            .collect()
    }

    /// The live edges out of `v`.
    pub fn out_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.vertices[v]
            .out_edges
            .iter()
            .copied()
            .filter(|&e| !self.edges[e].removed)
            .collect()
    }

    /// Returns `true` when `v` has exactly one live fanin edge.
    pub fn has_fanin_one(&self, v: VertexId) -> bool {
        self.in_edges(v).len() == 1
    }

    /// Detaches and removes an edge.
    pub fn delete_edge(&mut self, e: EdgeId) {
        let (from, to) = {
            let edge = &self.edges[e];
            (edge.from, edge.to)
        };
        self.vertices[from].out_edges.retain(|&x| x != e);
        self.vertices[to].in_edges.retain(|&x| x != e);
        self.edges[e].removed = true;
    }

    /// Detaches all of a vertex's edges, then removes the vertex.
    pub fn delete_vertex(&mut self, v: VertexId) {
        for e in self.in_edges(v) {
            self.delete_edge(e);
        }
        for e in self.out_edges(v) {
            self.delete_edge(e);
        }
        let pin = self.vertices[v].pin;
        if let Some(&(load, drvr)) = self.pin_map.get(&pin) {
            if load == v && drvr.is_none() {
                self.pin_map.remove(&pin);
            }
        }
        self.vertices[v].removed = true;
    }

    fn delay_index(&self, edge: &Edge, arc: usize, corner: usize, min_max: MinMax) -> usize {
        debug_assert!(arc < edge.arcs.len());
        (arc * self.corner_count + corner) * MinMax::COUNT + min_max.index()
    }

    /// The cached delay of `(edge, arc, corner, min_max)`.
    pub fn arc_delay(&self, e: EdgeId, arc: usize, corner: usize, min_max: MinMax) -> Delay {
        let edge = &self.edges[e];
        edge.arc_delays[self.delay_index(edge, arc, corner, min_max)]
    }

    /// Stores a computed delay unless the slot is annotated.
    pub fn set_arc_delay(
        &mut self,
        e: EdgeId,
        arc: usize,
        corner: usize,
        min_max: MinMax,
        delay: Delay,
    ) {
        let index = self.delay_index(&self.edges[e], arc, corner, min_max);
        let edge = &mut self.edges[e];
        if !edge.arc_delay_annotated[index] {
            edge.arc_delays[index] = delay;
        }
    }

    /// Stores an externally annotated delay and locks the slot.
    pub fn set_arc_delay_annotated(
        &mut self,
        e: EdgeId,
        arc: usize,
        corner: usize,
        min_max: MinMax,
        delay: Delay,
    ) {
        let index = self.delay_index(&self.edges[e], arc, corner, min_max);
        let edge = &mut self.edges[e];
        edge.arc_delays[index] = delay;
        edge.arc_delay_annotated[index] = true;
    }

    /// Whether `(edge, arc, corner, min_max)` carries an annotated delay.
    pub fn arc_delay_annotated(
        &self,
        e: EdgeId,
        arc: usize,
        corner: usize,
        min_max: MinMax,
    ) -> bool {
        let edge = &self.edges[e];
        edge.arc_delay_annotated[self.delay_index(edge, arc, corner, min_max)]
    }

    /// Stores a computed slew unless the slot is annotated.
    pub fn set_slew(
        &mut self,
        v: VertexId,
        corner: usize,
        rf: RiseFall,
        min_max: MinMax,
        slew: Delay,
    ) {
        let vertex = &mut self.vertices[v];
        if !vertex.slew_annotated[rf.index()][min_max.index()] {
            vertex.slews[corner][rf.index()][min_max.index()] = slew;
        }
    }

    /// Stores an externally annotated slew and locks the slot.
    pub fn set_slew_annotated(
        &mut self,
        v: VertexId,
        corner: usize,
        rf: RiseFall,
        min_max: MinMax,
        slew: Delay,
    ) {
        let vertex = &mut self.vertices[v];
        vertex.slews[corner][rf.index()][min_max.index()] = slew;
        vertex.slew_annotated[rf.index()][min_max.index()] = true;
    }

    /// Builds the timing graph for a netlist: cell edges from timing arc
    /// sets, wire edges from net drivers to loads, and the implicit
    /// zero-delay load-to-driver edge of each bidirect pin.
    pub fn build(network: &Network, corner_count: usize) -> Graph {
        let mut graph = Graph::new(corner_count);

        // Vertices for every pin.
        for pin in network.pins() {
            let direction = network.direction(pin);
            if direction.is_internal() {
                continue;
            }
            graph.make_pin_vertices(pin, direction);
        }

        // Cell edges and vertex flags.
        let mut cell_edges: Vec<(VertexId, VertexId, TimingRole, Vec<EdgeArc>)> = Vec::new();
        for pin in network.pins() {
            let record = network.pin(pin);
            let Some(cell) = network.liberty_cell(record.instance) else {
                continue;
            };
            let Some(to_port) = record.port else {
                continue;
            };
            for set in cell.arc_sets_to(to_port) {
                let Some(from_pin) = find_instance_pin(network, record.instance, set.from_port)
                else {
                    continue;
                };
                let (Some(from_v), Some(to_v)) = (
                    graph.pin_load_vertex(from_pin),
                    edge_target_vertex(&graph, network, pin, set),
                ) else {
                    continue;
                };
                cell_edges.push((from_v, to_v, set.role, clone_arcs(set)));
            }
        }
        for (from, to, role, arcs) in cell_edges {
            let e = graph.make_edge(from, to, role, arcs);
            match role {
                r if r.is_timing_check() => {
                    let to = graph.edge(e).to;
                    graph.vertex_mut(to).has_checks = true;
                    let from = graph.edge(e).from;
                    graph.vertex_mut(from).is_reg_clk = true;
                }
                TimingRole::RegClkToQ | TimingRole::LatchEnToQ => {
                    let from = graph.edge(e).from;
                    graph.vertex_mut(from).is_reg_clk = true;
                }
                _ => {}
            }
        }

        // Wire edges per net.
        for net in network.nets() {
            for drvr in network.drivers(net) {
                let Some(from_v) = graph.pin_drvr_vertex(drvr) else {
                    continue;
                };
                for load in network.loads(net) {
                    let Some(to_v) = graph.pin_load_vertex(load) else {
                        continue;
                    };
                    graph.make_edge(from_v, to_v, TimingRole::Wire, wire_arcs());
                }
            }
        }

        // Implicit bidirect load -> driver edge.
        let bidirect_pairs: Vec<(VertexId, VertexId)> = graph
            .pin_map
            .values()
            .filter_map(|&(load, drvr)| drvr.map(|d| (load, d)))
            .collect();
        for (load, drvr) in bidirect_pairs {
            let e = graph.make_edge(load, drvr, TimingRole::Wire, wire_arcs());
            graph.edge_mut(e).is_bidirect_inst_path = true;
        }

        graph
    }
}

fn find_instance_pin(
    network: &Network,
    inst: chronos_network::InstanceId,
    port: chronos_network::PortId,
) -> Option<PinId> {
    network
        .instance(inst)
        .pins
        .iter()
        .copied()
        .find(|&p| network.pin(p).port == Some(port))
}

// Cell arcs drive the output pin; a bidirect output targets its driver
// vertex so the arc joins the pin's driving side.
fn edge_target_vertex(
    graph: &Graph,
    network: &Network,
    to_pin: PinId,
    set: &TimingArcSet,
) -> Option<VertexId> {
    if set.role.is_timing_check() {
        graph.pin_load_vertex(to_pin)
    } else if network.direction(to_pin).is_bidirect() {
        graph.pin_drvr_vertex(to_pin)
    } else {
        graph.pin_load_vertex(to_pin)
    }
}

fn clone_arcs(set: &TimingArcSet) -> Vec<EdgeArc> {
    set.arcs
        .iter()
        .map(|arc| EdgeArc {
            from_rf: arc.from_rf,
            to_rf: arc.to_rf,
            models: arc.models.clone(),
        })
        .collect()
}

/// The two same-transition arcs of a wire edge.
pub fn wire_arcs() -> Vec<EdgeArc> {
    RiseFall::both()
        .into_iter()
        .map(|rf| EdgeArc {
            from_rf: rf,
            to_rf: rf,
            models: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronos_common::Interner;
    use chronos_network::{
        unate_arcs, LibertyCell, LibertyPort, TimingArc, TimingSense,
    };

    fn buf_lib(interner: &Interner, network: &mut Network) -> chronos_network::CellId {
        let mut cell = LibertyCell::new(interner.get_or_intern("BUFX2"));
        let a = cell.add_port(LibertyPort::new(
            interner.get_or_intern("A"),
            PortDirection::Input,
            1e-15,
        ));
        let y = cell.add_port(LibertyPort::new(
            interner.get_or_intern("Y"),
            PortDirection::Output,
            0.0,
        ));
        cell.add_arc_set(TimingArcSet {
            from_port: a,
            to_port: y,
            role: TimingRole::Combinational,
            sense: TimingSense::PositiveUnate,
            arcs: unate_arcs(
                TimingSense::PositiveUnate,
                ArcModel {
                    intrinsic: 100e-12,
                    resistance: 0.0,
                },
            ),
        });
        network.library.add_cell(cell)
    }

    fn dff_lib(interner: &Interner, network: &mut Network) -> chronos_network::CellId {
        let mut cell = LibertyCell::new(interner.get_or_intern("DFFX1"));
        let ck = cell.add_port(LibertyPort::new(
            interner.get_or_intern("CK"),
            PortDirection::Input,
            1e-15,
        ));
        let d = cell.add_port(LibertyPort::new(
            interner.get_or_intern("D"),
            PortDirection::Input,
            1e-15,
        ));
        let q = cell.add_port(LibertyPort::new(
            interner.get_or_intern("Q"),
            PortDirection::Output,
            0.0,
        ));
        cell.add_arc_set(TimingArcSet {
            from_port: ck,
            to_port: q,
            role: TimingRole::RegClkToQ,
            sense: TimingSense::NonUnate,
            arcs: vec![TimingArc {
                from_rf: RiseFall::Rise,
                to_rf: RiseFall::Rise,
                models: vec![ArcModel {
                    intrinsic: 150e-12,
                    resistance: 0.0,
                }],
            }],
        });
        cell.add_arc_set(TimingArcSet {
            from_port: ck,
            to_port: d,
            role: TimingRole::SetupCheck,
            sense: TimingSense::NonUnate,
            arcs: vec![TimingArc {
                from_rf: RiseFall::Rise,
                to_rf: RiseFall::Rise,
                models: vec![ArcModel {
                    intrinsic: 50e-12,
                    resistance: 0.0,
                }],
            }],
        });
        network.library.add_cell(cell)
    }

    #[test]
    fn build_simple_buffer_chain() {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        let buf = buf_lib(&interner, &mut network);
        let u1 = network.make_instance(interner.get_or_intern("u1"), buf);
        let input = network.make_top_port(interner.get_or_intern("in"), PortDirection::Input);
        let output = network.make_top_port(interner.get_or_intern("out"), PortDirection::Output);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        let y = network.find_pin(u1, interner.get_or_intern("Y")).unwrap();
        let n1 = network.make_net(interner.get_or_intern("n1"));
        let n2 = network.make_net(interner.get_or_intern("n2"));
        network.connect(input, n1);
        network.connect(a, n1);
        network.connect(y, n2);
        network.connect(output, n2);

        let graph = Graph::build(&network, 1);
        // in, u1/A, u1/Y, out.
        assert_eq!(graph.vertex_count(), 4);
        // wire in->A, cell A->Y, wire Y->out.
        assert_eq!(graph.edge_count(), 3);

        let a_v = graph.pin_load_vertex(a).unwrap();
        let cell_edges = graph.out_edges(a_v);
        assert_eq!(cell_edges.len(), 1);
        assert_eq!(graph.edge(cell_edges[0]).role, TimingRole::Combinational);
    }

    #[test]
    fn build_flags_reg_clk_and_checks() {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        let dff = dff_lib(&interner, &mut network);
        let r1 = network.make_instance(interner.get_or_intern("r1"), dff);
        let ck = network.find_pin(r1, interner.get_or_intern("CK")).unwrap();
        let d = network.find_pin(r1, interner.get_or_intern("D")).unwrap();

        let graph = Graph::build(&network, 1);
        let ck_v = graph.pin_load_vertex(ck).unwrap();
        let d_v = graph.pin_load_vertex(d).unwrap();
        assert!(graph.vertex(ck_v).is_reg_clk);
        assert!(graph.vertex(d_v).has_checks);
        assert!(!graph.vertex(d_v).is_reg_clk);
    }

    #[test]
    fn arc_delay_annotation_locks() {
        let mut graph = Graph::new(1);
        let pin = PinId::from_raw(0);
        let v1 = graph.make_pin_vertices(pin, PortDirection::Input);
        let v2 = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Output);
        let e = graph.make_edge(v1, v2, TimingRole::Wire, wire_arcs());

        graph.set_arc_delay(e, 0, 0, MinMax::Max, 1e-9);
        assert_eq!(graph.arc_delay(e, 0, 0, MinMax::Max), 1e-9);

        graph.set_arc_delay_annotated(e, 0, 0, MinMax::Max, 2e-9);
        assert!(graph.arc_delay_annotated(e, 0, 0, MinMax::Max));
        // Computed values no longer overwrite.
        graph.set_arc_delay(e, 0, 0, MinMax::Max, 3e-9);
        assert_eq!(graph.arc_delay(e, 0, 0, MinMax::Max), 2e-9);
        // Other slots are unaffected.
        assert!(!graph.arc_delay_annotated(e, 0, 0, MinMax::Min));
        assert_eq!(graph.arc_delay(e, 0, 0, MinMax::Min), 0.0);
    }

    #[test]
    fn slew_annotation_locks() {
        let mut graph = Graph::new(2);
        let v = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        graph.set_slew(v, 1, RiseFall::Fall, MinMax::Min, 5e-11);
        assert_eq!(graph.vertex(v).slew(1, RiseFall::Fall, MinMax::Min), 5e-11);
        graph.set_slew_annotated(v, 1, RiseFall::Fall, MinMax::Min, 7e-11);
        graph.set_slew(v, 1, RiseFall::Fall, MinMax::Min, 9e-11);
        assert_eq!(graph.vertex(v).slew(1, RiseFall::Fall, MinMax::Min), 7e-11);
        assert!(graph.vertex(v).slew_annotated(RiseFall::Fall, MinMax::Min));
    }

    #[test]
    fn bidirect_pin_gets_two_vertices_and_implicit_edge() {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        let io = network.make_top_port(interner.get_or_intern("io"), PortDirection::Bidirect);

        let graph = Graph::build(&network, 1);
        let (load, drvr) = graph.pin_vertices(io).unwrap();
        let drvr = drvr.expect("bidirect pin needs a driver vertex");
        assert!(graph.vertex(drvr).is_bidirect_driver);
        assert!(!graph.vertex(load).is_bidirect_driver);

        let implicit = graph.out_edges(load);
        assert_eq!(implicit.len(), 1);
        let e = graph.edge(implicit[0]);
        assert!(e.is_bidirect_inst_path);
        assert_eq!(e.to, drvr);
    }

    #[test]
    fn delete_edge_detaches() {
        let mut graph = Graph::new(1);
        let v1 = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        let v2 = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Output);
        let e = graph.make_edge(v1, v2, TimingRole::Wire, wire_arcs());
        assert_eq!(graph.out_edges(v1).len(), 1);
        graph.delete_edge(e);
        assert!(graph.out_edges(v1).is_empty());
        assert!(graph.in_edges(v2).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn delete_vertex_detaches_edges_first() {
        let mut graph = Graph::new(1);
        let v1 = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        let v2 = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Output);
        let v3 = graph.make_pin_vertices(PinId::from_raw(2), PortDirection::Output);
        graph.make_edge(v1, v2, TimingRole::Wire, wire_arcs());
        graph.make_edge(v2, v3, TimingRole::Wire, wire_arcs());
        graph.delete_vertex(v2);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.out_edges(v1).is_empty());
        assert!(graph.in_edges(v3).is_empty());
    }

    #[test]
    fn fanin_one() {
        let mut graph = Graph::new(1);
        let v1 = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        let v2 = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Input);
        let v3 = graph.make_pin_vertices(PinId::from_raw(2), PortDirection::Output);
        graph.make_edge(v1, v3, TimingRole::Wire, wire_arcs());
        assert!(graph.has_fanin_one(v3));
        graph.make_edge(v2, v3, TimingRole::Wire, wire_arcs());
        assert!(!graph.has_fanin_one(v3));
    }

    #[test]
    fn edge_arcs_from() {
        let mut graph = Graph::new(1);
        let v1 = graph.make_pin_vertices(PinId::from_raw(0), PortDirection::Input);
        let v2 = graph.make_pin_vertices(PinId::from_raw(1), PortDirection::Output);
        let e = graph.make_edge(v1, v2, TimingRole::Wire, wire_arcs());
        let (rise, fall) = graph.edge(e).arcs_from(RiseFall::Rise);
        assert!(rise.is_some());
        assert!(fall.is_none());
        let arc = &graph.edge(e).arcs[rise.unwrap()];
        assert_eq!(arc.to_rf, RiseFall::Rise);
    }
}
