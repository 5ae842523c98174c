//! RC network storage and build interface.
//!
//! Nodes are identified by {net, sub-id} for internal extraction nodes or by
//! {pin} for connection points. Ground capacitance accumulates on nodes;
//! two-terminal capacitor devices between non-ground nodes are coupling
//! capacitors, folded into effective ground capacitance by a per-corner
//! coupling factor during reduction.

use crate::reduced::Reduced;
use chronos_common::{MinMax, RiseFall};
use chronos_network::{Arena, ArenaId, NetId, Network, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque, copyable ID for a node within one parasitic network.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ParasiticNodeId(u32);

impl ArenaId for ParasiticNodeId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// How a parasitic node is named: an extractor sub-node of the net, or a
/// pin connection point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeIdent {
    /// Internal node `id` of `net` (SPEF `net:id` style).
    NetSub {
        /// The owning net.
        net: NetId,
        /// Extractor-assigned sub-node number.
        id: u32,
    },
    /// The node at a pin.
    Pin(PinId),
}

/// One node of a parasitic network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticNode {
    /// The node's identity.
    pub ident: NodeIdent,
    /// Accumulated capacitance to ground, in farads.
    pub gnd_cap: f32,
    /// `true` for nodes belonging to a different net (the far side of a
    /// coupling capacitor).
    pub is_external: bool,
}

impl ParasiticNode {
    /// The pin behind this node, if it is a pin node.
    pub fn pin(&self) -> Option<PinId> {
        match self.ident {
            NodeIdent::Pin(pin) => Some(pin),
            NodeIdent::NetSub { .. } => None,
        }
    }
}

/// A two-terminal resistor device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticResistor {
    /// Extractor-assigned device id.
    pub id: usize,
    /// Resistance in ohms.
    pub value: f32,
    /// First terminal.
    pub node1: ParasiticNodeId,
    /// Second terminal.
    pub node2: ParasiticNodeId,
}

impl ParasiticResistor {
    /// The terminal opposite `node`.
    pub fn other_node(&self, node: ParasiticNodeId) -> ParasiticNodeId {
        if node == self.node1 {
            self.node2
        } else {
            self.node1
        }
    }
}

/// A two-terminal coupling capacitor device.
///
/// Ground capacitance is accumulated on nodes instead; every capacitor
/// device couples two non-ground nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticCapacitor {
    /// Extractor-assigned device id.
    pub id: usize,
    /// Capacitance in farads.
    pub value: f32,
    /// First terminal.
    pub node1: ParasiticNodeId,
    /// Second terminal (often on an aggressor net).
    pub node2: ParasiticNodeId,
}

/// The RC graph annotated on one net for one analysis corner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParasiticNetwork {
    /// The annotated net.
    pub net: NetId,
    /// `true` when load pin capacitances are already folded into node
    /// ground capacitances.
    pub includes_pin_caps: bool,
    nodes: Arena<ParasiticNodeId, ParasiticNode>,
    resistors: Vec<ParasiticResistor>,
    capacitors: Vec<ParasiticCapacitor>,
    #[serde(skip)]
    node_index: HashMap<NodeIdent, ParasiticNodeId>,
    sub_node_next: u32,
}

impl ParasiticNetwork {
    /// Creates an empty parasitic network for `net`.
    pub fn new(net: NetId, includes_pin_caps: bool) -> Self {
        Self {
            net,
            includes_pin_caps,
            nodes: Arena::new(),
            resistors: Vec::new(),
            capacitors: Vec::new(),
            node_index: HashMap::new(),
            sub_node_next: 0,
        }
    }

    /// Finds or creates the node `{net, id}`.
    pub fn ensure_net_node(&mut self, net: NetId, id: u32) -> ParasiticNodeId {
        let ident = NodeIdent::NetSub { net, id };
        let is_external = net != self.net;
        self.ensure_node(ident, is_external)
    }

    /// Finds or creates the node at `pin`.
    pub fn ensure_pin_node(&mut self, pin: PinId) -> ParasiticNodeId {
        self.ensure_node(NodeIdent::Pin(pin), false)
    }

    fn ensure_node(&mut self, ident: NodeIdent, is_external: bool) -> ParasiticNodeId {
        if let Some(&id) = self.node_index.get(&ident) {
            return id;
        }
        if let NodeIdent::NetSub { net, id } = ident {
            if net == self.net {
                self.sub_node_next = self.sub_node_next.max(id + 1);
            }
        }
        let id = self.nodes.alloc(ParasiticNode {
            ident,
            gnd_cap: 0.0,
            is_external,
        });
        self.node_index.insert(ident, id);
        id
    }

    /// Finds the node at `pin`, if present.
    pub fn find_pin_node(&self, pin: PinId) -> Option<ParasiticNodeId> {
        self.node_index.get(&NodeIdent::Pin(pin)).copied()
    }

    /// Adds `cap` farads of ground capacitance to `node`.
    pub fn incr_cap(&mut self, node: ParasiticNodeId, cap: f32) {
        self.nodes[node].gnd_cap += cap;
    }

    /// The ground capacitance accumulated on `node`.
    pub fn node_gnd_cap(&self, node: ParasiticNodeId) -> f32 {
        self.nodes[node].gnd_cap
    }

    /// The node record.
    pub fn node(&self, node: ParasiticNodeId) -> &ParasiticNode {
        &self.nodes[node]
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a resistor device between two nodes of this network.
    pub fn make_resistor(
        &mut self,
        id: usize,
        value: f32,
        node1: ParasiticNodeId,
        node2: ParasiticNodeId,
    ) {
        self.resistors.push(ParasiticResistor {
            id,
            value,
            node1,
            node2,
        });
    }

    /// Adds a coupling capacitor device between two nodes.
    pub fn make_capacitor(
        &mut self,
        id: usize,
        value: f32,
        node1: ParasiticNodeId,
        node2: ParasiticNodeId,
    ) {
        self.capacitors.push(ParasiticCapacitor {
            id,
            value,
            node1,
            node2,
        });
    }

    /// All resistor devices.
    pub fn resistors(&self) -> &[ParasiticResistor] {
        &self.resistors
    }

    /// All coupling capacitor devices.
    pub fn capacitors(&self) -> &[ParasiticCapacitor] {
        &self.capacitors
    }

    /// Builds the node → incident-resistor index (resistor indices into
    /// [`resistors`](Self::resistors)).
    pub fn node_resistor_map(&self) -> Vec<Vec<usize>> {
        let mut map = vec![Vec::new(); self.nodes.len()];
        for (i, r) in self.resistors.iter().enumerate() {
            map[r.node1.as_raw() as usize].push(i);
            if r.node2 != r.node1 {
                map[r.node2.as_raw() as usize].push(i);
            }
        }
        map
    }

    /// Builds the node → incident-coupling-capacitor index.
    pub fn node_capacitor_map(&self) -> Vec<Vec<usize>> {
        let mut map = vec![Vec::new(); self.nodes.len()];
        for (i, c) in self.capacitors.iter().enumerate() {
            map[c.node1.as_raw() as usize].push(i);
            if c.node2 != c.node1 {
                map[c.node2.as_raw() as usize].push(i);
            }
        }
        map
    }

    /// Total capacitance of the network: ground caps plus coupling caps at
    /// full value.
    pub fn capacitance(&self) -> f32 {
        let gnd: f32 = self.nodes.values().map(|n| n.gnd_cap).sum();
        let coupling: f32 = self.capacitors.iter().map(|c| c.value).sum();
        gnd + coupling
    }

    /// Replaces the node at `pin` with a fresh sub-node of the same net,
    /// preserving all devices, so the pin can be disconnected during
    /// netlist surgery without collapsing the topology.
    pub fn disconnect_pin_before(&mut self, pin: PinId) {
        let ident = NodeIdent::Pin(pin);
        if let Some(&node) = self.node_index.get(&ident) {
            self.node_index.remove(&ident);
            let new_ident = NodeIdent::NetSub {
                net: self.net,
                id: self.sub_node_next,
            };
            self.sub_node_next += 1;
            self.nodes[node].ident = new_ident;
            self.node_index.insert(new_ident, node);
        }
    }

    /// Rebuilds the identity index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .map(|(id, node)| (node.ident, id))
            .collect();
    }
}

/// Per-driver reduced parasitics, indexed by (corner, min/max, rise/fall).
type DrvrReducedMap = HashMap<PinId, Vec<Option<Reduced>>>;

/// The per-corner parasitic store: one RC network per (net, corner) and the
/// reduced driving-point models derived from them.
///
/// Deleting a network transitively drops its nodes and devices; callers
/// reach them only through this container, so no dangling references
/// survive an edit.
#[derive(Clone, Debug)]
pub struct Parasitics {
    networks: HashMap<(NetId, usize), ParasiticNetwork>,
    drvr_map: DrvrReducedMap,
    corner_count: usize,
}

impl Default for Parasitics {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Parasitics {
    /// Creates an empty store for `corner_count` analysis corners.
    pub fn new(corner_count: usize) -> Self {
        Self {
            networks: HashMap::new(),
            drvr_map: HashMap::new(),
            corner_count: corner_count.max(1),
        }
    }

    /// Returns `true` if any parasitic network has been annotated.
    pub fn have_parasitics(&self) -> bool {
        !self.networks.is_empty()
    }

    /// Creates (or replaces) the network for `(net, corner)`.
    pub fn make_network(
        &mut self,
        net: NetId,
        corner: usize,
        includes_pin_caps: bool,
    ) -> &mut ParasiticNetwork {
        self.networks
            .insert((net, corner), ParasiticNetwork::new(net, includes_pin_caps));
        self.networks.get_mut(&(net, corner)).unwrap()
    }

    /// Finds the network for `(net, corner)`.
    pub fn find_network(&self, net: NetId, corner: usize) -> Option<&ParasiticNetwork> {
        self.networks.get(&(net, corner))
    }

    /// Deletes the network for `net` in every corner, with its devices and
    /// nodes, and any reduced models derived from it.
    pub fn delete_network(&mut self, net: NetId, network: &Network) {
        self.networks.retain(|&(n, _), _| n != net);
        self.delete_reduced_parasitics(net, network);
    }

    fn reduced_index(&self, corner: usize, min_max: MinMax, rf: RiseFall) -> usize {
        (corner * MinMax::COUNT + min_max.index()) * RiseFall::COUNT + rf.index()
    }

    /// Stores a reduced model for `drvr_pin` at `(corner, min_max, rf)`.
    pub fn set_reduced(
        &mut self,
        drvr_pin: PinId,
        corner: usize,
        min_max: MinMax,
        rf: RiseFall,
        reduced: Reduced,
    ) {
        let slots = self.corner_count * MinMax::COUNT * RiseFall::COUNT;
        let index = self.reduced_index(corner, min_max, rf);
        let entry = self
            .drvr_map
            .entry(drvr_pin)
            .or_insert_with(|| vec![None; slots]);
        entry[index] = Some(reduced);
    }

    /// Looks up the reduced model for `drvr_pin` at `(corner, min_max, rf)`.
    pub fn find_reduced(
        &self,
        drvr_pin: PinId,
        corner: usize,
        min_max: MinMax,
        rf: RiseFall,
    ) -> Option<&Reduced> {
        let index = self.reduced_index(corner, min_max, rf);
        self.drvr_map.get(&drvr_pin)?.get(index)?.as_ref()
    }

    /// Deletes the reduced models of every driver of `net`.
    pub fn delete_reduced_parasitics(&mut self, net: NetId, network: &Network) {
        for drvr in network.drivers(net) {
            self.drvr_map.remove(&drvr);
        }
    }

    /// Deletes the reduced models owned by one driver pin.
    pub fn delete_drvr_reduced_parasitics(&mut self, drvr_pin: PinId) {
        self.drvr_map.remove(&drvr_pin);
    }

    /// A load pin's capacitance changed: every reduced model whose topology
    /// folded that pin cap is stale.
    pub fn load_pin_capacitance_changed(&mut self, pin: PinId, network: &Network) {
        if let Some(net) = network.pin_net(pin) {
            self.delete_reduced_parasitics(net, network);
        }
    }

    /// Rewires the pin's node in every corner's network before a disconnect.
    pub fn disconnect_pin_before(&mut self, pin: PinId, network: &Network) {
        if let Some(net) = network.pin_net(pin) {
            for corner in 0..self.corner_count {
                if let Some(pn) = self.networks.get_mut(&(net, corner)) {
                    pn.disconnect_pin_before(pin);
                }
            }
            self.delete_reduced_parasitics(net, network);
        }
    }

    /// The load pins of `drvr_pin`'s net that have no Elmore entry in its
    /// reduced model.
    pub fn unannotated_loads(
        &self,
        drvr_pin: PinId,
        corner: usize,
        min_max: MinMax,
        rf: RiseFall,
        network: &Network,
    ) -> Vec<PinId> {
        let Some(net) = network.pin_net(drvr_pin) else {
            return Vec::new();
        };
        let loads = network.loads(net);
        match self.find_reduced(drvr_pin, corner, min_max, rf) {
            Some(Reduced::PiElmore(pi_elmore)) => loads
                .into_iter()
                .filter(|&l| pi_elmore.elmore(l).is_none())
                .collect(),
            Some(Reduced::PiPoleResidue(pr)) => loads
                .into_iter()
                .filter(|&l| pr.pole_residue(l).is_none())
                .collect(),
            None => loads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronos_common::Interner;
    use chronos_network::{LibertyCell, LibertyPort, PortDirection};

    fn two_pin_net() -> (Network, NetId, PinId, PinId) {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        let mut cell = LibertyCell::new(interner.get_or_intern("BUFX2"));
        cell.add_port(LibertyPort::new(
            interner.get_or_intern("A"),
            PortDirection::Input,
            1e-15,
        ));
        cell.add_port(LibertyPort::new(
            interner.get_or_intern("Y"),
            PortDirection::Output,
            0.0,
        ));
        let buf = network.library.add_cell(cell);
        let u1 = network.make_instance(interner.get_or_intern("u1"), buf);
        let u2 = network.make_instance(interner.get_or_intern("u2"), buf);
        let y = network.find_pin(u1, interner.get_or_intern("Y")).unwrap();
        let a = network.find_pin(u2, interner.get_or_intern("A")).unwrap();
        let net = network.make_net(interner.get_or_intern("n1"));
        network.connect(y, net);
        network.connect(a, net);
        (network, net, y, a)
    }

    #[test]
    fn ensure_node_dedups() {
        let (_, net, _, _) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let n1 = pn.ensure_net_node(net, 1);
        let n2 = pn.ensure_net_node(net, 1);
        assert_eq!(n1, n2);
        assert_eq!(pn.node_count(), 1);
    }

    #[test]
    fn gnd_cap_accumulates() {
        let (_, net, _, a) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let node = pn.ensure_pin_node(a);
        pn.incr_cap(node, 1e-13);
        pn.incr_cap(node, 2e-13);
        assert!((pn.node_gnd_cap(node) - 3e-13).abs() < 1e-20);
    }

    #[test]
    fn external_coupling_node() {
        let (_, net, _, _) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let aggressor = NetId::from_raw(99);
        let ext = pn.ensure_net_node(aggressor, 0);
        assert!(pn.node(ext).is_external);
    }

    #[test]
    fn total_capacitance() {
        let (_, net, y, a) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let n1 = pn.ensure_pin_node(y);
        let n2 = pn.ensure_pin_node(a);
        pn.incr_cap(n1, 1e-13);
        pn.incr_cap(n2, 2e-13);
        let ext = pn.ensure_net_node(NetId::from_raw(99), 0);
        pn.make_capacitor(0, 5e-14, n2, ext);
        assert!((pn.capacitance() - 3.5e-13).abs() < 1e-20);
    }

    #[test]
    fn disconnect_pin_rewires_node() {
        let (_, net, _, a) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let sub = pn.ensure_net_node(net, 0);
        let pin_node = pn.ensure_pin_node(a);
        pn.make_resistor(0, 100.0, sub, pin_node);
        pn.disconnect_pin_before(a);
        // Pin node is gone; the device still references the renamed node.
        assert!(pn.find_pin_node(a).is_none());
        assert_eq!(pn.resistors()[0].node2, pin_node);
        assert!(matches!(
            pn.node(pin_node).ident,
            NodeIdent::NetSub { id: 1, .. }
        ));
    }

    #[test]
    fn node_maps_cover_devices() {
        let (_, net, y, a) = two_pin_net();
        let mut pn = ParasiticNetwork::new(net, false);
        let n1 = pn.ensure_pin_node(y);
        let n2 = pn.ensure_pin_node(a);
        pn.make_resistor(0, 100.0, n1, n2);
        let rmap = pn.node_resistor_map();
        assert_eq!(rmap[n1.as_raw() as usize], vec![0]);
        assert_eq!(rmap[n2.as_raw() as usize], vec![0]);
    }

    #[test]
    fn store_lifecycle() {
        let (network, net, y, _) = two_pin_net();
        let mut parasitics = Parasitics::new(1);
        assert!(!parasitics.have_parasitics());
        parasitics.make_network(net, 0, false);
        assert!(parasitics.have_parasitics());
        assert!(parasitics.find_network(net, 0).is_some());
        parasitics.delete_network(net, &network);
        assert!(parasitics.find_network(net, 0).is_none());
        assert!(parasitics
            .find_reduced(y, 0, MinMax::Max, RiseFall::Rise)
            .is_none());
    }

    #[test]
    fn unannotated_loads_without_reduction() {
        let (network, _, y, a) = two_pin_net();
        let parasitics = Parasitics::new(1);
        let loads = parasitics.unannotated_loads(y, 0, MinMax::Max, RiseFall::Rise, &network);
        assert_eq!(loads, vec![a]);
    }
}
