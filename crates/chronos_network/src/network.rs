//! Flat gate-level netlist with connectivity queries.
//!
//! The [`Network`] stores instances, pins, and nets in arenas. Top-level
//! ports are modeled as pins of a distinguished top instance, matching how
//! the timing graph treats them (a top input port drives into the design, a
//! top output port loads it). Names are interned [`Ident`]s; callers that
//! need strings pass the session [`Interner`].

use crate::arena::Arena;
use crate::ids::{CellId, InstanceId, NetId, PinId, PortId};
use crate::liberty::{LibertyCell, LibertyLibrary, LibertyPort, PortDirection};
use chronos_common::{Ident, Interner};
use serde::{Deserialize, Serialize};

/// A pin: an instance's connection point, or a top-level port.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pin {
    /// Port name within the owning instance (or the port name itself for
    /// top-level ports).
    pub name: Ident,
    /// The owning instance. Top-level ports belong to the top instance.
    pub instance: InstanceId,
    /// The library port this pin instantiates; `None` for top-level ports.
    pub port: Option<PortId>,
    /// The net this pin is connected to, if any.
    pub net: Option<NetId>,
    /// Pin direction.
    pub direction: PortDirection,
}

/// An instance of a library cell (or the top instance).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name.
    pub name: Ident,
    /// The instantiated library cell; `None` for the top instance.
    pub cell: Option<CellId>,
    /// The instance's pins, in cell port order.
    pub pins: Vec<PinId>,
}

/// A net connecting two or more pins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Net {
    /// Net name.
    pub name: Ident,
    /// Connected pins, in connection order.
    pub pins: Vec<PinId>,
}

/// The flat netlist the timing core analyzes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    /// The cell library instances refer into.
    pub library: LibertyLibrary,
    instances: Arena<InstanceId, Instance>,
    pins: Arena<PinId, Pin>,
    nets: Arena<NetId, Net>,
    top: InstanceId,
}

impl Network {
    /// Creates a network with an empty library and a top instance.
    pub fn new(top_name: Ident) -> Self {
        let mut instances = Arena::new();
        let top = instances.alloc(Instance {
            name: top_name,
            cell: None,
            pins: Vec::new(),
        });
        Self {
            library: LibertyLibrary::default(),
            instances,
            pins: Arena::new(),
            nets: Arena::new(),
            top,
        }
    }

    /// The top instance.
    pub fn top_instance(&self) -> InstanceId {
        self.top
    }

    /// Creates an instance of `cell`, materializing one pin per cell port.
    pub fn make_instance(&mut self, name: Ident, cell: CellId) -> InstanceId {
        let inst = self.instances.alloc(Instance {
            name,
            cell: Some(cell),
            pins: Vec::new(),
        });
        let ports: Vec<(PortId, Ident, PortDirection)> = self.library.cells[cell]
            .ports
            .iter()
            .map(|(id, p)| (id, p.name, p.direction))
            .collect();
        for (port, pname, direction) in ports {
            let pin = self.pins.alloc(Pin {
                name: pname,
                instance: inst,
                port: Some(port),
                net: None,
                direction,
            });
            self.instances[inst].pins.push(pin);
        }
        inst
    }

    /// Creates a top-level port pin.
    pub fn make_top_port(&mut self, name: Ident, direction: PortDirection) -> PinId {
        let pin = self.pins.alloc(Pin {
            name,
            instance: self.top,
            port: None,
            net: None,
            direction,
        });
        self.instances[self.top].pins.push(pin);
        pin
    }

    /// Creates an unconnected net.
    pub fn make_net(&mut self, name: Ident) -> NetId {
        self.nets.alloc(Net {
            name,
            pins: Vec::new(),
        })
    }

    /// Connects `pin` to `net`, disconnecting it from any previous net.
    pub fn connect(&mut self, pin: PinId, net: NetId) {
        self.disconnect(pin);
        self.pins[pin].net = Some(net);
        self.nets[net].pins.push(pin);
    }

    /// Disconnects `pin` from its net, if connected.
    pub fn disconnect(&mut self, pin: PinId) {
        if let Some(net) = self.pins[pin].net.take() {
            self.nets[net].pins.retain(|&p| p != pin);
        }
    }

    /// The pin record.
    pub fn pin(&self, pin: PinId) -> &Pin {
        &self.pins[pin]
    }

    /// The instance record.
    pub fn instance(&self, inst: InstanceId) -> &Instance {
        &self.instances[inst]
    }

    /// The net record.
    pub fn net(&self, net: NetId) -> &Net {
        &self.nets[net]
    }

    /// All pins connected to `net`.
    pub fn net_pins(&self, net: NetId) -> &[PinId] {
        &self.nets[net].pins
    }

    /// The net `pin` is connected to.
    pub fn pin_net(&self, pin: PinId) -> Option<NetId> {
        self.pins[pin].net
    }

    /// Iterates all pins of the network.
    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.pins.ids()
    }

    /// Iterates all nets of the network.
    pub fn nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.nets.ids()
    }

    /// Finds a pin of `inst` by port name.
    pub fn find_pin(&self, inst: InstanceId, name: Ident) -> Option<PinId> {
        self.instances[inst]
            .pins
            .iter()
            .copied()
            .find(|&p| self.pins[p].name == name)
    }

    /// The pin's direction.
    pub fn direction(&self, pin: PinId) -> PortDirection {
        self.pins[pin].direction
    }

    /// Returns `true` if `pin` is a top-level port.
    pub fn is_top_level_port(&self, pin: PinId) -> bool {
        self.pins[pin].instance == self.top
    }

    /// Returns `true` if `pin` drives its net: a leaf output/bidirect pin,
    /// or a top-level input/bidirect port (external world drives in).
    pub fn is_driver(&self, pin: PinId) -> bool {
        let dir = self.pins[pin].direction;
        if self.is_top_level_port(pin) {
            dir.is_any_input()
        } else {
            dir.is_any_output()
        }
    }

    /// Returns `true` if `pin` loads its net: a leaf input/bidirect pin,
    /// or a top-level output/bidirect port.
    pub fn is_load(&self, pin: PinId) -> bool {
        let dir = self.pins[pin].direction;
        if self.is_top_level_port(pin) {
            dir.is_any_output()
        } else {
            dir.is_any_input()
        }
    }

    /// The pins driving `net`.
    pub fn drivers(&self, net: NetId) -> Vec<PinId> {
        self.nets[net]
            .pins
            .iter()
            .copied()
            .filter(|&p| self.is_driver(p))
            .collect()
    }

    /// The pins loading `net`.
    pub fn loads(&self, net: NetId) -> Vec<PinId> {
        self.nets[net]
            .pins
            .iter()
            .copied()
            .filter(|&p| self.is_load(p))
            .collect()
    }

    /// The library cell of `inst`, if it is a leaf instance.
    pub fn liberty_cell(&self, inst: InstanceId) -> Option<&LibertyCell> {
        self.instances[inst]
            .cell
            .map(|cell| &self.library.cells[cell])
    }

    /// The library port behind `pin`, if any.
    pub fn liberty_port(&self, pin: PinId) -> Option<&LibertyPort> {
        let pin = &self.pins[pin];
        let cell = self.instances[pin.instance].cell?;
        Some(&self.library.cells[cell].ports[pin.port?])
    }

    /// Hierarchical path name of `pin` (`inst/PORT`, or the bare port name
    /// for top-level ports).
    pub fn path_name(&self, pin: PinId, interner: &Interner) -> String {
        let p = &self.pins[pin];
        if self.is_top_level_port(pin) {
            interner.resolve(p.name).to_string()
        } else {
            format!(
                "{}/{}",
                interner.resolve(self.instances[p.instance].name),
                interner.resolve(p.name)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liberty::{ArcModel, TimingArcSet, TimingSense};
    use crate::role::TimingRole;

    fn make_network(interner: &Interner) -> (Network, InstanceId, PinId, PinId) {
        let mut network = Network::new(interner.get_or_intern("top"));
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
            arcs: crate::liberty::unate_arcs(TimingSense::PositiveUnate, ArcModel::default()),
        });
        let buf = network.library.add_cell(cell);
        let u1 = network.make_instance(interner.get_or_intern("u1"), buf);
        let input = network.make_top_port(interner.get_or_intern("in"), PortDirection::Input);
        let output = network.make_top_port(interner.get_or_intern("out"), PortDirection::Output);
        (network, u1, input, output)
    }

    #[test]
    fn instance_pins_follow_cell_ports() {
        let interner = Interner::new();
        let (network, u1, _, _) = make_network(&interner);
        assert_eq!(network.instance(u1).pins.len(), 2);
        assert!(network
            .find_pin(u1, interner.get_or_intern("A"))
            .is_some());
        assert!(network
            .find_pin(u1, interner.get_or_intern("CK"))
            .is_none());
    }

    #[test]
    fn connect_and_disconnect() {
        let interner = Interner::new();
        let (mut network, u1, input, _) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        let n1 = network.make_net(interner.get_or_intern("n1"));
        network.connect(input, n1);
        network.connect(a, n1);
        assert_eq!(network.net_pins(n1).len(), 2);
        network.disconnect(a);
        assert_eq!(network.net_pins(n1), &[input]);
        assert!(network.pin_net(a).is_none());
    }

    #[test]
    fn drivers_and_loads() {
        let interner = Interner::new();
        let (mut network, u1, input, output) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        let y = network.find_pin(u1, interner.get_or_intern("Y")).unwrap();
        let n1 = network.make_net(interner.get_or_intern("n1"));
        let n2 = network.make_net(interner.get_or_intern("n2"));
        network.connect(input, n1);
        network.connect(a, n1);
        network.connect(y, n2);
        network.connect(output, n2);

        // Top input drives; leaf input loads.
        assert_eq!(network.drivers(n1), vec![input]);
        assert_eq!(network.loads(n1), vec![a]);
        // Leaf output drives; top output loads.
        assert_eq!(network.drivers(n2), vec![y]);
        assert_eq!(network.loads(n2), vec![output]);
    }

    #[test]
    fn top_level_port_identity() {
        let interner = Interner::new();
        let (network, u1, input, _) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        assert!(network.is_top_level_port(input));
        assert!(!network.is_top_level_port(a));
    }

    #[test]
    fn liberty_port_lookup() {
        let interner = Interner::new();
        let (network, u1, input, _) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        assert!(network.liberty_port(a).is_some());
        assert!(network.liberty_port(input).is_none());
    }

    #[test]
    fn path_names() {
        let interner = Interner::new();
        let (network, u1, input, _) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        assert_eq!(network.path_name(a, &interner), "u1/A");
        assert_eq!(network.path_name(input, &interner), "in");
    }

    #[test]
    fn reconnect_moves_pin() {
        let interner = Interner::new();
        let (mut network, u1, _, _) = make_network(&interner);
        let a = network.find_pin(u1, interner.get_or_intern("A")).unwrap();
        let n1 = network.make_net(interner.get_or_intern("n1"));
        let n2 = network.make_net(interner.get_or_intern("n2"));
        network.connect(a, n1);
        network.connect(a, n2);
        assert!(network.net_pins(n1).is_empty());
        assert_eq!(network.net_pins(n2), &[a]);
    }
}
