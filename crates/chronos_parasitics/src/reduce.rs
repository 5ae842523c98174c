//! Model-order reduction of RC networks to driving-point models.
//!
//! Two reductions share one first pass:
//!
//! 1. A DFS from the driver accumulates the first three admittance moments
//!    of the network ("Modeling the Driving-Point Characteristic of
//!    Resistive Interconnect for Accurate Delay Estimation", O'Brien and
//!    Savarino, DAC 1989) and produces the π model.
//! 2. Either a second DFS accumulates Elmore delays per load pin from the
//!    cached downstream capacitances, or the RICE moment-matching algorithm
//!    ("RICE: Rapid Interconnect Circuit Evaluation Using AWE", Ratzlaff
//!    and Pillage, IEEE TCAD 1994) computes two poles and residues per
//!    load from the first three voltage moments.
//!
//! Resistor loops are detected by re-encountering an on-path node; the
//! closing resistor is marked and ignored by later traversals. Resistors
//! whose two terminals are the same node (a known extractor artifact) are
//! skipped outright.

use crate::model::{ParasiticNetwork, ParasiticNodeId};
use crate::reduced::{PiElmore, PiModel, PiPoleResidue, PoleResidue};
use chronos_network::{ArenaId, Network, PinId};
use num_complex::Complex32;

/// Callback supplying the capacitance of a pin node when the network does
/// not already fold pin caps into node capacitances. The caller routes this
/// to the library port capacitance or the port external cap.
pub type PinCapFn<'a> = dyn Fn(PinId) -> f32 + 'a;

/// Number of voltage moments carried by the pole/residue reduction.
const MOMENT_COUNT: usize = 4;

struct ReduceToPi<'a> {
    pn: &'a ParasiticNetwork,
    network: &'a Network,
    coupling_cap_factor: f64,
    pin_cap: &'a PinCapFn<'a>,
    resistor_map: Vec<Vec<usize>>,
    capacitor_map: Vec<Vec<usize>>,
    // On-path marks during DFS; doubles as the visited set because every
    // traversal enters each node once.
    on_path: Vec<bool>,
    downstream_cap: Vec<f64>,
    loop_resistors: Vec<bool>,
    max_resistance: f64,
}

impl<'a> ReduceToPi<'a> {
    fn new(pn: &'a ParasiticNetwork, network: &'a Network, coupling_cap_factor: f32,
           pin_cap: &'a PinCapFn<'a>) -> Self {
        let node_count = pn.node_count();
        Self {
            pn,
            network,
            coupling_cap_factor: coupling_cap_factor as f64,
            pin_cap,
            resistor_map: pn.node_resistor_map(),
            capacitor_map: pn.node_capacitor_map(),
            on_path: vec![false; node_count],
            downstream_cap: vec![0.0; node_count],
            loop_resistors: vec![false; pn.resistors().len()],
            max_resistance: 0.0,
        }
    }

    fn node_cap(&self, node: ParasiticNodeId) -> f64 {
        let coupling: f64 = self.capacitor_map[node.as_raw() as usize]
            .iter()
            .map(|&ci| self.pn.capacitors()[ci].value as f64)
            .sum();
        self.pn.node_gnd_cap(node) as f64
            + coupling * self.coupling_cap_factor
            + self.pin_capacitance(node) as f64
    }

    fn pin_capacitance(&self, node: ParasiticNodeId) -> f32 {
        if self.pn.includes_pin_caps {
            return 0.0;
        }
        match self.pn.node(node).pin() {
            Some(pin) => (self.pin_cap)(pin),
            None => 0.0,
        }
    }

    fn reduce_to_pi(&mut self, drvr_node: ParasiticNodeId) -> PiModel {
        let (y1, y2, y3, _dcap) = self.reduce_pi_dfs(drvr_node, None, 0.0);
        if y2 == 0.0 && y3 == 0.0 {
            // Capacitive load.
            PiModel::new(0.0, 0.0, y1 as f32)
        } else {
            let c1 = y2 * y2 / y3;
            let c2 = y1 - y2 * y2 / y3;
            let rpi = -y3 * y3 / (y2 * y2 * y2);
            PiModel::new(c2 as f32, rpi as f32, c1 as f32)
        }
    }

    // Find admittance moments. Series-upstream traversal of a resistor and
    // parallel-branch addition per the O'Brien-Savarino recurrences.
    fn reduce_pi_dfs(&mut self, node: ParasiticNodeId, from_res: Option<usize>,
                     src_resistance: f64) -> (f64, f64, f64, f64) {
        let mut dwn_cap = self.node_cap(node);
        let mut y1 = dwn_cap;
        let mut y2 = 0.0;
        let mut y3 = 0.0;
        self.max_resistance = self.max_resistance.max(src_resistance);

        self.on_path[node.as_raw() as usize] = true;
        for i in 0..self.resistor_map[node.as_raw() as usize].len() {
            let ri = self.resistor_map[node.as_raw() as usize][i];
            if self.loop_resistors[ri] {
                continue;
            }
            let resistor = &self.pn.resistors()[ri];
            let onode = resistor.other_node(node);
            // One commercial extractor creates resistors with identical
            // from/to nodes.
            if onode != node && from_res != Some(ri) {
                if self.on_path[onode.as_raw() as usize] {
                    // Resistor loop.
                    self.loop_resistors[ri] = true;
                } else {
                    let r = resistor.value as f64;
                    let (yd1, yd2, yd3, dcap) =
                        self.reduce_pi_dfs(onode, Some(ri), src_resistance + r);
                    y1 += yd1;
                    y2 += yd2 - r * yd1 * yd1;
                    y3 += yd3 - 2.0 * r * yd1 * yd2 + r * r * yd1 * yd1 * yd1;
                    dwn_cap += dcap;
                }
            }
        }
        self.downstream_cap[node.as_raw() as usize] = dwn_cap;
        self.on_path[node.as_raw() as usize] = false;
        (y1, y2, y3, dwn_cap)
    }

    // Find elmore delays on a second DFS using the downstream capacitances
    // cached by reduce_pi_dfs.
    fn reduce_elmore_dfs(&mut self, node: ParasiticNodeId, from_res: Option<usize>,
                         elmore: f64, pi_elmore: &mut PiElmore) {
        if from_res.is_some() {
            if let Some(pin) = self.pn.node(node).pin() {
                if self.network.is_load(pin) {
                    pi_elmore.set_elmore(pin, elmore as f32);
                }
            }
        }
        self.on_path[node.as_raw() as usize] = true;
        for i in 0..self.resistor_map[node.as_raw() as usize].len() {
            let ri = self.resistor_map[node.as_raw() as usize][i];
            let resistor = &self.pn.resistors()[ri];
            let onode = resistor.other_node(node);
            if from_res != Some(ri)
                && onode != node
                && !self.on_path[onode.as_raw() as usize]
                && !self.loop_resistors[ri]
            {
                let r = resistor.value as f64;
                let onode_elmore =
                    elmore + r * self.downstream_cap[onode.as_raw() as usize];
                self.reduce_elmore_dfs(onode, Some(ri), onode_elmore, pi_elmore);
            }
        }
        self.on_path[node.as_raw() as usize] = false;
    }
}

// Pole/residue state layered over the shared π pass.
struct ReduceToPiPoleResidue<'a> {
    pi: ReduceToPi<'a>,
    // Branch current per resistor for the moment being swept.
    currents: Vec<f64>,
    // Voltage moments per node; index 0 is the constant 1.0.
    moments: Vec<[f64; MOMENT_COUNT]>,
}

impl<'a> ReduceToPiPoleResidue<'a> {
    fn new(pi: ReduceToPi<'a>) -> Self {
        let node_count = pi.pn.node_count();
        let resistor_count = pi.pn.resistors().len();
        Self {
            pi,
            currents: vec![0.0; resistor_count],
            moments: vec![[1.0, 0.0, 0.0, 0.0]; node_count],
        }
    }

    fn moment(&self, node: ParasiticNodeId, moment_index: usize) -> f64 {
        // Zeroth moments are all 1: Vin(0) = 1 with no resistor current.
        if moment_index == 0 {
            1.0
        } else {
            self.moments[node.as_raw() as usize][moment_index]
        }
    }

    fn find_moments(&mut self, drvr_node: ParasiticNodeId) {
        for moment_index in 1..MOMENT_COUNT {
            self.find_branch_currents(drvr_node, None, moment_index);
            self.moments[drvr_node.as_raw() as usize][moment_index] = 0.0;
            self.find_moments_dfs(drvr_node, 0.0, None, moment_index);
        }
    }

    // Current sweep: a resistor's branch current is the sum of downstream
    // capacitor currents; a capacitor current at moment k uses the node's
    // moment k-1.
    fn find_branch_currents(&mut self, node: ParasiticNodeId, from_res: Option<usize>,
                            moment_index: usize) -> f64 {
        self.pi.on_path[node.as_raw() as usize] = true;
        let mut branch_i = 0.0;
        for i in 0..self.pi.resistor_map[node.as_raw() as usize].len() {
            let ri = self.pi.resistor_map[node.as_raw() as usize][i];
            let resistor = &self.pi.pn.resistors()[ri];
            let onode = resistor.other_node(node);
            if onode != node
                && from_res != Some(ri)
                && !self.pi.on_path[onode.as_raw() as usize]
                && !self.pi.loop_resistors[ri]
            {
                branch_i += self.find_branch_currents(onode, Some(ri), moment_index);
            }
        }
        let cap = self.pi.node_cap(node);
        branch_i += cap * self.moment(node, moment_index - 1);
        self.pi.on_path[node.as_raw() as usize] = false;
        if let Some(ri) = from_res {
            self.currents[ri] = branch_i;
        }
        branch_i
    }

    // Voltage sweep: m_k(onode) = m_k(node) - r * i_k(resistor).
    fn find_moments_dfs(&mut self, node: ParasiticNodeId, from_volt: f64,
                        from_res: Option<usize>, moment_index: usize) {
        self.pi.on_path[node.as_raw() as usize] = true;
        for i in 0..self.pi.resistor_map[node.as_raw() as usize].len() {
            let ri = self.pi.resistor_map[node.as_raw() as usize][i];
            let resistor = &self.pi.pn.resistors()[ri];
            let onode = resistor.other_node(node);
            if onode != node
                && from_res != Some(ri)
                && !self.pi.on_path[onode.as_raw() as usize]
                && !self.pi.loop_resistors[ri]
            {
                let r = resistor.value as f64;
                let r_volt = r * self.currents[ri];
                let onode_volt = from_volt - r_volt;
                self.moments[onode.as_raw() as usize][moment_index] = onode_volt;
                self.find_moments_dfs(onode, onode_volt, Some(ri), moment_index);
            }
        }
        self.pi.on_path[node.as_raw() as usize] = false;
    }

    // Poles and residues from the first three moments, per "An Explicit
    // RC-Circuit Delay Approximation Based on the First Three Moments of
    // the Impulse Response" (DAC 1996).
    fn find_poles_residues(&self, load_node: ParasiticNodeId) -> PoleResidue {
        let m1 = self.moment(load_node, 1);
        let m2 = self.moment(load_node, 2);
        let m3 = self.moment(load_node, 3);
        let p1 = -m2 / m3;
        let p2 = p1 * (1.0 / m1 - m1 / m2) / (m1 / m2 - m2 / m3);
        if p1 <= 0.0
            || p2 <= 0.0
            // Coincident poles are not handled by the delay calculator.
            || p1 == p2
            || m1 / m2 == m2 / m3
        {
            let p1 = -1.0 / m1;
            let k1 = 1.0;
            PoleResidue {
                poles: vec![Complex32::new(p1 as f32, 0.0)],
                residues: vec![Complex32::new(k1, 0.0)],
            }
        } else {
            let mut p1 = p1;
            let mut p2 = p2;
            let mut k1 = p1 * p1 * (1.0 + m1 * p2) / (p1 - p2);
            let mut k2 = -p2 * p2 * (1.0 + m1 * p1) / (p1 - p2);
            if k1 < 0.0 && k2 > 0.0 {
                std::mem::swap(&mut p1, &mut p2);
                std::mem::swap(&mut k1, &mut k2);
            }
            PoleResidue {
                poles: vec![
                    Complex32::new(p1 as f32, 0.0),
                    Complex32::new(p2 as f32, 0.0),
                ],
                residues: vec![
                    Complex32::new(k1 as f32, 0.0),
                    Complex32::new(k2 as f32, 0.0),
                ],
            }
        }
    }
}

/// Reduces `pn` to a π-Elmore driving-point model as seen from `drvr_pin`.
///
/// Returns `None` when the driver pin has no node in the network. The
/// `pin_cap` callback supplies load pin capacitances when the network does
/// not already include them.
pub fn reduce_to_pi_elmore(
    pn: &ParasiticNetwork,
    drvr_pin: PinId,
    coupling_cap_factor: f32,
    network: &Network,
    pin_cap: &PinCapFn<'_>,
) -> Option<PiElmore> {
    let drvr_node = pn.find_pin_node(drvr_pin)?;
    let mut reducer = ReduceToPi::new(pn, network, coupling_cap_factor, pin_cap);
    let pi = reducer.reduce_to_pi(drvr_node);
    let mut pi_elmore = PiElmore::new(pi);
    reducer.reduce_elmore_dfs(drvr_node, None, 0.0, &mut pi_elmore);
    Some(pi_elmore)
}

/// Reduces `pn` to a π-pole-residue driving-point model as seen from
/// `drvr_pin`, with two poles and residues per load pin (one in the
/// degenerate cases).
pub fn reduce_to_pi_pole_residue(
    pn: &ParasiticNetwork,
    drvr_pin: PinId,
    coupling_cap_factor: f32,
    network: &Network,
    pin_cap: &PinCapFn<'_>,
) -> Option<PiPoleResidue> {
    let drvr_node = pn.find_pin_node(drvr_pin)?;
    let mut reducer = ReduceToPi::new(pn, network, coupling_cap_factor, pin_cap);
    let pi = reducer.reduce_to_pi(drvr_node);
    let mut result = PiPoleResidue::new(pi);

    let mut pr = ReduceToPiPoleResidue::new(reducer);
    pr.find_moments(drvr_node);

    let net = network.pin_net(drvr_pin)?;
    for load_pin in network.loads(net) {
        if let Some(load_node) = pn.find_pin_node(load_pin) {
            result.set_pole_residue(load_pin, pr.find_poles_residues(load_node));
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronos_common::Interner;
    use chronos_network::{LibertyCell, LibertyPort, NetId, PortDirection};

    // Driver u1/Y and loads u2/A, u3/A on one net.
    struct Fixture {
        network: Network,
        net: NetId,
        drvr: PinId,
        load1: PinId,
        load2: PinId,
    }

    fn fixture() -> Fixture {
        let interner = Interner::new();
        let mut network = Network::new(interner.get_or_intern("top"));
        let mut cell = LibertyCell::new(interner.get_or_intern("BUFX2"));
        cell.add_port(LibertyPort::new(
            interner.get_or_intern("A"),
            PortDirection::Input,
            0.0,
        ));
        cell.add_port(LibertyPort::new(
            interner.get_or_intern("Y"),
            PortDirection::Output,
            0.0,
        ));
        let buf = network.library.add_cell(cell);
        let u1 = network.make_instance(interner.get_or_intern("u1"), buf);
        let u2 = network.make_instance(interner.get_or_intern("u2"), buf);
        let u3 = network.make_instance(interner.get_or_intern("u3"), buf);
        let a = interner.get_or_intern("A");
        let y = interner.get_or_intern("Y");
        let drvr = network.find_pin(u1, y).unwrap();
        let load1 = network.find_pin(u2, a).unwrap();
        let load2 = network.find_pin(u3, a).unwrap();
        let net = network.make_net(interner.get_or_intern("n1"));
        network.connect(drvr, net);
        network.connect(load1, net);
        network.connect(load2, net);
        Fixture {
            network,
            net,
            drvr,
            load1,
            load2,
        }
    }

    fn no_pin_cap(_: PinId) -> f32 {
        0.0
    }

    #[test]
    fn single_resistor_net() {
        // R = 1000 ohm driver -> load, C_load = 1 pF.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 1000.0, d, l);
        pn.incr_cap(l, 1e-12);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        assert!((pe.pi.c1 as f64 - 1e-12).abs() < 1e-17);
        assert!((pe.pi.c2 as f64).abs() < 1e-17);
        assert!((pe.pi.rpi as f64).abs() < 1e-3);
        let elmore = pe.elmore(f.load1).unwrap() as f64;
        assert!((elmore - 1e-9).abs() < 1e-14, "elmore = {elmore}");
    }

    #[test]
    fn distributed_rc() {
        // driver -(500)- A [0.5pF] -(500)- load [0.5pF].
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let a = pn.ensure_net_node(f.net, 1);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 500.0, d, a);
        pn.make_resistor(1, 500.0, a, l);
        pn.incr_cap(a, 0.5e-12);
        pn.incr_cap(l, 0.5e-12);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        // y1 = total cap.
        assert!((pe.pi.capacitance() as f64 - 1e-12).abs() < 1e-17);
        // Elmore(load) = 500 * 1pF + 500 * 0.5pF = 7.5e-10.
        let elmore = pe.elmore(f.load1).unwrap() as f64;
        assert!((elmore - 7.5e-10).abs() < 1e-14, "elmore = {elmore}");
    }

    #[test]
    fn coupling_cap_factor() {
        // Same as distributed_rc plus a 0.2 pF coupling cap from A to an
        // aggressor node with coupling factor 0.5: effective Cg(A) = 0.6 pF.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let a = pn.ensure_net_node(f.net, 1);
        let l = pn.ensure_pin_node(f.load1);
        let aggressor = pn.ensure_net_node(NetId::from_raw(77), 0);
        pn.make_resistor(0, 500.0, d, a);
        pn.make_resistor(1, 500.0, a, l);
        pn.incr_cap(a, 0.5e-12);
        pn.incr_cap(l, 0.5e-12);
        pn.make_capacitor(0, 0.2e-12, a, aggressor);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 0.5, &f.network, &no_pin_cap).unwrap();
        // Total cap now 1.1 pF; Elmore(load) = 500*1.1p + 500*0.5p.
        assert!((pe.pi.capacitance() as f64 - 1.1e-12).abs() < 1e-17);
        let elmore = pe.elmore(f.load1).unwrap() as f64;
        assert!((elmore - (500.0 * 1.1e-12 + 500.0 * 0.5e-12)).abs() < 1e-14);
    }

    #[test]
    fn purely_capacitive_network() {
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let l = pn.ensure_pin_node(f.load1);
        pn.incr_cap(d, 0.3e-12);
        pn.incr_cap(l, 0.7e-12);
        // No resistor connects the load, so only the driver's own cap is
        // seen; connect with a zero-resistance wire instead.
        pn.make_resistor(0, 0.0, d, l);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        assert!((pe.pi.c1 as f64 - 1e-12).abs() < 1e-17);
        assert_eq!(pe.pi.c2, 0.0);
        assert_eq!(pe.pi.rpi, 0.0);
        assert_eq!(pe.elmore(f.load1), Some(0.0));
    }

    #[test]
    fn unloaded_driver() {
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        pn.ensure_pin_node(f.drvr);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        assert_eq!(pe.pi.c1, 0.0);
        assert_eq!(pe.pi.c2, 0.0);
        assert_eq!(pe.pi.rpi, 0.0);
        assert_eq!(pe.load_count(), 0);
    }

    #[test]
    fn missing_driver_node() {
        let f = fixture();
        let pn = ParasiticNetwork::new(f.net, false);
        assert!(reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).is_none());
    }

    #[test]
    fn self_loop_resistor_ignored() {
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 1000.0, d, l);
        // Extractor artifact: both terminals on the same node.
        pn.make_resistor(1, 5e6, l, l);
        pn.incr_cap(l, 1e-12);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        let elmore = pe.elmore(f.load1).unwrap() as f64;
        assert!((elmore - 1e-9).abs() < 1e-14);
    }

    #[test]
    fn resistor_loop_detected() {
        // d - a - b - d forms a loop; reduction stays finite and the load
        // hanging off b still gets an Elmore entry.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let a = pn.ensure_net_node(f.net, 1);
        let b = pn.ensure_net_node(f.net, 2);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 100.0, d, a);
        pn.make_resistor(1, 100.0, a, b);
        pn.make_resistor(2, 100.0, b, d);
        pn.make_resistor(3, 100.0, b, l);
        pn.incr_cap(a, 0.1e-12);
        pn.incr_cap(b, 0.1e-12);
        pn.incr_cap(l, 0.2e-12);

        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        assert!(pe.pi.capacitance().is_finite());
        let elmore = pe.elmore(f.load1).unwrap();
        assert!(elmore.is_finite() && elmore > 0.0);
    }

    #[test]
    fn pin_caps_folded_by_callback() {
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 1000.0, d, l);

        let pin_cap = |pin: PinId| if pin == f.load1 { 1e-12 } else { 0.0 };
        let pe = reduce_to_pi_elmore(&pn, f.drvr, 1.0, &f.network, &pin_cap).unwrap();
        let elmore = pe.elmore(f.load1).unwrap() as f64;
        assert!((elmore - 1e-9).abs() < 1e-14);

        // With includes_pin_caps the callback must be ignored.
        let mut pn2 = ParasiticNetwork::new(f.net, true);
        let d2 = pn2.ensure_pin_node(f.drvr);
        let l2 = pn2.ensure_pin_node(f.load1);
        pn2.make_resistor(0, 1000.0, d2, l2);
        let pe2 = reduce_to_pi_elmore(&pn2, f.drvr, 1.0, &f.network, &pin_cap).unwrap();
        assert_eq!(pe2.elmore(f.load1), Some(0.0));
    }

    #[test]
    fn single_rc_pole_residue_degenerates() {
        // One R, one C: m1 = -RC, and 1/m1 - m1/m2 = 0 forces the
        // single-pole branch with p1 = 1/(RC), k1 = 1.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 1000.0, d, l);
        pn.incr_cap(l, 1e-12);

        let pr = reduce_to_pi_pole_residue(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        let load_pr = pr.pole_residue(f.load1).unwrap();
        assert_eq!(load_pr.count(), 1);
        let (p1, k1) = load_pr.pair(0);
        assert!((p1.re as f64 - 1e9).abs() < 1e4, "p1 = {}", p1.re);
        assert_eq!(k1.re, 1.0);
        assert_eq!(p1.im, 0.0);
    }

    #[test]
    fn branched_net_pole_residue() {
        // Asymmetric tree: two loads with distinct moments; both get
        // entries with positive first poles and equal-length sequences.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let mid = pn.ensure_net_node(f.net, 1);
        let l1 = pn.ensure_pin_node(f.load1);
        let l2 = pn.ensure_pin_node(f.load2);
        pn.make_resistor(0, 200.0, d, mid);
        pn.make_resistor(1, 400.0, mid, l1);
        pn.make_resistor(2, 800.0, mid, l2);
        pn.incr_cap(mid, 0.2e-12);
        pn.incr_cap(l1, 0.5e-12);
        pn.incr_cap(l2, 1.0e-12);

        let pr = reduce_to_pi_pole_residue(&pn, f.drvr, 1.0, &f.network, &no_pin_cap).unwrap();
        for load in [f.load1, f.load2] {
            let entry = pr.pole_residue(load).unwrap();
            assert!(entry.count() == 1 || entry.count() == 2);
            assert_eq!(entry.poles.len(), entry.residues.len());
            let (p1, _) = entry.pair(0);
            assert!(p1.re > 0.0, "pole should be positive, got {}", p1.re);
        }
        // π total capacitance matches the tree.
        assert!((pr.pi.capacitance() as f64 - 1.7e-12).abs() < 1e-16);
    }

    #[test]
    fn moments_match_elmore_first_moment() {
        // m1 at a load equals minus its Elmore delay on a tree.
        let f = fixture();
        let mut pn = ParasiticNetwork::new(f.net, false);
        let d = pn.ensure_pin_node(f.drvr);
        let a = pn.ensure_net_node(f.net, 1);
        let l = pn.ensure_pin_node(f.load1);
        pn.make_resistor(0, 500.0, d, a);
        pn.make_resistor(1, 500.0, a, l);
        pn.incr_cap(a, 0.5e-12);
        pn.incr_cap(l, 0.5e-12);

        let reducer = ReduceToPi::new(&pn, &f.network, 1.0, &no_pin_cap);
        let mut pr = ReduceToPiPoleResidue::new(reducer);
        pr.find_moments(d);
        let m1 = pr.moment(l, 1);
        assert!((m1 + 7.5e-10).abs() < 1e-14, "m1 = {m1}");
    }
}
