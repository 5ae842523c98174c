//! The delay calculation seam.
//!
//! The search reads cached per-edge arc delays; something must fill them.
//! [`DelayCalc`] is the collaborator interface an external calculator
//! implements, given each edge's driving-point load (a reduced parasitic π
//! when one exists, otherwise a pin-capacitance sum).
//! [`LumpedCapDelayCalc`] is the reference implementation: cell arcs use
//! their linear model against the lumped load, wire arcs use the Elmore
//! delay of the reduced parasitic.

use crate::graph::{Edge, Graph};
use crate::ids::EdgeId;
use chronos_common::{Delay, MinMax};
use chronos_network::{Network, TimingRole};
use chronos_parasitics::{Parasitics, Reduced};

/// Read-only collaborator bundle handed to a delay calculator.
pub struct DcalcContext<'a> {
    /// The netlist.
    pub network: &'a Network,
    /// The graph whose edges are being computed.
    pub graph: &'a Graph,
    /// Annotated parasitics and their reductions.
    pub parasitics: &'a Parasitics,
}

/// A delay calculator: returns `(arc delay, output slew)` for one edge arc
/// at one (corner, min/max) point.
pub trait DelayCalc {
    /// Computes the delay and destination slew of `edge`'s `arc_index`th
    /// arc.
    fn arc_delay(
        &self,
        ctx: &DcalcContext<'_>,
        edge: &Edge,
        arc_index: usize,
        corner: usize,
        min_max: MinMax,
    ) -> (Delay, Delay);
}

/// Reference delay calculator using lumped capacitive loads.
#[derive(Clone, Copy, Debug, Default)]
pub struct LumpedCapDelayCalc;

impl LumpedCapDelayCalc {
    /// Total capacitive load on `drvr_pin`: the reduced π capacitance when
    /// one exists, otherwise the sum of the load pins' library caps.
    pub fn load_cap(
        ctx: &DcalcContext<'_>,
        drvr_pin: chronos_network::PinId,
        corner: usize,
        min_max: MinMax,
        rf: chronos_common::RiseFall,
    ) -> f32 {
        if let Some(reduced) = ctx.parasitics.find_reduced(drvr_pin, corner, min_max, rf) {
            return reduced.pi().capacitance();
        }
        let Some(net) = ctx.network.pin_net(drvr_pin) else {
            return 0.0;
        };
        ctx.network
            .loads(net)
            .into_iter()
            .filter_map(|load| ctx.network.liberty_port(load))
            .map(|port| port.capacitance(corner, rf, min_max))
            .sum()
    }
}

impl DelayCalc for LumpedCapDelayCalc {
    fn arc_delay(
        &self,
        ctx: &DcalcContext<'_>,
        edge: &Edge,
        arc_index: usize,
        corner: usize,
        min_max: MinMax,
    ) -> (Delay, Delay) {
        let arc = &edge.arcs[arc_index];
        if edge.role.is_timing_check() {
            // Check margins are load-independent.
            return (arc.model(corner).intrinsic, 0.0);
        }
        if edge.role == TimingRole::Wire {
            // Interconnect: Elmore delay from the reduced parasitic.
            let drvr_pin = ctx.graph.vertex(edge.from).pin;
            let load_pin = ctx.graph.vertex(edge.to).pin;
            if drvr_pin == load_pin {
                // Bidirect load-to-driver path.
                return (0.0, 0.0);
            }
            match ctx
                .parasitics
                .find_reduced(drvr_pin, corner, min_max, arc.to_rf)
            {
                Some(Reduced::PiElmore(pe)) => {
                    let elmore = pe.elmore(load_pin).unwrap_or(0.0);
                    (elmore, elmore)
                }
                _ => (0.0, 0.0),
            }
        } else {
            let model = arc.model(corner);
            let drvr_pin = ctx.graph.vertex(edge.to).pin;
            let cap = Self::load_cap(ctx, drvr_pin, corner, min_max, arc.to_rf);
            let delay = model.intrinsic + model.resistance * cap;
            let slew = model.resistance * cap;
            (delay, slew)
        }
    }
}

/// Fills every unannotated arc delay and destination slew in the graph.
///
/// Timing check edges get their check margins the same way (the margin is
/// the arc "delay" of the check edge); they are simply never traversed by
/// the forward search.
pub fn find_delays(
    graph: &mut Graph,
    network: &Network,
    parasitics: &Parasitics,
    dcalc: &dyn DelayCalc,
) {
    let edges: Vec<EdgeId> = graph
        .vertices()
        .flat_map(|v| graph.out_edges(v))
        .collect();
    let corner_count = graph.corner_count();
    for e in edges {
        let arc_count = graph.edge(e).arcs.len();
        for arc_index in 0..arc_count {
            for corner in 0..corner_count {
                for min_max in MinMax::both() {
                    let (delay, slew) = {
                        let ctx = DcalcContext {
                            network,
                            graph,
                            parasitics,
                        };
                        dcalc.arc_delay(&ctx, graph.edge(e), arc_index, corner, min_max)
                    };
                    graph.set_arc_delay(e, arc_index, corner, min_max, delay);
                    let (to, to_rf, is_check) = {
                        let edge = graph.edge(e);
                        (edge.to, edge.arcs[arc_index].to_rf, edge.role.is_timing_check())
                    };
                    if !is_check {
                        graph.set_slew(to, corner, to_rf, min_max, slew);
                    }
                }
            }
        }
    }
}
