//! Interned clock history carried on every tag.

use crate::path::PathRef;
use chronos_common::{Delay, MinMax, RiseFall};
use chronos_network::PinId;
use chronos_sdc::{ClockEdge, ClockId, ClockUncertainties, Sdc};
use std::hash::{Hash, Hasher};

/// Index of an interned [`ClkInfo`].
pub type ClkInfoId = u32;

/// The clock history of an arrival: which clock edge launched it, from
/// which source pin, whether the clock network is propagated or ideal,
/// accumulated insertion/latency, uncertainties, and the path on the
/// CRPR-relevant clock pin. Two `ClkInfo`s are equal iff all fields are
/// equal; equal ones share one interned allocation.
#[derive(Clone, Debug)]
pub struct ClkInfo {
    /// The launching clock edge, `None` for unclocked arrivals.
    pub clk_edge: Option<ClockEdge>,
    /// The clock source pin the history started at.
    pub clk_src: Option<PinId>,
    /// `true` once the history runs through a propagated clock network.
    pub is_propagated: bool,
    /// The generated-clock source pin stamped when the history crosses
    /// one.
    pub gen_clk_src: Option<PinId>,
    /// `true` while tracing a generated clock's source path.
    pub is_gen_clk_src_path: bool,
    /// Liberty pulse-clock sense, propagated through the clock fanout.
    pub pulse_clk_sense: Option<RiseFall>,
    /// Source insertion delay.
    pub insertion: Delay,
    /// Ideal-mode network latency.
    pub latency: Delay,
    /// Uncertainties in effect.
    pub uncertainties: Option<ClockUncertainties>,
    /// Which analysis side this history serves.
    pub min_max: MinMax,
    /// The path on the CRPR-relevant clock pin; `None` when pessimism
    /// removal cannot apply.
    pub crpr_clk_path: Option<PathRef>,
}

impl ClkInfo {
    /// An unclocked history for `min_max`.
    pub fn unclocked(min_max: MinMax) -> Self {
        Self {
            clk_edge: None,
            clk_src: None,
            is_propagated: false,
            gen_clk_src: None,
            is_gen_clk_src_path: false,
            pulse_clk_sense: None,
            insertion: 0.0,
            latency: 0.0,
            uncertainties: None,
            min_max,
            crpr_clk_path: None,
        }
    }

    /// The launching clock, if any.
    pub fn clock(&self) -> Option<ClockId> {
        self.clk_edge.map(|e| e.clock)
    }

    /// Returns `true` when a CRPR clock pin is recorded.
    pub fn has_crpr_clk_pin(&self) -> bool {
        self.crpr_clk_path.is_some()
    }

    /// The launch time of the history's clock edge.
    pub fn clk_edge_time(&self, sdc: &Sdc) -> Delay {
        self.clk_edge.map(|e| sdc.clock_edge_time(e)).unwrap_or(0.0)
    }

    /// This history with its CRPR clock path stripped, for pruning
    /// comparisons.
    pub fn without_crpr_clk_path(&self) -> Self {
        let mut info = self.clone();
        info.crpr_clk_path = None;
        info
    }
}

impl PartialEq for ClkInfo {
    fn eq(&self, other: &Self) -> bool {
        self.clk_edge == other.clk_edge
            && self.clk_src == other.clk_src
            && self.is_propagated == other.is_propagated
            && self.gen_clk_src == other.gen_clk_src
            && self.is_gen_clk_src_path == other.is_gen_clk_src_path
            && self.pulse_clk_sense == other.pulse_clk_sense
            && self.insertion.to_bits() == other.insertion.to_bits()
            && self.latency.to_bits() == other.latency.to_bits()
            && uncertainty_bits(&self.uncertainties) == uncertainty_bits(&other.uncertainties)
            && self.min_max == other.min_max
            && self.crpr_clk_path == other.crpr_clk_path
    }
}

impl Eq for ClkInfo {}

impl Hash for ClkInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.clk_edge.hash(state);
        self.clk_src.hash(state);
        self.is_propagated.hash(state);
        self.gen_clk_src.hash(state);
        self.is_gen_clk_src_path.hash(state);
        self.pulse_clk_sense.hash(state);
        self.insertion.to_bits().hash(state);
        self.latency.to_bits().hash(state);
        uncertainty_bits(&self.uncertainties).hash(state);
        self.min_max.hash(state);
        self.crpr_clk_path.hash(state);
    }
}

fn uncertainty_bits(u: &Option<ClockUncertainties>) -> Option<(u32, u32)> {
    u.map(|u| (u.setup.to_bits(), u.hold.to_bits()))
}
