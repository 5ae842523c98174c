//! Clock definitions.

use chronos_common::{Delay, Frequency, Ident, MinMax, RiseFall};
use chronos_network::PinId;
use serde::{Deserialize, Serialize};

/// Index of a clock within the owning [`Sdc`](crate::Sdc).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ClockId(u32);

impl ClockId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Setup/hold uncertainty pair attached to a clock or a pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockUncertainties {
    /// Uncertainty subtracted from setup requireds.
    pub setup: Delay,
    /// Uncertainty added to hold requireds.
    pub hold: Delay,
}

impl ClockUncertainties {
    /// The uncertainty for one analysis side: setup for max, hold for min.
    pub fn value(&self, min_max: MinMax) -> Delay {
        match min_max {
            MinMax::Max => self.setup,
            MinMax::Min => self.hold,
        }
    }
}

/// One edge of a clock waveform: the (clock, transition) pair. The edge
/// time is looked up through the clock so equal edges stay `Eq`/`Hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ClockEdge {
    /// The owning clock.
    pub clock: ClockId,
    /// Which waveform edge.
    pub rf: RiseFall,
}

/// A declared clock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clock {
    /// Clock name.
    pub name: Ident,
    /// Period in seconds.
    pub period: Delay,
    /// Waveform edge times within the period: `[rise, fall]`.
    pub waveform: [Delay; 2],
    /// The pins the clock arrives at (clock tree leaves).
    pub leaf_pins: Vec<PinId>,
    /// `true` when the clock network delay is propagated rather than ideal.
    pub is_propagated: bool,
    /// `true` for generated clocks.
    pub is_generated: bool,
    /// Master clock of a generated clock.
    pub master_clk: Option<ClockId>,
    /// Source pin of a generated clock.
    pub src_pin: Option<PinId>,
    /// Clock-level uncertainties.
    pub uncertainties: Option<ClockUncertainties>,
    /// Source insertion delay, indexed `[rf][min_max]`.
    pub insertions: [[Delay; 2]; 2],
    /// Ideal-mode network latency, indexed `[rf][min_max]`.
    pub latencies: [[Delay; 2]; 2],
}

impl Clock {
    /// Creates an ideal clock with a 50% duty-cycle waveform.
    pub fn new(name: Ident, period: Delay) -> Self {
        Self {
            name,
            period,
            waveform: [0.0, period / 2.0],
            leaf_pins: Vec::new(),
            is_propagated: false,
            is_generated: false,
            master_clk: None,
            src_pin: None,
            uncertainties: None,
            insertions: [[0.0; 2]; 2],
            latencies: [[0.0; 2]; 2],
        }
    }

    /// The time of the waveform edge for `rf`.
    pub fn edge_time(&self, rf: RiseFall) -> Delay {
        self.waveform[rf.index()]
    }

    /// Source insertion delay for `(rf, min_max)`.
    pub fn insertion(&self, rf: RiseFall, min_max: MinMax) -> Delay {
        self.insertions[rf.index()][min_max.index()]
    }

    /// Ideal-mode network latency for `(rf, min_max)`.
    pub fn latency(&self, rf: RiseFall, min_max: MinMax) -> Delay {
        self.latencies[rf.index()][min_max.index()]
    }

    /// The clock's frequency.
    pub fn frequency(&self) -> Frequency {
        Frequency::from_period(self.period as f64)
    }

    /// The default pin the clock is sourced at, when it has leaf pins.
    pub fn default_pin(&self) -> Option<PinId> {
        self.leaf_pins.first().copied()
    }
}
