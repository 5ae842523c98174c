//! Input and output delay constraints.

use crate::clock::ClockEdge;
use chronos_common::{Delay, MinMax, RiseFall};
use chronos_network::PinId;
use serde::{Deserialize, Serialize};

/// Index of an input delay within the owning [`Sdc`](crate::Sdc).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct InputDelayId(u32);

impl InputDelayId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A per-(rise/fall, min/max) value table, with absent entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiseFallMinMax {
    values: [[Option<Delay>; 2]; 2],
}

impl RiseFallMinMax {
    /// A table with the same value in all four slots.
    pub fn fill(value: Delay) -> Self {
        Self {
            values: [[Some(value); 2]; 2],
        }
    }

    /// The value for `(rf, min_max)`, if set.
    pub fn value(&self, rf: RiseFall, min_max: MinMax) -> Option<Delay> {
        self.values[rf.index()][min_max.index()]
    }

    /// Sets the value for `(rf, min_max)`.
    pub fn set_value(&mut self, rf: RiseFall, min_max: MinMax, value: Delay) {
        self.values[rf.index()][min_max.index()] = Some(value);
    }
}

/// A `set_input_delay` constraint on one pin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputDelay {
    /// The constrained pin.
    pub pin: PinId,
    /// The reference clock edge, if the delay is clock-relative.
    pub clk_edge: Option<ClockEdge>,
    /// Reference pin: the delay is measured from this pin's clock arrival
    /// instead of the clock source.
    pub ref_pin: Option<PinId>,
    /// Transition of the reference pin arrival used with `ref_pin`.
    pub ref_rf: RiseFall,
    /// The delay values.
    pub delays: RiseFallMinMax,
    /// `-source_latency_included`: the value already contains the clock
    /// insertion delay.
    pub source_latency_included: bool,
    /// `-network_latency_included`: the value already contains the ideal
    /// clock network latency.
    pub network_latency_included: bool,
}

impl InputDelay {
    /// Creates an input delay of `delay` on all transitions and sides.
    pub fn new(pin: PinId, clk_edge: Option<ClockEdge>, delay: Delay) -> Self {
        Self {
            pin,
            clk_edge,
            ref_pin: None,
            ref_rf: RiseFall::Rise,
            delays: RiseFallMinMax::fill(delay),
            source_latency_included: false,
            network_latency_included: false,
        }
    }
}

/// A `set_output_delay` constraint on one pin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputDelay {
    /// The constrained pin.
    pub pin: PinId,
    /// The reference clock edge, if the delay is clock-relative.
    pub clk_edge: Option<ClockEdge>,
    /// The delay values.
    pub delays: RiseFallMinMax,
}

impl OutputDelay {
    /// Creates an output delay of `delay` on all transitions and sides.
    pub fn new(pin: PinId, clk_edge: Option<ClockEdge>, delay: Delay) -> Self {
        Self {
            pin,
            clk_edge,
            delays: RiseFallMinMax::fill(delay),
        }
    }
}
