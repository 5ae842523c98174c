//! Arrival tags: the identity of an arrival aside from its value.

use crate::clk_info::ClkInfoId;
use chronos_common::{MinMax, RiseFall};
use chronos_sdc::{ExceptionState, InputDelayId};
use serde::{Deserialize, Serialize};

/// Index of an interned [`Tag`].
///
/// Tags are interned as rise/fall sibling pairs at adjacent indices, so a
/// search step flipping the transition is index arithmetic (see
/// [`sibling_index`]).
pub type TagId = u32;

/// The sibling of `tag` with transition `rf`: same pair, other parity.
pub fn sibling_index(tag: TagId, rf: RiseFall) -> TagId {
    (tag / RiseFall::COUNT as u32) * RiseFall::COUNT as u32 + rf.index() as u32
}

/// An arrival's identity: transition, analysis side, clock history,
/// whether it is still a clock-network arrival, its input-delay origin,
/// segment-start and filter flags, and the exception states riding along.
///
/// Arrivals on one vertex with equal tags merge by min/max, keeping the
/// tag set small.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Tag {
    /// The scene the arrival belongs to.
    pub scene: usize,
    /// The arrival's transition.
    pub rf: RiseFall,
    /// The analysis side.
    pub min_max: MinMax,
    /// Interned clock history.
    pub clk_info: ClkInfoId,
    /// `true` while the arrival is still inside the clock network.
    pub is_clk: bool,
    /// The input delay that seeded the arrival, if any.
    pub input_delay: Option<InputDelayId>,
    /// `true` for segment-start arrivals (unclocked register clock pins
    /// and input-delay segment starts).
    pub is_segment_start: bool,
    /// `true` when a report filter's exception state is active on this
    /// tag.
    pub is_filter: bool,
    /// Exception states, kept sorted for interning stability.
    pub states: Vec<ExceptionState>,
}

impl Tag {
    /// Creates a tag, sorting `states` for a canonical interning key.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scene: usize,
        rf: RiseFall,
        min_max: MinMax,
        clk_info: ClkInfoId,
        is_clk: bool,
        input_delay: Option<InputDelayId>,
        is_segment_start: bool,
        is_filter: bool,
        mut states: Vec<ExceptionState>,
    ) -> Self {
        states.sort_unstable();
        states.dedup();
        Self {
            scene,
            rf,
            min_max,
            clk_info,
            is_clk,
            input_delay,
            is_segment_start,
            is_filter,
            states,
        }
    }

    /// This tag with the opposite transition (the interned sibling's
    /// value).
    pub fn sibling(&self) -> Self {
        let mut tag = self.clone();
        tag.rf = tag.rf.opposite();
        tag
    }

    /// This tag with a different clock history.
    pub fn with_clk_info(&self, clk_info: ClkInfoId) -> Self {
        let mut tag = self.clone();
        tag.clk_info = clk_info;
        tag
    }
}
