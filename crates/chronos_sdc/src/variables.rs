//! Analysis-mode variables.

use serde::{Deserialize, Serialize};

/// How CRPR identifies the reconvergence point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CrprMode {
    /// Pessimism is removed for the common clock pin.
    SamePin,
    /// Pessimism is removed only when the transitions at the common pin
    /// also match.
    SameTransition,
}

/// Switches that change how the search interprets the design, mirroring
/// the analyzer's user-settable variables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Variables {
    /// Enable clock reconvergence pessimism removal.
    pub crpr_enabled: bool,
    /// CRPR reconvergence matching mode.
    pub crpr_mode: CrprMode,
    /// Prune arrivals that cannot be critical even after CRPR relief.
    pub crpr_path_pruning_enabled: bool,
    /// Approximate a pruned arrival's required from a sibling tag that
    /// differs only in its CRPR clock path.
    pub crpr_approx_missing_requireds: bool,
    /// Search through preset/clear arcs.
    pub preset_clr_arcs_enabled: bool,
    /// Enable gated-clock checks.
    pub gated_clk_checks_enabled: bool,
    /// Re-enable disabled loop edges when a loop exception sensitizes
    /// the path.
    pub dynamic_loop_breaking: bool,
    /// Treat every clock as propagated.
    pub propagate_all_clocks: bool,
    /// Propagate clocks through tristate enable/disable arcs.
    pub clk_thru_tristate_enabled: bool,
    /// Give input ports without `set_input_delay` a default arrival clock.
    pub use_default_arrival_clock: bool,
    /// Seed and report unconstrained startpoints/endpoints.
    pub unconstrained_paths: bool,
    /// Allow timing from a bidirect pin's driver back into the instance.
    pub bidirect_inst_paths_enabled: bool,
}

impl Default for Variables {
    fn default() -> Self {
        Self {
            crpr_enabled: true,
            crpr_mode: CrprMode::SamePin,
            crpr_path_pruning_enabled: true,
            crpr_approx_missing_requireds: true,
            preset_clr_arcs_enabled: false,
            gated_clk_checks_enabled: false,
            dynamic_loop_breaking: false,
            propagate_all_clocks: false,
            clk_thru_tristate_enabled: false,
            use_default_arrival_clock: false,
            unconstrained_paths: false,
            bidirect_inst_paths_enabled: false,
        }
    }
}
