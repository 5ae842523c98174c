//! Timing roles classifying what an arc set (and its graph edge) models.

use serde::{Deserialize, Serialize};

/// The semantic role of a timing arc set.
///
/// The role determines how the search treats the edge: check edges are never
/// traversed forward, clock roles gate `is_clock` propagation, and the latch
/// data-to-output role triggers time borrowing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TimingRole {
    /// Interconnect from a driver pin to a load pin.
    Wire,
    /// Combinational propagation through a cell.
    Combinational,
    /// Register clock-to-output propagation.
    RegClkToQ,
    /// Latch data-to-output propagation (transparent phase).
    LatchDtoQ,
    /// Latch enable-to-output propagation (open edge).
    LatchEnToQ,
    /// Setup timing check (constraint, not a propagation).
    SetupCheck,
    /// Hold timing check (constraint, not a propagation).
    HoldCheck,
    /// Tristate enable-to-output propagation.
    TristateEnable,
    /// Tristate disable-to-output propagation.
    TristateDisable,
    /// Asynchronous set/clear-to-output propagation.
    RegSetClr,
}

impl TimingRole {
    /// Returns `true` for setup/hold check roles. Check edges constrain
    /// arrivals but are never traversed by the forward search.
    pub fn is_timing_check(self) -> bool {
        matches!(self, TimingRole::SetupCheck | TimingRole::HoldCheck)
    }

    /// Returns `true` for the interconnect role.
    pub fn is_wire(self) -> bool {
        self == TimingRole::Wire
    }

    /// Returns `true` for roles that leave a register or latch output.
    ///
    /// The latch enable-to-output role generalizes to clock-to-output:
    /// both start a new timing path at the storage element's output.
    pub fn is_reg_clk_to_q(self) -> bool {
        matches!(self, TimingRole::RegClkToQ | TimingRole::LatchEnToQ)
    }

    /// Returns `true` for tristate control roles.
    pub fn is_tristate(self) -> bool {
        matches!(
            self,
            TimingRole::TristateEnable | TimingRole::TristateDisable
        )
    }
}
