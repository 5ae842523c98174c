//! Opaque ID newtypes for netlist and library entities.
//!
//! All IDs are thin `u32` wrappers used as arena indices. They are `Copy`,
//! `Hash`, and `Serialize`/`Deserialize`.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a library cell.
    CellId
);

define_id!(
    /// Opaque, copyable ID for a port of a library cell.
    PortId
);

define_id!(
    /// Opaque, copyable ID for an instance in the netlist.
    InstanceId
);

define_id!(
    /// Opaque, copyable ID for a pin (an instance port connection or a
    /// top-level port).
    PinId
);

define_id!(
    /// Opaque, copyable ID for a net.
    NetId
);
