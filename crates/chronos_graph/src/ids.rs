//! Opaque ID newtypes for timing graph entities.

use chronos_network::ArenaId;
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
    /// Opaque, copyable ID for a vertex in the timing graph.
    VertexId
);

define_id!(
    /// Opaque, copyable ID for an edge in the timing graph.
    EdgeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn vertex_id_roundtrip() {
        let id = VertexId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn edge_id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(EdgeId::from_raw(1));
        set.insert(EdgeId::from_raw(1));
        set.insert(EdgeId::from_raw(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = VertexId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let back: VertexId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
