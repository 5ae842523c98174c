//! Analysis corners, scenes, and modes.
//!
//! A [`Corner`] is one PVT + parasitic extraction point. A [`Scene`] is
//! the unit every derived timing quantity is tagged with: one corner as
//! seen by one mode. A [`Mode`] groups the scenes that share one SDC and
//! simulation state; the facade currently drives a single mode, but all
//! derived data is scene-indexed so additional modes stay cheap.

use chronos_common::Ident;
use serde::{Deserialize, Serialize};

/// One PVT + parasitic analysis point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Corner {
    /// Corner name (e.g., `ss_0p72v_125c`).
    pub name: Ident,
    /// Dense index used by per-corner tables.
    pub index: usize,
}

/// A corner viewed by a mode; the (mode, corner) pair results are tagged
/// with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scene {
    /// Dense scene index.
    pub index: usize,
    /// The corner this scene analyzes.
    pub corner: usize,
}

/// A group of scenes sharing one SDC.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mode {
    /// Mode name.
    pub name: Ident,
    /// The corners of this mode.
    pub corners: Vec<Corner>,
    /// The scenes of this mode, one per corner.
    pub scenes: Vec<Scene>,
}

impl Mode {
    /// Creates a mode over `corner_count` corners with dense scene
    /// indices.
    pub fn new(name: Ident, corner_names: Vec<Ident>) -> Self {
        let corners: Vec<Corner> = corner_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Corner { name, index })
            .collect();
        let scenes = corners
            .iter()
            .map(|c| Scene {
                index: c.index,
                corner: c.index,
            })
            .collect();
        Self {
            name,
            corners,
            scenes,
        }
    }

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }
}
