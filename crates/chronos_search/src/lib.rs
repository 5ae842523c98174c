//! The Chronos timing search: levelization, tagged forward/backward
//! propagation, CRPR, and path ends.
//!
//! The search is organized leaves-first:
//!
//! - [`intern`] — mutex-guarded interning tables with dense indices
//! - [`clk_info`], [`tag`], [`tag_group`] — interned arrival identity
//! - [`path`] — per-vertex path arrays and stable path references
//! - [`search_pred`] — traversal predicates (disables, case analysis)
//! - [`levelize`] — topological levels and feedback-loop breaking
//! - [`bfs`] — level-ordered work queues
//! - [`search`] — the forward arrival search
//! - [`crpr`] — clock reconvergence pessimism removal
//! - [`latches`] — latch time borrowing
//! - [`required`] — the backward required search
//! - [`path_end`] — endpoint constraint evaluation and path groups
//! - [`sta`] — the facade sequencing a timing update

#![warn(missing_docs)]

pub mod bfs;
pub mod clk_info;
pub mod crpr;
pub mod intern;
pub mod latches;
pub mod levelize;
pub mod path;
pub mod path_end;
pub mod required;
pub mod search;
pub mod search_pred;
pub mod sta;
pub mod tag;
pub mod tag_group;

pub use clk_info::{ClkInfo, ClkInfoId};
pub use crpr::CheckCrpr;
pub use levelize::{GraphLoop, Levelize, LEVEL_SPACE, MAX_LEVEL};
pub use path::{Path, PathRef, PathTable};
pub use path_end::{visit_path_ends, PathEnd, PathEndKind, PathGroup};
pub use required::{find_requireds, RequiredCmp};
pub use search::{Search, SearchCtx, LATCH_PASS_LIMIT};
pub use search_pred::SearchPred;
pub use sta::Sta;
pub use tag::{sibling_index, Tag, TagId};
pub use tag_group::{TagGroup, TagGroupBldr, TagGroupId};
