//! Shared foundational types used across the Chronos timing analyzer.
//!
//! This crate provides core types including interned identifiers, content
//! hashing, frequency values, the min/max and rise/fall analysis axes, delay
//! value helpers, and common result types.

#![warn(missing_docs)]

pub mod delay;
pub mod frequency;
pub mod hash;
pub mod ident;
pub mod minmax;
pub mod result;
pub mod rise_fall;

pub use delay::{delay_init, fuzzy_equal, Delay, DELAY_ZERO};
pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use minmax::{EarlyLate, MinMax};
pub use result::{InternalError, StaResult};
pub use rise_fall::RiseFall;
