//! Structured diagnostics for the Chronos timing analyzer.
//!
//! All user-visible messages flow through a [`DiagnosticSink`]: warnings for
//! recoverable constraint problems, errors for bad user input, and critical
//! diagnostics for exceeded capacity ceilings that terminate the analysis.
//! Diagnostics reference design objects by hierarchical path rather than
//! source locations, since the analyzer's inputs are netlists and
//! constraints rather than source text.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
