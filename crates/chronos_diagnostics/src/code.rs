//! Diagnostic codes with subsystem category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subsystem a diagnostic originates from, determining its prefix letter.
///
/// Each category maps to a single-character prefix used in diagnostic code
/// display (e.g., `L616` for a levelizer diagnostic, `P102` for parasitics).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Netlist / network model diagnostics, prefixed with `N`.
    Network,
    /// Timing graph diagnostics, prefixed with `G`.
    Graph,
    /// Levelizer diagnostics, prefixed with `L`.
    Levelize,
    /// Parasitic network and reduction diagnostics, prefixed with `P`.
    Parasitics,
    /// Constraint (SDC) diagnostics, prefixed with `C`.
    Sdc,
    /// Search (arrival/required/path-end) diagnostics, prefixed with `S`.
    Search,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Network => 'N',
            Category::Graph => 'G',
            Category::Levelize => 'L',
            Category::Parasitics => 'P',
            Category::Sdc => 'C',
            Category::Search => 'S',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `L616`, `C101`, `S510`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The subsystem of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Network.prefix(), 'N');
        assert_eq!(Category::Graph.prefix(), 'G');
        assert_eq!(Category::Levelize.prefix(), 'L');
        assert_eq!(Category::Parasitics.prefix(), 'P');
        assert_eq!(Category::Sdc.prefix(), 'C');
        assert_eq!(Category::Search.prefix(), 'S');
    }

    #[test]
    fn display_format() {
        let code = DiagnosticCode::new(Category::Levelize, 616);
        assert_eq!(format!("{code}"), "L616");

        let code = DiagnosticCode::new(Category::Sdc, 3);
        assert_eq!(format!("{code}"), "C003");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Search, 510);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
