//! Structured diagnostic messages.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Diagnostics are the primary mechanism for reporting warnings, user-input
/// errors, and capacity failures. Each diagnostic includes a severity, a
/// subsystem code, a message, an optional design-object path (the pin, net,
/// or clock the message is about), and optional explanatory notes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Hierarchical path of the design object the diagnostic refers to,
    /// if any (e.g., `"core/u_alu/add_0/Y"`).
    pub object: Option<String>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a new critical diagnostic.
    pub fn critical(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, code, message)
    }

    fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            object: None,
            notes: Vec::new(),
        }
    }

    /// Attaches the design-object path this diagnostic refers to.
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Sdc, 101);
        let diag = Diagnostic::error(code, "clock 'vclk' not found");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "clock 'vclk' not found");
        assert_eq!(format!("{}", diag.code), "C101");
        assert!(diag.object.is_none());
    }

    #[test]
    fn create_critical() {
        let code = DiagnosticCode::new(Category::Levelize, 616);
        let diag = Diagnostic::critical(code, "maximum logic level exceeded");
        assert_eq!(diag.severity, Severity::Critical);
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Search, 12);
        let diag = Diagnostic::warning(code, "unconstrained endpoint")
            .with_object("u_core/r_state/D")
            .with_note("no clock reaches this register");
        assert_eq!(diag.object.as_deref(), Some("u_core/r_state/D"));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Parasitics, 7);
        let diag = Diagnostic::warning(code, "no parasitics for net").with_object("n42");
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, diag.message);
        assert_eq!(back.object, diag.object);
    }
}
