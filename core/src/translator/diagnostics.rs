//! Semantic diagnostics
//!
//! Diagnostics never abort a translation. They are written into the EDSL right
//! after the offending expression as `<expr> //ERROR: <message>` so whoever
//! reviews the output sees where resolution failed.

/// A non-fatal problem found while normalizing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Stem, ground name or sequence of the step the diagnostic belongs to
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A symbol argument names neither a local nor a parameter
    UnresolvedSymbol(String),
}

impl Diagnostic {
    pub fn unresolved_symbol(name: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::UnresolvedSymbol(name.into()),
            step: step.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DiagnosticKind::UnresolvedSymbol(name) => write!(
                f,
                "Variable '{}' is not defined as a local or parameter",
                name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_symbol_message() {
        let diagnostic = Diagnostic::unresolved_symbol("sugarrrrr", "PREPARE_LOAF");
        assert_eq!(
            diagnostic.to_string(),
            "Variable 'sugarrrrr' is not defined as a local or parameter"
        );
    }
}
