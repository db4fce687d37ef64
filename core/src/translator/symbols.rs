//! Symbol table for locals and parameters
//!
//! Built once per translation from the sequence's declarations. A name
//! resolves to exactly one of local, parameter or unresolved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::VariableDecl;

/// Which declaration list wins when a name appears in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowPrecedence {
    #[default]
    LocalsFirst,
    ParametersFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Local,
    Parameter,
    Unresolved,
}

impl SymbolKind {
    /// Object the EDSL addresses this kind of symbol through.
    pub fn scope(self) -> &'static str {
        match self {
            SymbolKind::Local => "locals",
            SymbolKind::Parameter => "parameters",
            SymbolKind::Unresolved => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub kind: SymbolKind,
    /// `locals.<name>`, `parameters.<name>` or `unknown.<name>`
    pub accessor: String,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.kind != SymbolKind::Unresolved
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolKind>,
}

impl SymbolTable {
    pub fn new(
        locals: &[VariableDecl],
        parameters: &[VariableDecl],
        precedence: ShadowPrecedence,
    ) -> Self {
        let (first, first_kind, second, second_kind) = match precedence {
            ShadowPrecedence::LocalsFirst => {
                (locals, SymbolKind::Local, parameters, SymbolKind::Parameter)
            }
            ShadowPrecedence::ParametersFirst => {
                (parameters, SymbolKind::Parameter, locals, SymbolKind::Local)
            }
        };

        let mut symbols = HashMap::with_capacity(locals.len() + parameters.len());
        for decl in first {
            symbols.entry(decl.name.clone()).or_insert(first_kind);
        }
        for decl in second {
            symbols.entry(decl.name.clone()).or_insert(second_kind);
        }

        Self { symbols }
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        let kind = self
            .symbols
            .get(name)
            .copied()
            .unwrap_or(SymbolKind::Unresolved);
        Resolution {
            kind,
            accessor: format!("{}.{}", kind.scope(), name),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariableType;

    fn table(precedence: ShadowPrecedence) -> SymbolTable {
        SymbolTable::new(
            &[
                VariableDecl::new("temp", VariableType::Float),
                VariableDecl::new("shared", VariableType::Int),
            ],
            &[
                VariableDecl::new("sugar", VariableType::Int),
                VariableDecl::new("shared", VariableType::String),
            ],
            precedence,
        )
    }

    #[test]
    fn test_resolve_local() {
        let resolution = table(ShadowPrecedence::LocalsFirst).resolve("temp");
        assert_eq!(resolution.kind, SymbolKind::Local);
        assert_eq!(resolution.accessor, "locals.temp");
    }

    #[test]
    fn test_resolve_parameter() {
        let resolution = table(ShadowPrecedence::LocalsFirst).resolve("sugar");
        assert_eq!(resolution.kind, SymbolKind::Parameter);
        assert_eq!(resolution.accessor, "parameters.sugar");
    }

    #[test]
    fn test_resolve_unknown() {
        let resolution = table(ShadowPrecedence::LocalsFirst).resolve("sugarrrrr");
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.accessor, "unknown.sugarrrrr");
    }

    #[test]
    fn test_shadowing_follows_precedence() {
        assert_eq!(
            table(ShadowPrecedence::LocalsFirst).resolve("shared").kind,
            SymbolKind::Local
        );
        assert_eq!(
            table(ShadowPrecedence::ParametersFirst).resolve("shared").kind,
            SymbolKind::Parameter
        );
    }

    #[test]
    fn test_len_counts_distinct_names() {
        assert_eq!(table(ShadowPrecedence::LocalsFirst).len(), 3);
        assert!(SymbolTable::new(&[], &[], ShadowPrecedence::LocalsFirst).is_empty());
    }
}
