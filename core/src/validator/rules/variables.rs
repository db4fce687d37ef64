//! Rules: Duplicate Variable, Shadowed Variable
//!
//! A name may appear only once in `locals` and once in `parameters`. The same
//! name in both lists is legal but ambiguous: symbol resolution picks one
//! according to the configured precedence, so it is reported as a warning.

use std::collections::HashSet;

use crate::types::{Sequence, VariableDecl};

use super::super::{ValidationError, ValidationRule};

pub struct DuplicateVariableRule;

impl DuplicateVariableRule {
    fn check_list(
        &self,
        list_name: &str,
        decls: &[VariableDecl],
        errors: &mut Vec<ValidationError>,
    ) {
        let mut seen = HashSet::new();
        for (i, decl) in decls.iter().enumerate() {
            if !seen.insert(decl.name.as_str()) {
                errors.push(ValidationError::error(
                    format!("{}[{}].name", list_name, i),
                    format!("Variable '{}' is declared more than once in {}", decl.name, list_name),
                    self.id(),
                ));
            }
        }
    }
}

impl ValidationRule for DuplicateVariableRule {
    fn id(&self) -> &'static str {
        "duplicate-variable"
    }

    fn description(&self) -> &'static str {
        "Variable names must be unique within locals and within parameters"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.check_list("locals", &sequence.locals, &mut errors);
        self.check_list("parameters", &sequence.parameters, &mut errors);
        errors
    }
}

pub struct ShadowedVariableRule;

impl ValidationRule for ShadowedVariableRule {
    fn id(&self) -> &'static str {
        "shadowed-variable"
    }

    fn description(&self) -> &'static str {
        "A name declared as both a local and a parameter is ambiguous"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        let locals: HashSet<&str> = sequence.locals.iter().map(|d| d.name.as_str()).collect();

        sequence
            .parameters
            .iter()
            .enumerate()
            .filter(|(_, decl)| locals.contains(decl.name.as_str()))
            .map(|(i, decl)| {
                ValidationError::warning(
                    format!("parameters[{}].name", i),
                    format!("Variable '{}' is declared as both a local and a parameter", decl.name),
                    self.id(),
                )
            })
            .collect()
    }
}
