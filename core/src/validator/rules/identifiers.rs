//! Rules: Invalid Identifier, Missing Name
//!
//! Command stems and variable names end up as EDSL member accesses
//! (`C.BAKE_BREAD`, `locals.temp`), so they must be identifiers. Ground step
//! names, activate/load targets and request names are quoted, so they only
//! need to be non-empty.

use crate::translator::writer::is_identifier;
use crate::types::{Sequence, StepKind};

use super::super::{for_each_step, ValidationError, ValidationRule};

pub struct InvalidIdentifierRule;

impl ValidationRule for InvalidIdentifierRule {
    fn id(&self) -> &'static str {
        "invalid-identifier"
    }

    fn description(&self) -> &'static str {
        "Command stems and variable names must be identifiers"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let declarations = sequence
            .locals
            .iter()
            .enumerate()
            .map(|(i, decl)| (format!("locals[{}].name", i), decl))
            .chain(
                sequence
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(i, decl)| (format!("parameters[{}].name", i), decl)),
            );
        for (path, decl) in declarations {
            if !is_identifier(&decl.name) {
                errors.push(ValidationError::error(
                    path,
                    format!("Variable name '{}' is not a valid identifier", decl.name),
                    self.id(),
                ));
            }
        }

        for_each_step(sequence, |path, step| {
            if let StepKind::Command { stem } = &step.kind {
                if !is_identifier(stem) {
                    errors.push(ValidationError::error(
                        format!("{}.stem", path),
                        format!("Command stem '{}' is not a valid identifier", stem),
                        self.id(),
                    ));
                }
            }
        });

        errors
    }
}

pub struct MissingNameRule;

impl ValidationRule for MissingNameRule {
    fn id(&self) -> &'static str {
        "missing-name"
    }

    fn description(&self) -> &'static str {
        "Ground steps, activate/load steps and requests must be named"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for_each_step(sequence, |path, step| {
            let (field, value) = match &step.kind {
                StepKind::Command { .. } => return,
                StepKind::Activate(target) | StepKind::Load(target) => {
                    ("sequence", target.sequence.as_str())
                }
                StepKind::GroundBlock { name } | StepKind::GroundEvent { name } => {
                    ("name", name.as_str())
                }
            };
            if value.trim().is_empty() {
                errors.push(ValidationError::error(
                    format!("{}.{}", path, field),
                    format!("Step field '{}' must not be empty", field),
                    self.id(),
                ));
            }
        });

        for (i, request) in sequence.requests.iter().enumerate() {
            if request.name.trim().is_empty() {
                errors.push(ValidationError::error(
                    format!("requests[{}].name", i),
                    "Request name must not be empty",
                    self.id(),
                ));
            }
        }

        errors
    }
}
