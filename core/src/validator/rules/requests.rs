//! Rule: Empty Request

use crate::types::Sequence;

use super::super::{ValidationError, ValidationRule};

pub struct EmptyRequestRule;

impl ValidationRule for EmptyRequestRule {
    fn id(&self) -> &'static str {
        "empty-request"
    }

    fn description(&self) -> &'static str {
        "Requests must contain at least one step"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        sequence
            .requests
            .iter()
            .enumerate()
            .filter(|(_, request)| request.steps.is_empty())
            .map(|(i, request)| {
                ValidationError::error(
                    format!("requests[{}].steps", i),
                    format!("Request '{}' has no steps", request.name),
                    self.id(),
                )
            })
            .collect()
    }
}
