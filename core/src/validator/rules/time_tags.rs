//! Rule: Invalid Time Tag
//!
//! Absolute tags must be day-of-year timestamps so they can be normalized.
//! Relative and epoch-relative tags are emitted verbatim inside a template
//! literal, so they must be non-empty and free of backticks.

use crate::translator::time::{check_offset_tag, normalize_absolute};
use crate::types::{RequestTiming, Sequence, Time};

use super::super::{for_each_step, ValidationError, ValidationRule};

pub struct InvalidTimeTagRule;

impl InvalidTimeTagRule {
    fn check(&self, path: String, time: &Time, errors: &mut Vec<ValidationError>) {
        let result = match time {
            Time::Absolute { tag } => normalize_absolute(tag).map(|_| ()),
            Time::CommandRelative { tag } | Time::EpochRelative { tag } => check_offset_tag(tag),
            Time::CommandComplete => Ok(()),
        };
        if let Err(err) = result {
            errors.push(ValidationError::error(path, err.to_string(), self.id()));
        }
    }
}

impl ValidationRule for InvalidTimeTagRule {
    fn id(&self) -> &'static str {
        "invalid-time-tag"
    }

    fn description(&self) -> &'static str {
        "Time tags must be renderable as EDSL time prefixes"
    }

    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for_each_step(sequence, |path, step| {
            self.check(format!("{}.time", path), &step.time, &mut errors);
        });

        for (i, request) in sequence.requests.iter().enumerate() {
            if let RequestTiming::Time { time } = &request.timing {
                self.check(format!("requests[{}].time", i), time, &mut errors);
            }
        }

        errors
    }
}
