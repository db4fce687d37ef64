//! Structural Validation for SeqJson Sequences
//!
//! This module provides an extensible rule-based validation system that runs
//! after decoding to catch problems the JSON shape alone can't express:
//! stems that can't be written as EDSL member accesses, duplicate variables,
//! unparseable time tags and so on.
//!
//! # Usage
//!
//! ```ignore
//! use seqedsl_core::validator::validate_sequence;
//!
//! let sequence = Sequence::from_json(source)?;
//! let errors = validate_sequence(&sequence);
//! if errors.iter().any(|e| e.is_error()) {
//!     // Refuse to translate
//! }
//! ```
//!
//! # Architecture
//!
//! 1. **ValidationRule trait** - Each rule implements this trait
//! 2. **Validator** - Collects and runs all rules
//! 3. **ValidationError** - The output of validation (errors, warnings)
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use crate::types::{Sequence, Step};

// ============================================================================
// Validation Error Types
// ============================================================================

/// A validation finding produced by structural analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Location inside the sequence, e.g. `steps[1].time`
    pub path: String,
    /// Human-readable message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

/// Severity levels for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Translation cannot proceed
    Error,
    /// Translation proceeds, but the output may surprise
    Warning,
}

impl ValidationError {
    pub fn error(path: impl Into<String>, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    pub fn warning(
        path: impl Into<String>,
        message: impl Into<String>,
        rule_id: &'static str,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at {}: {} [{}]",
            severity, self.path, self.message, self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules must implement.
///
/// Each rule checks one aspect of the sequence and must not depend on the
/// results of other rules.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "duplicate-variable")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any findings. Empty means no issues.
    fn validate(&self, sequence: &Sequence) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                // Error rules - translation would produce broken EDSL
                Box::new(rules::InvalidIdentifierRule),
                Box::new(rules::MissingNameRule),
                Box::new(rules::DuplicateVariableRule),
                Box::new(rules::InvalidTimeTagRule),
                Box::new(rules::EmptyRequestRule),
                // Warning rules
                Box::new(rules::ShadowedVariableRule),
            ],
        }
    }

    /// Run all validation rules and collect findings.
    pub fn validate(&self, sequence: &Sequence) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(sequence))
            .collect()
    }

    /// Get a list of all registered rules
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Step traversal shared by rules
// ============================================================================

/// Visit every step of a sequence, including request steps, with its path.
pub(crate) fn for_each_step(sequence: &Sequence, mut visit: impl FnMut(&str, &Step)) {
    for (i, step) in sequence.steps.iter().enumerate() {
        visit(&format!("steps[{}]", i), step);
    }
    for (r, request) in sequence.requests.iter().enumerate() {
        for (i, step) in request.steps.iter().enumerate() {
            visit(&format!("requests[{}].steps[{}]", r, i), step);
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a sequence and return all findings.
pub fn validate_sequence(sequence: &Sequence) -> Vec<ValidationError> {
    Validator::new().validate(sequence)
}
