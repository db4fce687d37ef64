//! SeqJson → EDSL translation
//!
//! A translation is a pure function of its input: decode, validate, build a
//! symbol table from the sequence's declarations, then generate. Nothing is
//! shared between calls except the injected command dictionary, so a single
//! [`Translator`] may be used from many threads at once.
//!
//! Failures come in two tiers:
//! - structural problems (undecodable JSON, failed validation) abort the
//!   translation of that one sequence with a [`TranslateError`]
//! - semantic problems (unresolved symbols) are embedded in the output as
//!   `//ERROR:` comments and reported alongside the text

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::dictionary::{CommandDictionary, EmptyDictionary};
use crate::types::Sequence;
use crate::validator::{self, ValidationError};

pub mod diagnostics;
pub mod generator;
pub mod normalize;
pub mod symbols;
pub mod time;
pub mod writer;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use symbols::{Resolution, ShadowPrecedence, SymbolKind, SymbolTable};

use generator::Generator;
use normalize::Normalizer;
use time::TimeTagError;
use writer::EdslWriter;

/* ===================== Error Types ===================== */

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("malformed SeqJson: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid sequence: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("invalid time tag: {0}")]
    TimeTag(#[from] TimeTagError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/* ===================== Translator ===================== */

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    pub shadowing: ShadowPrecedence,
}

/// Generated EDSL plus the diagnostics embedded in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub edsl: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone)]
pub struct Translator {
    dictionary: Arc<dyn CommandDictionary>,
    options: TranslateOptions,
}

impl Translator {
    pub fn new(dictionary: Arc<dyn CommandDictionary>, options: TranslateOptions) -> Self {
        Self {
            dictionary,
            options,
        }
    }

    /// Translate a decoded sequence.
    pub fn translate(&self, sequence: &Sequence) -> Result<Translation, TranslateError> {
        let findings = validator::validate_sequence(sequence);
        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(|f| f.is_error());

        for warning in &warnings {
            tracing::warn!(seq_id = %sequence.id, "{}", warning);
        }
        if !errors.is_empty() {
            return Err(TranslateError::Invalid(errors));
        }

        // Fresh table per call; scope never leaks between sequences.
        let symbols = SymbolTable::new(
            &sequence.locals,
            &sequence.parameters,
            self.options.shadowing,
        );
        let generator = Generator::new(Normalizer::new(&symbols, self.dictionary.as_ref()));

        let mut out = EdslWriter::new();
        generator.write_sequence(&mut out, sequence)?;
        let (edsl, diagnostics) = out.finish();

        for diagnostic in &diagnostics {
            tracing::warn!(seq_id = %sequence.id, step = %diagnostic.step, "{}", diagnostic);
        }
        tracing::debug!(
            seq_id = %sequence.id,
            steps = sequence.steps.len(),
            requests = sequence.requests.len(),
            symbols = symbols.len(),
            diagnostics = diagnostics.len(),
            "Translated sequence"
        );

        Ok(Translation { edsl, diagnostics })
    }

    /// Decode and translate one SeqJson value.
    pub fn translate_value(&self, value: JsonValue) -> Result<Translation, TranslateError> {
        let sequence = Sequence::from_value(value)?;
        self.translate(&sequence)
    }

    /// `translateOne`: SeqJson value in, EDSL text out.
    pub fn translate_one(&self, value: JsonValue) -> Result<String, TranslateError> {
        self.translate_value(value).map(|t| t.edsl)
    }

    /// `translateMany`: one result per input, in input order.
    ///
    /// Items are isolated: a structural error in one sequence does not affect
    /// the others.
    pub fn translate_many(&self, values: Vec<JsonValue>) -> Vec<Result<String, TranslateError>> {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let result = self.translate_one(value);
                if let Err(err) = &result {
                    tracing::warn!(index, "Bulk item failed: {}", err);
                }
                result
            })
            .collect()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Arc::new(EmptyDictionary), TranslateOptions::default())
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/* ===================== Public API ===================== */

/// Translate one SeqJson value with no command dictionary.
pub fn translate_one(value: JsonValue) -> Result<String, TranslateError> {
    Translator::default().translate_one(value)
}

/// Translate many SeqJson values with no command dictionary.
pub fn translate_many(values: Vec<JsonValue>) -> Vec<Result<String, TranslateError>> {
    Translator::default().translate_many(values)
}
