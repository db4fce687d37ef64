//! Argument normalization
//!
//! Turns a command's raw SeqJson arguments into labeled, rendered values ready
//! for the generator. Normalization never drops or reorders arguments; an
//! unresolved symbol yields exactly one diagnostic and processing continues.

use crate::dictionary::{ArgumentDefinition, CommandDictionary};
use crate::types::{Argument, ArgumentValue};

use super::diagnostics::Diagnostic;
use super::symbols::{Resolution, SymbolTable};
use super::writer::quote;

/// Label an argument is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Named(String),
    /// Top-level position: `argN`
    Positional(usize),
    /// Column inside a repeat row: `repeatN`
    RepeatField(usize),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Named(name) => write!(f, "{}", name),
            Label::Positional(index) => write!(f, "arg{}", index),
            Label::RepeatField(index) => write!(f, "repeat{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedValue {
    /// Already formatted literal (`100`, `'FALSE'`, `true`)
    Literal(String),
    /// Symbol reference, resolved or not
    Accessor(Resolution),
    /// Rows of normalized fields
    Repeat(Vec<Vec<NormalizedArgument>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedArgument {
    pub label: Label,
    pub value: RenderedValue,
    pub diagnostic: Option<Diagnostic>,
}

pub struct Normalizer<'a> {
    symbols: &'a SymbolTable,
    dictionary: &'a dyn CommandDictionary,
}

impl<'a> Normalizer<'a> {
    pub fn new(symbols: &'a SymbolTable, dictionary: &'a dyn CommandDictionary) -> Self {
        Self {
            symbols,
            dictionary,
        }
    }

    /// Normalize the top-level arguments of the command `stem`.
    pub fn normalize(&self, stem: &str, args: &[Argument]) -> Vec<NormalizedArgument> {
        let names = self.dictionary.parameter_names(stem).unwrap_or_default();
        let definitions: &[ArgumentDefinition] = self
            .dictionary
            .lookup(stem)
            .map(|def| def.arguments.as_slice())
            .unwrap_or(&[]);

        args.iter()
            .enumerate()
            .map(|(index, arg)| {
                let label = match (&arg.name, names.get(index)) {
                    (Some(name), _) => Label::Named(name.clone()),
                    (None, Some(name)) => Label::Named(name.to_string()),
                    (None, None) => Label::Positional(index),
                };
                let repeat_fields = definitions
                    .get(index)
                    .and_then(|def| def.repeat.as_deref());
                self.normalize_value(stem, label, &arg.value, repeat_fields)
            })
            .collect()
    }

    fn normalize_value(
        &self,
        stem: &str,
        label: Label,
        value: &ArgumentValue,
        repeat_fields: Option<&[String]>,
    ) -> NormalizedArgument {
        let (value, diagnostic) = match value {
            ArgumentValue::Number(n) => (RenderedValue::Literal(n.to_string()), None),
            ArgumentValue::String(s) => (RenderedValue::Literal(quote(s)), None),
            ArgumentValue::Boolean(b) => (RenderedValue::Literal(b.to_string()), None),
            ArgumentValue::Symbol(name) => {
                let resolution = self.symbols.resolve(name);
                let diagnostic = if resolution.is_resolved() {
                    None
                } else {
                    Some(Diagnostic::unresolved_symbol(name.as_str(), stem))
                };
                (RenderedValue::Accessor(resolution), diagnostic)
            }
            ArgumentValue::Repeat(rows) => {
                let rows = rows
                    .iter()
                    .map(|row| self.normalize_row(stem, row, repeat_fields))
                    .collect();
                (RenderedValue::Repeat(rows), None)
            }
        };

        NormalizedArgument {
            label,
            value,
            diagnostic,
        }
    }

    fn normalize_row(
        &self,
        stem: &str,
        row: &[Argument],
        fields: Option<&[String]>,
    ) -> Vec<NormalizedArgument> {
        row.iter()
            .enumerate()
            .map(|(column, arg)| {
                let label = match (&arg.name, fields.and_then(|f| f.get(column))) {
                    (Some(name), _) => Label::Named(name.clone()),
                    (None, Some(field)) => Label::Named(field.clone()),
                    (None, None) => Label::RepeatField(column),
                };
                // Nested repeat groups have no dictionary field names.
                self.normalize_value(stem, label, &arg.value, None)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CommandDefinition, EmptyDictionary, StaticDictionary};
    use crate::translator::symbols::{ShadowPrecedence, SymbolKind};
    use crate::types::{VariableDecl, VariableType};

    fn symbols() -> SymbolTable {
        SymbolTable::new(
            &[VariableDecl::new("temp", VariableType::Float)],
            &[VariableDecl::new("sugar", VariableType::Int)],
            ShadowPrecedence::LocalsFirst,
        )
    }

    fn number(n: i64) -> Argument {
        Argument::new(ArgumentValue::Number(n.into()))
    }

    fn string(s: &str) -> Argument {
        Argument::new(ArgumentValue::String(s.to_string()))
    }

    fn symbol(s: &str) -> Argument {
        Argument::new(ArgumentValue::Symbol(s.to_string()))
    }

    #[test]
    fn test_positional_labels_without_dictionary() {
        let symbols = symbols();
        let normalizer = Normalizer::new(&symbols, &EmptyDictionary);
        let args = normalizer.normalize("FAKE_COMMAND1", &[number(30), string("x")]);

        assert_eq!(args[0].label, Label::Positional(0));
        assert_eq!(args[0].value, RenderedValue::Literal("30".to_string()));
        assert_eq!(args[1].label.to_string(), "arg1");
        assert_eq!(args[1].value, RenderedValue::Literal("'x'".to_string()));
    }

    #[test]
    fn test_own_name_beats_dictionary() {
        let dictionary = StaticDictionary::new(vec![CommandDefinition {
            stem: "PREHEAT_OVEN".to_string(),
            arguments: vec![
                ArgumentDefinition::new("temperature"),
                ArgumentDefinition::new("duration"),
            ],
        }])
        .unwrap();
        let symbols = symbols();
        let normalizer = Normalizer::new(&symbols, &dictionary);

        let args = normalizer.normalize(
            "PREHEAT_OVEN",
            &[
                number(350),
                Argument::named("minutes", ArgumentValue::Number(20.into())),
                number(1),
            ],
        );

        assert_eq!(args[0].label, Label::Named("temperature".to_string()));
        assert_eq!(args[1].label, Label::Named("minutes".to_string()));
        assert_eq!(args[2].label, Label::Positional(2));
    }

    #[test]
    fn test_symbols_resolve_and_diagnose() {
        let symbols = symbols();
        let normalizer = Normalizer::new(&symbols, &EmptyDictionary);
        let args = normalizer.normalize(
            "PREPARE_LOAF",
            &[symbol("temp"), symbol("sugarrrrr"), symbol("sugar")],
        );

        match &args[0].value {
            RenderedValue::Accessor(r) => assert_eq!(r.kind, SymbolKind::Local),
            other => panic!("Expected accessor, got {:?}", other),
        }
        assert!(args[0].diagnostic.is_none());

        assert_eq!(
            args[1].diagnostic,
            Some(Diagnostic::unresolved_symbol("sugarrrrr", "PREPARE_LOAF"))
        );
        assert!(args[2].diagnostic.is_none());
    }

    #[test]
    fn test_repeat_rows_keep_order_and_labels() {
        let symbols = symbols();
        let normalizer = Normalizer::new(&symbols, &EmptyDictionary);
        let repeat = Argument::new(ArgumentValue::Repeat(vec![
            vec![number(10), string("another_test"), symbol("nope")],
            vec![number(5), string("repeat_test"), symbol("temp")],
        ]));

        let args = normalizer.normalize("FAKE_COMMAND1", &[repeat]);
        let rows = match &args[0].value {
            RenderedValue::Repeat(rows) => rows,
            other => panic!("Expected repeat, got {:?}", other),
        };

        assert_eq!(rows.len(), 2);
        let labels: Vec<String> = rows[0].iter().map(|f| f.label.to_string()).collect();
        assert_eq!(labels, vec!["repeat0", "repeat1", "repeat2"]);
        assert_eq!(rows[1][0].value, RenderedValue::Literal("5".to_string()));
        assert_eq!(
            rows[0][2].diagnostic,
            Some(Diagnostic::unresolved_symbol("nope", "FAKE_COMMAND1"))
        );
        assert!(rows[1][2].diagnostic.is_none());
    }

    #[test]
    fn test_repeat_fields_from_dictionary() {
        let dictionary = StaticDictionary::new(vec![CommandDefinition {
            stem: "ADD_WATER".to_string(),
            arguments: vec![ArgumentDefinition::repeat(
                "steps",
                vec!["volume".to_string()],
            )],
        }])
        .unwrap();
        let symbols = symbols();
        let normalizer = Normalizer::new(&symbols, &dictionary);
        let repeat = Argument::new(ArgumentValue::Repeat(vec![vec![number(1), number(2)]]));

        let args = normalizer.normalize("ADD_WATER", &[repeat]);
        assert_eq!(args[0].label, Label::Named("steps".to_string()));
        match &args[0].value {
            RenderedValue::Repeat(rows) => {
                assert_eq!(rows[0][0].label, Label::Named("volume".to_string()));
                assert_eq!(rows[0][1].label, Label::RepeatField(1));
            }
            other => panic!("Expected repeat, got {:?}", other),
        }
    }
}
