//! EDSL parser - PEST-based parser for sequence EDSL modules
//!
//! The inverse of the translator: reads the `Sequence.new({...})` module the
//! generator emits and rebuilds the SeqJson sequence, with span information
//! for error reporting.

use pest::Parser;
use pest_derive::Parser;
use serde_json::{Map, Number, Value as JsonValue};

use crate::types::{
    Argument, ArgumentValue, GroundEpoch, Metadata, Request, RequestKind, RequestTiming,
    Sequence, SequenceTarget, Step, StepKind, Time, VariableDecl, VariableType,
};

#[cfg(test)]
mod tests;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/edsl.pest"]
struct EdslParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/* ===================== Spans ===================== */

/// Source location, 0-indexed lines and columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/* ===================== Error Types ===================== */

#[derive(Debug)]
pub enum ParseError {
    PestError(String, Option<Span>),
    BuildError(String, Option<Span>),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::PestError(_, span) => *span,
            ParseError::BuildError(_, span) => *span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ParseError::PestError(msg, _) => msg,
            ParseError::BuildError(msg, _) => msg,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::PestError(msg, _) => write!(f, "{}", msg),
            ParseError::BuildError(msg, Some(span)) => write!(
                f,
                "{} (line {}, col {})",
                msg,
                span.start_line + 1,
                span.start_col + 1
            ),
            ParseError::BuildError(msg, None) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let span = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => Some(Span {
                start: 0,
                end: 0,
                start_line: line.saturating_sub(1),
                start_col: col.saturating_sub(1),
                end_line: line.saturating_sub(1),
                end_col: col,
            }),
            pest::error::LineColLocation::Span((start_line, start_col), (end_line, end_col)) => {
                Some(Span {
                    start: 0,
                    end: 0,
                    start_line: start_line.saturating_sub(1),
                    start_col: start_col.saturating_sub(1),
                    end_line: end_line.saturating_sub(1),
                    end_col: end_col.saturating_sub(1),
                })
            }
        };
        ParseError::PestError(err.to_string(), span)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Span Helpers ===================== */

fn pair_to_span(pair: &Pair, source: &str) -> Span {
    let pest_span = pair.as_span();
    let start = pest_span.start();
    let end = pest_span.end();

    let (start_line, start_col) = offset_to_line_col(source, start);
    let (end_line, end_col) = offset_to_line_col(source, end);

    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/// Convert byte offset to (line, column) - 0-indexed
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    let mut current_offset = 0;

    for ch in source.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

fn build_error(message: impl Into<String>, pair: &Pair, source: &str) -> ParseError {
    ParseError::BuildError(message.into(), Some(pair_to_span(pair, source)))
}

/* ===================== Public API ===================== */

/// Parse an EDSL module into a SeqJson sequence.
pub fn parse_edsl(source: &str) -> ParseResult<Sequence> {
    let mut pairs = EdslParser::parse(Rule::program, source)?;

    let program = pairs.next().unwrap();
    let sequence = program.into_inner().next().unwrap();
    build_sequence(sequence, source)
}

/* ===================== Sequence Builder ===================== */

fn build_sequence(pair: Pair, source: &str) -> ParseResult<Sequence> {
    let span = pair_to_span(&pair, source);
    let mut id = None;
    let mut metadata = Metadata::new();
    let mut locals = Vec::new();
    let mut parameters = Vec::new();
    let mut steps = Vec::new();
    let mut requests = Vec::new();

    for field in pair.into_inner() {
        match field.as_rule() {
            Rule::seq_id_field => {
                id = Some(build_string(field.into_inner().next().unwrap())?);
            }
            Rule::metadata_field => {
                metadata = build_object(field.into_inner().next().unwrap(), source)?;
            }
            Rule::locals_field => locals = build_variables(field, source)?,
            Rule::parameters_field => parameters = build_variables(field, source)?,
            Rule::steps_field => {
                steps = field
                    .into_inner()
                    .map(|step| build_step(step, source))
                    .collect::<ParseResult<_>>()?;
            }
            Rule::requests_field => {
                requests = field
                    .into_inner()
                    .map(|request| build_request(request, source))
                    .collect::<ParseResult<_>>()?;
            }
            _ => {
                return Err(build_error(
                    format!("Unexpected sequence field: {:?}", field.as_rule()),
                    &field,
                    source,
                ))
            }
        }
    }

    let id = id.ok_or_else(|| {
        ParseError::BuildError("Sequence is missing seqId".to_string(), Some(span))
    })?;

    Ok(Sequence {
        id,
        metadata,
        locals,
        parameters,
        steps,
        requests,
    })
}

fn build_variables(pair: Pair, source: &str) -> ParseResult<Vec<VariableDecl>> {
    pair.into_inner()
        .map(|decl| {
            let mut inner = decl.into_inner();
            let type_pair = inner.next().unwrap();
            let var_type = VariableType::from_keyword(type_pair.as_str()).ok_or_else(|| {
                build_error(
                    format!("Unknown variable type: {}", type_pair.as_str()),
                    &type_pair,
                    source,
                )
            })?;
            let name = build_string(inner.next().unwrap())?;
            Ok(VariableDecl { name, var_type })
        })
        .collect()
}

/* ===================== Step Builder ===================== */

fn build_time(pair: Pair, source: &str) -> ParseResult<Time> {
    let tag = || -> String {
        pair.clone()
            .into_inner()
            .next()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default()
    };

    match pair.as_rule() {
        Rule::absolute_time => Ok(Time::Absolute { tag: tag() }),
        Rule::relative_time => Ok(Time::CommandRelative { tag: tag() }),
        Rule::epoch_time => Ok(Time::EpochRelative { tag: tag() }),
        Rule::complete_time => Ok(Time::CommandComplete),
        _ => Err(build_error(
            format!("Expected time prefix, got {:?}", pair.as_rule()),
            &pair,
            source,
        )),
    }
}

fn build_step(pair: Pair, source: &str) -> ParseResult<Step> {
    let mut inner = pair.into_inner();

    let time = build_time(inner.next().unwrap(), source)?;

    let builder = inner.next().unwrap();
    let (kind, args) = match builder.as_rule() {
        Rule::command_call => {
            let mut call = builder.into_inner();
            let stem = call.next().unwrap().as_str().to_string();
            let args = match call.next() {
                Some(args_pair) => build_command_args(args_pair, source)?,
                None => Vec::new(),
            };
            (StepKind::Command { stem }, args)
        }
        Rule::activate_call | Rule::load_call => {
            let is_activate = builder.as_rule() == Rule::activate_call;
            let target = SequenceTarget {
                sequence: build_string(builder.into_inner().next().unwrap())?,
                engine: None,
                epoch: None,
            };
            let kind = if is_activate {
                StepKind::Activate(target)
            } else {
                StepKind::Load(target)
            };
            (kind, Vec::new())
        }
        Rule::ground_block_call => {
            let name = build_string(builder.into_inner().next().unwrap())?;
            (StepKind::GroundBlock { name }, Vec::new())
        }
        Rule::ground_event_call => {
            let name = build_string(builder.into_inner().next().unwrap())?;
            (StepKind::GroundEvent { name }, Vec::new())
        }
        _ => {
            return Err(build_error(
                format!("Unexpected step builder: {:?}", builder.as_rule()),
                &builder,
                source,
            ))
        }
    };

    let mut step = Step::new(kind, time).with_args(args);

    for chain in inner {
        match chain.as_rule() {
            Rule::arguments_chain => {
                if matches!(step.kind, StepKind::Command { .. }) {
                    return Err(build_error(
                        "Command steps take arguments in the call, not .ARGUMENTS()",
                        &chain,
                        source,
                    ));
                }
                let array = build_value(chain.clone().into_inner().next().unwrap(), source)?;
                step.args = serde_json::from_value(array)
                    .map_err(|e| build_error(format!("Invalid ARGUMENTS: {}", e), &chain, source))?;
            }
            Rule::description_chain => {
                step.description = Some(build_string(chain.into_inner().next().unwrap())?);
            }
            Rule::engine_chain => {
                let number_pair = chain.clone().into_inner().next().unwrap();
                let engine: i64 = number_pair.as_str().parse().map_err(|_| {
                    build_error("ENGINE expects an integer", &number_pair, source)
                })?;
                match &mut step.kind {
                    StepKind::Activate(target) | StepKind::Load(target) => {
                        target.engine = Some(engine)
                    }
                    _ => {
                        return Err(build_error(
                            "ENGINE is only valid on ACTIVATE or LOAD",
                            &chain,
                            source,
                        ))
                    }
                }
            }
            Rule::epoch_chain => {
                let epoch = build_string(chain.clone().into_inner().next().unwrap())?;
                match &mut step.kind {
                    StepKind::Activate(target) | StepKind::Load(target) => {
                        target.epoch = Some(epoch)
                    }
                    _ => {
                        return Err(build_error(
                            "EPOCH is only valid on ACTIVATE or LOAD",
                            &chain,
                            source,
                        ))
                    }
                }
            }
            Rule::metadata_chain => {
                step.metadata = build_object(chain.into_inner().next().unwrap(), source)?;
            }
            Rule::models_chain => {
                let array = build_value(chain.clone().into_inner().next().unwrap(), source)?;
                step.models = serde_json::from_value(array)
                    .map_err(|e| build_error(format!("Invalid MODELS: {}", e), &chain, source))?;
            }
            _ => {
                return Err(build_error(
                    format!("Unexpected chained call: {:?}", chain.as_rule()),
                    &chain,
                    source,
                ))
            }
        }
    }

    Ok(step)
}

/// `({ label: value, ... })` → arguments. `argN` at position N means unnamed.
fn build_command_args(pair: Pair, source: &str) -> ParseResult<Vec<Argument>> {
    pair.into_inner()
        .enumerate()
        .map(|(index, entry)| build_arg_entry(entry, source, &format!("arg{}", index)))
        .collect()
}

fn build_arg_entry(pair: Pair, source: &str, positional_label: &str) -> ParseResult<Argument> {
    let mut inner = pair.into_inner();
    let label = inner.next().unwrap().as_str();
    let value_pair = inner.next().unwrap();

    let value = match value_pair.as_rule() {
        Rule::string => ArgumentValue::String(build_string(value_pair)?),
        Rule::number => ArgumentValue::Number(build_number(&value_pair, source)?),
        Rule::boolean => ArgumentValue::Boolean(value_pair.as_str() == "true"),
        Rule::accessor => {
            // `locals.x`, `parameters.x` and `unknown.x` all name the symbol `x`
            let name = value_pair.into_inner().nth(1).unwrap().as_str();
            ArgumentValue::Symbol(name.to_string())
        }
        Rule::repeat_rows => {
            let rows = value_pair
                .into_inner()
                .map(|row| {
                    row.into_inner()
                        .enumerate()
                        .map(|(column, field)| {
                            build_arg_entry(field, source, &format!("repeat{}", column))
                        })
                        .collect::<ParseResult<Vec<_>>>()
                })
                .collect::<ParseResult<Vec<_>>>()?;
            ArgumentValue::Repeat(rows)
        }
        _ => {
            return Err(build_error(
                format!("Unexpected argument value: {:?}", value_pair.as_rule()),
                &value_pair,
                source,
            ))
        }
    };

    let name = if label == positional_label {
        None
    } else {
        Some(label.to_string())
    };
    Ok(Argument { name, value })
}

/* ===================== Request Builder ===================== */

fn build_request(pair: Pair, source: &str) -> ParseResult<Request> {
    let span = pair_to_span(&pair, source);
    let mut time = None;
    let mut name = None;
    let mut ground_epoch = None;
    let mut steps = Vec::new();
    let mut description = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::absolute_time | Rule::relative_time | Rule::epoch_time | Rule::complete_time => {
                time = Some(build_time(part, source)?);
            }
            Rule::string => name = Some(build_string(part)?),
            Rule::object => {
                let object = JsonValue::Object(build_object(part.clone(), source)?);
                let epoch: GroundEpoch = serde_json::from_value(object).map_err(|e| {
                    build_error(format!("Invalid ground epoch: {}", e), &part, source)
                })?;
                ground_epoch = Some(epoch);
            }
            Rule::step => steps.push(build_step(part, source)?),
            Rule::description_chain => {
                description = Some(build_string(part.into_inner().next().unwrap())?);
            }
            _ => {
                return Err(build_error(
                    format!("Unexpected request content: {:?}", part.as_rule()),
                    &part,
                    source,
                ))
            }
        }
    }

    let timing = match (time, ground_epoch) {
        (Some(time), None) => RequestTiming::Time { time },
        (None, Some(ground_epoch)) => RequestTiming::GroundEpoch { ground_epoch },
        (Some(_), Some(_)) => {
            return Err(ParseError::BuildError(
                "REQUEST cannot have both a time prefix and a ground epoch".to_string(),
                Some(span),
            ))
        }
        (None, None) => {
            return Err(ParseError::BuildError(
                "REQUEST needs a time prefix or a ground epoch".to_string(),
                Some(span),
            ))
        }
    };

    Ok(Request {
        kind: RequestKind::Request,
        name: name.unwrap_or_default(),
        description,
        steps,
        timing,
    })
}

/* ===================== Value Builders ===================== */

fn build_value(pair: Pair, source: &str) -> ParseResult<JsonValue> {
    match pair.as_rule() {
        Rule::object => Ok(JsonValue::Object(build_object(pair, source)?)),
        Rule::array => {
            let items = pair
                .into_inner()
                .map(|item| build_value(item, source))
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(JsonValue::Array(items))
        }
        Rule::string => Ok(JsonValue::String(build_string(pair)?)),
        Rule::number => Ok(JsonValue::Number(build_number(&pair, source)?)),
        Rule::boolean => Ok(JsonValue::Bool(pair.as_str() == "true")),
        Rule::null => Ok(JsonValue::Null),
        _ => Err(build_error(
            format!("Unexpected value: {:?}", pair.as_rule()),
            &pair,
            source,
        )),
    }
}

fn build_object(pair: Pair, source: &str) -> ParseResult<Map<String, JsonValue>> {
    let mut map = Map::new();
    for entry in pair.into_inner() {
        let mut inner = entry.into_inner();
        let key_pair = inner.next().unwrap();
        let key = match key_pair.as_rule() {
            Rule::string => build_string(key_pair)?,
            _ => key_pair.as_str().to_string(),
        };
        let value = build_value(inner.next().unwrap(), source)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn build_number(pair: &Pair, source: &str) -> ParseResult<Number> {
    serde_json::from_str::<Number>(pair.as_str())
        .map_err(|_| build_error(format!("Invalid number: {}", pair.as_str()), pair, source))
}

/// Unquote a single-quoted string literal.
fn build_string(pair: Pair) -> ParseResult<String> {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or("");

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {
                return Err(ParseError::BuildError(
                    "Unterminated escape in string literal".to_string(),
                    None,
                ))
            }
        }
    }
    Ok(out)
}
