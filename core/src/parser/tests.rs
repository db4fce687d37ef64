//! Tests for the EDSL parser

use super::*;
use crate::translator::translate_one;
use serde_json::json;

const ALL_POSSIBLE_FIELDS: &str = include_str!("../../fixtures/all_possible_fields.json");

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse source, panicking with the parser's message on failure
fn parse(source: &str) -> Sequence {
    match parse_edsl(source) {
        Ok(sequence) => sequence,
        Err(e) => panic!("Parse should succeed: {}", e),
    }
}

fn single_step(body: &str) -> String {
    format!(
        "export default () =>\n  Sequence.new({{\n    seqId: 'one',\n    metadata: {{}},\n    steps: ({{ locals, parameters }}) => ([\n      {},\n    ]),\n  }});",
        body
    )
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_generated_edsl_parses_back_to_same_sequence() {
    let expected = Sequence::from_json(ALL_POSSIBLE_FIELDS).unwrap();
    let edsl = translate_one(serde_json::from_str(ALL_POSSIBLE_FIELDS).unwrap()).unwrap();

    let parsed = parse(&edsl);
    assert_eq!(parsed, expected);
}

#[test]
fn test_diagnostic_comments_are_ignored() {
    let edsl = translate_one(json!({
        "id": "seq",
        "locals": [{ "name": "temp", "type": "FLOAT" }],
        "steps": [{
            "type": "command",
            "stem": "PREPARE_LOAF",
            "time": { "type": "COMMAND_COMPLETE" },
            "args": [
                { "name": "tb_sugar", "type": "symbol", "value": "sugarrrrr" },
                { "name": "gluten_free", "type": "string", "value": "FALSE" }
            ]
        }]
    }))
    .unwrap();
    assert!(edsl.contains("//ERROR:"));

    let sequence = parse(&edsl);
    let step = &sequence.steps[0];
    assert_eq!(step.args.len(), 2);
    assert_eq!(
        step.args[0],
        Argument::named("tb_sugar", ArgumentValue::Symbol("sugarrrrr".to_string()))
    );
    assert_eq!(
        step.args[1],
        Argument::named("gluten_free", ArgumentValue::String("FALSE".to_string()))
    );
}

// ============================================================================
// Steps
// ============================================================================

#[test]
fn test_positional_labels_become_unnamed() {
    let sequence = parse(&single_step(
        "R`00:00:05`.SET_MODE({\n        arg0: 'SAFE',\n        level: 3,\n        arg2: true,\n      })",
    ));

    let step = &sequence.steps[0];
    assert_eq!(step.time, Time::CommandRelative { tag: "00:00:05".to_string() });
    assert_eq!(step.kind, StepKind::Command { stem: "SET_MODE".to_string() });
    assert_eq!(step.args[0].name, None);
    assert_eq!(step.args[1].name.as_deref(), Some("level"));
    assert_eq!(step.args[2].name, None);
    assert_eq!(step.args[2].value, ArgumentValue::Boolean(true));
}

#[test]
fn test_bare_command_has_no_arguments() {
    let sequence = parse(&single_step("C.BAKE_BREAD"));
    assert_eq!(sequence.steps[0].time, Time::CommandComplete);
    assert!(sequence.steps[0].args.is_empty());
}

#[test]
fn test_repeat_rows() {
    let sequence = parse(&single_step(
        "C.FILL({\n        arg0: [\n          {\n            repeat0: 1,\n            slot: 'a',\n          },\n        ],\n      })",
    ));

    match &sequence.steps[0].args[0].value {
        ArgumentValue::Repeat(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0][0].name, None);
            assert_eq!(rows[0][1].name.as_deref(), Some("slot"));
        }
        other => panic!("Expected repeat, got {:?}", other),
    }
}

#[test]
fn test_escaped_strings() {
    let sequence = parse(&single_step(r"C.ECHO({ arg0: 'it\'s a\\b\n' })"));
    assert_eq!(
        sequence.steps[0].args[0].value,
        ArgumentValue::String("it's a\\b\n".to_string())
    );
}

#[test]
fn test_model_values_accept_json_objects() {
    let sequence = parse(&single_step(
        "C.NOOP\n        .MODELS([\n          {\n            offset: '00:00:00',\n            value: {\"a\":1},\n            variable: 'v',\n          }\n        ])",
    ));
    assert_eq!(sequence.steps[0].models[0].value, json!({ "a": 1 }));
}

#[test]
fn test_structured_model_values_round_trip() {
    let value = json!({
        "id": "m",
        "steps": [{
            "type": "command",
            "stem": "NOOP",
            "time": { "type": "COMMAND_COMPLETE" },
            "models": [{
                "offset": "00:00:00",
                "variable": "v",
                "value": { "b": [1, "x"], "a": {} }
            }]
        }]
    });
    let expected = Sequence::from_value(value.clone()).unwrap();
    let edsl = translate_one(value).unwrap();
    assert_eq!(parse(&edsl), expected);
}

#[test]
fn test_numbers_keep_source_text() {
    let sequence = parse(&single_step(
        "C.SET_VALUES({\n        arg0: 1E3,\n        arg1: 0.10,\n      })",
    ));
    let args = &sequence.steps[0].args;
    assert!(matches!(&args[0].value, ArgumentValue::Number(n) if n.to_string() == "1E3"));
    assert!(matches!(&args[1].value, ArgumentValue::Number(n) if n.to_string() == "0.10"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_error_has_span() {
    let err = parse_edsl("export default () => Sequence.new({ seqId: 'x', steps: nope })")
        .unwrap_err();
    assert!(matches!(err, ParseError::PestError(_, Some(_))));
}

#[test]
fn test_missing_seq_id() {
    let err = parse_edsl("export default () => Sequence.new({ metadata: {} });").unwrap_err();
    assert!(matches!(err, ParseError::BuildError(_, _)));
    assert!(err.message().contains("seqId"));
}

#[test]
fn test_unknown_variable_type() {
    let err = parse_edsl(
        "export default () => Sequence.new({ seqId: 'x', locals: [ DOUBLE('d') ] });",
    )
    .unwrap_err();
    assert!(err.message().contains("DOUBLE"));
    let span = err.span().expect("Build errors carry a span");
    assert_eq!(span.start_line, 0);
}

#[test]
fn test_engine_on_command_rejected() {
    let err = parse_edsl(&single_step("C.BAKE_BREAD\n        .ENGINE(2)")).unwrap_err();
    assert!(err.message().contains("ENGINE"));
    assert_eq!(err.span().unwrap().start_line, 6);
}
