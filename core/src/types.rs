use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

/// Ordered JSON map used for `metadata` fields.
pub type Metadata = Map<String, JsonValue>;

/// A complete SeqJson sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locals: Vec<VariableDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<VariableDecl>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<Request>,
}

impl Sequence {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, var_type: VariableType) -> Self {
        Self {
            name: name.into(),
            var_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    Float,
    Int,
    String,
    Uint,
    Enum,
}

impl VariableType {
    /// The EDSL declaration helper for this type (`FLOAT('x')`).
    pub fn keyword(self) -> &'static str {
        match self {
            VariableType::Float => "FLOAT",
            VariableType::Int => "INT",
            VariableType::String => "STRING",
            VariableType::Uint => "UINT",
            VariableType::Enum => "ENUM",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "FLOAT" => Some(VariableType::Float),
            "INT" => Some(VariableType::Int),
            "STRING" => Some(VariableType::String),
            "UINT" => Some(VariableType::Uint),
            "ENUM" => Some(VariableType::Enum),
            _ => None,
        }
    }
}

/* ===================== Steps ===================== */

/// One instruction in a sequence.
///
/// Fields shared by every variant live here; the variant-specific fields
/// (and the `type` discriminator) are flattened in from [`StepKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub kind: StepKind,
    pub time: Time,
    #[serde(default)]
    pub args: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<Model>,
}

impl Step {
    pub fn new(kind: StepKind, time: Time) -> Self {
        Self {
            kind,
            time,
            args: Vec::new(),
            description: None,
            metadata: Metadata::new(),
            models: Vec::new(),
        }
    }

    pub fn command(stem: impl Into<String>, time: Time) -> Self {
        Self::new(StepKind::Command { stem: stem.into() }, time)
    }

    pub fn with_args(mut self, args: Vec<Argument>) -> Self {
        self.args = args;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Command {
        stem: String,
    },
    Activate(SequenceTarget),
    Load(SequenceTarget),
    GroundBlock {
        name: String,
    },
    GroundEvent {
        name: String,
    },
}

/// Target of an `activate` or `load` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceTarget {
    pub sequence: String,
    #[serde(
        default,
        deserialize_with = "optional_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub engine: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<String>,
}

/// Flattened fields see numbers as `Number` tokens, never as primitives.
fn optional_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(|n| {
            n.as_i64()
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", n)))
        })
        .transpose()
}

/// Temporal anchor of a step or request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Time {
    Absolute { tag: String },
    CommandComplete,
    CommandRelative { tag: String },
    EpochRelative { tag: String },
}

/// Modeled value change applied at an offset during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub offset: String,
    pub variable: String,
    pub value: JsonValue,
}

/* ===================== Arguments ===================== */

/// A step argument: an optional label plus a typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub value: ArgumentValue,
}

impl Argument {
    pub fn new(value: ArgumentValue) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: ArgumentValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ArgumentValue {
    Number(Number),
    String(String),
    Boolean(bool),
    Symbol(String),
    /// Rows of repeated argument groups.
    Repeat(Vec<Vec<Argument>>),
}

impl ArgumentValue {
    /// The SeqJson `type` discriminator for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgumentValue::Number(_) => "number",
            ArgumentValue::String(_) => "string",
            ArgumentValue::Boolean(_) => "boolean",
            ArgumentValue::Symbol(_) => "symbol",
            ArgumentValue::Repeat(_) => "repeat",
        }
    }
}

/* ===================== Requests ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type", default)]
    pub kind: RequestKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<Step>,
    #[serde(flatten)]
    pub timing: RequestTiming,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[default]
    Request,
}

/// A request is anchored either like a step or to a named ground epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestTiming {
    Time { time: Time },
    GroundEpoch { ground_epoch: GroundEpoch },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundEpoch {
    pub name: String,
    pub delta: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_command_step() {
        let step: Step = serde_json::from_value(json!({
            "type": "command",
            "stem": "PREHEAT_OVEN",
            "time": { "type": "ABSOLUTE", "tag": "2020-060T03:45:19.000Z" },
            "args": [{ "value": 100, "name": "temperature", "type": "number" }],
            "metadata": {}
        }))
        .expect("Should decode");

        assert_eq!(
            step.kind,
            StepKind::Command {
                stem: "PREHEAT_OVEN".to_string()
            }
        );
        assert_eq!(
            step.time,
            Time::Absolute {
                tag: "2020-060T03:45:19.000Z".to_string()
            }
        );
        assert_eq!(step.args.len(), 1);
        assert_eq!(step.args[0].name.as_deref(), Some("temperature"));
        assert_eq!(step.args[0].value, ArgumentValue::Number(100.into()));
    }

    #[test]
    fn test_decode_repeat_argument() {
        let arg: Argument = serde_json::from_value(json!({
            "type": "repeat",
            "value": [[{ "type": "number", "value": 10 }, { "type": "boolean", "value": false }]]
        }))
        .expect("Should decode");

        match arg.value {
            ArgumentValue::Repeat(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0][1].value, ArgumentValue::Boolean(false));
            }
            other => panic!("Expected repeat, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_literal_argument_is_rejected() {
        let result: Result<Step, _> = serde_json::from_value(json!({
            "type": "command",
            "stem": "PREHEAT_OVEN",
            "time": { "type": "COMMAND_COMPLETE" },
            "args": [100]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_time_requires_tag() {
        let result: Result<Time, _> = serde_json::from_value(json!({ "type": "ABSOLUTE" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_ground_epoch_request() {
        let request: Request = serde_json::from_value(json!({
            "name": "test_request1",
            "ground_epoch": { "delta": "+00:30:00", "name": "test_ground_epoch" },
            "steps": [{
                "stem": "FAKE_COMMAND1",
                "time": { "tag": "00:00:01.000", "type": "COMMAND_RELATIVE" },
                "type": "command",
                "args": []
            }],
            "type": "request"
        }))
        .expect("Should decode");

        assert_eq!(
            request.timing,
            RequestTiming::GroundEpoch {
                ground_epoch: GroundEpoch {
                    name: "test_ground_epoch".to_string(),
                    delta: "+00:30:00".to_string(),
                }
            }
        );
    }

    #[test]
    fn test_activate_step_fields() {
        let step: Step = serde_json::from_value(json!({
            "type": "load",
            "sequence": "d:/eng/test.mod",
            "engine": 2,
            "epoch": "TEST_EPOCH",
            "time": { "tag": "00:00:01.000", "type": "EPOCH_RELATIVE" },
            "args": [{ "type": "symbol", "value": "Local_Var_A" }]
        }))
        .expect("Should decode");

        match step.kind {
            StepKind::Load(target) => {
                assert_eq!(target.sequence, "d:/eng/test.mod");
                assert_eq!(target.engine, Some(2));
                assert_eq!(target.epoch.as_deref(), Some("TEST_EPOCH"));
            }
            other => panic!("Expected load step, got {:?}", other),
        }
    }
}
