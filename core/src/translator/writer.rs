//! Output builder and literal formatting
//!
//! The generator threads one [`EdslWriter`] through every step. Values and
//! diagnostics are appended through separate primitives so a diagnostic can
//! be attached right after the expression it refers to without re-reading
//! the emitted text.

use serde_json::Value as JsonValue;

use super::diagnostics::Diagnostic;

const INDENT: &str = " ";

#[derive(Debug, Default)]
pub struct EdslWriter {
    buf: String,
    diagnostics: Vec<Diagnostic>,
}

impl EdslWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw text.
    pub fn push(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Append `indent` spaces.
    pub fn indent(&mut self, indent: usize) {
        self.buf.push_str(&INDENT.repeat(indent));
    }

    /// Append an indented line terminated by a newline.
    pub fn line(&mut self, indent: usize, text: &str) {
        self.indent(indent);
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Append an inline `//ERROR:` comment for the expression just written.
    pub fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.buf.push_str(" //ERROR: ");
        self.buf.push_str(&diagnostic.to_string());
        self.diagnostics.push(diagnostic.clone());
    }

    pub fn finish(self) -> (String, Vec<Diagnostic>) {
        (self.buf, self.diagnostics)
    }
}

/* ===================== Literals ===================== */

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Single-quoted string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Object key: bare when it is an identifier, quoted otherwise.
pub fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render a JSON scalar. Numbers keep their source form (`4.3` stays `4.3`).
pub fn scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => Some("null".to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::String(s) => Some(quote(s)),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Write the entries of a JSON object, keys sorted, one per line at `indent`.
pub fn write_object_entries(
    out: &mut EdslWriter,
    map: &serde_json::Map<String, JsonValue>,
    indent: usize,
) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    for key in keys {
        write_entry(out, key, &map[key.as_str()], indent);
    }
}

/// Write one `key: value,` line at `indent`.
///
/// Nested objects open as `key:{`; arrays list their items four columns in.
pub fn write_entry(out: &mut EdslWriter, key: &str, value: &JsonValue, indent: usize) {
    out.indent(indent);
    out.push(&object_key(key));
    out.push(":");
    match value {
        JsonValue::Object(inner) if inner.is_empty() => out.push("{},\n"),
        JsonValue::Object(inner) => {
            out.push("{\n");
            write_object_entries(out, inner, indent + 2);
            out.line(indent, "},");
        }
        JsonValue::Array(items) => {
            out.push(" ");
            write_array(out, items, indent);
            out.push(",\n");
        }
        other => {
            out.push(" ");
            out.push(&scalar(other).unwrap_or_default());
            out.push(",\n");
        }
    }
}

/// Write `[ ... ]` whose closing bracket sits at `indent`; no trailing comma.
fn write_array(out: &mut EdslWriter, items: &[JsonValue], indent: usize) {
    if items.is_empty() {
        out.push("[]");
        return;
    }
    out.push("[\n");
    let item_indent = indent + 4;
    for item in items {
        out.indent(item_indent);
        match item {
            JsonValue::Object(inner) if inner.is_empty() => out.push("{}"),
            JsonValue::Object(inner) => {
                out.push("{\n");
                write_object_entries(out, inner, item_indent + 2);
                out.indent(item_indent);
                out.push("}");
            }
            JsonValue::Array(nested) => write_array(out, nested, item_indent),
            other => out.push(&scalar(other).unwrap_or_default()),
        }
        out.push(",\n");
    }
    out.indent(indent);
    out.push("]");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(value: JsonValue, indent: usize) -> String {
        let mut out = EdslWriter::new();
        write_object_entries(&mut out, value.as_object().unwrap(), indent);
        out.finish().0
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"d:\eng"), r"'d:\\eng'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("BAKE_BREAD"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("some-key"));
    }

    #[test]
    fn test_entries_sorted_with_nested_object() {
        let text = entries(
            json!({
                "onboard_path": "/eng",
                "lgo": { "boolean": false },
                "count": 3
            }),
            6,
        );
        assert_eq!(
            text,
            "      count: 3,\n      lgo:{\n        boolean: false,\n      },\n      onboard_path: '/eng',\n"
        );
    }

    #[test]
    fn test_entries_with_array() {
        let text = entries(json!({ "listfield": ["1", 2] }), 10);
        assert_eq!(
            text,
            "          listfield: [\n              '1',\n              2,\n          ],\n"
        );
    }

    #[test]
    fn test_non_identifier_key_quoted() {
        let text = entries(json!({ "some-key": null }), 0);
        assert_eq!(text, "'some-key': null,\n");
    }

    #[test]
    fn test_single_entry_keeps_structure() {
        let mut out = EdslWriter::new();
        write_entry(&mut out, "value", &json!({ "b": [1], "a": {} }), 4);
        assert_eq!(
            out.finish().0,
            "    value:{\n      a:{},\n      b: [\n          1,\n      ],\n    },\n"
        );

        let mut out = EdslWriter::new();
        write_entry(&mut out, "value", &json!("1.234"), 4);
        assert_eq!(out.finish().0, "    value: '1.234',\n");
    }
}
