//! Content codec: raw text <-> [`Value`].
//!
//! | Type | Parse | Serialize |
//! |------|-------|-----------|
//! | `json` / `jsonc` | JSON5 grammar (comments, trailing commas) | pretty JSON, trailing newline |
//! | `yaml` | YAML | YAML |
//! | `text` / `plaintext` | raw string | JSON string literal |

pub mod value;

pub use value::{Mapping, Value};

use crate::core::{PrefMergeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Indentation used when no setting overrides it.
pub const DEFAULT_INDENT: usize = 2;

/// Declared format of a merge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Json,
    Jsonc,
    Yaml,
    Text,
    Plaintext,
}

/// Declared format of a merge output. `jsonc` is input-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Json,
    Yaml,
    Text,
    Plaintext,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Jsonc,
        DocumentType::Text,
        DocumentType::Plaintext,
        DocumentType::Json,
        DocumentType::Yaml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Json => "json",
            DocumentType::Jsonc => "jsonc",
            DocumentType::Yaml => "yaml",
            DocumentType::Text => "text",
            DocumentType::Plaintext => "plaintext",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DocumentType::Text | DocumentType::Plaintext)
    }
}

impl OutputType {
    pub const ALL: [OutputType; 4] = [
        OutputType::Text,
        OutputType::Plaintext,
        OutputType::Json,
        OutputType::Yaml,
    ];

    pub fn as_str(&self) -> &'static str {
        self.as_document_type().as_str()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputType::Text | OutputType::Plaintext)
    }

    pub fn as_document_type(&self) -> DocumentType {
        match self {
            OutputType::Json => DocumentType::Json,
            OutputType::Yaml => DocumentType::Yaml,
            OutputType::Text => DocumentType::Text,
            OutputType::Plaintext => DocumentType::Plaintext,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = PrefMergeError;

    fn from_str(s: &str) -> Result<Self> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PrefMergeError::Validation(format!("Unknown type \"{}\"", s)))
    }
}

impl FromStr for OutputType {
    type Err = PrefMergeError;

    fn from_str(s: &str) -> Result<Self> {
        OutputType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PrefMergeError::Validation(format!("Unknown type \"{}\"", s)))
    }
}

/// Parse `text` as `doc_type`.
pub fn parse(text: &str, doc_type: DocumentType) -> Result<Value> {
    parse_named("<inline>", text, doc_type)
}

/// Parse `text` as `doc_type`, naming `origin` in any error.
pub fn parse_named(origin: &str, text: &str, doc_type: DocumentType) -> Result<Value> {
    let parsed = match doc_type {
        DocumentType::Json | DocumentType::Jsonc => {
            json5::from_str::<Value>(text).map_err(|e| e.to_string())
        }
        DocumentType::Yaml => serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string()),
        DocumentType::Text | DocumentType::Plaintext => Ok(Value::Raw(text.to_string())),
    };

    parsed.map_err(|message| PrefMergeError::Parse {
        path: origin.to_string(),
        format: doc_type.as_str(),
        message,
    })
}

/// Serialize `value` as `output` with `indent` spaces per level.
///
/// YAML output always uses the emitter's two-space block indentation.
pub fn serialize(value: &Value, output: OutputType, indent: usize) -> Result<String> {
    match output {
        OutputType::Json => {
            let mut out = to_json_pretty(value, indent)?;
            out.push('\n');
            Ok(out)
        }
        OutputType::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputType::Text | OutputType::Plaintext => stringify(value),
    }
}

/// Compact JSON encoding. Strings come back as quoted, escaped literals.
pub fn stringify(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Pretty JSON with `indent` spaces per level and no trailing newline.
pub fn to_json_pretty(value: &Value, indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| PrefMergeError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, Value)]) -> Value {
        Value::Mapping(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_jsonc_comments_and_trailing_commas() {
        let v = parse("{\"second\": 2, /* inline */ \"third\": [1, 2,],} // comment", DocumentType::Jsonc)
            .unwrap();
        assert_eq!(
            v,
            mapping(&[
                ("second", Value::from(2)),
                ("third", Value::Sequence(vec![Value::from(1), Value::from(2)])),
            ])
        );
    }

    #[test]
    fn test_json_key_order_preserved() {
        let v = parse(r#"{"z": 1, "a": 2, "m": 3}"#, DocumentType::Json).unwrap();
        assert_eq!(
            serialize(&v, OutputType::Json, 2).unwrap(),
            "{\n  \"z\": 1,\n  \"a\": 2,\n  \"m\": 3\n}\n"
        );
    }

    #[test]
    fn test_yaml_key_order_preserved() {
        let v = parse("zeta: 1\nalpha:\n  b: true\n  a: null\n", DocumentType::Yaml).unwrap();
        let out = serialize(&v, OutputType::Yaml, 2).unwrap();
        assert_eq!(out, "zeta: 1\nalpha:\n  b: true\n  a: null\n");
    }

    #[test]
    fn test_yaml_numeric_keys_stringified() {
        let v = parse("1: one\ntrue: yes\n", DocumentType::Yaml).unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["1", "true"]);
    }

    #[test]
    fn test_text_is_raw() {
        let raw = "{\"not\": parsed} // at all";
        assert_eq!(
            parse(raw, DocumentType::Plaintext).unwrap(),
            Value::Raw(raw.to_string())
        );
    }

    #[test]
    fn test_text_output_is_string_literal() {
        let out = serialize(&Value::from("a \"b\"\n"), OutputType::Text, 2).unwrap();
        assert_eq!(out, r#""a \"b\"\n""#);
    }

    #[test]
    fn test_custom_indent() {
        let v = mapping(&[("a", mapping(&[("b", Value::from(1))]))]);
        assert_eq!(
            serialize(&v, OutputType::Json, 4).unwrap(),
            "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n"
        );
    }

    #[test]
    fn test_round_trip_json_and_yaml() {
        let v = mapping(&[
            ("name", Value::from("prefs")),
            ("enabled", Value::from(false)),
            ("nothing", Value::Null),
            (
                "nested",
                mapping(&[("list", Value::Sequence(vec![Value::from(1), Value::from("two")]))]),
            ),
        ]);
        for (output, input) in [
            (OutputType::Json, DocumentType::Json),
            (OutputType::Yaml, DocumentType::Yaml),
        ] {
            let text = serialize(&v, output, DEFAULT_INDENT).unwrap();
            assert_eq!(parse(&text, input).unwrap(), v, "round trip via {}", output);
        }
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_named("bad.json", "{\"a\": ", DocumentType::Json).unwrap_err();
        match err {
            PrefMergeError::Parse { path, format, .. } => {
                assert_eq!(path, "bad.json");
                assert_eq!(format, "json");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!("yaml".parse::<DocumentType>().unwrap(), DocumentType::Yaml);
        assert!("jsonc".parse::<OutputType>().is_err());
        assert!(OutputType::Plaintext.is_text());
    }
}
