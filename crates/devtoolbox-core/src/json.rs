//! JSON formatter, minifier, and validator.
//!
//! Key order is preserved (`serde_json` is built with `preserve_order`).

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{ConvertError, Format};

/// Indentation used by [`format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indent {
    #[default]
    Two,
    Four,
    Tab,
}

impl Indent {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            Indent::Two => b"  ",
            Indent::Four => b"    ",
            Indent::Tab => b"\t",
        }
    }
}

impl FromStr for Indent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" | "two" => Ok(Indent::Two),
            "4" | "four" => Ok(Indent::Four),
            "tab" | "\\t" => Ok(Indent::Tab),
            other => Err(format!("indent must be 2, 4, or tab (got '{}')", other)),
        }
    }
}

pub fn parse(input: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(input).map_err(|e| ConvertError::parse(Format::Json, e))
}

/// Pretty-print `input`.
pub fn format(input: &str, indent: Indent) -> Result<String, ConvertError> {
    let value = parse(input)?;
    to_pretty(&value, indent)
}

/// Serialize `value` with the given indentation.
pub fn to_pretty(value: &Value, indent: Indent) -> Result<String, ConvertError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    value
        .serialize(&mut ser)
        .map_err(|e| ConvertError::parse(Format::Json, e))?;
    String::from_utf8(buf).map_err(|e| ConvertError::parse(Format::Json, e))
}

/// Strip all insignificant whitespace from `input`.
pub fn minify(input: &str) -> Result<String, ConvertError> {
    let value = parse(input)?;
    serde_json::to_string(&value).map_err(|e| ConvertError::parse(Format::Json, e))
}

/// Shape of a valid document, reported by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// `object`, `array`, `string`, `number`, `boolean`, or `null`.
    pub kind: &'static str,
    /// Number of top-level keys or elements (0 for scalars).
    pub entries: usize,
    /// Maximum nesting depth; scalars have depth 0.
    pub depth: usize,
}

/// Check `input` parses. Errors carry serde_json's line/column message.
pub fn validate(input: &str) -> Result<Summary, ConvertError> {
    let value = parse(input)?;
    let (kind, entries) = match &value {
        Value::Object(map) => ("object", map.len()),
        Value::Array(items) => ("array", items.len()),
        Value::String(_) => ("string", 0),
        Value::Number(_) => ("number", 0),
        Value::Bool(_) => ("boolean", 0),
        Value::Null => ("null", 0),
    };
    Ok(Summary {
        kind,
        entries,
        depth: depth(&value),
    })
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_two_spaces_preserves_order() {
        let out = format(r#"{"b":1,"a":[true,null]}"#, Indent::Two).unwrap();
        assert_eq!(out, "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}");
    }

    #[test]
    fn test_format_tab() {
        let out = format(r#"{"k":"v"}"#, Indent::Tab).unwrap();
        assert_eq!(out, "{\n\t\"k\": \"v\"\n}");
    }

    #[test]
    fn test_minify() {
        let out = minify("{\n  \"a\" : [ 1, 2 ],\n  \"b\": { }\n}").unwrap();
        assert_eq!(out, r#"{"a":[1,2],"b":{}}"#);
    }

    #[test]
    fn test_malformed_is_error() {
        let err = format("{invalid", Indent::Two).unwrap_err();
        assert_eq!(err.format(), Format::Json);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(minify("").is_err());
        assert!(validate("   ").is_err());
    }

    #[test]
    fn test_validate_summary() {
        let summary = validate(r#"{"a":{"b":[1]},"c":2}"#).unwrap();
        assert_eq!(summary.kind, "object");
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.depth, 3);
        assert_eq!(validate("42").unwrap().depth, 0);
    }

    #[test]
    fn test_indent_from_str() {
        assert_eq!("4".parse::<Indent>().unwrap(), Indent::Four);
        assert!("3".parse::<Indent>().is_err());
    }
}
