//! YAML ⇄ JSON conversion.
//!
//! Both directions go through `serde_json::Value`, so only the data model
//! shared by the two formats survives. YAML mapping keys that are numbers,
//! booleans, or null become strings; tags are dropped.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

use crate::error::{ConvertError, Format};
use crate::json::{self, Indent};

/// Convert a JSON document to YAML.
pub fn json_to_yaml(input: &str) -> Result<String, ConvertError> {
    let value = json::parse(input)?;
    serde_yaml::to_string(&value).map_err(|e| ConvertError::parse(Format::Yaml, e))
}

/// Convert a YAML document to pretty-printed JSON.
pub fn yaml_to_json(input: &str, indent: Indent) -> Result<String, ConvertError> {
    let value = parse(input)?;
    json::to_pretty(&value, indent)
}

/// Parse a single YAML document into a JSON value.
pub fn parse(input: &str) -> Result<Value, ConvertError> {
    let yaml: Yaml = serde_yaml::from_str(input).map_err(|e| ConvertError::parse(Format::Yaml, e))?;
    to_json(yaml)
}

fn to_json(yaml: Yaml) -> Result<Value, ConvertError> {
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Value::Number(Number::from_f64(f).ok_or_else(|| {
                    ConvertError::parse(Format::Yaml, format!("{} has no JSON representation", n))
                })?)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect::<Result<_, _>>()?),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                map.insert(key_to_string(k)?, to_json(v)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => to_json(tagged.value)?,
    })
}

fn key_to_string(key: Yaml) -> Result<String, ConvertError> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => key_to_string(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(ConvertError::parse(
            Format::Yaml,
            "mapping keys must be scalars to convert to JSON",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn samples() -> Vec<Value> {
        vec![
            json!(null),
            json!(true),
            json!(-17),
            json!(3.25),
            json!("plain"),
            json!("needs: quoting # here"),
            json!("123"),
            json!("true"),
            json!(""),
            json!([]),
            json!({}),
            json!({"name": "devtoolbox", "tags": ["a", "b"], "nested": {"n": 1, "ok": false, "none": null}}),
            json!([{"x": [1, 2, [3]]}, "multi\nline\ntext"]),
        ]
    }

    #[test]
    fn test_json_yaml_json_round_trip() {
        for v in samples() {
            let yaml = json_to_yaml(&v.to_string()).unwrap();
            assert_eq!(parse(&yaml).unwrap(), v, "yaml was:\n{}", yaml);
        }
    }

    #[test]
    fn test_yaml_load_of_json_text() {
        // JSON text is valid YAML.
        for v in samples() {
            assert_eq!(parse(&v.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_yaml_to_json_output() {
        let out = yaml_to_json("name: box\ncount: 2\nitems:\n  - a\n  - b\n", Indent::Two).unwrap();
        assert_eq!(
            out,
            "{\n  \"name\": \"box\",\n  \"count\": 2,\n  \"items\": [\n    \"a\",\n    \"b\"\n  ]\n}"
        );
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let v = parse("1: one\ntrue: yes\n").unwrap();
        assert_eq!(v, json!({"1": "one", "true": "yes"}));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = yaml_to_json("key: [unclosed", Indent::Two).unwrap_err();
        assert_eq!(err.format(), Format::Yaml);
    }

    #[test]
    fn test_malformed_json_input() {
        let err = json_to_yaml("{invalid").unwrap_err();
        assert_eq!(err.format(), Format::Json);
    }
}
