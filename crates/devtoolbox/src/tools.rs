//! Built-in tools.
//!
//! Each tool is a thin adapter from JSON parameters to a function in
//! `devtoolbox_core`. Core errors pass through unchanged so the server can
//! map them to status codes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use devtoolbox_core::json::Indent;
use devtoolbox_core::lorem::{self, GenerationRequest, Unit};
use devtoolbox_core::regex_eval::{self, RegexFlags};
use devtoolbox_core::timestamp::{self, TimeUnit};
use devtoolbox_core::{base64_codec, html_entities, json, jsx, yaml};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::traits::{InvalidParams, Tool, ToolContext};

pub fn builtins() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(Base64EncodeTool),
        Box::new(Base64DecodeTool),
        Box::new(JsonFormatTool),
        Box::new(JsonMinifyTool),
        Box::new(JsonValidateTool),
        Box::new(JsonToYamlTool),
        Box::new(YamlToJsonTool),
        Box::new(HtmlEscapeTool),
        Box::new(HtmlUnescapeTool),
        Box::new(HtmlToJsxTool),
        Box::new(RegexTestTool),
        Box::new(RegexReplaceTool),
        Box::new(LoremIpsumTool),
        Box::new(TimestampTool),
    ]
}

fn str_param<'a>(params: &'a Value, name: &str) -> &'a str {
    params[name].as_str().unwrap_or("")
}

fn parse_param<T: std::str::FromStr>(params: &Value, name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match params[name].as_str() {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| InvalidParams(format!("parameter '{}': {}", name, e)).into()),
    }
}

fn text_schema(extra: Value) -> Value {
    let mut properties = json!({
        "text": { "type": "string", "description": "Input text" }
    });
    if let (Some(base), Some(more)) = (properties.as_object_mut(), extra.as_object()) {
        base.extend(more.clone());
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["text"]
    })
}

fn indent_property() -> Value {
    json!({
        "indent": { "type": "string", "enum": ["two", "four", "tab"], "default": "two" }
    })
}

fn output(text: String) -> Value {
    json!({ "output": text })
}

// ═══════════════════════════════════════════════════════════════════════
// Base64
// ═══════════════════════════════════════════════════════════════════════

pub struct Base64EncodeTool;

#[async_trait]
impl Tool for Base64EncodeTool {
    fn name(&self) -> &str {
        "base64_encode"
    }

    fn description(&self) -> &str {
        "Encode UTF-8 text as Base64"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({
            "url_safe": { "type": "boolean", "description": "Use the URL-safe alphabet", "default": false }
        }))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let url_safe = params["url_safe"].as_bool().unwrap_or(false);
        Ok(output(base64_codec::encode(str_param(&params, "text"), url_safe)))
    }
}

pub struct Base64DecodeTool;

#[async_trait]
impl Tool for Base64DecodeTool {
    fn name(&self) -> &str {
        "base64_decode"
    }

    fn description(&self) -> &str {
        "Decode Base64 into UTF-8 text"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({
            "url_safe": { "type": "boolean", "default": false }
        }))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let url_safe = params["url_safe"].as_bool().unwrap_or(false);
        Ok(output(base64_codec::decode(str_param(&params, "text"), url_safe)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// JSON / YAML
// ═══════════════════════════════════════════════════════════════════════

pub struct JsonFormatTool;

#[async_trait]
impl Tool for JsonFormatTool {
    fn name(&self) -> &str {
        "json_format"
    }

    fn description(&self) -> &str {
        "Pretty-print a JSON document"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(indent_property())
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let indent: Indent = parse_param(&params, "indent")?.unwrap_or_default();
        Ok(output(json::format(str_param(&params, "text"), indent)?))
    }
}

pub struct JsonMinifyTool;

#[async_trait]
impl Tool for JsonMinifyTool {
    fn name(&self) -> &str {
        "json_minify"
    }

    fn description(&self) -> &str {
        "Strip all insignificant whitespace from a JSON document"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(output(json::minify(str_param(&params, "text"))?))
    }
}

/// Reports invalid JSON as a result, not an error.
pub struct JsonValidateTool;

#[async_trait]
impl Tool for JsonValidateTool {
    fn name(&self) -> &str {
        "json_validate"
    }

    fn description(&self) -> &str {
        "Check whether text is valid JSON and summarize its shape"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(match json::validate(str_param(&params, "text")) {
            Ok(summary) => json!({ "valid": true, "summary": summary }),
            Err(e) => json!({ "valid": false, "error": e.to_string() }),
        })
    }
}

pub struct JsonToYamlTool;

#[async_trait]
impl Tool for JsonToYamlTool {
    fn name(&self) -> &str {
        "json_to_yaml"
    }

    fn description(&self) -> &str {
        "Convert a JSON document to YAML"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(output(yaml::json_to_yaml(str_param(&params, "text"))?))
    }
}

pub struct YamlToJsonTool;

#[async_trait]
impl Tool for YamlToJsonTool {
    fn name(&self) -> &str {
        "yaml_to_json"
    }

    fn description(&self) -> &str {
        "Convert a YAML document to JSON"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(indent_property())
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let indent: Indent = parse_param(&params, "indent")?.unwrap_or_default();
        Ok(output(yaml::yaml_to_json(str_param(&params, "text"), indent)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HTML
// ═══════════════════════════════════════════════════════════════════════

pub struct HtmlEscapeTool;

#[async_trait]
impl Tool for HtmlEscapeTool {
    fn name(&self) -> &str {
        "html_escape"
    }

    fn description(&self) -> &str {
        "Replace HTML special characters with entities"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(output(html_entities::escape(str_param(&params, "text"))))
    }
}

pub struct HtmlUnescapeTool;

#[async_trait]
impl Tool for HtmlUnescapeTool {
    fn name(&self) -> &str {
        "html_unescape"
    }

    fn description(&self) -> &str {
        "Resolve named and numeric HTML entities"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(output(html_entities::unescape(str_param(&params, "text"))?))
    }
}

pub struct HtmlToJsxTool;

#[async_trait]
impl Tool for HtmlToJsxTool {
    fn name(&self) -> &str {
        "html_to_jsx"
    }

    fn description(&self) -> &str {
        "Rewrite an HTML fragment as JSX"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        text_schema(json!({
            "component": { "type": "string", "description": "Wrap in a function component with this name" }
        }))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let component = params["component"].as_str().filter(|c| !c.is_empty());
        Ok(output(jsx::html_to_jsx(str_param(&params, "text"), component)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Regex
// ═══════════════════════════════════════════════════════════════════════

fn regex_schema(extra: Value) -> Value {
    let mut properties = json!({
        "pattern": { "type": "string", "description": "Regular expression" },
        "flags": { "type": "string", "description": "Any of g, i, m, s", "default": "g" },
        "text": { "type": "string", "description": "Text to search" }
    });
    if let (Some(base), Some(more)) = (properties.as_object_mut(), extra.as_object()) {
        base.extend(more.clone());
    }
    let mut required = vec!["pattern", "text"];
    if let Some(more) = extra.as_object() {
        required.extend(more.keys().map(|k| k.as_str()));
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

fn flags_param(params: &Value) -> Result<RegexFlags> {
    Ok(str_param(params, "flags").parse::<RegexFlags>()?)
}

pub struct RegexTestTool;

#[async_trait]
impl Tool for RegexTestTool {
    fn name(&self) -> &str {
        "regex_test"
    }

    fn description(&self) -> &str {
        "List regex matches with capture groups and highlight segments"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        regex_schema(json!({}))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let evaluation = regex_eval::evaluate(
            str_param(&params, "pattern"),
            flags_param(&params)?,
            str_param(&params, "text"),
        )?;
        Ok(serde_json::to_value(evaluation)?)
    }
}

pub struct RegexReplaceTool;

#[async_trait]
impl Tool for RegexReplaceTool {
    fn name(&self) -> &str {
        "regex_replace"
    }

    fn description(&self) -> &str {
        "Preview replacing regex matches; $1 and ${name} expand groups"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        regex_schema(json!({
            "replacement": { "type": "string" }
        }))
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(output(regex_eval::replace(
            str_param(&params, "pattern"),
            flags_param(&params)?,
            str_param(&params, "text"),
            str_param(&params, "replacement"),
        )?))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lorem ipsum
// ═══════════════════════════════════════════════════════════════════════

/// Generates placeholder text. Omitted fields use the `[lorem]` config
/// defaults; `seed` makes the output reproducible.
pub struct LoremIpsumTool;

impl LoremIpsumTool {
    fn request(params: &Value, defaults: &GenerationRequest) -> Result<GenerationRequest> {
        let mut req = defaults.clone();
        if let Some(unit) = parse_param::<Unit>(params, "unit")? {
            req.unit = unit;
        }
        for (name, field) in [
            ("count", &mut req.count),
            ("min_words_per_sentence", &mut req.min_words_per_sentence),
            ("max_words_per_sentence", &mut req.max_words_per_sentence),
            ("min_sentences_per_paragraph", &mut req.min_sentences_per_paragraph),
            ("max_sentences_per_paragraph", &mut req.max_sentences_per_paragraph),
        ] {
            if let Some(value) = params[name].as_u64() {
                *field = usize::try_from(value).unwrap_or(usize::MAX);
            }
        }
        if let Some(flag) = params["start_with_canonical_opening"].as_bool() {
            req.start_with_canonical_opening = flag;
        }
        if let Some(flag) = params["wrap_in_markup_tags"].as_bool() {
            req.wrap_in_markup_tags = flag;
        }
        Ok(req)
    }
}

#[async_trait]
impl Tool for LoremIpsumTool {
    fn name(&self) -> &str {
        "lorem_ipsum"
    }

    fn description(&self) -> &str {
        "Generate lorem ipsum paragraphs, sentences, or words"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "unit": { "type": "string", "enum": ["paragraphs", "sentences", "words"] },
                "count": { "type": "integer", "description": "How many units to generate" },
                "min_words_per_sentence": { "type": "integer" },
                "max_words_per_sentence": { "type": "integer" },
                "min_sentences_per_paragraph": { "type": "integer" },
                "max_sentences_per_paragraph": { "type": "integer" },
                "start_with_canonical_opening": { "type": "boolean" },
                "wrap_in_markup_tags": { "type": "boolean" },
                "seed": { "type": "integer", "description": "Seed for reproducible output" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let req = Self::request(&params, &ctx.config().lorem)?;
        let mut rng = match params["seed"].as_u64() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let text = lorem::generate(&req, &mut rng)?;
        let stats = lorem::text_stats(&text);
        Ok(json!({ "text": text, "stats": stats }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Timestamp
// ═══════════════════════════════════════════════════════════════════════

/// Integer input is a Unix timestamp; anything else is parsed as a date.
pub struct TimestampTool;

#[async_trait]
impl Tool for TimestampTool {
    fn name(&self) -> &str {
        "timestamp_convert"
    }

    fn description(&self) -> &str {
        "Convert between Unix timestamps and human-readable dates"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "Unix timestamp or date string" },
                "unit": { "type": "string", "enum": ["seconds", "milliseconds"] }
            },
            "required": ["input"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
        let input = str_param(&params, "input").trim();
        let unit = parse_param::<TimeUnit>(&params, "unit")?;
        let view = match input.parse::<i64>() {
            Ok(value) => timestamp::from_unix(value, unit, Utc::now())?,
            Err(_) => timestamp::parse_date(input, Utc::now())?,
        };
        Ok(serde_json::to_value(view)?)
    }
}
