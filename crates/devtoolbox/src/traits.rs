//! The tool extension point.
//!
//! Every utility DevToolBox serves over HTTP is a [`Tool`]: a name, a
//! description, a JSON Schema for its parameters, and an async `execute`.
//! Built-in tools live in [`crate::tools`]; embedders can register their own
//! on a [`ToolRegistry`] before handing it to the server.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//! │  │ encoders │ │  regex   │ │  Custom  │  │
//! │  │ json/yaml│ │  lorem   │ │  (Rust)  │  │
//! │  └──────────┘ └──────────┘ └──────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!        POST /tools/{name} → JSON result
//! ```
//!
//! # Usage
//!
//! ```rust
//! use devtoolbox::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool::new()));
//! assert!(tools.find("base64_encode").is_some());
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::tools;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A utility callable by name with JSON parameters.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use devtoolbox::traits::{Tool, ToolContext};
///
/// pub struct ReverseTool;
///
/// #[async_trait]
/// impl Tool for ReverseTool {
///     fn name(&self) -> &str { "reverse" }
///     fn description(&self) -> &str { "Reverse a string" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({
///             "type": "object",
///             "properties": { "text": { "type": "string" } },
///             "required": ["text"]
///         })
///     }
///
///     async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
///         let text = params["text"].as_str().unwrap_or("");
///         Ok(json!({ "output": text.chars().rev().collect::<String>() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`). Lowercase with underscores.
    fn name(&self) -> &str;

    /// One-line description shown in `GET /tools/list` and `dtb tools`.
    fn description(&self) -> &str;

    /// Whether this tool ships with DevToolBox. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` has already passed [`validate_params`] and
    /// carries schema defaults for omitted optional fields.
    ///
    /// The returned value is wrapped in `{ "result": ... }` by the server.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// What a tool may read while executing. Created per invocation.
pub struct ToolContext {
    config: Arc<Config>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Entry of `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter Validation
// ═══════════════════════════════════════════════════════════════════════

/// Parameters that do not satisfy a tool's schema.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidParams(pub String);

/// Validate incoming JSON parameters against a tool's schema.
///
/// Checks required fields, type compatibility, and enum constraints, then
/// injects default values for missing optional fields.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!(InvalidParams(format!(
            "parameters must be a JSON object, got {}",
            json_type_name(other)
        ))),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for field in required {
        if !params_obj.contains_key(field) {
            bail!(InvalidParams(format!("missing required parameter: {}", field)));
        }
    }

    let mut result = params_obj.clone();
    for (prop_name, prop_schema) in &properties {
        let Some(value) = params_obj.get(prop_name) else {
            if let Some(default) = prop_schema.get("default") {
                result.insert(prop_name.clone(), default.clone());
            }
            continue;
        };

        if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
            let type_ok = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !type_ok {
                bail!(InvalidParams(format!(
                    "parameter '{}' must be of type '{}', got {}",
                    prop_name,
                    expected,
                    json_type_name(value)
                )));
            }
        }

        if let Some(allowed) = prop_schema.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(value) {
                let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                bail!(InvalidParams(format!(
                    "parameter '{}' must be one of [{}], got {}",
                    prop_name,
                    names.join(", "),
                    value
                )));
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of callable tools, looked up by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for tool in tools::builtins() {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool. A later registration with an existing name replaces
    /// the earlier one.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if let Some(pos) = self.tools.iter().position(|t| t.name() == tool.name()) {
            tracing::warn!(tool = tool.name(), "replacing registered tool");
            self.tools[pos] = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| ToolInfo::of(t.as_ref())).collect()
    }

    /// Validate `params` and run the named tool.
    pub async fn call(&self, name: &str, params: &Value, ctx: &ToolContext) -> Result<Option<Value>> {
        let Some(tool) = self.find(name) else {
            return Ok(None);
        };
        let params = validate_params(&tool.parameters_schema(), params)?;
        let started = std::time::Instant::now();
        let result = tool.execute(params, ctx).await;
        tracing::debug!(
            tool = name,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );
        result.map(Some)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
