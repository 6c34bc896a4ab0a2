//! Template interpolation for account files
//!
//! Handles `{{ variable }}` interpolation in account configurations so that
//! credentials can be pulled from the environment instead of living in the
//! file. Supports nested access like `{{ env.LWA_CLIENT_ID }}` and
//! `{{ vars.marketplace }}`.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Environment variables
    pub env: Value,
    /// Additional user-supplied variables
    pub vars: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the current process environment
    pub fn from_env() -> Self {
        let env: serde_json::Map<String, Value> = std::env::vars()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Self {
            env: Value::Object(env),
            ..Default::default()
        }
    }

    /// Set environment values
    pub fn set_env(&mut self, env: Value) -> &mut Self {
        self.env = env;
        self
    }

    /// Set additional variables
    pub fn set_vars(&mut self, vars: Value) -> &mut Self {
        self.vars = vars;
        self
    }

    /// Get a value by path (e.g., "env.HOME")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();

        let root = match parts[0] {
            "env" => &self.env,
            "vars" => &self.vars,
            // Bare names resolve against vars
            _ => return get_nested_value(&self.vars, &parts),
        };

        if parts.len() == 1 {
            Some(root)
        } else {
            get_nested_value(root, &parts[1..])
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut missing = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let (Some(full_match), Some(var_path)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        match ctx.get(var_path.as_str()) {
            Some(value) => {
                result = result.replace(full_match.as_str(), &value_to_string(value));
            }
            None => missing.push(var_path.as_str().to_string()),
        }
    }

    if missing.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Render all string values in a JSON value
pub fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value> {
    match value {
        Value::String(s) if has_templates(s) => Ok(Value::String(render(s, ctx)?)),
        Value::Object(map) => {
            let mut new_map = serde_json::Map::new();
            for (k, v) in map {
                new_map.insert(k.clone(), render_value(v, ctx)?);
            }
            Ok(Value::Object(new_map))
        }
        Value::Array(arr) => {
            let new_arr: Result<Vec<Value>> = arr.iter().map(|v| render_value(v, ctx)).collect();
            Ok(Value::Array(new_arr?))
        }
        _ => Ok(value.clone()),
    }
}
