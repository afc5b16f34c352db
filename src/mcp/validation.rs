//! Tool argument validation against the advertised input schema.
//!
//! Covers the JSON-Schema subset the tools actually use: `type`, `required`,
//! `properties`, `enum`, `minLength`/`maxLength`, `minimum`/`maximum`,
//! `items` and `additionalProperties: false`. Every violation is collected so
//! the caller can fix all of them in one retry.

use serde_json::Value;
use std::fmt::Write as _;

/// One schema violation, with the dotted path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}`: {}", self.field, self.message)
    }
}

/// Check `args` against `schema`. An empty result means valid.
///
/// `null` for an optional property is treated as absent.
pub fn validate(schema: &Value, args: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    check(schema, args, "", &mut out);
    out
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "arguments" } else { path }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn check(schema: &Value, value: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !type_matches(expected, value) {
            out.push(Violation::new(
                display_path(path),
                format!("expected {expected}, got {}", type_name(value)),
            ));
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            out.push(Violation::new(
                display_path(path),
                format!("must be one of {}", options.join(", ")),
            ));
        }
    }

    match value {
        Value::String(s) => check_length(schema, s, path, out),
        Value::Number(n) => check_range(schema, n, path, out),
        Value::Object(map) => {
            let required = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect::<Vec<_>>())
                .unwrap_or_default();
            for name in &required {
                if map.get(*name).is_none_or(Value::is_null) {
                    out.push(Violation::new(child_path(path, name), "is required"));
                }
            }

            let properties = schema.get("properties").and_then(Value::as_object);
            if let Some(properties) = properties {
                for (key, sub_schema) in properties {
                    if let Some(v) = map.get(key).filter(|v| !v.is_null()) {
                        check(sub_schema, v, &child_path(path, key), out);
                    }
                }
            }

            if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
                for key in map.keys() {
                    if properties.is_none_or(|p| !p.contains_key(key)) {
                        out.push(Violation::new(child_path(path, key), "is not a recognized field"));
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (idx, item) in items.iter().enumerate() {
                    check(item_schema, item, &format!("{}[{idx}]", display_path(path)), out);
                }
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

fn check_length(schema: &Value, s: &str, path: &str, out: &mut Vec<Violation>) {
    let len = s.chars().count() as u64;
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if len < min {
            let message = if min == 1 {
                "must not be empty".to_string()
            } else {
                format!("must be at least {min} characters")
            };
            out.push(Violation::new(display_path(path), message));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            out.push(Violation::new(
                display_path(path),
                format!("must be at most {max} characters (got {len})"),
            ));
        }
    }
}

fn check_range(schema: &Value, n: &serde_json::Number, path: &str, out: &mut Vec<Violation>) {
    let Some(v) = n.as_f64() else { return };
    if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
        if v < min {
            out.push(Violation::new(display_path(path), format!("must be at least {min}")));
        }
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
        if v > max {
            out.push(Violation::new(display_path(path), format!("must be at most {max}")));
        }
    }
}

/// Render violations as the text block returned to the assistant.
///
/// Lists each violated field, then the expected shape taken from the schema.
pub fn render_violations(tool: &str, violations: &[Violation], schema: &Value) -> String {
    let mut out = format!("**Invalid input for `{tool}`**\n\nThe arguments did not match the tool's input schema:\n");
    for v in violations {
        let _ = writeln!(out, "- {v}");
    }

    out.push_str("\nExpected arguments:\n");
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    match schema.get("properties").and_then(Value::as_object) {
        Some(properties) if !properties.is_empty() => {
            for (name, prop) in properties {
                let ty = prop.get("type").and_then(Value::as_str).unwrap_or("any");
                let req = if required.iter().any(|r| r.as_str() == Some(name)) {
                    "required"
                } else {
                    "optional"
                };
                let _ = write!(out, "- `{name}` ({ty}, {req}");
                if let Some(bounds) = describe_bounds(prop) {
                    let _ = write!(out, ", {bounds}");
                }
                out.push(')');
                if let Some(desc) = prop.get("description").and_then(Value::as_str) {
                    let _ = write!(out, ": {desc}");
                }
                out.push('\n');
            }
        }
        _ => out.push_str("- no arguments; pass an empty object `{}`\n"),
    }

    out.push_str("\nFix the arguments above and call the tool again.");
    out
}

fn describe_bounds(prop: &Value) -> Option<String> {
    let min = prop.get("minimum").or_else(|| prop.get("minLength"));
    let max = prop.get("maximum").or_else(|| prop.get("maxLength"));
    let unit = if prop.get("minLength").is_some() || prop.get("maxLength").is_some() {
        " chars"
    } else {
        ""
    };
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{min}..{max}{unit}")),
        (Some(min), None) => Some(format!(">= {min}{unit}")),
        (None, Some(max)) => Some(format!("<= {max}{unit}")),
        (None, None) => prop
            .get("enum")
            .and_then(Value::as_array)
            .map(|options| {
                let options: Vec<String> = options.iter().map(ToString::to_string).collect();
                format!("one of {}", options.join(", "))
            }),
    }
}
