//! JSON extraction from free-form model output
//!
//! Models wrap JSON in code fences, prose or both. Extraction strips a fence,
//! locates the first balanced top-level object and parses it. Brace matching
//! skips braces inside string literals, so values like `"use {x}"` do not end
//! the object early.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::schema::OutputSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON object found in response")]
    NoJsonFound,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("schema validation failed: {0}")]
    SchemaViolation(String),
}

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)(?:```|\z)").unwrap())
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_+-]*\s*(.*?)(?:```|\z)").unwrap())
}

/// Contents of the first ```json block, else of the first fenced block,
/// else the input unchanged. An unterminated fence runs to end of input.
pub fn strip_code_fence(raw: &str) -> &str {
    for re in [json_fence(), any_fence()] {
        if let Some(body) = re.captures(raw).and_then(|c| c.get(1)) {
            return body.as_str();
        }
    }
    raw
}

/// Slice of `text` from the first `{` to its matching `}`
pub fn find_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoJsonFound)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::MalformedJson(format!(
        "unbalanced braces: {} unclosed",
        depth
    )))
}

/// Extract the first JSON object from raw model output
pub fn extract_json(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let body = strip_code_fence(raw);
    let candidate = find_object(body)?;
    serde_json::from_str::<Map<String, Value>>(candidate)
        .map_err(|e| ExtractError::MalformedJson(e.to_string()))
}

/// Extract then validate against `schema`
pub fn extract_structured(
    raw: &str,
    schema: &OutputSchema,
) -> Result<Map<String, Value>, ExtractError> {
    let object = extract_json(raw)?;
    schema.validate(object)
}
