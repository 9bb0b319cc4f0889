//! Output schemas
//!
//! A schema is a flat set of typed fields. It renders to JSON Schema for the
//! model-facing directive and validates the extracted object locally.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

use reactant_provider::ResponseFormat;

use crate::extract::ExtractError;
use crate::{AgentError, Result};

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<FieldKind>>,
    },
    Object,
    Enum {
        values: Vec<String>,
    },
}

impl FieldKind {
    pub fn array_of(items: FieldKind) -> Self {
        FieldKind::Array {
            items: Some(Box::new(items)),
        }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            FieldKind::String => json!({"type": "string"}),
            FieldKind::Number => json!({"type": "number"}),
            FieldKind::Integer => json!({"type": "integer"}),
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::Object => json!({"type": "object"}),
            FieldKind::Array { items } => match items {
                Some(items) => json!({"type": "array", "items": items.to_json_schema()}),
                None => json!({"type": "array"}),
            },
            FieldKind::Enum { values } => json!({"type": "string", "enum": values}),
        }
    }

    fn describe(&self) -> String {
        match self {
            FieldKind::String => "a string".to_string(),
            FieldKind::Number => "a number".to_string(),
            FieldKind::Integer => "an integer".to_string(),
            FieldKind::Boolean => "a boolean".to_string(),
            FieldKind::Object => "an object".to_string(),
            FieldKind::Array { .. } => "an array".to_string(),
            FieldKind::Enum { values } => format!("one of [{}]", values.join(", ")),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array { items } => match (value.as_array(), items) {
                (Some(elements), Some(items)) => elements.iter().all(|e| items.accepts(e)),
                (Some(_), None) => true,
                (None, _) => false,
            },
            FieldKind::Enum { values } => value
                .as_str()
                .map(|s| values.iter().any(|v| v == s))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// Desired shape of the final structured answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Default answer shape
    pub fn agent_response() -> Self {
        Self::new("AgentResponse", "Structured response from the agent")
            .field(FieldSpec::required(
                "answer",
                FieldKind::String,
                "The main answer to the user's question",
            ))
            .field(FieldSpec::optional(
                "sources",
                FieldKind::array_of(FieldKind::String),
                "List of sources or references used",
            ))
            .field(FieldSpec::optional(
                "confidence",
                FieldKind::one_of(["high", "medium", "low"]),
                "Confidence level",
            ))
            .field(FieldSpec::optional(
                "key_points",
                FieldKind::array_of(FieldKind::String),
                "Key points or takeaways",
            ))
            .field(FieldSpec::optional(
                "follow_up_questions",
                FieldKind::array_of(FieldKind::String),
                "Suggested follow-up questions",
            ))
    }

    pub fn search_response() -> Self {
        Self::new("SearchResponse", "Results of a web search")
            .field(FieldSpec::required(
                "query",
                FieldKind::String,
                "The search query that was executed",
            ))
            .field(FieldSpec::required(
                "results",
                FieldKind::array_of(FieldKind::Object),
                "Search results, each with title, url and snippet",
            ))
            .field(FieldSpec::required(
                "summary",
                FieldKind::String,
                "Summary of the search results",
            ))
            .field(FieldSpec::optional(
                "total_results",
                FieldKind::Integer,
                "Total number of results found",
            ))
    }

    pub fn analysis_response() -> Self {
        Self::new("AnalysisResponse", "Analysis of a topic or document")
            .field(FieldSpec::required(
                "summary",
                FieldKind::String,
                "Executive summary of the analysis",
            ))
            .field(FieldSpec::required(
                "findings",
                FieldKind::array_of(FieldKind::String),
                "Key findings",
            ))
            .field(FieldSpec::optional(
                "recommendations",
                FieldKind::array_of(FieldKind::String),
                "Recommended actions",
            ))
            .field(FieldSpec::optional(
                "risks",
                FieldKind::array_of(FieldKind::String),
                "Identified risks or concerns",
            ))
            .field(FieldSpec::optional(
                "confidence",
                FieldKind::one_of(["high", "medium", "low"]),
                "Confidence level",
            ))
    }

    pub fn research_response() -> Self {
        Self::new("ResearchResponse", "Research report on a topic")
            .field(FieldSpec::required(
                "topic",
                FieldKind::String,
                "Research topic",
            ))
            .field(FieldSpec::required(
                "summary",
                FieldKind::String,
                "Research summary",
            ))
            .field(FieldSpec::required(
                "main_findings",
                FieldKind::array_of(FieldKind::String),
                "Main research findings",
            ))
            .field(FieldSpec::optional(
                "sources",
                FieldKind::array_of(FieldKind::String),
                "Sources consulted",
            ))
            .field(FieldSpec::optional(
                "methodology",
                FieldKind::String,
                "How the research was conducted",
            ))
            .field(FieldSpec::optional(
                "limitations",
                FieldKind::array_of(FieldKind::String),
                "Known limitations",
            ))
            .field(FieldSpec::optional(
                "next_steps",
                FieldKind::array_of(FieldKind::String),
                "Suggested next steps",
            ))
    }

    /// Look up a built-in schema by name (case-insensitive, `_response`
    /// suffix optional)
    pub fn preset(name: &str) -> Option<Self> {
        let key = name.to_lowercase().replace(['-', '_'], "");
        let key = key.strip_suffix("response").unwrap_or(&key);
        match key {
            "agent" | "default" => Some(Self::agent_response()),
            "search" => Some(Self::search_response()),
            "analysis" => Some(Self::analysis_response()),
            "research" => Some(Self::research_response()),
            _ => None,
        }
    }

    pub const PRESETS: &'static [&'static str] = &["agent", "search", "analysis", "research"];

    /// Load a schema definition from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let schema: Self =
            serde_json::from_str(&content).map_err(|e| AgentError::Schema(e.to_string()))?;
        if schema.fields.is_empty() {
            return Err(AgentError::Schema(format!(
                "schema `{}` declares no fields",
                schema.name
            )));
        }
        Ok(schema)
    }

    /// Resolve a `--schema` argument: preset name first, then file path
    pub async fn resolve(spec: &str) -> Result<Self> {
        match Self::preset(spec) {
            Some(schema) => Ok(schema),
            None => Self::load(spec).await,
        }
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut property = field.kind.to_json_schema();
            if !field.description.is_empty() {
                property["description"] = json!(field.description);
            }
            properties.insert(field.name.clone(), property);
            if field.required {
                required.push(field.name.clone());
            }
        }

        json!({
            "title": &self.name,
            "description": &self.description,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Native directive. Not strict: strict mode forbids optional fields.
    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat {
            strict: false,
            ..ResponseFormat::json_schema(&self.name, self.to_json_schema())
        }
    }

    /// Check required fields and value types. Unknown keys pass through.
    pub fn validate(&self, object: Map<String, Value>) -> std::result::Result<Map<String, Value>, ExtractError> {
        let mut problems = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        problems.push(format!("missing required field `{}`", field.name));
                    }
                }
                Some(value) => {
                    if !field.kind.accepts(value) {
                        problems.push(format!(
                            "field `{}` must be {}",
                            field.name,
                            field.kind.describe()
                        ));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(object)
        } else {
            Err(ExtractError::SchemaViolation(problems.join("; ")))
        }
    }
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::agent_response()
    }
}
