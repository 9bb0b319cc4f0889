//! Model gateway boundary
//!
//! Wire types shared by every chat model adapter, the [`Provider`] trait,
//! the model capability registry and the immutable [`BoundModel`] binding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use thiserror::Error;

pub mod bound;
pub mod capabilities;
pub mod gateway;
pub mod holistic;
pub mod openai;

pub use bound::BoundModel;
pub use capabilities::{CapabilityRegistry, ModelCapabilities};
pub use gateway::{resolve_bedrock_model, GatewayKind};
pub use holistic::HolisticProvider;
pub use openai::{OpenAiCompatProvider, TokenLimit};

/// Gateway errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gateway rejected request: {0}")]
    Api(String),

    #[error("no API key configured")]
    NoApiKey,

    #[error("malformed gateway response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    /// Fresh correlation id for gateways that omit one
    pub fn generate_id() -> String {
        format!("call_{}", uuid::Uuid::new_v4().simple())
    }
}

/// One assistant turn returned by a gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Token accounting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat message in OpenAI-style role form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn with_role(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content.into())
    }

    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// Tool call as echoed back to the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallDef {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCallDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// Tool specification offered to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Native structured-output directive (`response_format: json_schema`)
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

impl ResponseFormat {
    pub fn json_schema(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }

    /// Wire form shared by OpenAI and the Bedrock proxy
    pub fn to_value(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "strict": self.strict,
                "schema": self.schema,
            }
        })
    }
}

/// Request parameters
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tool_choice: ToolChoice,
    pub response_format: Option<ResponseFormat>,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 1024,
            temperature: 0.7,
            tool_choice: ToolChoice::Auto,
            response_format: None,
        }
    }
}

/// Tool selection mode
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    Auto,
    Required(String),
    None,
}

/// A chat model gateway
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Parse tool arguments that may arrive as a JSON string or as an object
pub(crate) fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({})),
        Value::Null => json!({}),
        other => other.clone(),
    }
}
