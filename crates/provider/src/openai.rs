//! OpenAI-compatible chat completions gateway
//!
//! Serves the OpenAI API and Ollama's `/v1` endpoint.

use crate::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// How the output token cap goes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimit {
    /// `max_tokens`, understood by Ollama and older models
    MaxTokens,
    /// `max_completion_tokens`; covers reasoning plus visible output
    MaxCompletionTokens,
    /// No cap; the model decides
    ModelDefault,
}

/// OpenAI-compatible gateway
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
    timeout: Duration,
    token_limit: TokenLimit,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base
                .unwrap_or_else(|| OPENAI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            default_model: default_model.into(),
            timeout: Duration::from_secs(60),
            // gpt-5 models reject `max_tokens` and budget reasoning tokens themselves
            token_limit: TokenLimit::ModelDefault,
        }
    }

    /// Local Ollama server; the key is a placeholder Ollama ignores
    pub fn ollama(base_url: &str, default_model: impl Into<String>) -> Self {
        let api_base = format!("{}/v1", base_url.trim_end_matches('/'));
        Self::new("ollama", Some(api_base), default_model).with_token_limit(TokenLimit::MaxTokens)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_limit(mut self, token_limit: TokenLimit) -> Self {
        self.token_limit = token_limit;
        self
    }

    pub fn token_limit(&self) -> TokenLimit {
        self.token_limit
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    // The API expects arguments as a JSON-encoded string
                    let calls: Vec<serde_json::Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": &tc.id,
                                "type": &tc.call_type,
                                "function": {
                                    "name": &tc.function.name,
                                    "arguments": tc.function.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": &params.model,
            "messages": messages,
            "temperature": params.temperature,
            "stream": false,
        });

        match self.token_limit {
            TokenLimit::MaxTokens => body["max_tokens"] = json!(params.max_tokens),
            TokenLimit::MaxCompletionTokens => {
                body["max_completion_tokens"] = json!(params.max_tokens)
            }
            TokenLimit::ModelDefault => {}
        }

        if !params.tools.is_empty() {
            let tools: Vec<serde_json::Value> = params
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": &t.function.name,
                            "description": &t.function.description,
                            "parameters": &t.function.parameters
                        }
                    })
                })
                .collect();

            body["tools"] = json!(tools);
            body["tool_choice"] = match &params.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::Required(name) => {
                    json!({"type": "function", "function": {"name": name}})
                }
                ToolChoice::None => json!("none"),
            };
        }

        if let Some(format) = &params.response_format {
            body["response_format"] = format.to_value();
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                let id = match call["id"].as_str() {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => ToolCall::generate_id(),
                };

                tool_calls.push(ToolCall {
                    id,
                    name: function["name"].as_str().unwrap_or("").to_string(),
                    arguments: parse_arguments(&function["arguments"]),
                });
            }
        }

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
                total_tokens: usage["total_tokens"].as_u64().unwrap_or(0) as u32,
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }
        trace!("Sending chat request to {}", self.api_base);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(format!("{}: {}", status, error)));
        }

        debug!(
            "Chat response with {} tool calls",
            json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0)
        );

        self.parse_response(json)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
