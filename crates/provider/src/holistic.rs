//! Holistic AI Bedrock proxy gateway
//!
//! The proxy speaks Anthropic-style content blocks: assistant tool calls are
//! `tool_use` blocks, tool results are `tool_result` blocks inside a user
//! message, and the system prompt is sent as a leading user message.

use crate::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

pub const HOLISTIC_API_ENDPOINT: &str =
    "https://ctwa92wg1b.execute-api.us-east-1.amazonaws.com/prod/invoke";

/// Bedrock proxy gateway
pub struct HolisticProvider {
    client: Client,
    team_id: String,
    api_token: String,
    api_endpoint: String,
    default_model: String,
    timeout: Duration,
}

impl HolisticProvider {
    pub fn new(
        team_id: impl Into<String>,
        api_token: impl Into<String>,
        api_endpoint: Option<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            team_id: team_id.into(),
            api_token: api_token.into(),
            api_endpoint: api_endpoint.unwrap_or_else(|| HOLISTIC_API_ENDPOINT.to_string()),
            default_model: default_model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
        let mut converted = Vec::new();

        if let Some(system) = messages
            .iter()
            .find(|m| m.role == "system")
            .and_then(|m| m.content.as_deref())
        {
            converted.push(json!({"role": "user", "content": format!("System: {}", system)}));
        }

        for msg in messages {
            let text = msg.content.clone().unwrap_or_default();
            match msg.role.as_str() {
                "system" => continue,
                "assistant" => match &msg.tool_calls {
                    Some(calls) if !calls.is_empty() => {
                        let mut blocks = Vec::new();
                        if !text.is_empty() {
                            blocks.push(json!({"type": "text", "text": text}));
                        }
                        for call in calls {
                            blocks.push(json!({
                                "type": "tool_use",
                                "id": &call.id,
                                "name": &call.function.name,
                                "input": &call.function.arguments,
                            }));
                        }
                        converted.push(json!({"role": "assistant", "content": blocks}));
                    }
                    _ => converted.push(json!({"role": "assistant", "content": text})),
                },
                "tool" => converted.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id.clone().unwrap_or_default(),
                        "content": text,
                    }]
                })),
                _ => converted.push(json!({"role": "user", "content": text})),
            }
        }

        converted
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let mut body = json!({
            "team_id": &self.team_id,
            "api_token": &self.api_token,
            "model": &params.model,
            "messages": Self::convert_messages(&params.messages),
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if let Some(format) = &params.response_format {
            body["response_format"] = format.to_value();
        } else if !params.tools.is_empty() {
            let tools: Vec<serde_json::Value> = params
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": &t.function.name,
                        "description": &t.function.description,
                        "input_schema": &t.function.parameters,
                    })
                })
                .collect();
            body["tools"] = json!(tools);
            body["tool_choice"] = match &params.tool_choice {
                ToolChoice::Auto => json!({"type": "auto"}),
                ToolChoice::Required(name) => json!({"type": "tool", "name": name}),
                ToolChoice::None => json!({"type": "none"}),
            };
        }

        body
    }

    fn parse_response(json: serde_json::Value) -> Result<ChatResponse> {
        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();

        match &json["content"] {
            serde_json::Value::Array(blocks) => {
                for block in blocks {
                    match block["type"].as_str() {
                        Some("text") => {
                            if let Some(text) = block["text"].as_str() {
                                if !text.is_empty() {
                                    texts.push(text.to_string());
                                }
                            }
                        }
                        Some("tool_use") => {
                            let id = match block["id"].as_str() {
                                Some(id) if !id.is_empty() => id.to_string(),
                                _ => ToolCall::generate_id(),
                            };
                            tool_calls.push(ToolCall {
                                id,
                                name: block["name"].as_str().unwrap_or("").to_string(),
                                arguments: parse_arguments(&block["input"]),
                            });
                        }
                        _ => {
                            if let Some(text) = block.as_str() {
                                texts.push(text.to_string());
                            }
                        }
                    }
                }
            }
            serde_json::Value::String(text) => texts.push(text.clone()),
            _ => match json["text"].as_str() {
                Some(text) => texts.push(text.to_string()),
                None => return Err(ProviderError::InvalidResponse),
            },
        }

        let finish_reason = json["stop_reason"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                if tool_calls.is_empty() {
                    "stop".to_string()
                } else {
                    "tool_calls".to_string()
                }
            });

        let usage = &json["usage"];
        let prompt_tokens = usage["input_tokens"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = usage["output_tokens"].as_u64().unwrap_or(0) as u32;

        Ok(ChatResponse {
            content: if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            },
            tool_calls,
            finish_reason,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }
}

#[async_trait::async_trait]
impl Provider for HolisticProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }
        trace!("Sending proxy request for {}", params.model);

        let body = self.build_request(&params);
        let response = self
            .client
            .post(&self.api_endpoint)
            .header("Content-Type", "application/json")
            .header("X-Team-ID", &self.team_id)
            .header("X-API-Token", &self.api_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, detail)));
        }

        let json: serde_json::Value = response.json().await?;
        let parsed = Self::parse_response(json)?;
        debug!("Proxy response with {} tool calls", parsed.tool_calls.len());
        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.team_id.is_empty() && !self.api_token.is_empty()
    }
}
