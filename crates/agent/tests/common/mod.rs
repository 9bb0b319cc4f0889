//! Shared fixtures for control loop tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use reactant_agent::{ReactAgent, RunConfig, ToolRegistry, ToolTrait};
use reactant_provider::{
    BoundModel, ChatParams, ChatResponse, ModelCapabilities, Provider, ProviderError, ToolCall,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub Gateway {}

    #[async_trait]
    impl Provider for Gateway {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

pub const HOSTED: ModelCapabilities = ModelCapabilities {
    supports_tools: true,
    supports_response_format: true,
};

pub const TOOLS_ONLY: ModelCapabilities = ModelCapabilities {
    supports_tools: true,
    supports_response_format: false,
};

/// Requests seen by a scripted gateway, in order
pub type Seen = Arc<Mutex<Vec<ChatParams>>>;

/// Gateway that replays `responses` in order and expects exactly that many
/// calls.
pub fn scripted(responses: Vec<ChatResponse>) -> (MockGateway, Seen) {
    let expected = responses.len();
    let queue = Arc::new(Mutex::new(VecDeque::from(responses)));
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let mut gateway = MockGateway::new();
    let recorded = Arc::clone(&seen);
    gateway
        .expect_chat()
        .times(expected)
        .returning(move |params| {
            recorded.lock().unwrap().push(params);
            Ok(queue.lock().unwrap().pop_front().unwrap())
        });

    (gateway, seen)
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub fn tool_calls(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse::with_tool_calls(calls)
}

pub fn agent(gateway: MockGateway, tools: ToolRegistry, config: RunConfig) -> ReactAgent<MockGateway> {
    ReactAgent::new(BoundModel::new(Arc::new(gateway), "test-model"), tools, config)
}

pub fn config(max_steps: u32, capabilities: ModelCapabilities) -> RunConfig {
    RunConfig {
        max_steps,
        system_prompt: "You are a test agent. Time: {system_time}".to_string(),
        capabilities,
        ..Default::default()
    }
}

pub fn registry() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(AddTool);
    tools.register(SleepTool);
    tools.register(FailingTool);
    tools
}

/// Adds two numbers
pub struct AddTool;

#[async_trait]
impl ToolTrait for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let a = args["a"].as_f64().ok_or("missing a")?;
        let b = args["b"].as_f64().ok_or("missing b")?;
        Ok(format!("{}", a + b))
    }
}

/// Sleeps for `ms` milliseconds then reports its label
pub struct SleepTool;

#[async_trait]
impl ToolTrait for SleepTool {
    fn name(&self) -> &str {
        "sleep"
    }

    fn description(&self) -> &str {
        "Sleep then echo a label"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ms": { "type": "integer" },
                "label": { "type": "string" }
            },
            "required": ["ms", "label"]
        })
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let ms = args["ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(args["label"].as_str().unwrap_or("").to_string())
    }
}

/// Always fails
pub struct FailingTool;

#[async_trait]
impl ToolTrait for FailingTool {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(
        &self,
        _args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Err("boom".into())
    }
}
