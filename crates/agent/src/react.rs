//! ReAct control loop
//!
//! A run alternates model calls and tool dispatch until the model answers
//! without requesting tools, the step budget runs out, or a fatal error
//! occurs. With an output schema configured, one extra model call restates
//! the answer as JSON which is then extracted and validated locally.

use chrono::Utc;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use reactant_config::AgentSettings;
use reactant_provider::{BoundModel, Message, ModelCapabilities, Provider};

use crate::budget::StepBudget;
use crate::conversation::{Conversation, ToolCall, Turn};
use crate::extract::extract_structured;
use crate::prompt::{
    format_directive, format_failure, render_system_prompt, FORCED_STOP_MESSAGE,
    REACT_SYSTEM_PROMPT,
};
use crate::schema::OutputSchema;
use crate::tools::ToolRegistry;
use crate::{AgentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    CallModel,
    DispatchTools,
    FormatOutput,
    Done,
}

/// Per-run settings, fixed when the agent is built
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub max_steps: u32,
    pub system_prompt: String,
    pub output_schema: Option<OutputSchema>,
    pub capabilities: ModelCapabilities,
    pub run_timeout: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            system_prompt: REACT_SYSTEM_PROMPT.to_string(),
            output_schema: None,
            capabilities: ModelCapabilities::default(),
            run_timeout: None,
        }
    }
}

impl RunConfig {
    /// Snapshot the agent settings. `capabilities` come from the registry;
    /// an explicit `supports_tools` setting wins over them.
    pub fn from_settings(
        settings: &AgentSettings,
        capabilities: ModelCapabilities,
        output_schema: Option<OutputSchema>,
    ) -> Self {
        let capabilities = match settings.supports_tools {
            Some(tools) => capabilities.with_tools(tools),
            None => capabilities,
        };
        let output_schema = match output_schema {
            Some(schema) => Some(schema),
            None if settings.structured_output => Some(OutputSchema::agent_response()),
            None => None,
        };

        Self {
            max_steps: settings.max_steps,
            system_prompt: settings
                .system_prompt
                .clone()
                .unwrap_or_else(|| REACT_SYSTEM_PROMPT.to_string()),
            output_schema,
            capabilities,
            run_timeout: settings.run_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Validated structured answer
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult {
    pub schema: String,
    pub value: Map<String, Value>,
}

impl StructuredResult {
    pub fn to_json_pretty(&self) -> String {
        let value = Value::Object(self.value.clone());
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

/// Mutable state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    pub conversation: Conversation,
    pub budget: StepBudget,
    pub structured: Option<StructuredResult>,
    /// States entered so far, in order
    pub path: Vec<LoopState>,
}

impl RunState {
    pub fn new(conversation: Conversation, max_steps: u32) -> Self {
        Self {
            conversation,
            budget: StepBudget::new(max_steps),
            structured: None,
            path: Vec::new(),
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.budget.is_last_step()
    }

    pub fn into_outcome(self) -> RunOutcome {
        RunOutcome {
            steps: self.budget.step_count(),
            conversation: self.conversation,
            structured: self.structured,
            path: self.path,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub conversation: Conversation,
    pub structured: Option<StructuredResult>,
    pub steps: u32,
    pub path: Vec<LoopState>,
}

impl RunOutcome {
    pub fn final_answer(&self) -> Option<&str> {
        self.conversation.final_answer()
    }
}

/// The agent: a model bound for reasoning, a model bound for formatting,
/// the tool catalog and the run settings.
pub struct ReactAgent<P: Provider + ?Sized = dyn Provider> {
    model: BoundModel<P>,
    format_model: BoundModel<P>,
    tools: ToolRegistry,
    config: RunConfig,
}

impl<P: Provider + ?Sized> ReactAgent<P> {
    pub fn new(model: BoundModel<P>, tools: ToolRegistry, config: RunConfig) -> Self {
        let format_model = match &config.output_schema {
            Some(schema) if config.capabilities.supports_response_format => {
                model.with_response_format(schema.response_format())
            }
            _ => model.clone(),
        };

        let model = if config.capabilities.supports_tools && !tools.is_empty() {
            model.bind_tools(tools.definitions())
        } else {
            if !tools.is_empty() {
                info!(
                    "Model {} has no native tool support, running without {} tools",
                    model.model(),
                    tools.len()
                );
            }
            model
        };

        Self {
            model,
            format_model,
            tools,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &BoundModel<P> {
        &self.model
    }

    /// Run to completion from an initial conversation
    pub async fn run(&self, conversation: Conversation) -> Result<RunOutcome> {
        let mut state = RunState::new(conversation, self.config.max_steps);
        match self.config.run_timeout {
            Some(limit) => self.run_with_timeout(&mut state, limit).await?,
            None => self.run_in(&mut state).await?,
        }
        Ok(state.into_outcome())
    }

    /// Run with a wall-clock limit. On timeout `state` keeps every turn
    /// appended before cancellation and stays correlation-consistent; the
    /// error carries a copy of that conversation.
    pub async fn run_with_timeout(&self, state: &mut RunState, limit: Duration) -> Result<()> {
        match tokio::time::timeout(limit, self.run_in(state)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Run cancelled after {:?}", limit);
                Err(AgentError::Timeout {
                    limit,
                    conversation: state.conversation.clone(),
                })
            }
        }
    }

    /// Drive `state` through the loop until `Done`
    pub async fn run_in(&self, state: &mut RunState) -> Result<()> {
        info!(
            "Starting run on {} (max_steps={}, tools={}, structured={})",
            self.model.model(),
            self.config.max_steps,
            self.model.tools().len(),
            self.config.output_schema.is_some()
        );

        let mut next = LoopState::CallModel;
        loop {
            state.path.push(next);
            debug!("Loop state {:?} (step {})", next, state.budget.step_count());

            next = match next {
                LoopState::CallModel => self.call_model(state).await?,
                LoopState::DispatchTools => self.dispatch_tools(state).await?,
                LoopState::FormatOutput => self.format_output(state).await?,
                LoopState::Done => break,
            };
        }

        info!(
            "Run finished after {} tool round-trips",
            state.budget.step_count()
        );
        Ok(())
    }

    /// Next state after a model call, decided from the last turn alone
    pub fn route(&self, conversation: &Conversation) -> Result<LoopState> {
        match conversation.last() {
            Some(turn @ Turn::Assistant { .. }) => Ok(if turn.has_tool_calls() {
                LoopState::DispatchTools
            } else if self.config.output_schema.is_some() {
                LoopState::FormatOutput
            } else {
                LoopState::Done
            }),
            Some(other) => Err(AgentError::RoutingContractViolation(other.kind().to_string())),
            None => Err(AgentError::RoutingContractViolation(
                "empty conversation".to_string(),
            )),
        }
    }

    async fn call_model(&self, state: &mut RunState) -> Result<LoopState> {
        let mut messages = Vec::with_capacity(state.conversation.len() + 1);
        messages.push(Message::system(render_system_prompt(
            &self.config.system_prompt,
            Utc::now(),
        )));
        messages.extend(state.conversation.to_messages());

        let response = self.model.generate(messages).await?;
        let turn = Turn::from_response(response);

        if state.is_last_step() && turn.has_tool_calls() {
            warn!(
                "Step budget exhausted with {} pending tool calls, stopping",
                turn.tool_calls().len()
            );
            state.conversation.push(Turn::assistant(FORCED_STOP_MESSAGE))?;
            return Ok(LoopState::Done);
        }

        state.conversation.push(turn)?;
        self.route(&state.conversation)
    }

    async fn dispatch_tools(&self, state: &mut RunState) -> Result<LoopState> {
        let calls: Vec<ToolCall> = match state.conversation.last() {
            Some(Turn::Assistant { tool_calls, .. }) => tool_calls.clone(),
            Some(other) => {
                return Err(AgentError::RoutingContractViolation(other.kind().to_string()))
            }
            None => {
                return Err(AgentError::RoutingContractViolation(
                    "empty conversation".to_string(),
                ))
            }
        };

        let results = join_all(calls.iter().map(|call| self.execute_tool(call))).await;

        for (call, content) in calls.iter().zip(results) {
            state
                .conversation
                .push(Turn::tool_result(&call.id, &call.name, content))?;
        }
        state.budget.advance();

        Ok(LoopState::CallModel)
    }

    async fn execute_tool(&self, call: &ToolCall) -> String {
        debug!("Executing tool: {}", call.name);
        self.tools
            .execute(&call.name, Value::Object(call.arguments.clone()))
            .await
            .unwrap_or_else(|e| format!("Error: {}", e))
    }

    async fn format_output(&self, state: &mut RunState) -> Result<LoopState> {
        let Some(schema) = &self.config.output_schema else {
            return Ok(LoopState::Done);
        };

        let mut messages = state.conversation.to_messages();
        messages.push(Message::user(format_directive(schema)));

        let response = self.format_model.generate(messages).await?;
        let raw = response.content.unwrap_or_default();

        match extract_structured(&raw, schema) {
            Ok(value) => {
                let result = StructuredResult {
                    schema: schema.name.clone(),
                    value,
                };
                state
                    .conversation
                    .push(Turn::assistant(result.to_json_pretty()))?;
                state.structured = Some(result);
            }
            Err(e) => {
                warn!("Structured output failed: {}", e);
                state
                    .conversation
                    .push(Turn::assistant(format_failure(&e, &raw)))?;
            }
        }

        Ok(LoopState::Done)
    }
}
