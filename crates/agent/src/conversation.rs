//! Conversation model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use reactant_provider::{ChatResponse, Message, ToolCallDef};

use crate::{AgentError, Result};

/// A model-issued tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl From<reactant_provider::ToolCall> for ToolCall {
    fn from(call: reactant_provider::ToolCall) -> Self {
        let arguments = match call.arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };
        Self {
            id: call.id,
            name: call.name,
            arguments,
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    User {
        text: String,
    },
    System {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User { text: text.into() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Turn::System { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn::Assistant {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Turn::Assistant {
            text: text.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Turn::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Assistant turn from a gateway response
    pub fn from_response(response: ChatResponse) -> Self {
        Turn::Assistant {
            text: response.content.unwrap_or_default(),
            tool_calls: response.tool_calls.into_iter().map(ToolCall::from).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Turn::User { .. } => "user",
            Turn::System { .. } => "system",
            Turn::Assistant { .. } => "assistant",
            Turn::ToolResult { .. } => "tool_result",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Turn::User { text } | Turn::System { text } | Turn::Assistant { text, .. } => text,
            Turn::ToolResult { content, .. } => content,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Turn::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    pub fn to_message(&self) -> Message {
        match self {
            Turn::User { text } => Message::user(text.as_str()),
            Turn::System { text } => Message::system(text.as_str()),
            Turn::Assistant { text, tool_calls } => {
                let mut msg = Message::assistant(text.as_str());
                if !tool_calls.is_empty() {
                    msg.tool_calls = Some(
                        tool_calls
                            .iter()
                            .map(|tc| {
                                ToolCallDef::new(&tc.id, &tc.name, Value::Object(tc.arguments.clone()))
                            })
                            .collect(),
                    );
                }
                msg
            }
            Turn::ToolResult {
                call_id,
                name,
                content,
            } => Message::tool(call_id.as_str(), name.as_str(), content.as_str()),
        }
    }
}

/// Append-only turn sequence.
///
/// Every tool result must answer a tool call made earlier in the same
/// conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Turn>", into = "Vec<Turn>")]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing turns, checking correlation
    pub fn from_turns(turns: impl IntoIterator<Item = Turn>) -> Result<Self> {
        let mut conversation = Self::new();
        for turn in turns {
            conversation.push(turn)?;
        }
        Ok(conversation)
    }

    pub fn push(&mut self, turn: Turn) -> Result<()> {
        if let Turn::ToolResult { call_id, .. } = &turn {
            if !self.has_call(call_id) {
                return Err(AgentError::OrphanToolResult(call_id.clone()));
            }
        }
        self.turns.push(turn);
        Ok(())
    }

    fn has_call(&self, call_id: &str) -> bool {
        self.turns
            .iter()
            .flat_map(|t| t.tool_calls())
            .any(|call| call.id == call_id)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(Turn::to_message).collect()
    }

    /// Text of the final assistant turn, if any
    pub fn final_answer(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| matches!(t, Turn::Assistant { .. }))
            .map(Turn::text)
    }
}

impl TryFrom<Vec<Turn>> for Conversation {
    type Error = AgentError;

    fn try_from(turns: Vec<Turn>) -> Result<Self> {
        Self::from_turns(turns)
    }
}

impl From<Conversation> for Vec<Turn> {
    fn from(conversation: Conversation) -> Self {
        conversation.turns
    }
}
