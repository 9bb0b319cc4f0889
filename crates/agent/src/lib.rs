//! ReAct agent core
//!
//! Conversation model, step budget, structured-output coercion and the
//! control loop that sequences model calls and tool dispatch.

use std::time::Duration;
use thiserror::Error;

use reactant_provider::ProviderError;

pub mod budget;
pub mod conversation;
pub mod extract;
pub mod prompt;
pub mod react;
pub mod schema;
pub mod tools;

pub use budget::StepBudget;
pub use conversation::{Conversation, ToolCall, Turn};
pub use extract::{extract_json, extract_structured, ExtractError};
pub use react::{LoopState, ReactAgent, RunConfig, RunOutcome, RunState, StructuredResult};
pub use schema::{FieldKind, FieldSpec, OutputSchema};
pub use tools::{ToolRegistry, ToolTrait};

/// Fatal run errors. Model-output shape problems never show up here; they
/// become assistant turns instead.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model gateway error: {0}")]
    Provider(#[from] ProviderError),

    #[error("routing contract violated: expected an assistant turn, found {0}")]
    RoutingContractViolation(String),

    #[error("tool result for `{0}` has no matching tool call")]
    OrphanToolResult(String),

    /// Carries the turns appended before cancellation
    #[error("run did not finish within {limit:?}")]
    Timeout {
        limit: Duration,
        conversation: Conversation,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid output schema: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
