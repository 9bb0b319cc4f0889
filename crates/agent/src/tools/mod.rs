//! Tool registry

pub mod valyu;

pub use valyu::{ValyuContentsTool, ValyuSearchTool};

use async_trait::async_trait;
use reactant_provider::Tool;
use serde_json::Value;

type BoxedTool = Box<dyn ToolTrait + Send + Sync>;

#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub fn to_provider_tool(tool: &dyn ToolTrait) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Named tools, kept in registration order so the catalog sent to the
/// model is stable between calls.
pub struct ToolRegistry {
    tools: Vec<BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        let boxed: BoxedTool = Box::new(tool);
        match self.tools.iter().position(|t| t.name() == boxed.name()) {
            Some(index) => self.tools[index] = boxed,
            None => self.tools.push(boxed),
        }
    }

    pub fn get(&self, name: &str) -> Option<&(dyn ToolTrait + Send + Sync)> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| to_provider_tool(t.as_ref()))
            .collect()
    }

    pub async fn execute(
        &self,
        name: &str,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("tool '{}' not found", name))?;
        tool.execute(args).await
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the Valyu search and contents tools
pub fn register_default_tools(registry: &mut ToolRegistry, config: &reactant_config::Config) {
    registry.register(ValyuSearchTool::from_config(config));
    registry.register(ValyuContentsTool::from_config(config));
}
