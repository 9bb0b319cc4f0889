//! Model capability registry
//!
//! Capabilities are looked up once when an agent is built and stored in its
//! configuration snapshot; the control loop never inspects model names.

/// What a model can do natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelCapabilities {
    pub supports_tools: bool,
    pub supports_response_format: bool,
}

impl ModelCapabilities {
    pub const TEXT_ONLY: Self = Self {
        supports_tools: false,
        supports_response_format: false,
    };

    /// Force tool support on or off
    pub fn with_tools(mut self, supports_tools: bool) -> Self {
        self.supports_tools = supports_tools;
        self
    }
}

/// How a rule matches a model identifier
#[derive(Debug, Clone)]
pub enum ModelMatch {
    Exact(String),
    Prefix(String),
    /// Case-insensitive substring
    Contains(String),
}

impl ModelMatch {
    fn matches(&self, model: &str) -> bool {
        match self {
            ModelMatch::Exact(name) => model == name,
            ModelMatch::Prefix(prefix) => model.starts_with(prefix.as_str()),
            ModelMatch::Contains(needle) => model
                .to_lowercase()
                .contains(needle.to_lowercase().as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct CapabilityRule {
    matcher: ModelMatch,
    capabilities: ModelCapabilities,
}

/// Ordered rule table; the first matching rule wins
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    rules: Vec<CapabilityRule>,
}

impl CapabilityRegistry {
    /// Empty registry; every model resolves to text-only
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Known model families
    pub fn builtin() -> Self {
        let hosted = ModelCapabilities {
            supports_tools: true,
            supports_response_format: true,
        };
        let local = ModelCapabilities {
            supports_tools: true,
            supports_response_format: false,
        };

        let mut registry = Self::empty();
        for name in ["gpt-5", "gpt-5-mini", "gpt-5-nano"] {
            registry = registry.with_rule(ModelMatch::Exact(name.to_string()), hosted);
        }
        for prefix in ["us.anthropic", "us.meta", "us.amazon"] {
            registry = registry.with_rule(ModelMatch::Prefix(prefix.to_string()), hosted);
        }
        for prefix in ["gpt-oss", "qwen3"] {
            registry = registry.with_rule(ModelMatch::Prefix(prefix.to_string()), local);
        }
        for family in ["claude", "llama", "nova", "mistral"] {
            registry = registry.with_rule(ModelMatch::Contains(family.to_string()), hosted);
        }
        registry
    }

    /// Append a rule (checked after existing ones)
    pub fn with_rule(mut self, matcher: ModelMatch, capabilities: ModelCapabilities) -> Self {
        self.rules.push(CapabilityRule {
            matcher,
            capabilities,
        });
        self
    }

    pub fn resolve(&self, model: &str) -> ModelCapabilities {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(model))
            .map(|rule| rule.capabilities)
            .unwrap_or(ModelCapabilities::TEXT_ONLY)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
