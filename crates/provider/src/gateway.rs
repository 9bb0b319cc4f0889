//! Gateway selection and model name aliases

/// Bedrock model used when a name is not a recognised Bedrock id
pub const DEFAULT_BEDROCK_MODEL: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";

/// Short names accepted by the Bedrock proxy
pub const BEDROCK_ALIASES: &[(&str, &str)] = &[
    ("claude-3-5-sonnet", "us.anthropic.claude-3-5-sonnet-20241022-v2:0"),
    ("claude-3-5-haiku", "us.anthropic.claude-3-5-haiku-20241022-v1:0"),
    ("claude-3-opus", "us.anthropic.claude-3-opus-20240229-v1:0"),
    ("claude-3-sonnet", "us.anthropic.claude-3-sonnet-20240229-v1:0"),
    ("claude-3-haiku", "us.anthropic.claude-3-haiku-20240307-v1:0"),
    ("llama3-2-90b", "us.meta.llama3-2-90b-instruct-v1:0"),
    ("llama3-2-11b", "us.meta.llama3-2-11b-instruct-v1:0"),
    ("llama3-2-3b", "us.meta.llama3-2-3b-instruct-v1:0"),
    ("nova-pro", "us.amazon.nova-pro-v1:0"),
    ("nova-lite", "us.amazon.nova-lite-v1:0"),
];

/// Models served only by the OpenAI API
pub const OPENAI_MODELS: &[&str] = &["gpt-5-nano", "gpt-5-mini", "gpt-5"];

/// Which gateway serves a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    /// Holistic AI Bedrock proxy
    Holistic,
    /// OpenAI chat completions
    OpenAi,
    /// Ollama through its OpenAI-compatible endpoint
    Ollama,
}

impl GatewayKind {
    /// The proxy wins whenever its credentials are present
    pub fn select(model: &str, holistic_configured: bool) -> Self {
        if holistic_configured {
            GatewayKind::Holistic
        } else if OPENAI_MODELS.contains(&model) {
            GatewayKind::OpenAi
        } else {
            GatewayKind::Ollama
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Holistic => "holistic",
            GatewayKind::OpenAi => "openai",
            GatewayKind::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a short name to a Bedrock model id
pub fn resolve_bedrock_model(name: &str) -> String {
    let lower = name.to_lowercase();
    let resolved = BEDROCK_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, id)| id.to_string())
        .unwrap_or_else(|| name.to_string());

    if resolved.starts_with("us.") || resolved.starts_with("mistral.") {
        resolved
    } else {
        DEFAULT_BEDROCK_MODEL.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_holistic() {
        assert_eq!(GatewayKind::select("gpt-5", true), GatewayKind::Holistic);
        assert_eq!(GatewayKind::select("gpt-5", false), GatewayKind::OpenAi);
        assert_eq!(GatewayKind::select("qwen3:8b", false), GatewayKind::Ollama);
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(
            resolve_bedrock_model("Nova-Pro"),
            "us.amazon.nova-pro-v1:0".to_string()
        );
        assert_eq!(
            resolve_bedrock_model("us.meta.llama3-2-3b-instruct-v1:0"),
            "us.meta.llama3-2-3b-instruct-v1:0"
        );
        assert_eq!(
            resolve_bedrock_model("mistral.mistral-large-2402-v1:0"),
            "mistral.mistral-large-2402-v1:0"
        );
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(resolve_bedrock_model("qwen3:8b"), DEFAULT_BEDROCK_MODEL);
    }
}
