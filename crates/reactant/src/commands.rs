//! reactant command implementations

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use reactant_agent::tools::{register_default_tools, ToolRegistry};
use reactant_agent::{AgentError, Conversation, OutputSchema, ReactAgent, RunConfig, Turn};
use reactant_config::{self, Config, ConfigOverrides};
use reactant_provider::gateway::{BEDROCK_ALIASES, OPENAI_MODELS};
use reactant_provider::{
    resolve_bedrock_model, BoundModel, CapabilityRegistry, GatewayKind, HolisticProvider,
    ModelCapabilities, OpenAiCompatProvider, Provider,
};

/// OpenAI's gpt-5 family only accepts the default temperature
const OPENAI_TEMPERATURE: f32 = 1.0;

/// Arguments for `reactant ask`
#[derive(Debug, clap::Args)]
pub struct AskArgs {
    /// Message to send
    #[arg(short, long)]
    pub message: String,
    /// Model name or alias
    #[arg(long)]
    pub model: Option<String>,
    /// Maximum model/tool round-trips (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_steps: Option<u32>,
    /// Coerce the answer into the default AgentResponse schema
    #[arg(long)]
    pub structured: bool,
    /// Schema preset (agent, search, analysis, research) or JSON file
    #[arg(long)]
    pub schema: Option<String>,
    /// Replace the system prompt ({system_time} is substituted)
    #[arg(long)]
    pub system_prompt: Option<String>,
    /// Do not offer tools to the model
    #[arg(long)]
    pub no_tools: bool,
    /// Print the whole run as JSON
    #[arg(long)]
    pub json: bool,
    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl AskArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            max_steps: self.max_steps,
            structured_output: (self.structured || self.schema.is_some()).then_some(true),
            supports_tools: self.no_tools.then_some(false),
        }
    }
}

/// A connected gateway and the model it will be asked for
pub struct Gateway {
    pub kind: GatewayKind,
    pub model: String,
    pub temperature: f32,
    pub provider: Arc<dyn Provider>,
}

/// Pick and build the gateway for the configured model
pub fn connect(config: &Config) -> Result<Gateway> {
    let requested = config.agent.model.as_str();
    let holistic = &config.gateway.holistic;
    let kind = GatewayKind::select(requested, holistic.is_configured());
    let timeout = Duration::from_secs(config.agent.timeout_secs);

    let gateway = match kind {
        GatewayKind::Holistic => {
            let model = resolve_bedrock_model(requested);
            let provider = HolisticProvider::new(
                &holistic.team_id,
                &holistic.api_token,
                Some(holistic.api_endpoint.clone()),
                &model,
            )
            .with_timeout(timeout);
            Gateway {
                kind,
                model,
                temperature: config.agent.temperature,
                provider: Arc::new(provider),
            }
        }
        GatewayKind::OpenAi => {
            let api_key = config.openai_api_key().with_context(|| {
                format!("OPENAI_API_KEY is required for model {}", requested)
            })?;
            let provider = OpenAiCompatProvider::new(
                api_key,
                config.gateway.openai.api_base.clone(),
                requested,
            )
            .with_timeout(timeout);
            Gateway {
                kind,
                model: requested.to_string(),
                temperature: OPENAI_TEMPERATURE,
                provider: Arc::new(provider),
            }
        }
        GatewayKind::Ollama => {
            let provider =
                OpenAiCompatProvider::ollama(&config.gateway.ollama.base_url, requested)
                    .with_timeout(timeout);
            Gateway {
                kind,
                model: requested.to_string(),
                temperature: config.agent.temperature,
                provider: Arc::new(provider),
            }
        }
    };

    debug!("Using {} gateway for {}", gateway.kind, gateway.model);
    Ok(gateway)
}

fn capabilities_for(config: &Config, model: &str) -> ModelCapabilities {
    let capabilities = CapabilityRegistry::builtin().resolve(model);
    match config.agent.supports_tools {
        Some(tools) => capabilities.with_tools(tools),
        None => capabilities,
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn set_or_missing(value: &str) -> &'static str {
    if value.is_empty() {
        "[Missing]"
    } else {
        "[Set]"
    }
}

/// Initialize config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing reactant...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = reactant_config::init().await?;
    let path = reactant_config::config_path();

    println!("Config:  {}", path.display());
    println!("Model:   {}", config.agent.model);

    println!("\n◆ reactant initialized");
    println!("\nNext steps:");
    println!("  1. Add gateway credentials to {} or .env", path.display());
    println!("     (HOLISTIC_AI_TEAM_ID / HOLISTIC_AI_API_TOKEN, OPENAI_API_KEY, or a local Ollama)");
    println!("  2. Add VALYU_API_KEY to enable search tools");
    println!("  3. Ask something: reactant ask -m \"Hello!\"");

    Ok(())
}

/// Run one conversation and print the answer
pub async fn ask_command(args: AskArgs) -> Result<()> {
    let config = Config::load(&args.overrides()).await?;
    let gateway = connect(&config)?;

    let schema = match &args.schema {
        Some(spec) => {
            let path = reactant_config::expand_home(spec);
            Some(
                OutputSchema::resolve(&path.to_string_lossy())
                    .await
                    .with_context(|| format!("Cannot load schema {}", spec))?,
            )
        }
        None => None,
    };

    let capabilities = CapabilityRegistry::builtin().resolve(&gateway.model);
    let run_config = RunConfig::from_settings(&config.agent, capabilities, schema);

    let mut tools = ToolRegistry::new();
    if config.valyu_api_key().is_some() {
        register_default_tools(&mut tools, &config);
    } else {
        info!("VALYU_API_KEY not set, running without search tools");
    }

    let model = BoundModel::new(gateway.provider, &gateway.model)
        .with_sampling(config.agent.max_tokens, gateway.temperature);
    let agent: ReactAgent = ReactAgent::new(model, tools, run_config);

    let conversation = Conversation::from_turns([Turn::user(args.message)])?;
    let outcome = match agent.run(conversation).await {
        Ok(outcome) => outcome,
        Err(AgentError::Timeout {
            limit,
            conversation,
        }) => {
            warn!("Run timed out with {} turns kept", conversation.len());
            if args.json {
                let report = serde_json::json!({
                    "gateway": gateway.kind.as_str(),
                    "model": agent.model().model(),
                    "conversation": &conversation,
                    "structured": null,
                    "timed_out": true,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(answer) = conversation.final_answer().filter(|a| !a.is_empty()) {
                println!("{}", answer);
            }
            anyhow::bail!("run did not finish within {:?}", limit);
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        let report = serde_json::json!({
            "gateway": gateway.kind.as_str(),
            "model": agent.model().model(),
            "steps": outcome.steps,
            "conversation": &outcome.conversation,
            "structured": outcome.structured.as_ref().map(|s| &s.value),
            "timed_out": false,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(structured) = &outcome.structured {
        println!("{}", structured.to_json_pretty());
    } else {
        println!("{}", outcome.final_answer().unwrap_or_default());
    }

    Ok(())
}

/// Show resolved configuration
pub async fn status_command() -> Result<()> {
    let config_path = reactant_config::config_path();

    println!("◆ reactant Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:     {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load(&ConfigOverrides::default()).await?;
    let kind = GatewayKind::select(&config.agent.model, config.gateway.holistic.is_configured());
    let model = match kind {
        GatewayKind::Holistic => resolve_bedrock_model(&config.agent.model),
        _ => config.agent.model.clone(),
    };
    let capabilities = capabilities_for(&config, &model);

    println!("Model:      {}", config.agent.model);
    println!("Resolved:   {}", model);
    println!("Gateway:    {}", kind);
    println!("Tools:      {}", yes_no(capabilities.supports_tools));
    println!(
        "Native JSON: {}",
        yes_no(capabilities.supports_response_format)
    );
    println!("Max steps:  {}", config.agent.max_steps);
    println!(
        "Structured: {}",
        yes_no(config.agent.structured_output)
    );

    println!("\nCredentials:");
    println!(
        "  Holistic AI: {}",
        if config.gateway.holistic.is_configured() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    println!(
        "  OpenAI:      {}",
        set_or_missing(&config.gateway.openai.api_key)
    );
    println!(
        "  Valyu:       {}",
        set_or_missing(&config.toolkit.valyu.api_key)
    );
    println!("  Ollama:      {}", config.gateway.ollama.base_url);

    println!("\n◆ Ready");

    Ok(())
}

/// List model aliases and capabilities
pub fn models_command() -> Result<()> {
    let registry = CapabilityRegistry::builtin();

    println!("◆ Known models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("Holistic AI (Bedrock):");
    for (alias, id) in BEDROCK_ALIASES {
        let caps = registry.resolve(id);
        println!(
            "  {:<20} {} (tools: {}, native JSON: {})",
            alias,
            id,
            yes_no(caps.supports_tools),
            yes_no(caps.supports_response_format)
        );
    }

    println!("\nOpenAI:");
    for name in OPENAI_MODELS {
        let caps = registry.resolve(name);
        println!(
            "  {:<20} (tools: {}, native JSON: {})",
            name,
            yes_no(caps.supports_tools),
            yes_no(caps.supports_response_format)
        );
    }

    println!("\nOllama: any local model, e.g. gpt-oss:20b, qwen3:8b");
    println!("\nSchemas: {}", OutputSchema::PRESETS.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> AskArgs {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            ask: AskArgs,
        }

        let mut argv = vec!["reactant", "-m", "hi"];
        argv.extend_from_slice(extra);
        Harness::parse_from(argv).ask
    }

    #[test]
    fn test_overrides_default_to_none() {
        let overrides = args(&[]).overrides();
        assert!(overrides.model.is_none());
        assert!(overrides.max_steps.is_none());
        assert!(overrides.structured_output.is_none());
        assert!(overrides.supports_tools.is_none());
    }

    #[test]
    fn test_overrides_from_flags() {
        let overrides = args(&[
            "--model",
            "gpt-5-mini",
            "--max-steps",
            "4",
            "--schema",
            "research",
            "--no-tools",
        ])
        .overrides();
        assert_eq!(overrides.model.as_deref(), Some("gpt-5-mini"));
        assert_eq!(overrides.max_steps, Some(4));
        assert_eq!(overrides.structured_output, Some(true));
        assert_eq!(overrides.supports_tools, Some(false));
    }

    #[test]
    fn test_connect_prefers_holistic() {
        let mut config = Config::default();
        config.gateway.holistic.team_id = "team".to_string();
        config.gateway.holistic.api_token = "token".to_string();
        config.agent.model = "claude-3-5-haiku".to_string();

        let gateway = connect(&config).unwrap();
        assert_eq!(gateway.kind, GatewayKind::Holistic);
        assert_eq!(gateway.model, "us.anthropic.claude-3-5-haiku-20241022-v1:0");
        assert!(gateway.provider.is_configured());
    }

    #[test]
    fn test_connect_openai_requires_key() {
        let mut config = Config::default();
        config.agent.model = "gpt-5".to_string();
        assert!(connect(&config).is_err());

        config.gateway.openai.api_key = "sk-test".to_string();
        let gateway = connect(&config).unwrap();
        assert_eq!(gateway.kind, GatewayKind::OpenAi);
        assert_eq!(gateway.temperature, OPENAI_TEMPERATURE);
    }

    #[test]
    fn test_connect_falls_back_to_ollama() {
        let mut config = Config::default();
        config.agent.model = "qwen3:8b".to_string();

        let gateway = connect(&config).unwrap();
        assert_eq!(gateway.kind, GatewayKind::Ollama);
        assert_eq!(gateway.model, "qwen3:8b");
        assert_eq!(gateway.provider.default_model(), "qwen3:8b");
    }

    #[test]
    fn test_capabilities_respect_override() {
        let mut config = Config::default();
        assert!(capabilities_for(&config, "gpt-5").supports_tools);

        config.agent.supports_tools = Some(false);
        let caps = capabilities_for(&config, "gpt-5");
        assert!(!caps.supports_tools);
        assert!(caps.supports_response_format);
    }
}
