//! Prompt templates for the control loop

use chrono::{DateTime, SecondsFormat, Utc};

use crate::schema::OutputSchema;

/// Placeholder replaced with the current UTC time on every model call
pub const SYSTEM_TIME_PLACEHOLDER: &str = "{system_time}";

/// Minimal assistant prompt
pub const SIMPLE_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.

System time: {system_time}";

/// Default prompt for tool-using runs
pub const REACT_SYSTEM_PROMPT: &str = "You are a general ReAct agent that can solve multi-step tasks by planning, using tools, and producing clear results. You have access to multiple registered tools; their names, descriptions, and argument schemas are provided to you.

Instructions:
1. Clarify or decompose the task if needed; plan minimal steps.
2. Use tools when they materially improve correctness or efficiency.
3. Ground factual claims in retrieved information and avoid hallucinations.
4. Otherwise, produce a final answer with clear, actionable steps.

System time: {system_time}";

/// Assistant text that replaces tool calls requested on the last step
pub const FORCED_STOP_MESSAGE: &str = "Sorry, could not complete in the specified steps.";

/// Substitute the timestamp into a system prompt template
pub fn render_system_prompt(template: &str, now: DateTime<Utc>) -> String {
    template.replace(
        SYSTEM_TIME_PLACEHOLDER,
        &now.to_rfc3339_opts(SecondsFormat::Micros, false),
    )
}

/// Directive asking the model to restate its answer as schema-shaped JSON
pub fn format_directive(schema: &OutputSchema) -> String {
    let rendered = serde_json::to_string_pretty(&schema.to_json_schema())
        .unwrap_or_else(|_| schema.to_json_schema().to_string());

    format!(
        "Format the previous response as a valid JSON object following this schema:

{}

IMPORTANT: Return ONLY valid JSON with no additional text, explanations, or thinking process. Start with {{ and end with }}.",
        rendered
    )
}

/// Assistant text recorded when the formatting step fails
pub fn format_failure(error: &impl std::fmt::Display, raw: &str) -> String {
    format!("Error formatting output: {}\n\n{}", error, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_substitutes_utc_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let rendered = render_system_prompt(SIMPLE_SYSTEM_PROMPT, now);
        assert!(rendered.ends_with("System time: 2026-01-02T03:04:05.000000+00:00"));
        assert!(!rendered.contains(SYSTEM_TIME_PLACEHOLDER));
    }

    #[test]
    fn test_render_without_placeholder_is_identity() {
        let now = Utc::now();
        assert_eq!(render_system_prompt("Be terse.", now), "Be terse.");
    }

    #[test]
    fn test_format_directive_embeds_schema() {
        let directive = format_directive(&OutputSchema::agent_response());
        assert!(directive.starts_with("Format the previous response"));
        assert!(directive.contains("\"title\": \"AgentResponse\""));
        assert!(directive.ends_with("Start with { and end with }."));
    }

    #[test]
    fn test_format_failure_layout() {
        let text = format_failure(&"no JSON object found in response", "plain text");
        assert_eq!(
            text,
            "Error formatting output: no JSON object found in response\n\nplain text"
        );
    }
}
