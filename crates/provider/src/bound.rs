//! Immutable model binding

use std::sync::Arc;
use tracing::trace;

use crate::{ChatParams, ChatResponse, Message, Provider, ResponseFormat, Result, Tool, ToolChoice};

/// A gateway plus everything bound to it for a call.
///
/// Binding operations return a new value and never mutate `self`.
pub struct BoundModel<P: Provider + ?Sized = dyn Provider> {
    base: Arc<P>,
    model: String,
    tools: Vec<Tool>,
    response_format: Option<ResponseFormat>,
    max_tokens: u32,
    temperature: f32,
}

impl<P: Provider + ?Sized> Clone for BoundModel<P> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            model: self.model.clone(),
            tools: self.tools.clone(),
            response_format: self.response_format.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl<P: Provider + ?Sized> BoundModel<P> {
    pub fn new(base: Arc<P>, model: impl Into<String>) -> Self {
        let defaults = ChatParams::default();
        Self {
            base,
            model: model.into(),
            tools: Vec::new(),
            response_format: None,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    pub fn with_sampling(&self, max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            ..self.clone()
        }
    }

    pub fn bind_tools(&self, tools: Vec<Tool>) -> Self {
        Self {
            tools,
            ..self.clone()
        }
    }

    pub fn with_response_format(&self, response_format: ResponseFormat) -> Self {
        Self {
            response_format: Some(response_format),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn response_format(&self) -> Option<&ResponseFormat> {
        self.response_format.as_ref()
    }

    /// One request/response round-trip.
    ///
    /// Tools are withheld when a response format is bound; gateways do not
    /// accept both on the same request.
    pub async fn generate(&self, messages: Vec<Message>) -> Result<ChatResponse> {
        let tools = if self.response_format.is_some() {
            Vec::new()
        } else {
            self.tools.clone()
        };
        trace!(
            "Generating with {} ({} messages, {} tools)",
            self.model,
            messages.len(),
            tools.len()
        );

        let params = ChatParams {
            model: self.model.clone(),
            messages,
            tools,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tool_choice: ToolChoice::Auto,
            response_format: self.response_format.clone(),
        };
        self.base.chat(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the last params it was called with
    #[derive(Default)]
    struct Recorder {
        last: Mutex<Option<ChatParams>>,
    }

    #[async_trait]
    impl Provider for Recorder {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
            *self.last.lock().unwrap() = Some(params);
            Ok(ChatResponse::text("ok"))
        }

        fn default_model(&self) -> String {
            "recorder".to_string()
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn tool() -> Tool {
        Tool::new("add", "Add numbers", json!({"type": "object"}))
    }

    #[test]
    fn test_binding_does_not_mutate_original() {
        let base = BoundModel::new(Arc::new(Recorder::default()), "m");
        let with_tools = base.bind_tools(vec![tool()]);

        assert!(base.tools().is_empty());
        assert_eq!(with_tools.tools().len(), 1);
        assert_eq!(with_tools.model(), "m");

        let formatted = with_tools.with_response_format(ResponseFormat::json_schema("s", json!({})));
        assert!(with_tools.response_format().is_none());
        assert!(formatted.response_format().is_some());
    }

    #[tokio::test]
    async fn test_generate_passes_binding() {
        let recorder = Arc::new(Recorder::default());
        let model = BoundModel::new(recorder.clone(), "m")
            .with_sampling(256, 0.2)
            .bind_tools(vec![tool()]);

        model.generate(vec![Message::user("hi")]).await.unwrap();

        let params = recorder.last.lock().unwrap().clone().unwrap();
        assert_eq!(params.model, "m");
        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.tools.len(), 1);
        assert!(params.response_format.is_none());
    }

    #[tokio::test]
    async fn test_response_format_withholds_tools() {
        let recorder = Arc::new(Recorder::default());
        let model = BoundModel::new(recorder.clone(), "m")
            .bind_tools(vec![tool()])
            .with_response_format(ResponseFormat::json_schema("s", json!({})));

        model.generate(vec![Message::user("hi")]).await.unwrap();

        let params = recorder.last.lock().unwrap().clone().unwrap();
        assert!(params.tools.is_empty());
        assert!(params.response_format.is_some());
    }
}
