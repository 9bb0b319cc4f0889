//! Valyu tools: valyu_deep_search and valyu_contents_extract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::ToolTrait;

pub const VALYU_API_BASE: &str = "https://api.valyu.network/v1";

const MAX_CONTENT_URLS: usize = 10;

/// Content length per item: a character count or a named size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseLength {
    Chars(u64),
    Named(String),
}

impl ResponseLength {
    fn from_setting(setting: &str) -> Option<Self> {
        let setting = setting.trim();
        if setting.is_empty() {
            None
        } else if let Ok(chars) = setting.parse() {
            Some(ResponseLength::Chars(chars))
        } else {
            Some(ResponseLength::Named(setting.to_string()))
        }
    }
}

/// Map a non-success response to tool-visible error text
async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("Error: Valyu API returned {}", status)
    } else {
        format!("Error: Valyu API returned {}: {}", status, body)
    }
}

/// Deep search over proprietary and web sources
pub struct ValyuSearchTool {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    max_results: u32,
}

impl ValyuSearchTool {
    pub fn new(api_key: Option<String>, max_results: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.unwrap_or_default(),
            api_base: VALYU_API_BASE.to_string(),
            max_results,
        }
    }

    pub fn from_config(config: &reactant_config::Config) -> Self {
        Self::new(config.valyu_api_key(), config.agent.max_search_results)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_search_type")]
    search_type: String,
    max_num_results: Option<u32>,
    #[serde(default = "default_relevance_threshold")]
    relevance_threshold: f64,
    #[serde(default = "default_max_price")]
    max_price: f64,
    start_date: Option<String>,
    end_date: Option<String>,
    included_sources: Option<Vec<String>>,
    excluded_sources: Option<Vec<String>>,
    response_length: Option<ResponseLength>,
    country_code: Option<String>,
    #[serde(default)]
    fast_mode: bool,
}

fn default_search_type() -> String {
    "all".to_string()
}

fn default_relevance_threshold() -> f64 {
    0.5
}

fn default_max_price() -> f64 {
    50.0
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    search_type: String,
    max_num_results: u32,
    relevance_threshold: f64,
    max_price: f64,
    is_tool_call: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    included_sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excluded_sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_length: Option<ResponseLength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country_code: Option<String>,
    fast_mode: bool,
}

impl SearchRequest {
    fn new(args: SearchArgs, default_results: u32) -> Self {
        Self {
            query: args.query,
            search_type: args.search_type,
            max_num_results: args.max_num_results.unwrap_or(default_results).clamp(1, 20),
            relevance_threshold: args.relevance_threshold.clamp(0.0, 1.0),
            max_price: args.max_price,
            is_tool_call: true,
            start_date: args.start_date,
            end_date: args.end_date,
            included_sources: args.included_sources,
            excluded_sources: args.excluded_sources,
            response_length: args.response_length,
            country_code: args.country_code,
            fast_mode: args.fast_mode,
        }
    }
}

#[async_trait]
impl ToolTrait for ValyuSearchTool {
    fn name(&self) -> &str {
        "valyu_deep_search"
    }

    fn description(&self) -> &str {
        "A wrapper around the Valyu deep search API to search for relevant content from proprietary and web sources. Input is a query and search parameters. Output is a JSON object with the search results."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The input query to be processed." },
                "search_type": {
                    "type": "string",
                    "enum": ["all", "proprietary", "web"],
                    "description": "Type of search. Defaults to 'all'."
                },
                "max_num_results": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 20,
                    "description": "Maximum number of results to return (1-20)."
                },
                "relevance_threshold": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "Minimum relevance score for a result (0.0-1.0). Defaults to 0.5."
                },
                "max_price": { "type": "number", "description": "Maximum cost in dollars for this search. Defaults to 50.0." },
                "start_date": { "type": "string", "description": "Start date in YYYY-MM-DD format." },
                "end_date": { "type": "string", "description": "End date in YYYY-MM-DD format." },
                "included_sources": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "URLs, domains or datasets to include."
                },
                "excluded_sources": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "URLs, domains or datasets to exclude."
                },
                "response_length": {
                    "type": ["integer", "string"],
                    "description": "Content length per item: a character count, or 'short', 'medium', 'large', 'max'."
                },
                "country_code": { "type": "string", "description": "2-letter ISO country code to bias results (e.g. 'GB', 'US')." },
                "fast_mode": { "type": "boolean", "description": "Faster but shorter results. Defaults to false." }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.api_key.is_empty() {
            return Ok("Error: VALYU_API_KEY not configured".to_string());
        }
        let args: SearchArgs = serde_json::from_value(args)?;
        let request = SearchRequest::new(args, self.max_results);
        debug!(
            "Valyu search: {} ({} results)",
            request.query, request.max_num_results
        );

        let response = self
            .client
            .post(format!("{}/deepsearch", self.api_base))
            .header("x-api-key", &self.api_key)
            .timeout(Duration::from_secs(60))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(error_text(response).await);
        }

        let data: Value = response.json().await?;
        Ok(data.to_string())
    }
}

/// Clean content extraction from web pages
pub struct ValyuContentsTool {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    summary: Option<bool>,
    extract_effort: String,
    response_length: Option<ResponseLength>,
}

impl ValyuContentsTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.unwrap_or_default(),
            api_base: VALYU_API_BASE.to_string(),
            summary: None,
            extract_effort: "normal".to_string(),
            response_length: Some(ResponseLength::Named("short".to_string())),
        }
    }

    pub fn from_config(config: &reactant_config::Config) -> Self {
        let valyu = &config.toolkit.valyu;
        Self {
            summary: valyu.summary,
            extract_effort: valyu.extract_effort.clone(),
            response_length: ResponseLength::from_setting(&valyu.response_length),
            ..Self::new(config.valyu_api_key())
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ContentsArgs {
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ContentsRequest<'a> {
    urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<bool>,
    extract_effort: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_length: Option<&'a ResponseLength>,
}

#[async_trait]
impl ToolTrait for ValyuContentsTool {
    fn name(&self) -> &str {
        "valyu_contents_extract"
    }

    fn description(&self) -> &str {
        "A wrapper around the Valyu contents API to extract clean content from web pages. Input is a list of URLs. Output is a JSON object with the extracted content from each URL."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "maxItems": MAX_CONTENT_URLS,
                    "description": "URLs to extract content from (maximum 10 per request)."
                }
            },
            "required": ["urls"]
        })
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.api_key.is_empty() {
            return Ok("Error: VALYU_API_KEY not configured".to_string());
        }
        let args: ContentsArgs = serde_json::from_value(args)?;
        if args.urls.is_empty() {
            return Ok("Error: no URLs given".to_string());
        }
        if args.urls.len() > MAX_CONTENT_URLS {
            return Ok(format!(
                "Error: at most {} URLs per request, got {}",
                MAX_CONTENT_URLS,
                args.urls.len()
            ));
        }
        debug!("Valyu contents: {} urls", args.urls.len());

        let request = ContentsRequest {
            urls: args.urls,
            summary: self.summary,
            extract_effort: &self.extract_effort,
            response_length: self.response_length.as_ref(),
        };

        let response = self
            .client
            .post(format!("{}/contents", self.api_base))
            .header("x-api-key", &self.api_key)
            .timeout(Duration::from_secs(60))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(error_text(response).await);
        }

        let data: Value = response.json().await?;
        Ok(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults() {
        let args: SearchArgs = serde_json::from_value(json!({"query": "rust"})).unwrap();
        let request = SearchRequest::new(args, 10);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["search_type"], "all");
        assert_eq!(body["max_num_results"], 10);
        assert_eq!(body["relevance_threshold"], 0.5);
        assert_eq!(body["max_price"], 50.0);
        assert_eq!(body["is_tool_call"], true);
        assert_eq!(body["fast_mode"], false);
        assert!(body.get("start_date").is_none());
    }

    #[test]
    fn test_search_request_clamps_result_count() {
        let args: SearchArgs =
            serde_json::from_value(json!({"query": "q", "max_num_results": 99})).unwrap();
        assert_eq!(SearchRequest::new(args, 10).max_num_results, 20);

        let args: SearchArgs =
            serde_json::from_value(json!({"query": "q", "max_num_results": 0})).unwrap();
        assert_eq!(SearchRequest::new(args, 10).max_num_results, 1);
    }

    #[test]
    fn test_response_length_accepts_number_or_name() {
        let args: SearchArgs =
            serde_json::from_value(json!({"query": "q", "response_length": 5000})).unwrap();
        assert_eq!(args.response_length, Some(ResponseLength::Chars(5000)));

        let args: SearchArgs =
            serde_json::from_value(json!({"query": "q", "response_length": "max"})).unwrap();
        assert_eq!(
            args.response_length,
            Some(ResponseLength::Named("max".to_string()))
        );
    }

    #[test]
    fn test_response_length_setting() {
        assert_eq!(ResponseLength::from_setting(""), None);
        assert_eq!(
            ResponseLength::from_setting("25000"),
            Some(ResponseLength::Chars(25000))
        );
        assert_eq!(
            ResponseLength::from_setting("medium"),
            Some(ResponseLength::Named("medium".to_string()))
        );
    }

    #[test]
    fn test_contents_from_config() {
        let mut config = reactant_config::Config::default();
        config.toolkit.valyu.api_key = "vk".to_string();
        config.toolkit.valyu.extract_effort = "high".to_string();
        config.toolkit.valyu.summary = Some(true);

        let tool = ValyuContentsTool::from_config(&config);
        assert_eq!(tool.api_key, "vk");
        assert_eq!(tool.extract_effort, "high");
        assert_eq!(tool.summary, Some(true));
        assert_eq!(
            tool.response_length,
            Some(ResponseLength::Named("short".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_as_content() {
        let search = ValyuSearchTool::new(None, 5);
        let result = search.execute(json!({"query": "x"})).await.unwrap();
        assert_eq!(result, "Error: VALYU_API_KEY not configured");

        let contents = ValyuContentsTool::new(None);
        let result = contents.execute(json!({"urls": ["https://a"]})).await.unwrap();
        assert_eq!(result, "Error: VALYU_API_KEY not configured");
    }

    #[tokio::test]
    async fn test_too_many_urls() {
        let tool = ValyuContentsTool::new(Some("k".to_string()));
        let urls: Vec<String> = (0..11).map(|i| format!("https://example.com/{}", i)).collect();
        let result = tool.execute(json!({ "urls": urls })).await.unwrap();
        assert!(result.starts_with("Error: at most 10 URLs"));
    }

    #[tokio::test]
    async fn test_missing_query_is_an_error() {
        let tool = ValyuSearchTool::new(Some("k".to_string()), 5);
        assert!(tool.execute(json!({})).await.is_err());
    }
}
