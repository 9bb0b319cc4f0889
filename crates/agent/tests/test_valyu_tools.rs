//! Valyu tools against a mock HTTP server

use mockito::Matcher;
use reactant_agent::tools::{ToolTrait, ValyuContentsTool, ValyuSearchTool};
use serde_json::{json, Value};

#[tokio::test]
async fn test_search_posts_query_with_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/deepsearch")
        .match_header("x-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "query": "rust async runtimes",
            "search_type": "web",
            "max_num_results": 3,
            "is_tool_call": true
        })))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "results": [{"title": "Tokio", "url": "https://tokio.rs", "content": "..."}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tool = ValyuSearchTool::new(Some("test-key".to_string()), 10).with_api_base(server.url());
    let result = tool
        .execute(json!({
            "query": "rust async runtimes",
            "search_type": "web",
            "max_num_results": 3
        }))
        .await
        .unwrap();

    mock.assert_async().await;
    let parsed: Value = serde_json::from_str(&result).unwrap();
    assert_eq!(parsed["results"][0]["title"], "Tokio");
}

#[tokio::test]
async fn test_search_uses_configured_result_count() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/deepsearch")
        .match_body(Matcher::PartialJson(json!({"max_num_results": 7})))
        .with_status(200)
        .with_body("{\"results\": []}")
        .create_async()
        .await;

    let tool = ValyuSearchTool::new(Some("k".to_string()), 7).with_api_base(server.url());
    tool.execute(json!({"query": "q"})).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_error_status_is_content() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/deepsearch")
        .with_status(401)
        .with_body("invalid api key")
        .create_async()
        .await;

    let tool = ValyuSearchTool::new(Some("bad".to_string()), 5).with_api_base(server.url());
    let result = tool.execute(json!({"query": "q"})).await.unwrap();

    assert!(result.starts_with("Error: Valyu API returned 401"));
    assert!(result.contains("invalid api key"));
}

#[tokio::test]
async fn test_contents_sends_configured_options() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/contents")
        .match_header("x-api-key", "vk")
        .match_body(Matcher::PartialJson(json!({
            "urls": ["https://example.com/a"],
            "extract_effort": "high",
            "response_length": 20000,
            "summary": true
        })))
        .with_status(200)
        .with_body(json!({"results": [{"url": "https://example.com/a", "content": "body"}]}).to_string())
        .create_async()
        .await;

    let mut config = reactant_config::Config::default();
    config.toolkit.valyu.api_key = "vk".to_string();
    config.toolkit.valyu.extract_effort = "high".to_string();
    config.toolkit.valyu.response_length = "20000".to_string();
    config.toolkit.valyu.summary = Some(true);

    let tool = ValyuContentsTool::from_config(&config).with_api_base(server.url());
    let result = tool
        .execute(json!({"urls": ["https://example.com/a"]}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(result.contains("body"));
}

#[tokio::test]
async fn test_contents_rejects_empty_url_list() {
    let tool = ValyuContentsTool::new(Some("k".to_string()));
    let result = tool.execute(json!({"urls": []})).await.unwrap();
    assert_eq!(result, "Error: no URLs given");
}
