/// JSON-RPC level tests of the MCP surface
use std::sync::Arc;

use gnews_mcp::*;
use httpmock::prelude::*;
use serde_json::{json, Value};

#[cfg(test)]
mod mcp_integration_tests {
    use super::*;

    fn mcp_for(base_url: &str, api_key: Option<&str>) -> McpServer<HttpDispatcher> {
        let config = GNewsConfig::new(api_key.map(str::to_string), base_url, 5).unwrap();
        McpServer::new(Arc::new(GNewsServer::new(config).unwrap()))
    }

    async fn call(server: &McpServer<HttpDispatcher>, request: Value) -> Value {
        let response = server
            .process_line(&request.to_string())
            .await
            .expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    /// Parse the envelope out of a tools/call response
    fn envelope_of(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let server = mcp_for("http://127.0.0.1:9", Some("k"));
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "test", "version": "1"}
            }}),
        )
        .await;

        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "GNews MCP");
        assert!(response["result"]["capabilities"]["resources"].is_object());

        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.process_line(&notification.to_string()).await.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_tools_list_schemas() {
        let server = mcp_for("http://127.0.0.1:9", Some("k"));
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["search_news", "get_top_headlines"]);

        let search_schema = &tools[0]["inputSchema"];
        assert_eq!(search_schema["required"], json!(["q"]));
        assert!(search_schema["properties"]["in"].is_object());
        assert!(search_schema["properties"]["sortby"].is_object());
        assert!(tools[1]["inputSchema"]["properties"]["category"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/search").query_param("max", "3");
            then.status(200).json_body(json!({
                "totalArticles": 1,
                "articles": [{"title": "Only one", "url": "https://example.com/a"}]
            }));
        })
        .await;

        let server = mcp_for(&mock.base_url(), Some("test-key"));
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "search_news", "arguments": {"q": "rust", "max_articles": "3"}
            }}),
        )
        .await;

        assert_eq!(response["result"]["isError"], false);
        let envelope = envelope_of(&response);
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["articles"][0]["image"], Value::Null);
        assert_eq!(envelope["parameters_used"]["max"], 3);
    }

    #[tokio::test]
    async fn test_tools_call_validation_failure() {
        let server = mcp_for("http://127.0.0.1:9", Some("test-key"));
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "get_top_headlines", "arguments": {"category": "weather", "lang": "en"}
            }}),
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let envelope = envelope_of(&response);
        assert_eq!(envelope["success"], false);
        assert!(envelope["error"].as_str().unwrap().contains("Invalid category 'weather'"));
        assert_eq!(envelope["parameters_used"], json!({"lang": "en"}));
    }

    #[tokio::test]
    async fn test_tools_call_malformed_arguments() {
        let server = mcp_for("http://127.0.0.1:9", Some("test-key"));
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
                "name": "search_news", "arguments": {"q": "rust", "lang": 42}
            }}),
        )
        .await;

        let envelope = envelope_of(&response);
        assert_eq!(envelope["success"], false);
        assert!(envelope["error"].as_str().unwrap().starts_with("Malformed arguments"));
        assert_eq!(envelope["query"], "rust");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let server = mcp_for("http://127.0.0.1:9", Some("k"));
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "weather"}}),
        )
        .await;
        assert_eq!(response["result"]["isError"], true);

        let response = call(&server, json!({"jsonrpc": "2.0", "id": 7, "method": "sampling/create"})).await;
        assert_eq!(response["error"]["code"], -32601);

        let response = server.process_line("{not json").await.unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap()["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_resources() {
        let server = mcp_for("http://127.0.0.1:9", None);
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"})).await;
        let uris: Vec<&str> = response["result"]["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["uri"].as_str().unwrap())
            .collect();
        assert_eq!(uris, vec!["gnews://languages", "gnews://countries", "gnews://query-syntax"]);

        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 9, "method": "resources/read", "params": {"uri": "gnews://countries"}}),
        )
        .await;
        let contents = &response["result"]["contents"][0];
        assert_eq!(contents["mimeType"], "application/json");
        let table: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
        assert_eq!(table["gb"], "United Kingdom");

        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 10, "method": "resources/read", "params": {"uri": "gnews://nope"}}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32002);
    }

    #[tokio::test]
    async fn test_prompts() {
        let server = mcp_for("http://127.0.0.1:9", None);
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 11, "method": "prompts/list"})).await;
        assert_eq!(response["result"]["prompts"][0]["name"], "news_research");

        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 12, "method": "prompts/get", "params": {
                "name": "news_research", "arguments": {"topic": "solar power", "days": "3"}
            }}),
        )
        .await;
        let text = response["result"]["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("\"solar power\""));
        assert!(text.contains("past 3 days"));

        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 13, "method": "prompts/get", "params": {
                "name": "news_research", "arguments": {}
            }}),
        )
        .await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let server = mcp_for("http://127.0.0.1:9", Some("k"));
        let mut input = Vec::new();
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 1, \"method\": \"ping\"}\n");
        input.extend_from_slice(b"\xff\xfe not text\n");
        input.extend_from_slice(b"\n");
        input.extend_from_slice(b"{\"jsonrpc\": \"2.0\", \"id\": 2, \"method\": \"ping\"}\n");

        let output = server.serve(&input[..], Vec::new()).await.unwrap();
        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        let parse_errors: Vec<&Value> = responses
            .iter()
            .filter(|r| r["error"]["code"] == -32700)
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert!(parse_errors[0]["id"].is_null());

        let mut ids: Vec<i64> = responses.iter().filter_map(|r| r["id"].as_i64()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
