/// End-to-end tests of the gateway over HTTP
use std::time::Duration;

use gnews_mcp::*;
use httpmock::prelude::*;
use serde_json::json;

#[cfg(test)]
mod gateway_integration_tests {
    use super::*;

    fn server_for(mock: &MockServer, api_key: Option<&str>) -> GNewsServer {
        let config = GNewsConfig::new(api_key.map(str::to_string), &mock.base_url(), 5)
            .expect("Failed to build config");
        GNewsServer::new(config).expect("Failed to create server")
    }

    fn article(n: u32) -> serde_json::Value {
        json!({
            "title": format!("Article {}", n),
            "description": format!("Description {}", n),
            "content": "Full content...",
            "url": format!("https://news.example.com/{}", n),
            "image": format!("https://news.example.com/{}.jpg", n),
            "publishedAt": "2024-03-01T09:00:00Z",
            "source": {"name": "Example News", "url": "https://news.example.com"}
        })
    }

    #[tokio::test]
    async fn test_search_with_defaults() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "Apple AND iPhone")
                    .query_param("max", "10")
                    .query_param("page", "1")
                    .query_param("sortby", "publishedAt")
                    .query_param("apikey", "test-key");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({"totalArticles": 45, "articles": [article(1), article(2)]}));
            })
            .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("Apple AND iPhone".to_string()),
                ..Default::default()
            })
            .await;

        api.assert_async().await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["query"], "Apple AND iPhone");
        assert_eq!(value["totalArticles"], 45);
        assert_eq!(value["articles"].as_array().unwrap().len(), 2);
        assert_eq!(value["articles"][0]["source"], "Example News");
        assert_eq!(value["parameters_used"]["max"], 10);
        assert_eq!(value["parameters_used"]["page"], 1);
        assert_eq!(value["parameters_used"]["sortby"], "publishedAt");
        assert!(value["parameters_used"].get("lang").is_none());
        assert!(value["parameters_used"].get("apikey").is_none());
    }

    #[tokio::test]
    async fn test_invalid_language_never_reaches_network() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(json!({"totalArticles": 0, "articles": []}));
            })
            .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("x".to_string()),
                lang: Some("xx".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(api.hits_async().await, 0);
        let error = envelope.error().expect("expected failure");
        assert_eq!(error.kind(), "invalid_code");
        assert!(error.to_string().contains("language code 'xx'"));
        assert_eq!(envelope.query(), "x");
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(json!({"totalArticles": 0, "articles": []}));
            })
            .await;

        let server = server_for(&mock, None);
        let search = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;
        let headlines = server.get_top_headlines(HeadlinesParams::default()).await;

        assert_eq!(api.hits_async().await, 0);
        for envelope in [&search, &headlines] {
            assert_eq!(envelope.error(), Some(&GatewayError::MissingCredential));
            assert_eq!(envelope.parameters_used().max, Some(10));
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(429)
                    .json_body(json!({"errors": ["You have exceeded your daily request quota."]}));
            })
            .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;

        api.assert_hits_async(1).await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        let message = value["error"].as_str().unwrap();
        assert!(message.starts_with("Rate limit exceeded"));
        assert!(message.contains("daily request quota"));
        assert_eq!(envelope.error().map(GatewayError::kind), Some("rate_limited"));
    }

    #[tokio::test]
    async fn test_external_error_message() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(401).json_body(json!({"errors": ["Your API key is invalid."]}));
        })
        .await;

        let server = server_for(&mock, Some("bad-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(
            envelope.error(),
            Some(&GatewayError::External {
                status: 401,
                message: "Your API key is invalid.".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_headlines_total_differs_from_page() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/top-headlines")
                    .query_param("category", "sports")
                    .query_param("country", "gb")
                    .query_param("max", "5");
                then.status(200).json_body(json!({
                    "totalArticles": 120,
                    "articles": (1..=5).map(article).collect::<Vec<_>>()
                }));
            })
            .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .get_top_headlines(HeadlinesParams {
                category: Some("sports".to_string()),
                country: Some("gb".to_string()),
                max: Some(NumberLike::Integer(5)),
                ..Default::default()
            })
            .await;

        api.assert_async().await;
        match &envelope {
            ResultEnvelope::Success { total_articles, articles, parameters_used, query } => {
                assert_eq!(*total_articles, 120);
                assert_eq!(articles.len(), 5);
                assert_eq!(parameters_used.category, Some(Category::Sports));
                assert_eq!(parameters_used.country.as_deref(), Some("gb"));
                assert_eq!(parameters_used.max, Some(5));
                assert_eq!(query, "category:sports");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_fields_forwarded() {
        let mock = MockServer::start_async().await;
        let api = mock
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("lang", "en")
                    .query_param("in", "title,description")
                    .query_param("nullable", "image")
                    .query_param("from", "2024-01-01T00:00:00Z")
                    .query_param("to", "2024-01-31T00:00:00Z")
                    .query_param("sortby", "relevance")
                    .query_param("page", "2");
                then.status(200).json_body(json!({"totalArticles": 0, "articles": []}));
            })
            .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("\"open source\" OR linux".to_string()),
                lang: Some("EN".to_string()),
                search_in: Some(TokenList::Text("title, description, title".to_string())),
                nullable: Some(TokenList::Text("image".to_string())),
                from: Some("2024-01-01".to_string()),
                to: Some("2024-01-31".to_string()),
                sortby: Some("relevance".to_string()),
                page: Some(NumberLike::Text("2".to_string())),
                ..Default::default()
            })
            .await;

        api.assert_async().await;
        assert!(envelope.is_success());
        assert!(envelope.articles().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

        let server = server_for(&mock, Some("test-key"));
        let envelope = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(envelope.error().map(GatewayError::kind), Some("malformed_response"));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({"totalArticles": 0, "articles": []}));
        })
        .await;

        let config = GNewsConfig::new(Some("test-key".to_string()), &mock.base_url(), 1).unwrap();
        let server = GNewsServer::new(config).unwrap();
        let envelope = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;

        let error = envelope.error().expect("expected failure");
        assert_eq!(error.kind(), "transport_error");
        assert!(error.to_string().starts_with("Unable to reach news service: request timed out"));
        assert!(!error.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Port 9 (discard) is not expected to be listening
        let config = GNewsConfig::new(Some("test-key".to_string()), "http://127.0.0.1:9", 2).unwrap();
        let server = GNewsServer::new(config).unwrap();
        let envelope = server
            .search_news(SearchParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .await;

        let error = envelope.error().expect("expected failure");
        assert_eq!(error.kind(), "transport_error");
        assert!(error.to_string().starts_with("Unable to reach news service"));
    }
}
