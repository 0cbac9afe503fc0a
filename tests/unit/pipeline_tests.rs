/// Pipeline tests with a fake dispatcher standing in for GNews
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gnews_mcp::*;
use serde_json::json;

/// Records every dispatch and answers with a canned result
struct FakeDispatcher {
    calls: AtomicUsize,
    seen: Mutex<Vec<CanonicalParameters>>,
    reply: Result<Outcome, DispatchError>,
}

impl FakeDispatcher {
    fn replying(reply: Result<Outcome, DispatchError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            reply,
        }
    }

    fn ok(body: serde_json::Value) -> Self {
        Self::replying(Ok(Outcome::Ok { status: 200, body: body.to_string() }))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatch for FakeDispatcher {
    async fn dispatch(&self, params: &CanonicalParameters) -> Result<Outcome, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());
        self.reply.clone()
    }
}

#[cfg(test)]
mod pipeline_unit_tests {
    use super::*;

    fn search(q: &str) -> SearchParams {
        SearchParams {
            q: Some(q.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_validation_failures_skip_dispatch() {
        let server = GNewsServer::with_dispatcher(FakeDispatcher::ok(json!({}))).unwrap();

        let failing = vec![
            SearchParams::default(),
            SearchParams { lang: Some("xx".to_string()), ..search("x") },
            SearchParams { country: Some("atlantis".to_string()), ..search("x") },
            SearchParams { max: Some(NumberLike::Integer(101)), ..search("x") },
            SearchParams { page: Some(NumberLike::Integer(-1)), ..search("x") },
            SearchParams { from: Some("soon".to_string()), ..search("x") },
            SearchParams { sortby: Some("popularity".to_string()), ..search("x") },
        ];

        for params in failing {
            let envelope = server.search_news(params).await;
            assert!(envelope.error().map(GatewayError::is_local).unwrap_or(false));
        }
        assert_eq!(server.dispatcher().calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_receives_canonical_params() {
        let body = json!({"totalArticles": 45, "articles": [{"title": "a"}, {"title": "b"}]});
        let server = GNewsServer::with_dispatcher(FakeDispatcher::ok(body)).unwrap();

        let envelope = server.search_news(search("Apple AND iPhone")).await;

        assert_eq!(server.dispatcher().calls(), 1);
        let seen = server.dispatcher().seen.lock().unwrap()[0].clone();
        assert_eq!(seen.query(), Some("Apple AND iPhone"));
        assert_eq!(seen.max(), 10);
        assert_eq!(seen.page(), 1);
        assert_eq!(seen.sortby(), Some(SortBy::PublishedAt));

        match envelope {
            ResultEnvelope::Success { total_articles, articles, parameters_used, .. } => {
                assert_eq!(total_articles, 45);
                assert_eq!(articles.len(), 2);
                assert_eq!(parameters_used, ParametersUsed::from(&seen));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_envelope() {
        let server = GNewsServer::with_dispatcher(FakeDispatcher::replying(Err(
            DispatchError::MissingCredential,
        )))
        .unwrap();

        let envelope = server
            .get_top_headlines(HeadlinesParams {
                category: Some("science".to_string()),
                ..Default::default()
            })
            .await;

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("API key"));
        assert_eq!(value["query"], "category:science");
        assert_eq!(value["parameters_used"]["category"], "science");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let body = json!({"totalArticles": 1, "articles": [{"title": "a"}]});
        let server = Arc::new(GNewsServer::with_dispatcher(FakeDispatcher::ok(body)).unwrap());

        let mut handles = Vec::new();
        for i in 1..=20i64 {
            let server = Arc::clone(&server);
            handles.push(tokio::spawn(async move {
                let params = SearchParams {
                    max: Some(NumberLike::Integer(i)),
                    ..search("topic")
                };
                server.search_news(params).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let envelope = handle.await.unwrap();
            assert!(envelope.is_success());
            assert_eq!(envelope.parameters_used().max, Some(i as u32 + 1));
        }
        assert_eq!(server.dispatcher().calls(), 20);
    }
}
