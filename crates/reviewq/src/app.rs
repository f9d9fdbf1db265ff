use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        completed::{completed_stats, export_training, get_completed, list_completed},
        health::{livez, readyz},
        methods::{method_not_allowed, preflight},
        pending::{list_pending, next_review, reset_pending, submit_review},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let request_timeout = state.config.timeouts.request;

    // CORS configuration for API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // API routes with CORS
    let api_routes = Router::new()
        // Pending queue
        .route("/pending", get(list_pending))
        .route("/pending/next", get(next_review))
        .route(
            "/submit",
            post(submit_review)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/reset",
            post(reset_pending)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        // Completed log
        .route("/completed", get(list_completed))
        .route("/completed/stats", get(completed_stats))
        .route("/completed/export", get(export_training))
        .route("/completed/{review_id}", get(get_completed))
        .layer(cors);

    // Main application router
    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use reviewq_core::review::ReviewItem;
    use reviewq_core::storage::{
        BackupRepository, PendingRepository, RepositoryError, Result, ReviewStore,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::connection::{ConnectionCache, Connector};
    use crate::state::test_support::in_memory_state;
    use crate::storage::inmemory::InMemoryRepository;

    async fn seed_pending(repo: &InMemoryRepository, docs: Vec<Value>) {
        let items: Vec<ReviewItem> = docs
            .into_iter()
            .map(|d| ReviewItem::try_from(d).unwrap())
            .collect();
        repo.replace_backup(&items).await.unwrap();
        repo.replace_pending(&items).await.unwrap();
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    struct RefusingConnector;

    #[async_trait::async_trait]
    impl Connector for RefusingConnector {
        fn backend(&self) -> &'static str {
            "refusing"
        }

        async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
            Err(RepositoryError::ConnectionFailed("refused".to_string()))
        }
    }

    struct SlowConnector;

    #[async_trait::async_trait]
    impl Connector for SlowConnector {
        fn backend(&self) -> &'static str {
            "slow"
        }

        async fn connect(&self) -> Result<Arc<dyn ReviewStore>> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }

    fn unreachable_state() -> AppState {
        AppState {
            connections: Arc::new(ConnectionCache::new(
                Arc::new(RefusingConnector),
                Duration::from_secs(1),
            )),
            config: Arc::new(Config::default()),
        }
    }

    #[tokio::test]
    async fn test_livez() {
        let (state, _) = in_memory_state();

        let (status, _) = send(create_app(state), get_request("/livez")).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz() {
        let (state, _) = in_memory_state();
        let (status, body) = send(create_app(state), get_request("/readyz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], json!(true));

        let (status, body) = send(create_app(unreachable_state()), get_request("/readyz")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], json!(false));
    }

    #[tokio::test]
    async fn test_next_review() {
        let (state, repo) = in_memory_state();
        seed_pending(&repo, vec![json!({"id": "a1", "prompt": "p"}), json!({"id": "a2"})]).await;

        let (status, body) = send(create_app(state), get_request("/api/pending/next")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item"]["id"], json!("a1"));
        assert_eq!(body["remainingCount"], json!(2));
        assert_eq!(body["totalCount"], json!(2));
    }

    #[tokio::test]
    async fn test_next_review_empty_is_200_with_error() {
        let (state, _) = in_memory_state();

        let (status, body) = send(create_app(state), get_request("/api/pending/next")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], json!("No pending reviews"));
    }

    #[tokio::test]
    async fn test_request_timeout_comes_from_config() {
        let mut config = Config::default();
        config.timeouts.request = Duration::from_millis(50);
        let state = AppState {
            connections: Arc::new(ConnectionCache::new(
                Arc::new(SlowConnector),
                Duration::from_secs(5),
            )),
            config: Arc::new(config),
        };

        let response = create_app(state)
            .oneshot(get_request("/api/pending"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_get_routes_report_unreachable_database() {
        for uri in ["/api/pending", "/api/pending/next", "/api/completed"] {
            let (status, body) = send(create_app(unreachable_state()), get_request(uri)).await;

            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            assert!(body["error"].as_str().unwrap().contains("refused"));
        }
    }

    #[tokio::test]
    async fn test_list_pending() {
        let (state, repo) = in_memory_state();
        seed_pending(&repo, vec![json!({"id": "a"}), json!({"id": "b"})]).await;

        let (status, body) = send(create_app(state), get_request("/api/pending")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["total"], json!(2));
        assert_eq!(body["truncated"], json!(false));
    }

    #[tokio::test]
    async fn test_submit_then_list_pending() {
        let (state, repo) = in_memory_state();
        seed_pending(&repo, vec![json!({"id": "a1", "prompt": "..."})]).await;
        let app = create_app(state);

        let (status, body) = send(
            app.clone(),
            post_json("/api/submit", json!({"review_id": "a1", "acceptable": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["removed_pending"], json!(true));
        assert!(body["id"].is_string());

        let (_, pending) = send(app.clone(), get_request("/api/pending")).await;
        assert_eq!(pending["items"], json!([]));

        let (status, review) = send(app, get_request("/api/completed/a1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(review["acceptable"], json!(true));
        assert_eq!(review["review_id"], json!("a1"));
        assert!(review["submitted_at"].is_string());
    }

    #[tokio::test]
    async fn test_submit_malformed_body() {
        let (state, _) = in_memory_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/submit")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(create_app(state), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_submit_options_and_wrong_method() {
        let (state, _) = in_memory_state();
        let app = create_app(state);

        let options = Request::builder()
            .method("OPTIONS")
            .uri("/api/submit")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), options).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app, get_request("/api/submit")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], json!("Method not allowed"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (state, _) = in_memory_state();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/reset")
            .header("origin", "https://review.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = create_app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_reset() {
        let (state, repo) = in_memory_state();
        seed_pending(&repo, vec![json!({"id": "a"}), json!({"id": "b"})]).await;
        repo.replace_pending(&[]).await.unwrap();
        let app = create_app(state);

        let (status, _) = send(app.clone(), post_json("/api/reset", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(app.clone(), post_json("/api/reset", json!({"confirm": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["restored"], json!(2));
        assert_eq!(repo.count_pending().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_without_backup_is_500() {
        let (state, _) = in_memory_state();

        let (status, body) = send(
            create_app(state),
            post_json("/api/reset", json!({"confirm": true})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("backup"));
    }

    #[tokio::test]
    async fn test_list_completed_views() {
        let (state, _) = in_memory_state();
        let app = create_app(state);
        send(
            app.clone(),
            post_json(
                "/api/submit",
                json!({"review_id": "a", "response": "long text", "rating": 5}),
            ),
        )
        .await;

        let (status, summary) = send(app.clone(), get_request("/api/completed")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["view"], json!("summary"));
        assert!(summary["items"][0].get("response").is_none());

        let (_, detail) = send(app.clone(), get_request("/api/completed?view=detail&limit=5")).await;
        assert_eq!(detail["items"][0]["response"], json!("long text"));

        let (status, _) = send(app, get_request("/api/completed?view=everything")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_completed_empty_is_200_with_error() {
        let (state, _) = in_memory_state();

        let (status, body) = send(create_app(state), get_request("/api/completed")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], json!("No completed reviews"));
    }

    #[tokio::test]
    async fn test_get_completed_missing_is_404() {
        let (state, _) = in_memory_state();

        let (status, body) = send(create_app(state), get_request("/api/completed/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_stats_and_export() {
        let (state, _) = in_memory_state();
        let app = create_app(state);
        for (id, rating) in [("a", 2), ("b", 5)] {
            send(
                app.clone(),
                post_json(
                    "/api/submit",
                    json!({"review_id": id, "rating": rating, "prompt": "p", "feature": "chat"}),
                ),
            )
            .await;
        }

        let (status, stats) = send(app.clone(), get_request("/api/completed/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_reviews"], json!(2));
        assert_eq!(stats["by_feature"]["chat"]["count"], json!(2));

        let response = app
            .oneshot(get_request("/api/completed/export"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/x-ndjson");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let lines: Vec<Value> = String::from_utf8(body.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["rating"], json!(5));
        assert!(lines[0]["metadata"]["timestamp"].is_string());
    }
}
