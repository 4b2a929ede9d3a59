//! End-to-end tests for the relay HTTP surface: a real listener on an
//! ephemeral port, exercised with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{ json, Value };

use chat_relay::cli::Args;
use chat_relay::ratelimit::FixedWindowLimiter;
use chat_relay::reply::create_reply_generator;
use chat_relay::server::{ build_router, AppState };
use chat_relay::store::initialize_store;

fn test_args() -> Args {
    Args {
        server_addr: "127.0.0.1:0".to_string(),
        development: false,
        reply_backend: "pattern".to_string(),
        webhook_url: None,
        webhook_timeout_secs: 30,
        webhook_retry_attempts: 3,
        webhook_backoff_base_ms: 1000,
        rate_limit_max_requests: 30,
        rate_limit_window_secs: 60,
    }
}

/// Binds the app on an ephemeral port and returns its base URL.
async fn spawn_app(args: Args) -> String {
    let store = initialize_store();
    let limiter = Arc::new(
        FixedWindowLimiter::new(
            args.rate_limit_max_requests,
            Duration::from_secs(args.rate_limit_window_secs)
        )
    );
    let generator = create_reply_generator(&args).expect("generator should build");
    let state = AppState::new(store, limiter, generator, &args);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("server run");
    });

    format!("http://{}", addr)
}

async fn post_webhook(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .json(&body)
        .send().await
        .expect("request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn test_math_message_round_trip_and_follow_up() {
    let base = spawn_app(test_args()).await;

    let (status, body) = post_webhook(&base, json!({ "message": "5 + 3" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["response"].as_str().unwrap().contains('8'));
    assert!(body["rateLimit"]["remaining"].is_number());

    let conversation_id = body["conversation_id"].as_str().unwrap().to_string();

    let (status, body) = post_webhook(
        &base,
        json!({ "message": "follow-up", "conversation_id": conversation_id })
    ).await;
    assert_eq!(status, 200);
    assert_eq!(body["conversation_id"].as_str().unwrap(), conversation_id);

    let response = reqwest::get(
        format!("{}/webhook/conversation/{}", base, conversation_id)
    ).await.expect("request");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["conversation"]["messageCount"], 4);
    let messages = body["conversation"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn test_validation_failure_reports_all_details() {
    let base = spawn_app(test_args()).await;

    let (status, body) = post_webhook(&base, json!({ "message": 12345 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"], json!(["message must be a string"]));
}

#[tokio::test]
async fn test_rate_limit_rejects_over_quota() {
    let mut args = test_args();
    args.rate_limit_max_requests = 2;
    let base = spawn_app(args).await;

    let (status, first) = post_webhook(&base, json!({ "message": "one" })).await;
    assert_eq!(status, 200);
    assert_eq!(first["rateLimit"]["remaining"], 1);

    let (status, second) = post_webhook(&base, json!({ "message": "two" })).await;
    assert_eq!(status, 200);
    assert_eq!(second["rateLimit"]["remaining"], 0);

    let (status, third) = post_webhook(&base, json!({ "message": "three" })).await;
    assert_eq!(status, 429);
    assert_eq!(third["success"], false);
    assert_eq!(third["error"], "Rate limit exceeded");
    assert!(third["resetIn"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_post_to_unknown_conversation_is_404() {
    let base = spawn_app(test_args()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/webhook/conversation/nope", base))
        .json(&json!({ "message": "hi" }))
        .send().await
        .expect("request");
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["error"], "Conversation not found");
    assert_eq!(body["conversation_id"], "nope");
}

#[tokio::test]
async fn test_post_to_existing_conversation_reports_count() {
    let base = spawn_app(test_args()).await;

    let (_, created) = post_webhook(&base, json!({ "message": "first" })).await;
    let conversation_id = created["conversation_id"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/webhook/conversation/{}", base, conversation_id))
        .json(&json!({ "message": "second" }))
        .send().await
        .expect("request");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["message_count"], 4);
}

#[tokio::test]
async fn test_list_and_delete_flow() {
    let base = spawn_app(test_args()).await;

    let (_, created) = post_webhook(&base, json!({ "message": "hello there" })).await;
    let conversation_id = created["conversation_id"].as_str().unwrap();

    let list: Value = reqwest::get(format!("{}/webhook/conversations", base)).await
        .expect("request")
        .json().await
        .expect("json body");
    assert_eq!(list["count"], 1);
    assert_eq!(list["conversations"][0]["id"].as_str().unwrap(), conversation_id);
    assert_eq!(list["conversations"][0]["messageCount"], 2);
    assert!(list["conversations"][0]["lastMessage"].is_string());

    let response = reqwest::Client::new()
        .delete(format!("{}/webhook/conversation/{}", base, conversation_id))
        .send().await
        .expect("request");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["message"], "Conversation deleted");

    let response = reqwest::Client::new()
        .delete(format!("{}/webhook/conversation/{}", base, conversation_id))
        .send().await
        .expect("request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_health_reports_store_size() {
    let base = spawn_app(test_args()).await;

    post_webhook(&base, json!({ "message": "hi" })).await;

    let body: Value = reqwest::get(format!("{}/health", base)).await
        .expect("request")
        .json().await
        .expect("json body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["conversationsCount"], 1);
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["memoryUsage"].is_object());
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let base = spawn_app(test_args()).await;

    let response = reqwest::get(format!("{}/nowhere", base)).await.expect("request");
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["success"], false);
    assert_eq!(body["path"], "/nowhere");
}

#[tokio::test]
async fn test_invalid_json_body_is_400() {
    let base = spawn_app(test_args()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send().await
        .expect("request");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["error"], "Invalid JSON body");
}
