//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint, including the
//! caching behavior observable through the stats counters.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use calculator::{api::create_router, cache::CacheStore, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(dir: &TempDir) -> Router {
    let store = CacheStore::open(dir.path(), 100).unwrap();
    let state = AppState::new(store, 300);
    create_router(state)
}

async fn post_calculate(app: &Router, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/calculate")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Calculate Endpoint Tests ==

#[tokio::test]
async fn test_calculate_add() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, r#"{"op":"add","operands":[2,3]}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["result"].as_f64().unwrap(), 5.0);
    assert!(!json["cached"].as_bool().unwrap());
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_calculate_repeat_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let first = post_calculate(&app, r#"{"op":"add","operands":[2,3]}"#).await;
    let first = body_to_json(first.into_body()).await;
    assert_eq!(first["result"].as_f64().unwrap(), 5.0);
    assert!(!first["cached"].as_bool().unwrap());

    let second = post_calculate(&app, r#"{"op":"add","operands":[2,3]}"#).await;
    let second = body_to_json(second.into_body()).await;
    assert_eq!(second["result"].as_f64().unwrap(), 5.0);
    assert!(second["cached"].as_bool().unwrap());

    // exactly one evaluation ran
    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 1);
    assert_eq!(stats["hits"].as_u64().unwrap(), 1);
}

#[tokio::test]
async fn test_calculate_expression() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, r#"{"expression":"(2+3)*4"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["result"].as_f64().unwrap(), 20.0);
}

#[tokio::test]
async fn test_calculate_expression_whitespace_shares_cache() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    post_calculate(&app, r#"{"expression":"2+3"}"#).await;
    let spaced = post_calculate(&app, r#"{"expression":" 2 + 3 "}"#).await;
    let json = body_to_json(spaced.into_body()).await;
    assert!(json["cached"].as_bool().unwrap());
}

#[tokio::test]
async fn test_no_cache_forces_reevaluation() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    post_calculate(&app, r#"{"op":"multiply","operands":[6,7]}"#).await;
    let forced = post_calculate(&app, r#"{"op":"multiply","operands":[6,7],"no_cache":true}"#).await;
    let json = body_to_json(forced.into_body()).await;
    assert_eq!(json["result"].as_f64().unwrap(), 42.0);
    assert!(!json["cached"].as_bool().unwrap());

    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 2);
}

#[tokio::test]
async fn test_ttl_zero_expires_immediately() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    post_calculate(&app, r#"{"op":"add","operands":[1,1],"ttl":0}"#).await;
    let second = post_calculate(&app, r#"{"op":"add","operands":[1,1]}"#).await;
    let json = body_to_json(second.into_body()).await;
    assert!(!json["cached"].as_bool().unwrap());

    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 2);
}

// == Error Mapping Tests ==

#[tokio::test]
async fn test_division_by_zero_maps_to_422() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, r#"{"op":"divide","operands":[5,0]}"#).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"].as_str().unwrap(), "division_by_zero");
}

#[tokio::test]
async fn test_arity_mismatch_maps_to_400() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, r#"{"op":"divide","operands":[5]}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"].as_str().unwrap(), "arity_error");
}

#[tokio::test]
async fn test_malformed_expression_maps_to_400() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, r#"{"expression":"2+*3"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["kind"].as_str().unwrap(), "parse_error");
}

#[tokio::test]
async fn test_empty_request_maps_to_400() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let response = post_calculate(&app, "{}").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cached_error_is_served_with_same_status() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let first = post_calculate(&app, r#"{"op":"divide","operands":[5,0]}"#).await;
    assert_eq!(first.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let second = post_calculate(&app, r#"{"op":"divide","operands":[5,0]}"#).await;
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_to_json(second.into_body()).await;
    assert_eq!(json["kind"].as_str().unwrap(), "division_by_zero");

    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 1);
}

// == Persistence Tests ==

#[tokio::test]
async fn test_results_survive_restart() {
    let dir = TempDir::new().unwrap();

    {
        let app = create_test_app(&dir);
        let response = post_calculate(&app, r#"{"op":"add","operands":[2,3]}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // a fresh store over the same directory sees the committed entry
    let app = create_test_app(&dir);
    let response = post_calculate(&app, r#"{"op":"add","operands":[2,3]}"#).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["result"].as_f64().unwrap(), 5.0);
    assert!(json["cached"].as_bool().unwrap());

    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 0);
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_shape() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let stats = get_json(&app, "/stats").await;
    assert_eq!(stats["hits"].as_u64().unwrap(), 0);
    assert_eq!(stats["misses"].as_u64().unwrap(), 0);
    assert_eq!(stats["evictions"].as_u64().unwrap(), 0);
    assert_eq!(stats["evaluations"].as_u64().unwrap(), 0);
    assert_eq!(stats["total_entries"].as_u64().unwrap(), 0);
    assert_eq!(stats["hit_rate"].as_f64().unwrap(), 0.0);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir);

    let json = get_json(&app, "/health").await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json["timestamp"].as_str().is_some());
}
