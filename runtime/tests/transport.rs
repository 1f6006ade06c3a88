//! Integration tests for the reqwest transport against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use pantry_core::HttpMethod;
use pantry_core::environment::{HttpRequest, HttpTransport};
use pantry_runtime::ReqwestTransport;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(server: &MockServer, http_method: HttpMethod, url: &str) -> HttpRequest {
    HttpRequest {
        method: http_method,
        base_url: server.uri(),
        url: url.to_string(),
        headers: BTreeMap::from([
            ("Accept".to_string(), "application/json".to_string()),
            ("x-api-key".to_string(), "k-123".to_string()),
        ]),
        query: Vec::new(),
        body: None,
    }
}

#[tokio::test]
async fn test_get_with_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/food/ingredients/search"))
        .and(query_param("query", "banana"))
        .and(query_param("number", "2"))
        .and(header("x-api-key", "k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalResults": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(&server, HttpMethod::Get, "/food/ingredients/search");
    req.query = vec![
        ("query".to_string(), "banana".to_string()),
        ("number".to_string(), "2".to_string()),
    ];

    let response = ReqwestTransport::new().execute(req).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "totalResults": 1 }));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    let payload = json!({ "title": "Soup", "servings": 2 });
    Mock::given(method("POST"))
        .and(path("/recipes/analyze"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "title": "Soup" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(&server, HttpMethod::Post, "/recipes/analyze");
    req.body = Some(payload);

    let response = ReqwestTransport::new().execute(req).await.unwrap();
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_error_status_carries_parsed_body() {
    let server = MockServer::start().await;
    let envelope = json!({ "code": 402, "message": "Daily points limit reached", "status": "failure" });
    Mock::given(method("GET"))
        .and(path("/recipes/1/information"))
        .respond_with(ResponseTemplate::new(402).set_body_json(envelope.clone()))
        .mount(&server)
        .await;

    let err = ReqwestTransport::new()
        .execute(request(&server, HttpMethod::Get, "/recipes/1/information"))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(402));
    assert_eq!(err.body, Some(envelope));
}

#[tokio::test]
async fn test_error_status_with_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = ReqwestTransport::new()
        .execute(request(&server, HttpMethod::Get, "/anything"))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(502));
    assert_eq!(err.body, Some(json!("Bad Gateway")));
}

#[tokio::test]
async fn test_connection_failure_has_no_status() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    drop(server);

    let req = HttpRequest {
        method: HttpMethod::Get,
        base_url,
        url: "/gone".to_string(),
        headers: BTreeMap::new(),
        query: Vec::new(),
        body: None,
    };
    let err = ReqwestTransport::new().execute(req).await.unwrap_err();

    assert_eq!(err.status, None);
    assert_eq!(err.body, None);
}
