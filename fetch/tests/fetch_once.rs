//! One-shot fetching.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use pantry_api::{AnalyzeRecipe, AnalyzeRecipePayload, ErrorEnvelope, registry};
use pantry_core::classify::messages;
use pantry_core::request::RequestInputs;
use pantry_core::HttpMethod;
use pantry_fetch::{ApiConfig, FetchEnvironment, FetchError, FetchOptions, fetch_endpoint, fetch_once};
use pantry_testing::{
    MemoryHydrationStore, MockTransport, RecordingErrorHandler, RecordingMessageSink,
    RecordingNavigator, StaticCredential,
};
use serde_json::json;
use std::sync::Arc;

type TestEnvironment = FetchEnvironment<
    MockTransport,
    MemoryHydrationStore,
    StaticCredential,
    RecordingNavigator,
    RecordingMessageSink,
>;

fn env(transport: &MockTransport, navigator: &RecordingNavigator) -> TestEnvironment {
    FetchEnvironment::new(
        transport.clone(),
        MemoryHydrationStore::new(),
        StaticCredential::token("abc"),
        navigator.clone(),
        RecordingMessageSink::new(),
        Arc::new(ApiConfig::new("https://api.test")),
    )
}

fn payload() -> AnalyzeRecipePayload {
    AnalyzeRecipePayload {
        title: "Pancakes".to_string(),
        servings: 4,
        ingredients: vec!["2 eggs".to_string(), "250g flour".to_string()],
        instructions: "Mix and fry.".to_string(),
    }
}

#[tokio::test]
async fn test_typed_post_returns_response() {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::at("/recipes/new");
    transport.push_json(
        200,
        json!({
            "title": "Pancakes",
            "servings": 4,
            "extendedIngredients": [
                { "id": 1123, "name": "eggs", "amount": 2, "unit": "" },
                { "name": "flour", "amount": 250, "unit": "g" }
            ]
        }),
    );

    let analyzed = fetch_endpoint::<AnalyzeRecipe, _, _, _, _, _>(
        registry().unwrap(),
        &(),
        &(),
        &payload(),
        &env(&transport, &navigator),
        &FetchOptions::new(),
    )
    .await
    .unwrap();

    assert_eq!(analyzed.extended_ingredients.len(), 2);
    let request = transport.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.full_url(), "https://api.test/recipes/analyze");
    assert_eq!(request.body.as_ref().unwrap()["ingredients"][1], json!("250g flour"));
    assert_eq!(request.header("Authorization"), Some("Bearer abc"));
}

#[tokio::test]
async fn test_failure_is_handled_then_returned_classified() {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::at("/recipes/7");
    transport.push_json(404, json!({}));

    let inputs = RequestInputs::new().with_path_params(&json!({ "id": 7 })).unwrap();
    let err = fetch_once(
        registry().unwrap(),
        "getRecipeInfo",
        &inputs,
        &env(&transport, &navigator),
        &FetchOptions::new(),
    )
    .await
    .unwrap_err();

    let classified = err.classified().unwrap();
    assert_eq!(classified.message, messages::RESOURCE_NOT_FOUND);
    assert_eq!(classified.status_code, Some(404));
    assert_eq!(navigator.navigations().len(), 1);
}

#[tokio::test]
async fn test_envelope_message_is_surfaced() {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::at("/search");
    let envelope = json!({
        "code": 402,
        "message": "Your daily points limit of 150 has been reached.",
        "status": "failure"
    });
    transport.push_json(402, envelope.clone());
    let handler = RecordingErrorHandler::new();

    let inputs = RequestInputs::new().with_query(&json!({ "query": "pasta" })).unwrap();
    let err = fetch_once(
        registry().unwrap(),
        "searchRecipes",
        &inputs,
        &env(&transport, &navigator),
        &FetchOptions::new().with_error_handler(handler.callback()),
    )
    .await
    .unwrap_err();

    let parsed = ErrorEnvelope::parse(Some(&envelope)).unwrap();
    assert_eq!(err.to_string(), parsed.message);
    assert_eq!(handler.errors().len(), 1);
    assert!(navigator.navigations().is_empty());
}

#[tokio::test]
async fn test_skip_error_returns_raw_failure() {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::at("/recipes/7");
    transport.push_json(403, json!({}));

    let inputs = RequestInputs::new().with_path_params(&json!({ "id": 7 })).unwrap();
    let err = fetch_once(
        registry().unwrap(),
        "getRecipeInfo",
        &inputs,
        &env(&transport, &navigator),
        &FetchOptions::new().skip_error(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::Transport(ref e) if e.status == Some(403)));
    assert!(navigator.navigations().is_empty());
}

#[tokio::test]
async fn test_fatal_payload_is_rejected_without_io() {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::at("/recipes/new");

    let inputs = RequestInputs::new().with_payload(&json!({ "title": "x" })).unwrap();
    let err = fetch_once(
        registry().unwrap(),
        "analyzeRecipe",
        &inputs,
        &env(&transport, &navigator),
        &FetchOptions::new(),
    )
    .await
    .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(transport.request_count(), 0);
}
