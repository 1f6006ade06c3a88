//! `use_api` against the real endpoint registry and mock collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use pantry_api::{IngredientId, SearchIngredient, SearchIngredientQuery, registry};
use pantry_core::classify::{ErrorOutcome, messages};
use pantry_core::environment::{MessageKind, NavigateOptions, NavigationTarget, Navigator, RenderPhase};
use pantry_core::error::Slot;
use pantry_core::request::RequestInputs;
use pantry_fetch::{ApiConfig, FetchEnvironment, FetchError, FetchOptions, FetchPhase, use_api, use_endpoint};
use pantry_session::{MemoryCookieJar, ServerMessage, ServerMessages, TokenState, consume_on_client_start};
use pantry_testing::{
    MemoryHydrationStore, MockTransport, RecordingErrorHandler, RecordingMessageSink,
    RecordingNavigator, StaticCredential, init_test_tracing,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

type TestEnvironment = FetchEnvironment<
    MockTransport,
    MemoryHydrationStore,
    StaticCredential,
    RecordingNavigator,
    RecordingMessageSink,
>;

struct Harness {
    transport: MockTransport,
    hydration: MemoryHydrationStore,
    navigator: RecordingNavigator,
    messages: RecordingMessageSink,
    credential: StaticCredential,
}

impl Harness {
    fn at(path: &str) -> Self {
        init_test_tracing();
        Self {
            transport: MockTransport::new(),
            hydration: MemoryHydrationStore::new(),
            navigator: RecordingNavigator::at(path),
            messages: RecordingMessageSink::new(),
            credential: StaticCredential::anonymous(),
        }
    }

    fn env(&self) -> TestEnvironment {
        FetchEnvironment::new(
            self.transport.clone(),
            self.hydration.clone(),
            self.credential.clone(),
            self.navigator.clone(),
            self.messages.clone(),
            Arc::new(ApiConfig::new("https://api.test").with_api_key("k")),
        )
    }
}

fn ingredient_info() -> Value {
    json!({
        "id": 42,
        "original": "bananas",
        "originalName": "bananas",
        "name": "bananas",
        "amount": 1,
        "unit": "",
        "unitShort": "",
        "unitLong": "",
        "possibleUnits": ["piece", "g"],
        "estimatedCost": { "value": 25, "unit": "US Cents" },
        "consistency": "solid",
        "shoppingListUnits": ["pieces"],
        "aisle": "Produce",
        "image": "bananas.jpg",
        "meta": [],
        "nutrition": {
            "nutrients": [{ "name": "Calories", "amount": 105, "unit": "kcal", "percentOfDailyNeeds": 5.25 }],
            "properties": [],
            "caloricBreakdown": { "percentProtein": 4.3, "percentFat": 3.0, "percentCarbs": 92.7 },
            "weightPerServing": { "amount": 118, "unit": "g" }
        },
        "categoryPath": ["fruit"]
    })
}

fn search_response(name: &str) -> Value {
    json!({
        "results": [{ "id": 9040, "name": name, "image": "x.jpg" }],
        "offset": 0,
        "number": 1,
        "totalResults": 1
    })
}

fn ingredient(id: u64) -> RequestInputs {
    RequestInputs::new().with_path_params(&IngredientId { id }).unwrap()
}

#[tokio::test]
async fn test_ingredient_info_without_nutrition_is_a_published_schema_error() {
    let harness = Harness::at("/ingredients/42");
    let mut body = ingredient_info();
    body.as_object_mut().unwrap().remove("nutrition");
    harness.transport.push_json(200, body);

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    let result = api.wait().await;

    let request = harness.transport.last_request().unwrap();
    assert_eq!(request.url, "/food/ingredients/42/information");
    assert!(request.query.is_empty());
    assert_eq!(request.body, None);

    let error = result.error.unwrap();
    assert!(error.origin_from_schema);
    assert_eq!(error.status_code, Some(200));
    assert_eq!(error.message, messages::UNKNOWN);
    assert_eq!(error.raw_error_data.unwrap()["path"], json!("nutrition"));
    assert_eq!(result.data, None);
    assert!(!result.pending);
    assert_eq!(api.phase().await, FetchPhase::RequestFailed);
    assert!(harness.navigator.navigations().is_empty());
}

#[tokio::test]
async fn test_ingredient_info_success_is_typed() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(200, ingredient_info());

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    let result = api.wait().await;

    assert_eq!(result.error, None);
    let info: pantry_api::IngredientInfo = api.data_as().unwrap().unwrap();
    assert_eq!(info.nutrition.nutrients[0].name, "Calories");
    assert_eq!(api.phase().await, FetchPhase::DataReady);

    let request = harness.transport.last_request().unwrap();
    assert_eq!(request.header("accept"), Some("application/json"));
    assert_eq!(request.header("x-api-key"), Some("k"));
    assert_eq!(request.header("authorization"), None);
}

#[tokio::test]
async fn test_bearer_token_is_attached_when_signed_in() {
    let mut harness = Harness::at("/");
    harness.credential = StaticCredential::token("abc");
    harness.transport.push_json(200, ingredient_info());

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    api.wait().await;

    let request = harness.transport.last_request().unwrap();
    assert_eq!(request.header("Authorization"), Some("Bearer abc"));
}

#[tokio::test]
async fn test_equal_query_keeps_the_request() {
    let harness = Harness::at("/search");
    harness.transport.push_json(200, search_response("apple"));
    harness.transport.push_json(200, search_response("apple"));

    let mut api = use_endpoint::<SearchIngredient, _, _, _, _, _>(
        registry().unwrap(),
        &(),
        &SearchIngredientQuery::new("apple"),
        &(),
        harness.env(),
        FetchOptions::new(),
    )
    .await
    .unwrap();
    api.wait().await;
    let key = api.cache_key().await.unwrap();

    // A new value with the same content does not restart.
    let restarted = api.set_query(&SearchIngredientQuery::new("apple")).await.unwrap();
    assert!(!restarted);
    assert_eq!(api.cache_key().await.unwrap(), key);
    assert_eq!(harness.transport.request_count(), 1);

    let restarted = api
        .set_query(&SearchIngredientQuery::new("apple").with_number(2))
        .await
        .unwrap();
    assert!(restarted);
    api.wait().await;
    assert_ne!(api.cache_key().await.unwrap(), key);
    assert_eq!(harness.transport.request_count(), 2);
    assert!(
        harness
            .transport
            .last_request()
            .unwrap()
            .query
            .contains(&("number".to_string(), "2".to_string()))
    );
}

#[tokio::test]
async fn test_only_the_latest_request_is_published() {
    let harness = Harness::at("/search");
    harness
        .transport
        .push_delayed(Duration::from_millis(150), 200, search_response("old"));
    harness.transport.push_json(200, search_response("new"));

    let mut api = use_api(
        registry().unwrap(),
        "searchIngredient",
        RequestInputs::new().with_query(&SearchIngredientQuery::new("old")).unwrap(),
        harness.env(),
        FetchOptions::new(),
    )
    .await
    .unwrap();

    // Let the first request reach the transport before superseding it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(api.set_query(&SearchIngredientQuery::new("new")).await.unwrap());

    let result = api.wait().await;
    assert_eq!(result.data.unwrap()["results"][0]["name"], json!("new"));

    // The superseded answer arrives later and is dropped.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(api.result().data.unwrap()["results"][0]["name"], json!("new"));
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test]
async fn test_hydrated_value_skips_the_transport() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(200, ingredient_info());

    let first = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    first.wait().await;
    // Hydration is written by an effect of the response.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(harness.hydration.len(), 1);

    let second = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();

    let result = second.result();
    assert!(!result.pending);
    assert_eq!(result.data, first.result().data);
    assert_eq!(second.phase().await, FetchPhase::DataReady);
    assert_eq!(harness.transport.request_count(), 1);

    // Refresh bypasses hydration.
    harness.transport.push_json(200, ingredient_info());
    second.refresh().await.unwrap();
    second.wait().await;
    assert_eq!(harness.transport.request_count(), 2);
}

#[tokio::test]
async fn test_forbidden_navigates_home_replacing_history() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(403, json!({}));

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    let result = api.wait().await;

    assert_eq!(result.error.unwrap().message, messages::PERMISSION_DENIED);
    assert_eq!(
        harness.navigator.navigations(),
        vec![(NavigationTarget::path("/"), NavigateOptions::replace())]
    );
    // Client side: the error is published, not left in the message slot.
    assert!(harness.messages.messages().is_empty());
}

#[tokio::test]
async fn test_navigation_to_current_location_is_guarded() {
    let harness = Harness::at("/");
    harness.transport.push_json(404, json!({}));

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    let result = api.wait().await;

    assert_eq!(result.error.unwrap().message, messages::RESOURCE_NOT_FOUND);
    assert!(harness.navigator.navigations().is_empty());
    assert_eq!(
        api.outcome().await,
        Some(ErrorOutcome::LoopGuarded {
            target: NavigationTarget::path("/")
        })
    );
}

#[tokio::test]
async fn test_custom_handler_suppresses_navigation() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(404, json!({}));
    let handler = RecordingErrorHandler::new();

    let api = use_api(
        registry().unwrap(),
        "getIngredientInfo",
        ingredient(42),
        harness.env(),
        FetchOptions::new().with_error_handler(handler.callback()),
    )
    .await
    .unwrap();
    let result = api.wait().await;

    assert_eq!(handler.errors(), vec![result.error.unwrap()]);
    assert!(harness.navigator.navigations().is_empty());
    assert_eq!(api.outcome().await, Some(ErrorOutcome::Delegated));
}

#[tokio::test]
async fn test_skip_error_publishes_without_handling() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(405, json!({}));

    let api = use_api(
        registry().unwrap(),
        "getIngredientInfo",
        ingredient(42),
        harness.env(),
        FetchOptions::new().skip_error(),
    )
    .await
    .unwrap();
    let result = api.wait().await;

    assert_eq!(result.error.unwrap().status_code, Some(405));
    assert!(harness.navigator.navigations().is_empty());
    assert_eq!(api.outcome().await, Some(ErrorOutcome::Skipped));
}

#[tokio::test]
async fn test_server_failure_leaves_message_for_the_client() {
    init_test_tracing();
    let transport = MockTransport::new();
    transport.push_json(
        403,
        json!({ "code": 403, "message": "Ingredient is private", "status": "failure" }),
    );
    let navigator = RecordingNavigator::at("/ingredients/42");
    let server_jar = MemoryCookieJar::from_header("token=%22abc%22");

    let env = FetchEnvironment::new(
        transport.clone(),
        MemoryHydrationStore::new(),
        TokenState::new(server_jar.clone()),
        navigator.clone(),
        ServerMessages::new(server_jar.clone()),
        Arc::new(ApiConfig::default()),
    )
    .with_phase(RenderPhase::Server);

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), env, FetchOptions::new())
        .await
        .unwrap();
    api.wait().await;

    assert_eq!(
        transport.last_request().unwrap().header("authorization"),
        Some("Bearer abc")
    );
    assert_eq!(navigator.current_path(), "/");

    // The browser comes back with the cookies the server set.
    let client_messages = ServerMessages::new(MemoryCookieJar::from_header(&server_jar.to_header()));
    let mut shown = Vec::new();
    assert!(consume_on_client_start(&client_messages, |m| shown.push(m.clone())));
    assert!(!consume_on_client_start(&client_messages, |m| shown.push(m.clone())));
    assert_eq!(
        shown,
        vec![ServerMessage::new(MessageKind::Error, "Ingredient is private")]
    );
}

#[tokio::test]
async fn test_fatal_errors_are_returned_before_any_request() {
    let harness = Harness::at("/");

    let unknown = use_api(registry().unwrap(), "deleteEverything", RequestInputs::new(), harness.env(), FetchOptions::new()).await;
    assert!(matches!(unknown, Err(FetchError::UnknownEndpoint { ref name }) if name == "deleteEverything"));

    let bad_query = use_api(
        registry().unwrap(),
        "searchIngredient",
        RequestInputs::new().with_query(&json!({ "number": 2 })).unwrap(),
        harness.env(),
        FetchOptions::new(),
    )
    .await;
    assert!(matches!(bad_query, Err(FetchError::RequestValidation(ref e)) if e.slot == Slot::Query));
    assert_eq!(harness.transport.request_count(), 0);
}

#[tokio::test]
async fn test_invalid_new_inputs_fail_the_handle() {
    let harness = Harness::at("/ingredients/42");
    harness.transport.push_json(200, ingredient_info());

    let mut api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    api.wait().await;

    let err = api.set_path_params(&json!({ "id": "forty-two" })).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(api.phase().await, FetchPhase::ValidationFailed);
    assert_eq!(api.cache_key().await, None);
    assert_eq!(harness.transport.request_count(), 1);
}

#[tokio::test]
async fn test_subscribers_see_pending_then_data() {
    let harness = Harness::at("/ingredients/42");
    harness
        .transport
        .push_delayed(Duration::from_millis(30), 200, ingredient_info());

    let api = use_api(registry().unwrap(), "getIngredientInfo", ingredient(42), harness.env(), FetchOptions::new())
        .await
        .unwrap();
    let mut updates = api.subscribe();
    assert!(updates.borrow_and_update().pending);

    updates.changed().await.unwrap();
    let settled = updates.borrow().clone();
    assert!(!settled.pending);
    assert!(settled.data.is_some());
}
