use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use tripmatch_core::config::{
    MatchingConfig, NotificationsConfig, ServerConfig, SharedConfig, SweeperConfig,
};
use tripmatch_core::entities::Gender;
use tripmatch_core::entities::traveler::{BudgetRange, TravelPreferences, Traveler};
use tripmatch_core::events::{NoopNotifier, delivery_channel};
use tripmatch_core::processors::OnlineUsers;
use tripmatch_core::store::MemoryStore;
use tripmatch_sdk::identity::USER_ID_HEADER;
use uuid::Uuid;

use crate::server::build_router;
use crate::state::AppState;

fn shared_config() -> SharedConfig {
    SharedConfig::new(
        ServerConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
        },
        MatchingConfig::default(),
        SweeperConfig::default(),
        NotificationsConfig::default(),
    )
}

fn app(store: &MemoryStore) -> Router {
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(NoopNotifier),
        shared_config(),
        OnlineUsers::new(delivery_channel(16)),
    );
    build_router(state)
}

fn paris_traveler(age: i32) -> Traveler {
    Traveler {
        id: Uuid::new_v4(),
        age: Some(age),
        gender: Some(Gender::Male),
        travel_preferences: Some(TravelPreferences {
            destinations: vec!["Paris".to_string()],
            budget_range: Some(BudgetRange {
                min: dec!(1000),
                max: dec!(2000),
            }),
            travel_styles: vec![],
        }),
    }
}

fn post_body() -> Value {
    json!({
        "destination": "Paris",
        "travel_dates": { "start": "2026-06-01", "end": "2026-06-10" },
        "description": "museums",
        "budget": "1500",
        "requirements": { "min_age": 25, "max_age": 40, "gender_preference": "any" }
    })
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str, user: Uuid) -> (StatusCode, Value) {
    call(app, "GET", uri, Some(user), None).await
}

async fn post(app: &Router, uri: &str, user: Uuid, body: Option<Value>) -> (StatusCode, Value) {
    call(app, "POST", uri, Some(user), body).await
}

async fn publish(app: &Router, creator: Uuid) -> Value {
    let body = Some(post_body());
    let (status, body) = post(app, "/api/v1/posts", creator, body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn id_of(value: &Value, field: &str) -> Uuid {
    value[field].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(&MemoryStore::new());
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let app = app(&MemoryStore::new());
    let body = Some(post_body());
    let (status, body) = call(&app, "POST", "/api/v1/posts", None, body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn test_publish_lists_candidates_and_summary() {
    let store = MemoryStore::new();
    let traveler = paris_traveler(30);
    store.put_traveler(traveler.clone()).await;
    let app = app(&store);
    let creator = Uuid::new_v4();

    let body = publish(&app, creator).await;
    let matches = body["potential_matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(id_of(&matches[0], "user_id"), traveler.id);
    assert_eq!(matches[0]["match_score"], 100);
    assert!(body.get("matching_error").is_none());
    assert!(body.get("matching_debug").is_none());
    assert_eq!(body["post"]["status"], "active");
    assert_eq!(body["post"]["match_summary"]["accepted"], 1);
    assert_eq!(body["post"]["match_summary"]["pending"], 1);

    let post_id = id_of(&body["post"], "post_id");
    let uri = format!("/api/v1/posts/{post_id}");
    let (status, fetched) = get(&app, &uri, traveler.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["destination"], "Paris");
    assert_eq!(fetched["match_summary"]["pending"], 1);
}

#[tokio::test]
async fn test_matching_failure_hides_store_details() {
    let store = MemoryStore::new();
    let traveler = paris_traveler(30);
    store.put_traveler(traveler.clone()).await;
    store.fail_match_inserts_for(traveler.id).await;
    let app = app(&store);

    let body = publish(&app, Uuid::new_v4()).await;
    let message = body["matching_error"].as_str().unwrap();
    assert!(!message.contains("injected"));
    assert!(!message.contains("store unavailable"));
    assert!(!message.contains(&traveler.id.to_string()));
    assert!(body["potential_matches"].as_array().unwrap().is_empty());
    assert_eq!(body["post"]["match_summary"]["pending"], 0);

    let debug = body.get("matching_debug").and_then(Value::as_str);
    if cfg!(debug_assertions) {
        assert!(debug.unwrap().contains("injected"));
    } else {
        assert!(debug.is_none());
    }
}

#[tokio::test]
async fn test_invalid_post_is_rejected() {
    let app = app(&MemoryStore::new());
    let mut body = post_body();
    body["travel_dates"] = json!({ "start": "2026-06-10", "end": "2026-06-01" });
    let user = Uuid::new_v4();
    let (status, err) = post(&app, "/api/v1/posts", user, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");
}

#[tokio::test]
async fn test_malformed_body_is_invalid_operation() {
    let app = app(&MemoryStore::new());
    let body = Some(json!({ "destination": "Paris" }));
    let (status, err) = post(&app, "/api/v1/posts", Uuid::new_v4(), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");
}

#[tokio::test]
async fn test_malformed_and_unknown_ids() {
    let app = app(&MemoryStore::new());
    let user = Uuid::new_v4();

    let (status, err) = get(&app, "/api/v1/posts/not-a-uuid", user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");

    let uri = format!("/api/v1/posts/{}", Uuid::new_v4());
    let (status, err) = get(&app, &uri, user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "not_found");
}

#[tokio::test]
async fn test_request_match_rules() {
    let store = MemoryStore::new();
    let app = app(&store);
    let creator = Uuid::new_v4();
    let post_id = id_of(&publish(&app, creator).await["post"], "post_id");
    let uri = format!("/api/v1/posts/{post_id}/matches");

    let (status, err) = post(&app, &uri, creator, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");

    let joiner = Uuid::new_v4();
    let (status, created) = post(&app, &uri, joiner, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["match_score"], 0);

    let (status, err) = post(&app, &uri, joiner, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "conflict");
}

#[tokio::test]
async fn test_accept_forms_trip() {
    let store = MemoryStore::new();
    let traveler = paris_traveler(30);
    store.put_traveler(traveler.clone()).await;
    let app = app(&store);
    let creator = Uuid::new_v4();
    let post_id = id_of(&publish(&app, creator).await["post"], "post_id");

    let uri = format!("/api/v1/posts/{post_id}/matches?status=pending");
    let (status, pending) = get(&app, &uri, creator).await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    let match_id = id_of(&pending[0], "match_id");
    let respond = format!("/api/v1/posts/{post_id}/matches/{match_id}/respond");
    let accept = Some(json!({ "response": "accept" }));

    let (status, err) = post(&app, &respond, traveler.id, accept.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["code"], "forbidden");

    let (status, body) = post(&app, &respond, creator, accept).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["match"]["status"], "accepted");
    let participants = body["trip"]["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    let trip_id = id_of(&body["trip"], "trip_id");

    let reject = json!({ "response": "reject" });
    let (status, err) = post(&app, &respond, creator, Some(reject)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "conflict");

    let post_uri = format!("/api/v1/posts/{post_id}");
    let (status, closed) = get(&app, &post_uri, creator).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let trip_uri = format!("/api/v1/trips/{trip_id}");
    let (status, trip) = get(&app, &trip_uri, traveler.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&trip, "post_id"), post_id);

    let (status, _) = get(&app, &trip_uri, Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_response_is_rejected_in_strict_mode() {
    let store = MemoryStore::new();
    let app = app(&store);
    let creator = Uuid::new_v4();
    let post_id = id_of(&publish(&app, creator).await["post"], "post_id");
    let uri = format!("/api/v1/posts/{post_id}/matches");
    let (_, created) = post(&app, &uri, Uuid::new_v4(), None).await;
    let match_id = id_of(&created, "match_id");

    let respond = format!("/api/v1/posts/{post_id}/matches/{match_id}/respond");
    let body = Some(json!({ "response": "maybe" }));
    let (status, err) = post(&app, &respond, creator, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");
}

#[tokio::test]
async fn test_match_listing_visibility_and_history() {
    let store = MemoryStore::new();
    let app = app(&store);
    let creator = Uuid::new_v4();
    let post_id = id_of(&publish(&app, creator).await["post"], "post_id");
    let joiner = Uuid::new_v4();
    let uri = format!("/api/v1/posts/{post_id}/matches");
    let (status, _) = post(&app, &uri, joiner, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let list = format!("/api/v1/posts/{post_id}/matches?sort=score");
    let (status, err) = get(&app, &list, joiner).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["code"], "forbidden");

    let (status, all) = get(&app, &list, creator).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    // the creator's seat scores 100, the profile-less joiner 0
    assert_eq!(id_of(&all[0], "user_id"), creator);

    let bogus = format!("/api/v1/posts/{post_id}/matches?status=bogus");
    let (status, err) = get(&app, &bogus, creator).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "invalid_operation");

    let (status, mine) = get(&app, "/api/v1/matches/mine", joiner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_matches_is_creator_only_and_idempotent() {
    let store = MemoryStore::new();
    let app = app(&store);
    let creator = Uuid::new_v4();
    let post_id = id_of(&publish(&app, creator).await["post"], "post_id");
    let uri = format!("/api/v1/posts/{post_id}/find-matches");

    let (status, _) = post(&app, &uri, Uuid::new_v4(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let late = paris_traveler(35);
    store.put_traveler(late.clone()).await;

    let (status, first) = post(&app, &uri, creator, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["created"], 1);
    assert_eq!(id_of(&first["potential_matches"][0], "user_id"), late.id);

    let (status, second) = post(&app, &uri, creator, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], 0);
    let listed = second["potential_matches"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
}
