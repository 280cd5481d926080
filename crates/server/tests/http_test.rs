use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use tripindex::planner::Planner;
use tripindex::store::{MemoryStore, Store};
use tripindex::writer::Writer;
use tripindex_server::state::AppState;

fn app() -> axum::Router {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState {
        writer: Arc::new(Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400))),
        planner: Arc::new(Planner::new(store)),
        touched_prefixes: None,
    };
    tripindex_server::http::router(state)
}

async fn post_json(app: &axum::Router, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn scenario_reproduces_the_worked_example_over_http() {
    let app = app();

    post_json(
        &app,
        "/trips/",
        serde_json::json!({"tripId": 123, "event": "begin", "lat": 37.8025, "lng": -122.4058}),
    )
    .await;
    post_json(
        &app,
        "/trips/",
        serde_json::json!({"tripId": 456, "event": "begin", "lat": 37.80164, "lng": -122.402244}),
    )
    .await;
    post_json(
        &app,
        "/trips/",
        serde_json::json!({"tripId": 123, "event": "end", "lat": 37.800619, "lng": -122.401782, "fare": 20.0}),
    )
    .await;
    post_json(
        &app,
        "/trips/",
        serde_json::json!({"tripId": 789, "event": "begin", "lat": 37.790789, "lng": -122.431812}),
    )
    .await;
    post_json(
        &app,
        "/trips/",
        serde_json::json!({"tripId": 789, "event": "end", "lat": 37.785057, "lng": -122.437992, "fare": 40.0}),
    )
    .await;

    let resp = app
        .clone()
        .oneshot(
            Request::get("/query/trip_count_right_now/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["count"], 1);

    let (status, json) = post_json(
        &app,
        "/query/trips_passed_through/",
        serde_json::json!({
            "lat1": 37.808374, "lng1": -122.409196,
            "lat2": 37.7952, "lng2": -122.4028,
            "days_back": "0d"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);

    let (status, json) = post_json(
        &app,
        "/query/trips_start_stop/",
        serde_json::json!({
            "lat1": 37.808374, "lng1": -122.409196,
            "lat2": 37.7952, "lng2": -122.4028,
            "days_back": "0d"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["start_count"], 2);
    assert_eq!(json["stop_count"], 1);
    assert_eq!(json["fare_sum"], 20.0);
}

#[tokio::test]
async fn healthz_is_always_reachable() {
    let app = app();
    let resp = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
