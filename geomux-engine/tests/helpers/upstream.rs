//! Local stand-ins for geocoding providers, the AI endpoint and the places API
//!
//! Routes:
//! - `GET /geocode?address&key` - OK, echoes the decoded address and key
//! - `GET /slow?address&key` - OK after 300 ms
//! - `GET /empty` - ZERO_RESULTS
//! - `GET /fail` - HTTP 500
//! - `GET /garbage` - 200 with a non-JSON body
//! - `POST /complete` - completion reply, requires `Bearer ai-key`
//! - `POST /complete-blank` - completion reply with whitespace text
//! - `POST /complete-nochoices` - reply without `choices`
//! - `GET /nearby?location&radius&key` - one place echoing the query
//! - `GET /details?place_id&key` - details echoing the query

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

type Params = Query<HashMap<String, String>>;

fn param(q: &HashMap<String, String>, name: &str) -> String {
    q.get(name).cloned().unwrap_or_default()
}

async fn geocode(Query(q): Params) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "results": [{
            "formatted_address": param(&q, "address"),
            "geometry": {"location": {"lat": 40.7128, "lng": -74.006}},
            "place_id": param(&q, "key"),
            "types": ["street_address"]
        }]
    }))
}

async fn slow(q: Params) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(300)).await;
    geocode(q).await
}

async fn empty() -> Json<Value> {
    Json(json!({"status": "ZERO_RESULTS", "results": []}))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn complete(headers: HeaderMap, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != "Bearer ai-key" {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if body["max_tokens"] != 100 || body["model"].as_str().unwrap_or_default().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let prompt = body["prompt"].as_str().unwrap_or_default();
    let text = match prompt.strip_prefix("Refine this address: ") {
        Some("123 main st") => "  123 Main Street, Springfield \n",
        Some(other) => other,
        None => return Err(StatusCode::BAD_REQUEST),
    };

    Ok(Json(json!({"choices": [{"text": text}]})))
}

async fn complete_blank() -> Json<Value> {
    Json(json!({"choices": [{"text": "   "}]}))
}

async fn complete_nochoices() -> Json<Value> {
    Json(json!({"id": "x"}))
}

async fn nearby(Query(q): Params) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "results": [{
            "place_id": "place-1",
            "name": format!("{}|{}|{}", param(&q, "location"), param(&q, "radius"), param(&q, "key")),
            "types": ["cafe"],
            "vicinity": "Main St"
        }],
        "html_attributions": []
    }))
}

async fn details(Query(q): Params) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "result": {
            "place_id": param(&q, "place_id"),
            "name": param(&q, "key"),
            "formatted_address": "1 Main St",
            "opening_hours": {"open_now": true, "weekday_text": ["Mon: 9-5"]}
        },
        "html_attributions": []
    }))
}

/// Serve the stub on an ephemeral port; returns its base URL
pub async fn spawn_upstream() -> String {
    let router = Router::new()
        .route("/geocode", get(geocode))
        .route("/slow", get(slow))
        .route("/empty", get(empty))
        .route("/fail", get(fail))
        .route("/garbage", get(garbage))
        .route("/complete", post(complete))
        .route("/complete-blank", post(complete_blank))
        .route("/complete-nochoices", post(complete_nochoices))
        .route("/nearby", get(nearby))
        .route("/details", get(details));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}
