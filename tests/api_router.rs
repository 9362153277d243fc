use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use teamhub::{app_state::AppState, config::Config};
use tower::ServiceExt;

fn app() -> Router {
    AppState::new(Config::default()).router()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_list_endpoints() {
    let app = app();
    let (status, teams) = call(&app, Method::GET, "/api/teams", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(teams.as_array().unwrap().len(), 4);
    assert_eq!(teams[0]["memberCount"], 12);

    let (_, members) = call(&app, Method::GET, "/api/teams/1/members", None).await;
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (_, unread) = call(&app, Method::GET, "/api/notifications/unread", None).await;
    assert_eq!(unread.as_array().unwrap().len(), 2);

    let (status, user) = call(&app, Method::GET, "/api/auth/user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "team_admin");
}

#[tokio::test]
async fn test_create_team_and_validation_errors() {
    let app = app();
    let (status, team) = call(
        &app,
        Method::POST,
        "/api/teams",
        Some(json!({"name": "Lightning Bolts", "sport": "basketball", "category": "U12"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(team["id"], 5);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/teams",
        Some(json!({"name": " ", "sport": "basketball", "category": "U12"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
    assert_eq!(body["status"], 400);

    let (status, body) = call(&app, Method::POST, "/api/teams", Some(json!({"name": "X"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (_, teams) = call(&app, Method::GET, "/api/teams", None).await;
    assert_eq!(teams.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/teams/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = call(&app, Method::PATCH, "/api/notifications/99/read", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_read_and_send_message() {
    let app = app();
    let (status, notification) = call(&app, Method::PATCH, "/api/notifications/2/read", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification["read"], true);

    let (_, stats) = call(&app, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(stats["unreadNotifications"], 1);
    assert_eq!(stats["activeTeams"], 4);

    let (status, message) = call(
        &app,
        Method::POST,
        "/api/teams/1/messages",
        Some(json!({"message": "Game moved to 7pm", "isUrgent": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["isUrgent"], true);
    assert_eq!(message["teamId"], 1);

    let (_, messages) = call(&app, Method::GET, "/api/teams/1/messages", None).await;
    assert_eq!(messages.as_array().unwrap().len(), 3);
}
