mod common;

use common::{context, within};
use std::sync::Arc;
use teamhub::{
    api::{Command, RemoteBackend},
    app_state::AppState,
    config::{ClientConfig, Config},
    error::AppError,
    infrastructure::{Backend, QueryFetcher},
    models::NewTeam,
    query_key,
    views::TeamsView,
};
use tokio::net::TcpListener;

/// Serve the mock API on an ephemeral port and point a client at it.
async fn spawn_server() -> RemoteBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = AppState::new(Config::default()).router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    RemoteBackend::new(&ClientConfig {
        api_base_url: format!("http://{}", addr),
        request_timeout_ms: 5_000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_and_send() {
    let backend = spawn_server().await;

    let teams = backend.fetch(&query_key!["teams"]).await.unwrap();
    assert_eq!(teams.as_array().unwrap().len(), 4);

    let created = backend
        .send(Command::CreateTeam(NewTeam::new("Fire Dragons", "soccer", "U10")))
        .await
        .unwrap();
    assert_eq!(created["id"], 5);

    let missing = backend.fetch(&query_key!["teams", 99]).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let missing = backend.send(Command::MarkNotificationRead { id: 99 }).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_validation_happens_client_side() {
    let backend = spawn_server().await;
    let result = backend
        .send(Command::CreateTeam(NewTeam::new("", "soccer", "U10")))
        .await;
    assert_eq!(result, Err(AppError::Validation("name is required".to_string())));
}

#[tokio::test]
async fn test_views_over_http() {
    let backend = Arc::new(spawn_server().await);
    let ctx = context(backend);
    let mut view = TeamsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();
    assert_eq!(view.render().unwrap().len(), 4);

    view.submit(NewTeam::new("Lightning Bolts", "basketball", "U12"))
        .await
        .unwrap();
    within(view.query().wait_until(|teams| teams.len() == 5))
        .await
        .unwrap();
}
