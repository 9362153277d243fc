// Team Hub mock API server

use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use teamhub::{app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teamhub=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config.clone());

    let app = app_state
        .router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    info!("Team Hub API starting on http://{}", addr);
    info!("  GET   /api/teams | /api/teams/{{id}} | /api/teams/{{id}}/members | /api/teams/{{id}}/messages");
    info!("  GET   /api/players | /api/events | /api/facilities | /api/notifications[/unread]");
    info!("  GET   /api/dashboard/stats | /api/dashboard/upcoming-events | /api/auth/user");
    info!("  POST  /api/teams | /api/players | /api/events | /api/facilities | /api/notifications | /api/teams/{{id}}/messages");
    info!("  PATCH /api/notifications/{{id}}/read");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
