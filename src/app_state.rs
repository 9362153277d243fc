use std::sync::Arc;
use axum::Router;
use crate::{
    api::{create_api_router, MockStore},
    config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MockStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        // Seeded store; simulated latency comes from MOCK_LATENCY_MS
        let store = Arc::new(MockStore::from_config(&config.mock));
        Self { store, config }
    }

    /// Full application router with the API nested under `/api`.
    pub fn router(&self) -> Router {
        Router::new().nest("/api", create_api_router(self.store.clone()))
    }
}
