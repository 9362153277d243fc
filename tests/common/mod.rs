#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use teamhub::{
    config::Config,
    infrastructure::{Backend, Clock, QueryClient},
    views::{Toaster, ViewContext},
};

/// Views see 2025-01-25 11:00 UTC as "now".
pub fn test_clock() -> Clock {
    let now = NaiveDate::from_ymd_opt(2025, 1, 25)
        .and_then(|date| date.and_hms_opt(11, 0, 0))
        .unwrap();
    Clock::fixed(Utc.from_utc_datetime(&now))
}

pub fn context<B: Backend + 'static>(backend: Arc<B>) -> ViewContext {
    let config = Config::default();
    let client = QueryClient::new(config.cache.clone());
    ViewContext::new(client, backend, Toaster::new(), test_clock(), config)
}

/// Fails the test instead of hanging when a view never reaches the state.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out waiting for view state")
}
