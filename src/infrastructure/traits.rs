use crate::api::Command;
use crate::error::AppResult;
use crate::infrastructure::query_key::QueryKey;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Resolves a query key to its JSON payload.
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    async fn fetch(&self, key: &QueryKey) -> AppResult<Value>;
}

/// A data source that also accepts writes.
#[async_trait]
pub trait Backend: QueryFetcher {
    async fn send(&self, command: Command) -> AppResult<Value>;
}

struct FnFetcher<F>(F);

#[async_trait]
impl<F> QueryFetcher for FnFetcher<F>
where
    F: Fn(QueryKey) -> BoxFuture<'static, AppResult<Value>> + Send + Sync,
{
    async fn fetch(&self, key: &QueryKey) -> AppResult<Value> {
        (self.0)(key.clone()).await
    }
}

/// Wrap a closure as a fetcher.
pub fn fetcher_fn<F>(fetch: F) -> Arc<dyn QueryFetcher>
where
    F: Fn(QueryKey) -> BoxFuture<'static, AppResult<Value>> + Send + Sync + 'static,
{
    Arc::new(FnFetcher(fetch))
}
