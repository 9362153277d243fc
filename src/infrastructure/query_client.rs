use crate::config::CacheConfig;
use crate::infrastructure::invalidation::{InvalidationBus, InvalidationEvent, InvalidationReason};
use crate::infrastructure::mutation::{Mutation, MutationAction};
use crate::infrastructure::query_cache::QueryCache;
use crate::infrastructure::query_key::QueryKey;
use std::sync::Arc;
use tracing::info;

/// A query cache wired to its invalidation bus.
#[derive(Clone)]
pub struct QueryClient {
    cache: QueryCache,
    bus: InvalidationBus,
}

impl QueryClient {
    /// Must be called inside a tokio runtime: spawns the bus listener and
    /// the garbage collector.
    pub fn new(config: CacheConfig) -> Self {
        let cache = QueryCache::new(config);
        let bus = InvalidationBus::default();
        cache.listen(&bus);
        cache.spawn_gc();
        info!(
            "Query client ready (max {} entries, gc after {:?})",
            cache.config().max_entries,
            cache.config().gc_time()
        );
        Self { cache, bus }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn mutation(&self, label: impl Into<String>, action: Arc<dyn MutationAction>) -> Mutation {
        Mutation::new(self.cache.clone(), self.bus.clone(), label, action)
    }

    /// Publish an invalidation through the bus, as a mutation would.
    pub fn invalidate(&self, keys: Vec<QueryKey>, reason: InvalidationReason) -> usize {
        self.bus.publish(InvalidationEvent::new(keys, reason))
    }
}
