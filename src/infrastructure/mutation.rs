// Mutations: one-shot writes that publish invalidations on success.

use crate::error::{AppError, AppResult};
use crate::infrastructure::invalidation::{InvalidationBus, InvalidationEvent, InvalidationReason};
use crate::infrastructure::query_cache::{QueryCache, QueryData};
use crate::infrastructure::query_key::QueryKey;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument, warn};

#[async_trait]
pub trait MutationAction: Send + Sync {
    async fn execute(&self, variables: Value) -> AppResult<Value>;
}

struct FnAction<F>(F);

#[async_trait]
impl<F> MutationAction for FnAction<F>
where
    F: Fn(Value) -> BoxFuture<'static, AppResult<Value>> + Send + Sync,
{
    async fn execute(&self, variables: Value) -> AppResult<Value> {
        (self.0)(variables).await
    }
}

pub fn action_fn<F>(action: F) -> Arc<dyn MutationAction>
where
    F: Fn(Value) -> BoxFuture<'static, AppResult<Value>> + Send + Sync + 'static,
{
    Arc::new(FnAction(action))
}

/// Computes the optimistic value of a key from its cached data and the
/// mutation variables.
pub type OptimisticFn = Arc<dyn Fn(Option<&Value>, &Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct OptimisticUpdate {
    pub key: QueryKey,
    pub apply: OptimisticFn,
}

impl fmt::Debug for OptimisticUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticUpdate").field("key", &self.key).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error(AppError),
}

pub struct Mutation {
    label: String,
    cache: QueryCache,
    bus: InvalidationBus,
    action: Arc<dyn MutationAction>,
    invalidates: Vec<QueryKey>,
    optimistic: Option<OptimisticUpdate>,
    status: watch::Sender<MutationStatus>,
    /// Calls started and not yet settled, queued ones included.
    in_flight: AtomicUsize,
    /// Held for a whole call so each optimistic snapshot is taken from
    /// confirmed or rolled-back data.
    running: Mutex<()>,
}

impl Mutation {
    pub fn new(
        cache: QueryCache,
        bus: InvalidationBus,
        label: impl Into<String>,
        action: Arc<dyn MutationAction>,
    ) -> Self {
        let (status, _) = watch::channel(MutationStatus::Idle);
        Self {
            label: label.into(),
            cache,
            bus,
            action,
            invalidates: Vec::new(),
            optimistic: None,
            status,
            in_flight: AtomicUsize::new(0),
            running: Mutex::new(()),
        }
    }

    /// Keys (prefixes) to invalidate after a successful run.
    pub fn invalidates(mut self, key: QueryKey) -> Self {
        self.invalidates.push(key);
        self
    }

    /// Apply `apply` to the cached value of `key` before the action runs and
    /// restore the snapshot if it fails.
    pub fn optimistic<F>(mut self, key: QueryKey, apply: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> Value + Send + Sync + 'static,
    {
        self.optimistic = Some(OptimisticUpdate {
            key,
            apply: Arc::new(apply),
        });
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> MutationStatus {
        self.status.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn watch_status(&self) -> watch::Receiver<MutationStatus> {
        self.status.subscribe()
    }

    pub fn reset(&self) {
        self.status.send_replace(MutationStatus::Idle);
    }

    /// Run the action once. Success publishes the invalidation list; failure
    /// rolls back the optimistic write and invalidates nothing. Overlapping
    /// calls on one mutation run in order, and the status stays `Pending`
    /// until the last of them settles.
    #[instrument(skip(self, variables), fields(mutation = %self.label))]
    pub async fn mutate(&self, variables: Value) -> AppResult<Value> {
        let call = InFlight::enter(&self.in_flight);
        self.status.send_replace(MutationStatus::Pending);

        let result = {
            let _running = self.running.lock().await;
            self.run(variables).await
        };

        let settled = match &result {
            Ok(_) => MutationStatus::Success,
            Err(err) => MutationStatus::Error(err.clone()),
        };
        if call.leave() {
            self.status.send_replace(settled);
        }
        result
    }

    async fn run(&self, variables: Value) -> AppResult<Value> {
        let snapshot: Option<(QueryKey, Option<QueryData>)> = self.optimistic.as_ref().map(|update| {
            let previous = self.cache.get_query_data(&update.key);
            let next = (update.apply)(previous.as_deref(), &variables);
            self.cache.set_query_data(&update.key, next);
            (update.key.clone(), previous)
        });

        match self.action.execute(variables).await {
            Ok(result) => {
                let mut keys = self.invalidates.clone();
                if let Some((key, _)) = snapshot {
                    if !keys.iter().any(|prefix| key.starts_with(prefix)) {
                        keys.push(key);
                    }
                }
                if !keys.is_empty() {
                    self.bus
                        .publish(InvalidationEvent::new(keys, InvalidationReason::MutationSuccess));
                }
                debug!("Mutation {} succeeded", self.label);
                Ok(result)
            }
            Err(err) => {
                if let Some((key, previous)) = snapshot {
                    debug!("Rolling back optimistic update of {}", key);
                    self.cache.restore_query_data(&key, previous);
                }
                warn!("Mutation {} failed: {}", self.label, err);
                Err(err)
            }
        }
    }

    pub async fn mutate_with<T: Serialize + ?Sized>(&self, variables: &T) -> AppResult<Value> {
        let variables = serde_json::to_value(variables)?;
        self.mutate(variables).await
    }
}

/// Counts one call as in flight until it settles or is dropped.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
    left: bool,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter, left: false }
    }

    /// True when this was the last call in flight.
    fn leave(mut self) -> bool {
        self.left = true;
        self.counter.fetch_sub(1, Ordering::SeqCst) == 1
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.left {
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("label", &self.label)
            .field("invalidates", &self.invalidates)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::query_client::QueryClient;
    use crate::query_key;
    use futures::FutureExt;
    use serde_json::json;
    use tokio::sync::Semaphore;

    fn counting_action(calls: Arc<AtomicUsize>, fail: bool) -> Arc<dyn MutationAction> {
        action_fn(move |variables| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(AppError::Remote {
                        status: 500,
                        message: "write failed".into(),
                    })
                } else {
                    Ok(variables)
                }
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_success_publishes_invalidation() {
        let client = QueryClient::new(Default::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = client.bus().subscribe();

        let mutation = client
            .mutation("create team", counting_action(calls.clone(), false))
            .invalidates(query_key!["teams"]);
        let result = mutation.mutate(json!({ "name": "Lightning Bolts" })).await.unwrap();

        assert_eq!(result["name"], "Lightning Bolts");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(mutation.status(), MutationStatus::Success);
        let event = events.recv().await.unwrap();
        assert_eq!(event.keys, vec![query_key!["teams"]]);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_and_invalidates_nothing() {
        let client = QueryClient::new(Default::default());
        let key = query_key!["notifications"];
        client.cache().set_query_data(&key, json!([{ "id": 1, "read": false }]));
        let mut events = client.bus().subscribe();

        let mutation = client
            .mutation("mark read", counting_action(Arc::new(AtomicUsize::new(0)), true))
            .invalidates(key.clone())
            .optimistic(key.clone(), |_, _| json!([{ "id": 1, "read": true }]));

        let err = mutation.mutate(json!({ "id": 1 })).await.unwrap_err();
        assert!(matches!(err, AppError::Remote { status: 500, .. }));
        assert!(matches!(mutation.status(), MutationStatus::Error(_)));
        assert_eq!(
            client.cache().get_query_data(&key).as_deref(),
            Some(&json!([{ "id": 1, "read": false }]))
        );
        assert!(events.try_recv().is_err());
    }

    fn mark_read(cached: Option<&Value>, variables: &Value) -> Value {
        let mut records = cached.cloned().unwrap_or_else(|| json!([]));
        if let Some(items) = records.as_array_mut() {
            for item in items.iter_mut().filter(|item| item["id"] == variables["id"]) {
                item["read"] = Value::Bool(true);
            }
        }
        records
    }

    #[tokio::test]
    async fn test_overlapping_failures_restore_original_data() {
        let client = QueryClient::new(Default::default());
        let key = query_key!["notifications"];
        let original = json!([{ "id": 1, "read": false }, { "id": 2, "read": false }]);
        client.cache().set_query_data(&key, original.clone());

        let gate = Arc::new(Semaphore::new(0));
        let action = {
            let gate = gate.clone();
            action_fn(move |_| {
                let gate = gate.clone();
                async move {
                    let _permit = gate.acquire().await.map_err(|e| AppError::Internal(e.to_string()))?;
                    Err(AppError::Remote {
                        status: 503,
                        message: "unavailable".into(),
                    })
                }
                .boxed()
            })
        };
        let mutation = client
            .mutation("mark read", action)
            .optimistic(key.clone(), mark_read);

        let (first, second, ()) = tokio::join!(
            mutation.mutate(json!({ "id": 1 })),
            mutation.mutate(json!({ "id": 2 })),
            async {
                tokio::task::yield_now().await;
                assert!(mutation.is_pending());
                assert_eq!(
                    client.cache().get_query_data(&key).as_deref(),
                    Some(&json!([{ "id": 1, "read": true }, { "id": 2, "read": false }]))
                );
                gate.add_permits(1);
            }
        );

        assert!(first.is_err());
        assert!(second.is_err());
        assert!(!mutation.is_pending());
        assert!(matches!(mutation.status(), MutationStatus::Error(_)));
        assert_eq!(client.cache().get_query_data(&key).as_deref(), Some(&original));
    }

    #[tokio::test]
    async fn test_pending_until_last_overlapping_call_settles() {
        let client = QueryClient::new(Default::default());
        let gate = Arc::new(Semaphore::new(0));
        let done = Arc::new(AtomicUsize::new(0));
        let action = {
            let gate = gate.clone();
            let done = done.clone();
            action_fn(move |variables| {
                let gate = gate.clone();
                let done = done.clone();
                async move {
                    gate.acquire().await.map_err(|e| AppError::Internal(e.to_string()))?.forget();
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(variables)
                }
                .boxed()
            })
        };
        let mutation = client.mutation("create event", action);

        let (first, second, ()) = tokio::join!(
            mutation.mutate(json!({ "title": "Practice" })),
            mutation.mutate(json!({ "title": "Scrimmage" })),
            async {
                gate.add_permits(1);
                while done.load(Ordering::SeqCst) == 0 {
                    tokio::task::yield_now().await;
                }
                assert!(mutation.is_pending());
                assert_eq!(mutation.status(), MutationStatus::Pending);
                gate.add_permits(1);
            }
        );

        assert_eq!(first.unwrap()["title"], "Practice");
        assert_eq!(second.unwrap()["title"], "Scrimmage");
        assert!(!mutation.is_pending());
        assert_eq!(mutation.status(), MutationStatus::Success);
    }
}
