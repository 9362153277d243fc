// Session resolution: an opt-in development bypass in front of the remote
// `auth/user` query.

use crate::config::DevAuthConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::invalidation::{InvalidationBus, InvalidationEvent, InvalidationReason};
use crate::infrastructure::query_cache::{QueryCache, QueryOptions};
use crate::infrastructure::query_key::QueryKey;
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::traits::QueryFetcher;
use crate::models::{SessionUser, UserRole};
use crate::query_key;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Small string key-value store, the shape of browser local storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` means nobody is signed in.
    async fn current_user(&self) -> AppResult<Option<SessionUser>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevCredential {
    pub email: &'static str,
    pub password: &'static str,
    pub role: &'static str,
    pub label: &'static str,
}

pub const DEV_CREDENTIALS: [DevCredential; 3] = [
    DevCredential {
        email: "admin@teampro.ai",
        password: "admin123",
        role: "super_admin",
        label: "Super Admin",
    },
    DevCredential {
        email: "coach@teampro.ai",
        password: "coach123",
        role: "team_admin",
        label: "Team Admin",
    },
    DevCredential {
        email: "parent@teampro.ai",
        password: "parent123",
        role: "parent",
        label: "Parent",
    },
];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevSessionRecord {
    email: String,
    role: UserRole,
    first_name: String,
    last_name: String,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
}

/// Development sign-in stored under `dev_auth`. Only constructed when
/// enabled in configuration.
pub struct DevSessionProvider {
    store: Arc<dyn SessionStore>,
    clock: Clock,
    ttl: chrono::Duration,
    bus: Option<InvalidationBus>,
}

impl DevSessionProvider {
    pub const STORAGE_KEY: &'static str = "dev_auth";
    pub const USER_ID: &'static str = "dev_user";

    /// `Ok(None)` when development sign-in is disabled.
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Clock,
        config: &DevAuthConfig,
    ) -> AppResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let ttl = config.session_ttl().ok_or_else(|| {
            AppError::ConfigurationError(format!(
                "development session TTL of {} hours is out of range",
                config.session_ttl_hours
            ))
        })?;
        Ok(Some(Self {
            store,
            clock,
            ttl,
            bus: None,
        }))
    }

    /// Announce sign-in and sign-out on `bus` so cached `auth/user` data is
    /// refetched.
    pub fn with_invalidation(mut self, bus: InvalidationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    fn session_changed(&self) {
        if let Some(bus) = &self.bus {
            bus.publish(InvalidationEvent::new(
                vec![RemoteSessionProvider::key()],
                InvalidationReason::SessionChanged,
            ));
        }
    }

    /// Any non-blank email/password pair signs in. Listed dev credentials
    /// carry their own role; anything else signs in as super admin.
    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("Please enter both email and password.".to_string()));
        }

        let role = DEV_CREDENTIALS
            .iter()
            .find(|credential| credential.email == email && credential.password == password)
            .map(|credential| UserRole::from(credential.role))
            .unwrap_or(UserRole::SuperAdmin);

        let record = DevSessionRecord {
            email: email.to_string(),
            role,
            first_name: "Development".to_string(),
            last_name: "User".to_string(),
            timestamp: self.clock.now().timestamp_millis(),
        };
        self.store.set(Self::STORAGE_KEY, serde_json::to_string(&record)?);
        info!("Development session started for {} as {}", record.email, record.role);
        self.session_changed();
        Ok(Self::user_from(record))
    }

    pub fn sign_out(&self) {
        self.store.remove(Self::STORAGE_KEY);
        self.session_changed();
    }

    /// The stored session, if present and younger than the TTL. Expired or
    /// unreadable records are deleted.
    pub fn session(&self) -> Option<SessionUser> {
        let raw = self.store.get(Self::STORAGE_KEY)?;
        let record: DevSessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!("Discarding unreadable development session: {}", err);
                self.store.remove(Self::STORAGE_KEY);
                return None;
            }
        };

        let age = self.clock.now().timestamp_millis() - record.timestamp;
        if age >= self.ttl.num_milliseconds() {
            debug!("Development session for {} expired", record.email);
            self.store.remove(Self::STORAGE_KEY);
            return None;
        }
        Some(Self::user_from(record))
    }

    fn user_from(record: DevSessionRecord) -> SessionUser {
        SessionUser {
            id: Self::USER_ID.to_string(),
            email: record.email,
            role: record.role,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}

#[async_trait]
impl SessionProvider for DevSessionProvider {
    async fn current_user(&self) -> AppResult<Option<SessionUser>> {
        Ok(self.session())
    }

    fn name(&self) -> &'static str {
        "development"
    }
}

/// Resolves the signed-in user through the `auth/user` query. Never retries;
/// an unauthorized answer means signed out.
pub struct RemoteSessionProvider {
    cache: QueryCache,
    fetcher: Arc<dyn QueryFetcher>,
}

impl RemoteSessionProvider {
    pub fn new(cache: QueryCache, fetcher: Arc<dyn QueryFetcher>) -> Self {
        Self { cache, fetcher }
    }

    pub fn key() -> QueryKey {
        query_key!["auth", "user"]
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn current_user(&self) -> AppResult<Option<SessionUser>> {
        let options = QueryOptions::default().with_retry(RetryPolicy::none());
        let state = self
            .cache
            .fetch_query(Self::key(), self.fetcher.clone(), options)
            .await;

        if state.is_error() {
            return match state.error {
                Some(AppError::Unauthorized(_)) => Ok(None),
                Some(err) => Err(err),
                None => Ok(None),
            };
        }
        state.decode()
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<SessionUser>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
            is_authenticated: false,
        }
    }

    fn resolved(user: Option<SessionUser>) -> Self {
        Self {
            is_authenticated: user.is_some(),
            user,
            is_loading: false,
        }
    }
}

/// Combines the providers: a development session wins and the remote
/// lookup is skipped while one exists.
pub struct Auth {
    dev: Option<DevSessionProvider>,
    remote: Option<Arc<dyn SessionProvider>>,
    state: watch::Sender<AuthState>,
}

impl Auth {
    pub fn new(dev: Option<DevSessionProvider>, remote: Option<Arc<dyn SessionProvider>>) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        Self { dev, remote, state }
    }

    pub fn dev(&self) -> Option<&DevSessionProvider> {
        self.dev.as_ref()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub async fn resolve(&self) -> AuthState {
        let user = match self.dev.as_ref().and_then(DevSessionProvider::session) {
            Some(user) => Some(user),
            None => match &self.remote {
                Some(remote) => match remote.current_user().await {
                    Ok(user) => user,
                    Err(err) => {
                        warn!("Session lookup through {} failed: {}", remote.name(), err);
                        None
                    }
                },
                None => None,
            },
        };

        let resolved = AuthState::resolved(user);
        self.state.send_replace(resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::fetcher_fn;
    use chrono::{TimeZone, Utc};
    use futures::FutureExt;
    use serde_json::json;

    fn dev_config() -> DevAuthConfig {
        DevAuthConfig {
            enabled: true,
            session_ttl_hours: 24,
        }
    }

    fn provider_at(store: Arc<InMemorySessionStore>, hour: u32) -> DevSessionProvider {
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap() + chrono::Duration::hours(hour.into());
        DevSessionProvider::new(store, Clock::fixed(at), &dev_config()).unwrap().unwrap()
    }

    #[test]
    fn test_disabled_dev_auth_is_absent() {
        let config = DevAuthConfig {
            enabled: false,
            session_ttl_hours: 24,
        };
        let provider = DevSessionProvider::new(Arc::new(InMemorySessionStore::new()), Clock::system(), &config);
        assert!(provider.unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_ttl_is_a_configuration_error() {
        for hours in [0, -1, i64::MAX] {
            let config = DevAuthConfig {
                enabled: true,
                session_ttl_hours: hours,
            };
            let result = DevSessionProvider::new(Arc::new(InMemorySessionStore::new()), Clock::system(), &config);
            assert!(matches!(result, Err(AppError::ConfigurationError(_))));
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_out_announce_session_change() {
        let bus = InvalidationBus::default();
        let mut events = bus.subscribe();
        let provider = provider_at(Arc::new(InMemorySessionStore::new()), 0).with_invalidation(bus);

        provider.sign_in("parent@teampro.ai", "parent123").unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.reason, InvalidationReason::SessionChanged);
        assert_eq!(event.keys, vec![RemoteSessionProvider::key()]);

        provider.sign_out();
        assert_eq!(events.recv().await.unwrap().reason, InvalidationReason::SessionChanged);
        assert!(provider.session().is_none());
    }

    #[test]
    fn test_dev_session_expires_after_ttl() {
        let store = Arc::new(InMemorySessionStore::new());
        let user = provider_at(store.clone(), 0)
            .sign_in("coach@teampro.ai", "coach123")
            .unwrap();
        assert_eq!(user.role, UserRole::TeamAdmin);
        assert_eq!(user.id, "dev_user");

        assert!(provider_at(store.clone(), 23).session().is_some());
        assert!(provider_at(store.clone(), 24).session().is_none());
        assert!(store.get(DevSessionProvider::STORAGE_KEY).is_none());
    }

    #[test]
    fn test_corrupt_dev_session_is_removed() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set(DevSessionProvider::STORAGE_KEY, "{not json".to_string());
        assert!(provider_at(store.clone(), 0).session().is_none());
        assert!(store.get(DevSessionProvider::STORAGE_KEY).is_none());
    }

    #[test]
    fn test_sign_in_requires_both_fields() {
        let provider = provider_at(Arc::new(InMemorySessionStore::new()), 0);
        assert!(matches!(provider.sign_in("", "x"), Err(AppError::Validation(_))));
        let user = provider.sign_in("someone@example.com", "pw").unwrap();
        assert_eq!(user.role, UserRole::SuperAdmin);
    }

    #[tokio::test]
    async fn test_remote_unauthorized_means_signed_out() {
        let fetcher = fetcher_fn(|_| async { Err(AppError::Unauthorized("no session".into())) }.boxed());
        let remote: Arc<dyn SessionProvider> = Arc::new(RemoteSessionProvider::new(QueryCache::default(), fetcher));
        let auth = Auth::new(None, Some(remote));

        assert!(auth.state().is_loading);
        let state = auth.resolve().await;
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_dev_session_skips_remote_lookup() {
        let fetcher = fetcher_fn(|_| async { Err(AppError::Internal("remote lookup should be skipped".into())) }.boxed());
        let remote: Arc<dyn SessionProvider> = Arc::new(RemoteSessionProvider::new(QueryCache::default(), fetcher));
        let store = Arc::new(InMemorySessionStore::new());
        let dev = DevSessionProvider::new(store, Clock::system(), &dev_config()).unwrap().unwrap();
        dev.sign_in("admin@teampro.ai", "admin123").unwrap();

        let auth = Auth::new(Some(dev), Some(remote));
        let state = auth.resolve().await;
        assert!(state.is_authenticated);
        assert_eq!(state.user.unwrap().email, "admin@teampro.ai");
    }

    #[tokio::test]
    async fn test_remote_user_is_decoded() {
        let fetcher = fetcher_fn(|_| {
            async {
                Ok(json!({
                    "id": "42",
                    "email": "coach@example.com",
                    "role": "team_admin",
                    "firstName": "Sam",
                    "lastName": "Lee"
                }))
            }
            .boxed()
        });
        let provider = RemoteSessionProvider::new(QueryCache::default(), fetcher);
        let user = provider.current_user().await.unwrap().unwrap();
        assert_eq!(user.display_name(), "Sam Lee");
    }
}
