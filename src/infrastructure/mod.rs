// Client infrastructure: query cache, mutations, invalidation and sessions
pub mod clock;                 // Injectable wall clock
pub mod query_key;             // Composite cache keys
pub mod retry;                 // Fetch retry policy
pub mod traits;                // Fetcher and backend traits
pub mod invalidation;          // Invalidation bus (broadcast)
pub mod query_cache;           // Keyed, deduplicated query cache
pub mod query_client;          // Cache + bus wiring
pub mod mutation;              // Mutation executor
pub mod session;               // Session providers

pub use clock::Clock;
pub use query_key::{KeySegment, PathPart, QueryKey};
pub use retry::{Backoff, RetryPolicy};
pub use traits::{fetcher_fn, Backend, QueryFetcher};
pub use invalidation::{InvalidationBus, InvalidationEvent, InvalidationReason};
pub use query_cache::{CacheStats, QueryCache, QueryData, QueryObserver, QueryOptions, QueryState, QueryStatus};
pub use query_client::QueryClient;
pub use mutation::{action_fn, Mutation, MutationAction, MutationStatus};
pub use session::{
    Auth, AuthState, DevSessionProvider, InMemorySessionStore, RemoteSessionProvider, SessionProvider,
    SessionStore, DEV_CREDENTIALS,
};
