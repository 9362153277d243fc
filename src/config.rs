use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub dev_auth: DevAuthConfig,
    pub chat: ChatConfig,
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without the `/api` suffix.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// `None` keeps entries fresh until invalidated.
    pub stale_time_ms: Option<u64>,
    pub gc_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevAuthConfig {
    pub enabled: bool,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub latency_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            client: ClientConfig {
                api_base_url: "http://127.0.0.1:5000".to_string(),
                request_timeout_ms: 30_000,
            },
            cache: CacheConfig::default(),
            dev_auth: DevAuthConfig {
                enabled: false,
                session_ttl_hours: 24,
            },
            chat: ChatConfig {
                poll_interval_ms: 3_000,
            },
            mock: MockConfig { latency_ms: 0 },
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            stale_time_ms: None,
            gc_time_ms: 5 * 60 * 1000, // 5 minutes
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Option<Duration> {
        self.stale_time_ms.map(Duration::from_millis)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.gc_time_ms)
    }
}

impl DevAuthConfig {
    /// One year.
    pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

    /// `None` when the configured hours are out of range.
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        if !(1..=Self::MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return None;
        }
        chrono::Duration::try_hours(self.session_ttl_hours)
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ChatConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl MockConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        let config = Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_or("SERVER_PORT", defaults.server.port),
            },
            client: ClientConfig {
                api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.client.api_base_url),
                request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.client.request_timeout_ms),
            },
            cache: CacheConfig {
                max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache.max_entries),
                stale_time_ms: env::var("CACHE_STALE_TIME_MS")
                    .ok()
                    .and_then(|value| value.parse().ok()),
                gc_time_ms: env_or("CACHE_GC_TIME_MS", defaults.cache.gc_time_ms),
            },
            dev_auth: DevAuthConfig {
                enabled: env_or("DEV_AUTH_ENABLED", defaults.dev_auth.enabled),
                session_ttl_hours: env_or("DEV_SESSION_TTL_HOURS", defaults.dev_auth.session_ttl_hours),
            },
            chat: ChatConfig {
                poll_interval_ms: env_or("CHAT_POLL_INTERVAL_MS", defaults.chat.poll_interval_ms),
            },
            mock: MockConfig {
                latency_ms: env_or("MOCK_LATENCY_MS", defaults.mock.latency_ms),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache.max_entries == 0 {
            anyhow::bail!("CACHE_MAX_ENTRIES must be greater than zero");
        }
        if self.chat.poll_interval_ms == 0 {
            anyhow::bail!("CHAT_POLL_INTERVAL_MS must be greater than zero");
        }
        if self.dev_auth.session_ttl().is_none() {
            anyhow::bail!(
                "DEV_SESSION_TTL_HOURS must be between 1 and {}",
                DevAuthConfig::MAX_SESSION_TTL_HOURS
            );
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
