use std::time::Duration;

/// Runtime configuration for the trace feed, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote trace API, e.g. `http://gb7bpq.local:8008/api`.
    pub api_base_url: String,
    /// Records requested per page.
    pub page_size: u32,
    /// Maximum total records a session may download before stopping early.
    pub max_download: u64,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let page_size: u32 = env_parse("TRACEFEED_PAGE_SIZE", 500)?;
        if page_size == 0 {
            return Err(anyhow::anyhow!("TRACEFEED_PAGE_SIZE must be at least 1"));
        }

        Ok(Self {
            api_base_url: env_str("TRACEFEED_API_BASE_URL", "http://localhost:8008/api"),
            page_size,
            max_download: env_parse("TRACEFEED_MAX_DOWNLOAD", 5000)?,
            request_timeout: Duration::from_secs(env_parse(
                "TRACEFEED_REQUEST_TIMEOUT_SECS",
                30,
            )?),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Comma-separated list env var; missing or empty means an empty list.
pub fn env_csv(key: &str) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}
