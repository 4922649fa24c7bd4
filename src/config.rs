use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_API_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_PORT: u16 = 3147;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_origin: String,
    pub api_prefix: String,
    pub listen: SocketAddr,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let api_origin = get("CINEBOOK_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_origin);
        url::Url::parse(&api_origin)
            .with_context(|| format!("CINEBOOK_API_URL is not a valid URL: {}", api_origin))?;

        let api_prefix = match get("CINEBOOK_API_PREFIX") {
            Some(p) => normalize_prefix(&p),
            None => defaults.api_prefix,
        };

        let port = match get("CINEBOOK_PORT") {
            Some(p) => p
                .parse::<u16>()
                .with_context(|| format!("CINEBOOK_PORT must be a port number, got '{}'", p))?,
            None => DEFAULT_PORT,
        };

        let request_timeout = match get("CINEBOOK_HTTP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_secs("CINEBOOK_HTTP_TIMEOUT_SECS", &v)?),
            None => defaults.request_timeout,
        };
        let connect_timeout = match get("CINEBOOK_CONNECT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_secs("CINEBOOK_CONNECT_TIMEOUT_SECS", &v)?),
            None => defaults.connect_timeout,
        };

        Ok(Self {
            api_origin,
            api_prefix,
            listen: SocketAddr::from(([0, 0, 0, 0], port)),
            request_timeout,
            connect_timeout,
        })
    }

    /// Origin plus versioned prefix, e.g. `http://localhost:8000/api/v1`.
    pub fn api_base_url(&self) -> String {
        format!("{}{}", self.api_origin, self.api_prefix)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, value))
}
