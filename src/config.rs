//! Environment configuration for the console.
//!
//! Values come from the process environment (after `dotenvy` has loaded any
//! `.env` file) and fall back to local development defaults.

use std::time::Duration;

use crate::error::{ConsoleError, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the external order service, without trailing slash.
    pub api_base_url: String,
    /// Address the console listens on.
    pub bind_addr: String,
    /// Upstream request timeout. `None` keeps the HTTP client default.
    pub request_timeout: Option<Duration>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            request_timeout: None,
        }
    }
}

impl ConsoleConfig {
    /// Read `ORDER_API_BASE_URL`, `CONSOLE_BIND_ADDR` and
    /// `ORDER_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("ORDER_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            return Err(ConsoleError::Config("ORDER_API_BASE_URL is empty".into()));
        }

        let bind_addr =
            lookup("CONSOLE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let request_timeout = match lookup("ORDER_API_TIMEOUT_SECS") {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConsoleError::Config(format!(
                        "ORDER_API_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
        };

        Ok(Self {
            api_base_url,
            bind_addr,
            request_timeout,
        })
    }
}
