//! Support for library configuration options

use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Where the task service listens when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

/// Environment variable that overrides the base URL of the task service (see [`Config::from_env`])
pub const BASE_URL_ENV_VAR: &str = "ORGANIZO_API_URL";
/// Environment variable that sets how many times a request is attempted when the service is unreachable
pub const RETRIES_ENV_VAR: &str = "ORGANIZO_MAX_ATTEMPTS";

/// How long to wait before the first retry, when retries are enabled from the environment
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Settings needed to talk to the task service
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The base URL the four endpoints are resolved against
    pub base_url: Url,
    /// What to do when the service cannot be reached. Defaults to a single attempt
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a config from the environment, falling back to [`DEFAULT_BASE_URL`] and to no retries.
    ///
    /// The library never calls this on its own, it is meant for binaries.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let base_url = std::env::var(BASE_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let config = Self::new(base_url)?;

        let attempts = std::env::var(RETRIES_ENV_VAR).ok()
            .and_then(|value| match value.parse::<u32>() {
                Ok(n) => Some(n),
                Err(err) => {
                    log::warn!("Ignoring invalid {} value {:?}: {}", RETRIES_ENV_VAR, value, err);
                    None
                },
            });

        Ok(match attempts {
            Some(n) if n > 1 => config.with_retry(RetryPolicy::new(n, DEFAULT_INITIAL_BACKOFF)),
            _ => config,
        })
    }
}
