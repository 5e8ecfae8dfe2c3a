//! Client configuration.
//!
//! # Design
//! `ClientConfig` is built once and never mutated afterwards; `Transport`
//! keeps it behind an `Arc` so resource facades share it read-only. The
//! tenant key can travel under one of two header schemes, and exactly one
//! is active per config (see `AuthScheme`).

use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header used by the `BrandKey` scheme.
pub const BRAND_KEY_HEADER: &str = "X-Brand-Key";

/// How the tenant key is attached to outgoing requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-Brand-Key: <key>`
    #[default]
    BrandKey,
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl AuthScheme {
    pub fn header_name(self) -> &'static str {
        match self {
            AuthScheme::BrandKey => BRAND_KEY_HEADER,
            AuthScheme::Bearer => "Authorization",
        }
    }

    pub fn header_value(self, key: &str) -> String {
        match self {
            AuthScheme::BrandKey => key.to_string(),
            AuthScheme::Bearer => format!("Bearer {key}"),
        }
    }
}

impl std::str::FromStr for AuthScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand-key" | "brand_key" | "x-brand-key" => Ok(AuthScheme::BrandKey),
            "bearer" => Ok(AuthScheme::Bearer),
            other => Err(ConfigError::Invalid {
                name: "TRANSLATOR_AUTH_SCHEME",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub tenant_key: Option<String>,
    pub auth_scheme: AuthScheme,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            tenant_key: None,
            auth_scheme: AuthScheme::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: None,
        }
    }

    pub fn with_tenant_key(mut self, key: impl Into<String>) -> Self {
        self.tenant_key = Some(key.into());
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    /// Overall per-call limit. `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect limit. `Duration::ZERO` disables it.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Base URL without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Overall limit for the executor; `None` when the timeout is zero.
    pub fn timeout_limit(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Connect limit for the executor; `None` when the timeout is zero.
    pub fn connect_timeout_limit(&self) -> Option<Duration> {
        (!self.connect_timeout.is_zero()).then_some(self.connect_timeout)
    }

    /// The tenant key, treating an empty string as unset.
    pub fn active_tenant_key(&self) -> Option<&str> {
        self.tenant_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Load settings from `TRANSLATOR_*` environment variables.
    ///
    /// Timeouts read this way must be positive; disabling one is only
    /// possible through the builder.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("TRANSLATOR_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("TRANSLATOR_BASE_URL"))?;

        let mut config = Self::new(base_url.trim());
        config.tenant_key = lookup("TRANSLATOR_TENANT_KEY").filter(|v| !v.is_empty());
        config.user_agent = lookup("TRANSLATOR_USER_AGENT").filter(|v| !v.is_empty());

        if let Some(raw) = lookup("TRANSLATOR_AUTH_SCHEME") {
            config.auth_scheme = raw.parse()?;
        }
        if let Some(raw) = lookup("TRANSLATOR_TIMEOUT_SECS") {
            config.timeout = parse_seconds("TRANSLATOR_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("TRANSLATOR_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_seconds("TRANSLATOR_CONNECT_TIMEOUT_SECS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name,
        value: raw.to_string(),
    };
    let secs: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs_f64(secs))
}
