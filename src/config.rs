//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ConfigError;
use crate::wizard::model::Plan;

/// Price of each plan, charged through the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPricing {
    pub basic: Decimal,
    pub standard: Decimal,
    pub premium: Decimal,
    pub currency: String,
}

impl Default for PlanPricing {
    fn default() -> Self {
        Self {
            basic: dec!(19.99),
            standard: dec!(39.99),
            premium: dec!(79.99),
            currency: "USD".to_string(),
        }
    }
}

impl PlanPricing {
    pub fn price(&self, plan: Plan) -> Decimal {
        match plan {
            Plan::Basic => self.basic,
            Plan::Standard => self.standard,
            Plan::Premium => self.premium,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP API listens on.
    pub port: u16,
    /// Base URL of the website backend (submissions, website listings).
    pub backend_url: String,
    /// Base URL of the payment order service.
    pub payment_url: String,
    /// Base URL of the identity provider.
    pub auth_url: String,
    /// Timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,
    /// Wizard sessions untouched for this long are discarded.
    pub session_idle_timeout: Duration,
    /// How often idle sessions are swept.
    pub prune_interval: Duration,
    pub pricing: PlanPricing,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backend_url: "http://localhost:8080".to_string(),
            payment_url: "http://localhost:8080".to_string(),
            auth_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(15),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(60),
            pricing: PlanPricing::default(),
        }
    }
}

impl AppConfig {
    /// Build config from `SITECRAFT_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or("SITECRAFT_PORT", &lookup, defaults.port)?;
        let backend_url = lookup("SITECRAFT_BACKEND_URL").unwrap_or(defaults.backend_url);
        let payment_url = lookup("SITECRAFT_PAYMENT_URL").unwrap_or(defaults.payment_url);
        let auth_url = lookup("SITECRAFT_AUTH_URL").unwrap_or(defaults.auth_url);

        let request_timeout = Duration::from_secs(parse_or(
            "SITECRAFT_REQUEST_TIMEOUT_SECS",
            &lookup,
            defaults.request_timeout.as_secs(),
        )?);
        let session_idle_timeout = Duration::from_secs(
            parse_or(
                "SITECRAFT_SESSION_IDLE_MINS",
                &lookup,
                defaults.session_idle_timeout.as_secs() / 60,
            )? * 60,
        );
        let prune_interval = Duration::from_secs(parse_or(
            "SITECRAFT_PRUNE_INTERVAL_SECS",
            &lookup,
            defaults.prune_interval.as_secs(),
        )?);

        let pricing = PlanPricing {
            basic: parse_or("SITECRAFT_PRICE_BASIC", &lookup, defaults.pricing.basic)?,
            standard: parse_or("SITECRAFT_PRICE_STANDARD", &lookup, defaults.pricing.standard)?,
            premium: parse_or("SITECRAFT_PRICE_PREMIUM", &lookup, defaults.pricing.premium)?,
            currency: lookup("SITECRAFT_CURRENCY").unwrap_or(defaults.pricing.currency),
        };

        for (key, value) in [
            ("SITECRAFT_REQUEST_TIMEOUT_SECS", request_timeout),
            ("SITECRAFT_PRUNE_INTERVAL_SECS", prune_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(Self {
            port,
            backend_url: trim_trailing_slash(backend_url),
            payment_url: trim_trailing_slash(payment_url),
            auth_url: trim_trailing_slash(auth_url),
            request_timeout,
            session_idle_timeout,
            prune_interval,
            pricing,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn trim_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
