//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORT` - Listen port (default: 8083)
//! - `ORDER_SERVICE_URL` - Upstream order/payment/identity API; unset runs the in-memory backend
//! - `DATABASE_URL` - PostgreSQL URL for durable cart storage; unset uses files
//! - `CART_STORAGE_DIR` - Directory for file-backed cart storage (default: ./data/carts)
//! - `NATS_URL` - Publish domain events to NATS when set
//! - `SHIPPING_FEE` - Flat shipping fee in minor units (default: 2500)
//! - `REQUEST_TIMEOUT_SECS` - Bound on upstream calls (default: 10)
//! - `CONFIRMATION_DISPLAY_SECS` - How long the payment confirmation is shown (default: 3)
//! - `SHOPPER_IDLE_SECS` - Idle shopper sessions are dropped from memory after this long (default: 1800)
//! - `MAX_SHOPPER_SESSIONS` - Upper bound on shopper sessions held in memory (default: 10000)
//! - `DEV_ADMIN_TOKEN` - Seeds an admin user in the in-memory backend
//! - `DEV_AUTO_SETTLE_PAYMENTS` - In-memory backend treats every payment reference as paid (default: false)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::value_objects::Money;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub order_service_url: Option<String>,
    pub database_url: Option<String>,
    pub cart_storage_dir: PathBuf,
    pub nats_url: Option<String>,
    pub shipping_fee: Money,
    pub request_timeout: Duration,
    pub confirmation_display: Duration,
    pub shopper_idle: Duration,
    pub max_shopper_sessions: usize,
    pub dev_admin_token: Option<String>,
    pub dev_auto_settle_payments: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let shipping_fee: i64 = parse(&get, "SHIPPING_FEE", 2500)?;
        if shipping_fee < 0 {
            return Err(ConfigError::InvalidEnvVar("SHIPPING_FEE".into(), "must not be negative".into()));
        }
        let shopper_idle_secs: u64 = parse(&get, "SHOPPER_IDLE_SECS", 1800)?;
        let max_shopper_sessions: usize = parse(&get, "MAX_SHOPPER_SESSIONS", 10_000)?;
        if shopper_idle_secs == 0 || max_shopper_sessions == 0 {
            return Err(ConfigError::InvalidEnvVar("SHOPPER_IDLE_SECS/MAX_SHOPPER_SESSIONS".into(), "must be positive".into()));
        }
        Ok(Self {
            port: parse(&get, "PORT", 8083)?,
            order_service_url: get("ORDER_SERVICE_URL"),
            database_url: get("DATABASE_URL"),
            cart_storage_dir: get("CART_STORAGE_DIR").map_or_else(|| PathBuf::from("./data/carts"), PathBuf::from),
            nats_url: get("NATS_URL"),
            shipping_fee: Money::from_minor(shipping_fee),
            request_timeout: Duration::from_secs(parse(&get, "REQUEST_TIMEOUT_SECS", 10)?),
            confirmation_display: Duration::from_secs(parse(&get, "CONFIRMATION_DISPLAY_SECS", 3)?),
            shopper_idle: Duration::from_secs(shopper_idle_secs),
            max_shopper_sessions,
            dev_admin_token: get("DEV_ADMIN_TOKEN"),
            dev_auto_settle_payments: parse(&get, "DEV_AUTO_SETTLE_PAYMENTS", false)?,
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}
