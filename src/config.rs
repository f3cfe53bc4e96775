use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{PosError, Result};
use crate::pricing::{
    CALLBACK_APPROVAL_TIMEOUT, DEFAULT_TAX_RATE, KITCHEN_POLL_INTERVAL, MOBILE_MONEY_APPROVAL_WAIT,
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// How cart lines reach the server before the order is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartSyncMode {
    /// One `POST /cart/add/` per line, awaited in order.
    #[default]
    Sequential,
    /// Lines embedded as `order_items` in the create-order request. Needs a
    /// server whose order serializer accepts writable `order_items`.
    Batched,
}

impl FromStr for CartSyncMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(CartSyncMode::Sequential),
            "batched" | "batch" => Ok(CartSyncMode::Batched),
            other => Err(format!("unknown cart sync mode '{}'", other)),
        }
    }
}

/// Where mobile-money approval comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalMode {
    /// Fixed wait with no provider feedback.
    #[default]
    Timer,
    /// Provider callback delivered to the terminal (see `checkout::CallbackApproval`).
    Callback,
}

impl FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timer" => Ok(ApprovalMode::Timer),
            "callback" => Ok(ApprovalMode::Callback),
            other => Err(format!("unknown approval mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub tax_rate: f64,
    pub cart_sync: CartSyncMode,
    pub approval: ApprovalMode,
    pub approval_wait: Duration,
    pub approval_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            tax_rate: DEFAULT_TAX_RATE,
            cart_sync: CartSyncMode::default(),
            approval: ApprovalMode::default(),
            approval_wait: MOBILE_MONEY_APPROVAL_WAIT,
            approval_timeout: CALLBACK_APPROVAL_TIMEOUT,
            request_timeout: Duration::from_secs(15),
            poll_interval: KITCHEN_POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Load from `CHEFCHAIN_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_base_url = lookup("CHEFCHAIN_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| {
                info!("CHEFCHAIN_API_URL not set, using default: {}", DEFAULT_API_URL);
                defaults.api_base_url.clone()
            });

        let tax_rate: f64 = try_load(&lookup, "CHEFCHAIN_TAX_RATE", defaults.tax_rate)?;
        if !(0.0..1.0).contains(&tax_rate) {
            return Err(PosError::Config(format!(
                "CHEFCHAIN_TAX_RATE must be in [0, 1), got {}",
                tax_rate
            )));
        }

        let timeout_secs: u64 = try_load(
            &lookup,
            "CHEFCHAIN_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;

        let approval_timeout_secs: u64 = try_load(
            &lookup,
            "CHEFCHAIN_APPROVAL_TIMEOUT_SECS",
            defaults.approval_timeout.as_secs(),
        )?;

        Ok(Self {
            api_base_url,
            tax_rate,
            cart_sync: try_load(&lookup, "CHEFCHAIN_CART_SYNC", defaults.cart_sync)?,
            approval: try_load(&lookup, "CHEFCHAIN_APPROVAL", defaults.approval)?,
            approval_wait: defaults.approval_wait,
            approval_timeout: Duration::from_secs(approval_timeout_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            poll_interval: defaults.poll_interval,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            PosError::Config(format!("invalid {}: {}", key, e))
        }),
    }
}
