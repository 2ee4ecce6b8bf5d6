//! Runtime configuration.
//!
//! Defaults cover a single front-of-house terminal. Each value can be overridden through
//! a `DINEIN_*` environment variable; `main` loads a `.env` file first with `dotenvy`.
//!
//! | variable | default |
//! |---|---|
//! | `DINEIN_TABLE_POLL_MS` | 2000 |
//! | `DINEIN_ORDER_POLL_MS` | 5000 |
//! | `DINEIN_SUPPRESSION_MS` | 2000 |
//! | `DINEIN_STORE_DEADLINE_MS` | 5000 |
//! | `DINEIN_NOTIFY_DEADLINE_MS` | 2000 |
//! | `DINEIN_TAX_RATE` | 0.18 |
//! | `DINEIN_CHANNEL_BUFFER` | 32 |
//! | `DINEIN_LOG` | info |

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub table_poll_interval: Duration,
    pub order_poll_interval: Duration,
    /// How long poll results are ignored for a row after a local write.
    pub suppression_window: Duration,
    pub store_deadline: Duration,
    pub notify_deadline: Duration,
    pub tax_rate: Decimal,
    pub channel_buffer: usize,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_poll_interval: Duration::from_secs(2),
            order_poll_interval: Duration::from_secs(5),
            suppression_window: Duration::from_secs(2),
            store_deadline: Duration::from_secs(5),
            notify_deadline: Duration::from_secs(2),
            tax_rate: Decimal::new(18, 2),
            channel_buffer: 32,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to the defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let millis = |key: &'static str, default: Duration| {
            parse(&lookup, key).map(|ms| ms.map(Duration::from_millis).unwrap_or(default))
        };

        let tax_rate: Decimal = parse(&lookup, "DINEIN_TAX_RATE")?.unwrap_or(defaults.tax_rate);
        if tax_rate.is_sign_negative() {
            return Err(ConfigError::Invalid {
                key: "DINEIN_TAX_RATE",
                value: tax_rate.to_string(),
            });
        }

        Ok(Self {
            table_poll_interval: millis("DINEIN_TABLE_POLL_MS", defaults.table_poll_interval)?,
            order_poll_interval: millis("DINEIN_ORDER_POLL_MS", defaults.order_poll_interval)?,
            suppression_window: millis("DINEIN_SUPPRESSION_MS", defaults.suppression_window)?,
            store_deadline: millis("DINEIN_STORE_DEADLINE_MS", defaults.store_deadline)?,
            notify_deadline: millis("DINEIN_NOTIFY_DEADLINE_MS", defaults.notify_deadline)?,
            tax_rate,
            channel_buffer: parse(&lookup, "DINEIN_CHANNEL_BUFFER")?
                .filter(|buffer| *buffer > 0)
                .unwrap_or(defaults.channel_buffer),
            log_filter: lookup("DINEIN_LOG").unwrap_or(defaults.log_filter),
        })
    }
}

fn parse<V: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<V>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<V>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
