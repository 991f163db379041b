//! Exchange-rate table, conversion, and the 24-hour rate cache.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtrack_domain::Currency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    storage::{load_json, save_json, KeyValueStore, EXCHANGE_RATES_KEY},
    time::Clock,
};

pub const RATE_CACHE_TTL_HOURS: i64 = 24;

/// Approximate rates used whenever live rates are unavailable.
pub const DEFAULT_RATES: [(Currency, f64); 4] = [
    (Currency::Usd, 1.0),
    (Currency::Eur, 0.92),
    (Currency::Jpy, 149.5),
    (Currency::Gbp, 0.79),
];

/// Rates keyed by ISO code, each expressed against [`Currency::BASE`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn defaults() -> Self {
        let mut table = Self::empty();
        for (currency, rate) in DEFAULT_RATES {
            table.set(currency, rate);
        }
        table
    }

    /// Restricts a provider response to the supported currencies.
    ///
    /// The base is pinned at 1. A supported currency that is missing or not a
    /// positive finite number in `raw` keeps its default rate.
    pub fn from_provider_rates(raw: &HashMap<String, f64>) -> Self {
        let mut table = Self::empty();
        for (currency, fallback) in DEFAULT_RATES {
            let rate = if currency == Currency::BASE {
                1.0
            } else {
                raw.get(currency.code())
                    .copied()
                    .filter(|value| is_usable_rate(*value))
                    .unwrap_or(fallback)
            };
            table.set(currency, rate);
        }
        table
    }

    pub fn set(&mut self, currency: Currency, rate: f64) {
        self.rates.insert(currency.code().to_string(), rate);
    }

    /// Rate for `currency`, when present and usable.
    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.rates
            .get(currency.code())
            .copied()
            .filter(|value| is_usable_rate(*value))
    }

    /// Supported currencies present in the table, in canonical order.
    pub fn entries(&self) -> Vec<(Currency, f64)> {
        Currency::ALL
            .iter()
            .filter_map(|currency| self.rate(*currency).map(|rate| (*currency, rate)))
            .collect()
    }

    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> Option<f64> {
        convert_amount(amount, from, to, self)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::defaults()
    }
}

fn is_usable_rate(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Converts through the base currency: `amount / rate[from] * rate[to]`.
///
/// Identity when `from == to`. Returns `None` for a non-finite amount, a
/// missing rate, or a non-finite result.
pub fn convert_amount(amount: f64, from: Currency, to: Currency, rates: &RateTable) -> Option<f64> {
    if !amount.is_finite() {
        return None;
    }
    if from == to {
        return Some(amount);
    }
    let from_rate = rates.rate(from)?;
    let to_rate = rates.rate(to)?;
    let result = amount / from_rate * to_rate;
    result.is_finite().then_some(result)
}

/// Persisted cache entry: the table plus its fetch time in epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedRates {
    pub rates: RateTable,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("rate provider returned status {0}")]
    Status(u16),
    #[error("invalid rate payload: {0}")]
    Payload(String),
}

/// Source of live exchange rates relative to [`Currency::BASE`].
pub trait RateProvider: Send + Sync {
    fn fetch_latest(&self) -> Result<HashMap<String, f64>, RateFetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Network,
    Fallback,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RateSource::Cache => "cache",
            RateSource::Network => "network",
            RateSource::Fallback => "built-in defaults",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub source: RateSource,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Serves exchange rates from storage while fresh, otherwise from the provider.
///
/// Never fails outward: any fetch problem degrades to [`RateTable::defaults`].
pub struct RateCache {
    storage: Arc<dyn KeyValueStore>,
    provider: Box<dyn RateProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        provider: Box<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            provider,
            clock,
            ttl: Duration::hours(RATE_CACHE_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn get_rates(&self) -> RateTable {
        self.get_rates_with_source().table
    }

    pub fn get_rates_with_source(&self) -> RateSnapshot {
        if let Some(cached) = self.read_cache() {
            let age = self.clock.now() - cached.fetched_at;
            // A timestamp ahead of the clock would otherwise pin the entry indefinitely.
            if age >= Duration::zero() && age < self.ttl {
                debug!(age_minutes = age.num_minutes(), "using cached exchange rates");
                return RateSnapshot {
                    table: cached.rates,
                    source: RateSource::Cache,
                    fetched_at: Some(cached.fetched_at),
                };
            }
            debug!(age_minutes = age.num_minutes(), "cached exchange rates stale");
        }
        self.fetch()
    }

    /// Fetches regardless of cache age.
    pub fn refresh(&self) -> RateSnapshot {
        self.fetch()
    }

    fn fetch(&self) -> RateSnapshot {
        match self.provider.fetch_latest() {
            Ok(raw) => {
                let table = RateTable::from_provider_rates(&raw);
                let fetched_at = self.clock.now();
                let entry = CachedRates {
                    rates: table.clone(),
                    fetched_at,
                };
                if let Err(err) = save_json(self.storage.as_ref(), EXCHANGE_RATES_KEY, &entry) {
                    warn!(error = %err, "failed to cache exchange rates");
                }
                info!("fetched fresh exchange rates");
                RateSnapshot {
                    table,
                    source: RateSource::Network,
                    fetched_at: Some(fetched_at),
                }
            }
            Err(err) => {
                warn!(error = %err, "exchange rate fetch failed, using defaults");
                RateSnapshot {
                    table: RateTable::defaults(),
                    source: RateSource::Fallback,
                    fetched_at: None,
                }
            }
        }
    }

    fn read_cache(&self) -> Option<CachedRates> {
        match load_json::<CachedRates>(self.storage.as_ref(), EXCHANGE_RATES_KEY) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable exchange rate cache");
                None
            }
        }
    }
}
