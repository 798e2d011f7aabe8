// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::cache::{cache_key, RateCache, SqliteRateCache};
use super::fallback::{FallbackKind, FallbackRates};
use super::store;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::errors::{LedgerError, Result};
use crate::models::{Currency, RateSource};
use crate::utils::currency_by_id;

/// Which step of the priority chain produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "via", rename_all = "snake_case")]
pub enum RateOrigin {
    Identity,
    Override,
    Cache,
    Stored,
    Fallback(FallbackKind),
}

/// Degradations the resolver absorbs instead of failing the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum DataQualityWarning {
    FallbackRate {
        from: String,
        to: String,
        date: NaiveDate,
        rate: Decimal,
    },
    NoRateAvailable {
        from: String,
        to: String,
        date: NaiveDate,
    },
    PersistFailed {
        from: String,
        to: String,
        date: NaiveDate,
        reason: String,
    },
    CacheFailed {
        key: String,
        reason: String,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::FallbackRate {
                from,
                to,
                date,
                rate,
            } => write!(f, "no FX data for {}/{} on {}, used fallback {}", from, to, date, rate),
            DataQualityWarning::NoRateAvailable { from, to, date } => {
                write!(f, "no FX rate available for {}/{} on {}, used 1", from, to, date)
            }
            DataQualityWarning::PersistFailed {
                from,
                to,
                date,
                reason,
            } => write!(
                f,
                "could not store fallback rate {}/{} on {}: {}",
                from, to, date, reason
            ),
            DataQualityWarning::CacheFailed { key, reason } => {
                write!(f, "rate cache unavailable for {}: {}", key, reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub rate: Decimal,
    pub origin: RateOrigin,
    pub warnings: Vec<DataQualityWarning>,
}

impl Resolution {
    fn new(rate: Decimal, origin: RateOrigin) -> Self {
        Self {
            rate,
            origin,
            warnings: Vec::new(),
        }
    }
}

/// FX rate resolution over the ledger database.
///
/// Lookup order, first match wins:
/// identical currencies, manual override, cache, stored ECB rate, and finally
/// a rate synthesized from the fallback table which is persisted as an ECB row.
/// The chain never fails for lack of a rate.
pub struct FxService<'c> {
    conn: &'c Connection,
    cache: Box<dyn RateCache + 'c>,
    fallback: FallbackRates,
    ttl: Duration,
}

impl<'c> FxService<'c> {
    pub fn new(conn: &'c Connection, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn,
            cache: Box::new(SqliteRateCache::new(conn, clock)),
            fallback: FallbackRates::default(),
            ttl: Duration::hours(24),
        }
    }

    pub fn from_config(conn: &'c Connection, clock: Arc<dyn Clock>, cfg: &EngineConfig) -> Self {
        Self::new(conn, clock)
            .with_fallback(cfg.fallback_rates())
            .with_ttl(cfg.fx_cache_ttl())
    }

    pub fn with_cache<C: RateCache + 'c>(mut self, cache: C) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackRates) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    pub fn resolve_rate(&self, from_id: i64, to_id: i64, date: NaiveDate) -> Result<Decimal> {
        Ok(self.resolve_detailed(from_id, to_id, date)?.rate)
    }

    pub fn resolve_detailed(
        &self,
        from_id: i64,
        to_id: i64,
        date: NaiveDate,
    ) -> Result<Resolution> {
        if from_id == to_id {
            return Ok(Resolution::new(Decimal::ONE, RateOrigin::Identity));
        }
        let from = currency_by_id(self.conn, from_id)?;
        let to = currency_by_id(self.conn, to_id)?;
        self.resolve_pair(&from, &to, date)
    }

    pub fn resolve_pair(&self, from: &Currency, to: &Currency, date: NaiveDate) -> Result<Resolution> {
        if from.id == to.id {
            return Ok(Resolution::new(Decimal::ONE, RateOrigin::Identity));
        }

        if let Some(rate) = store::find_rate(self.conn, from.id, to.id, date, RateSource::Override)? {
            tracing::debug!(from = %from.code, to = %to.code, %date, %rate, "override rate");
            return Ok(Resolution::new(rate, RateOrigin::Override));
        }

        let key = cache_key(&from.code, &to.code, date);
        let mut warnings = Vec::new();
        match self.cache.get(&key) {
            Ok(Some(rate)) => {
                tracing::debug!(%key, %rate, "cached rate");
                return Ok(Resolution::new(rate, RateOrigin::Cache));
            }
            Ok(None) => {}
            Err(e) => warnings.push(cache_failed(&key, &e)),
        }

        if let Some(rate) = store::find_rate(self.conn, from.id, to.id, date, RateSource::Ecb)? {
            self.remember(&key, rate, &mut warnings);
            tracing::debug!(from = %from.code, to = %to.code, %date, %rate, "stored ecb rate");
            return Ok(Resolution {
                rate,
                origin: RateOrigin::Stored,
                warnings,
            });
        }

        let (mut rate, kind) = self.fallback.lookup(&from.code, &to.code);
        let fallback_warning = match kind {
            FallbackKind::Unavailable => DataQualityWarning::NoRateAvailable {
                from: from.code.clone(),
                to: to.code.clone(),
                date,
            },
            _ => DataQualityWarning::FallbackRate {
                from: from.code.clone(),
                to: to.code.clone(),
                date,
                rate,
            },
        };
        tracing::warn!(from = %from.code, to = %to.code, %date, %rate, "{}", fallback_warning);
        warnings.push(fallback_warning);

        match store::find_or_create_ecb(self.conn, from.id, to.id, date, rate) {
            Ok(stored) => rate = stored,
            Err(e) => {
                let w = DataQualityWarning::PersistFailed {
                    from: from.code.clone(),
                    to: to.code.clone(),
                    date,
                    reason: e.to_string(),
                };
                tracing::warn!("{}", w);
                warnings.push(w);
            }
        }
        self.remember(&key, rate, &mut warnings);

        Ok(Resolution {
            rate,
            origin: RateOrigin::Fallback(kind),
            warnings,
        })
    }

    fn remember(&self, key: &str, rate: Decimal, warnings: &mut Vec<DataQualityWarning>) {
        if let Err(e) = self.cache.put(key, rate, self.ttl) {
            warnings.push(cache_failed(key, &e));
        }
    }

    /// Stores a manual rate that beats any ECB rate for the same day.
    pub fn set_override_rate(
        &self,
        from_id: i64,
        to_id: i64,
        date: NaiveDate,
        rate: Decimal,
    ) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidRate(rate.to_string()));
        }
        let from = currency_by_id(self.conn, from_id)?;
        let to = currency_by_id(self.conn, to_id)?;
        store::upsert_rate(self.conn, from.id, to.id, date, rate, RateSource::Override)?;
        self.invalidate(&from, &to, date);
        tracing::info!(from = %from.code, to = %to.code, %date, %rate, "override rate set");
        Ok(())
    }

    pub fn remove_override_rate(&self, from_id: i64, to_id: i64, date: NaiveDate) -> Result<bool> {
        let from = currency_by_id(self.conn, from_id)?;
        let to = currency_by_id(self.conn, to_id)?;
        let removed = store::delete_rate(self.conn, from.id, to.id, date, RateSource::Override)?;
        self.invalidate(&from, &to, date);
        if removed {
            tracing::info!(from = %from.code, to = %to.code, %date, "override rate removed");
        }
        Ok(removed)
    }

    /// Stores a published ECB rate, replacing any synthesized value for the day.
    pub fn record_ecb_rate(
        &self,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
        rate: Decimal,
    ) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidRate(rate.to_string()));
        }
        store::upsert_rate(self.conn, from.id, to.id, date, rate, RateSource::Ecb)?;
        self.invalidate(from, to, date);
        Ok(())
    }

    fn invalidate(&self, from: &Currency, to: &Currency, date: NaiveDate) {
        let key = cache_key(&from.code, &to.code, date);
        if let Err(e) = self.cache.forget(&key) {
            cache_failed(&key, &e);
        }
    }
}

fn cache_failed(key: &str, e: &LedgerError) -> DataQualityWarning {
    let w = DataQualityWarning::CacheFailed {
        key: key.to_string(),
        reason: e.to_string(),
    };
    tracing::warn!("{}", w);
    w
}
