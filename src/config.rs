// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Engine settings persisted in the `settings` table.

use chrono::Duration;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::{LedgerError, Result};
use crate::fx::fallback::FallbackRates;
use crate::models::Jurisdiction;
use crate::utils::{currency_code, stored_decimal};

pub const HOME_JURISDICTION: &str = "home_jurisdiction";
pub const MODELO720_THRESHOLD: &str = "modelo720_threshold";
pub const FX_CACHE_TTL_HOURS: &str = "fx_cache_ttl_hours";
/// Ten years.
const MAX_CACHE_TTL_HOURS: i64 = 87_600;
const REPORTING_PREFIX: &str = "reporting_currency.";
const FALLBACK_PREFIX: &str = "fallback_rate.";

#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    reporting_currencies: BTreeMap<String, String>,
    pub home_jurisdiction: String,
    pub modelo720_threshold: Decimal,
    pub fx_cache_ttl_hours: i64,
    fallback_overlays: Vec<(String, String, Decimal)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let reporting_currencies = Jurisdiction::ALL
            .iter()
            .map(|j| (j.code().to_string(), j.default_reporting_currency().to_string()))
            .collect();
        Self {
            reporting_currencies,
            home_jurisdiction: Jurisdiction::Spain.code().to_string(),
            modelo720_threshold: Decimal::new(50_000, 0),
            fx_cache_ttl_hours: 24,
            fallback_overlays: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with whatever the `settings` table holds.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = EngineConfig::default();
        for (key, value) in list_settings(conn)? {
            cfg.apply(&key, &value)?;
        }
        Ok(cfg)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(j) = key.strip_prefix(REPORTING_PREFIX) {
            self.reporting_currencies
                .insert(j.to_string(), currency_code(value)?);
        } else if let Some(pair) = key.strip_prefix(FALLBACK_PREFIX) {
            let (from, to) = split_pair(pair)?;
            let rate = stored_decimal(value, key)?;
            if rate <= Decimal::ZERO {
                return Err(LedgerError::InvalidRate(value.to_string()));
            }
            self.fallback_overlays.push((from, to, rate));
        } else {
            match key {
                HOME_JURISDICTION => self.home_jurisdiction = value.trim().to_uppercase(),
                MODELO720_THRESHOLD => self.modelo720_threshold = stored_decimal(value, key)?,
                FX_CACHE_TTL_HOURS => self.fx_cache_ttl_hours = parse_ttl_hours(key, value)?,
                // Unrelated keys may share the table.
                _ => {}
            }
        }
        Ok(())
    }

    pub fn reporting_currency(&self, jurisdiction: Jurisdiction) -> &str {
        self.reporting_currencies
            .get(jurisdiction.code())
            .map(String::as_str)
            .unwrap_or_else(|| jurisdiction.default_reporting_currency())
    }

    pub fn with_reporting_currency(mut self, jurisdiction: Jurisdiction, code: &str) -> Self {
        self.reporting_currencies
            .insert(jurisdiction.code().to_string(), code.to_string());
        self
    }

    pub fn fx_cache_ttl(&self) -> Duration {
        Duration::try_hours(self.fx_cache_ttl_hours).unwrap_or_else(|| Duration::hours(24))
    }

    /// Effective value of every setting, defaults included.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Jurisdiction::ALL
            .iter()
            .map(|j| {
                (
                    format!("{}{}", REPORTING_PREFIX, j.code()),
                    self.reporting_currency(*j).to_string(),
                )
            })
            .collect();
        out.push((HOME_JURISDICTION.to_string(), self.home_jurisdiction.clone()));
        out.push((MODELO720_THRESHOLD.to_string(), self.modelo720_threshold.to_string()));
        out.push((FX_CACHE_TTL_HOURS.to_string(), self.fx_cache_ttl_hours.to_string()));
        for (from, to, rate) in &self.fallback_overlays {
            out.push((format!("{}{}_{}", FALLBACK_PREFIX, from, to), rate.to_string()));
        }
        out
    }

    /// Built-in fallback table with any configured pair overlays applied.
    pub fn fallback_rates(&self) -> FallbackRates {
        let mut table = FallbackRates::default();
        for (from, to, rate) in &self.fallback_overlays {
            table.insert(from, to, *rate);
        }
        table
    }
}

fn parse_ttl_hours(key: &str, value: &str) -> Result<i64> {
    match value.trim().parse::<i64>() {
        Ok(h) if (1..=MAX_CACHE_TTL_HOURS).contains(&h) => Ok(h),
        _ => Err(LedgerError::InvalidData(format!(
            "{} '{}' (expected 1..={} hours)",
            key, value, MAX_CACHE_TTL_HOURS
        ))),
    }
}

fn split_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('_') {
        Some((from, to)) => Ok((currency_code(from)?, currency_code(to)?)),
        None => Err(LedgerError::UnknownSetting(format!("{}{}", FALLBACK_PREFIX, pair))),
    }
}

fn is_known_key(key: &str) -> bool {
    if let Some(j) = key.strip_prefix(REPORTING_PREFIX) {
        return Jurisdiction::ALL.iter().any(|x| x.code() == j);
    }
    if let Some(pair) = key.strip_prefix(FALLBACK_PREFIX) {
        return split_pair(pair).is_ok();
    }
    matches!(key, HOME_JURISDICTION | MODELO720_THRESHOLD | FX_CACHE_TTL_HOURS)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

/// Validates and stores a setting. The value must parse the way `load` reads it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let key = key.trim();
    if !is_known_key(key) {
        return Err(LedgerError::UnknownSetting(key.to_string()));
    }
    EngineConfig::default().apply(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    Ok(())
}

pub fn list_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
