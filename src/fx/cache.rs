// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::Result;
use crate::utils::stored_decimal;

/// Key-value store for resolved rates with a time-to-live.
pub trait RateCache {
    fn get(&self, key: &str) -> Result<Option<Decimal>>;
    fn put(&self, key: &str, rate: Decimal, ttl: Duration) -> Result<()>;
    fn forget(&self, key: &str) -> Result<()>;
}

pub fn cache_key(from_code: &str, to_code: &str, date: NaiveDate) -> String {
    format!("fx_rate_{}_{}_{}", from_code, to_code, date)
}

/// Cache rows live in the `rate_cache` table next to the ledger.
/// Expired rows read as misses and are dropped on the next read.
pub struct SqliteRateCache<'c> {
    conn: &'c Connection,
    clock: Arc<dyn Clock>,
}

impl<'c> SqliteRateCache<'c> {
    pub fn new(conn: &'c Connection, clock: Arc<dyn Clock>) -> Self {
        Self { conn, clock }
    }

    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now().timestamp();
        let n = self
            .conn
            .execute("DELETE FROM rate_cache WHERE expires_at<=?1", params![now])?;
        Ok(n)
    }
}

impl RateCache for SqliteRateCache<'_> {
    fn get(&self, key: &str) -> Result<Option<Decimal>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT value, expires_at FROM rate_cache WHERE key=?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        match row {
            Some((value, expires_at)) if expires_at > self.clock.now().timestamp() => {
                Ok(Some(stored_decimal(&value, "cached rate")?))
            }
            Some(_) => {
                self.forget(key)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, rate: Decimal, ttl: Duration) -> Result<()> {
        let expires_at = (self.clock.now() + ttl).timestamp();
        self.conn.execute(
            "INSERT INTO rate_cache(key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, expires_at=excluded.expires_at",
            params![key, rate.to_string(), expires_at],
        )?;
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM rate_cache WHERE key=?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Connection, Arc<FixedClock>) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE rate_cache(key TEXT PRIMARY KEY, value TEXT NOT NULL, expires_at INTEGER NOT NULL);",
        )
        .unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        (conn, clock)
    }

    #[test]
    fn key_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(cache_key("EUR", "USD", d), "fx_rate_EUR_USD_2024-03-01");
    }

    #[test]
    fn entries_expire_after_ttl() {
        let (conn, clock) = setup();
        let cache = SqliteRateCache::new(&conn, clock.clone());
        cache
            .put("k", Decimal::new(108, 2), Duration::hours(24))
            .unwrap();
        clock.advance(Duration::hours(23));
        assert_eq!(cache.get("k").unwrap(), Some(Decimal::new(108, 2)));
        clock.advance(Duration::hours(1));
        assert_eq!(cache.get("k").unwrap(), None);
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM rate_cache", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn forget_and_purge() {
        let (conn, clock) = setup();
        let cache = SqliteRateCache::new(&conn, clock.clone());
        cache.put("a", Decimal::ONE, Duration::hours(1)).unwrap();
        cache.put("b", Decimal::ONE, Duration::hours(48)).unwrap();
        cache.forget("b").unwrap();
        assert_eq!(cache.get("b").unwrap(), None);
        cache.put("c", Decimal::ONE, Duration::hours(48)).unwrap();
        clock.advance(Duration::hours(2));
        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.get("c").unwrap(), Some(Decimal::ONE));
    }
}
