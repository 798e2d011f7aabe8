// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{LedgerError, Result};
use crate::models::{FxRate, RateSource};
use crate::utils::{stored_date, stored_decimal};

/// Exact-date lookup; rates are never interpolated from neighbouring days.
pub fn find_rate(
    conn: &Connection,
    from_id: i64,
    to_id: i64,
    date: NaiveDate,
    source: RateSource,
) -> Result<Option<Decimal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT rate FROM fx_rates
         WHERE currency_from_id=?1 AND currency_to_id=?2 AND rate_date=?3 AND source=?4
         ORDER BY id DESC LIMIT 1",
    )?;
    let r: Option<String> = stmt
        .query_row(
            params![from_id, to_id, date.to_string(), source.as_str()],
            |r| r.get(0),
        )
        .optional()?;
    match r {
        Some(s) => Ok(Some(stored_decimal(&s, "fx rate")?)),
        None => Ok(None),
    }
}

/// Inserts an ecb row unless one already exists for the triple, then returns
/// whichever value is stored. A concurrent writer's row wins.
pub fn find_or_create_ecb(
    conn: &Connection,
    from_id: i64,
    to_id: i64,
    date: NaiveDate,
    rate: Decimal,
) -> Result<Decimal> {
    conn.execute(
        "INSERT INTO fx_rates(currency_from_id, currency_to_id, rate, rate_date, source)
         VALUES (?1, ?2, ?3, ?4, 'ecb')
         ON CONFLICT(currency_from_id, currency_to_id, rate_date, source) DO NOTHING",
        params![from_id, to_id, rate.to_string(), date.to_string()],
    )?;
    find_rate(conn, from_id, to_id, date, RateSource::Ecb)?.ok_or_else(|| {
        LedgerError::InvalidData(format!(
            "ecb rate {}->{} on {} vanished after insert",
            from_id, to_id, date
        ))
    })
}

/// Inserts or replaces the row for `(from, to, date, source)`.
pub fn upsert_rate(
    conn: &Connection,
    from_id: i64,
    to_id: i64,
    date: NaiveDate,
    rate: Decimal,
    source: RateSource,
) -> Result<()> {
    conn.execute(
        "INSERT INTO fx_rates(currency_from_id, currency_to_id, rate, rate_date, source)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(currency_from_id, currency_to_id, rate_date, source)
         DO UPDATE SET rate=excluded.rate",
        params![
            from_id,
            to_id,
            rate.to_string(),
            date.to_string(),
            source.as_str()
        ],
    )?;
    Ok(())
}

pub fn delete_rate(
    conn: &Connection,
    from_id: i64,
    to_id: i64,
    date: NaiveDate,
    source: RateSource,
) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM fx_rates
         WHERE currency_from_id=?1 AND currency_to_id=?2 AND rate_date=?3 AND source=?4",
        params![from_id, to_id, date.to_string(), source.as_str()],
    )?;
    Ok(n > 0)
}

#[derive(Debug, Clone, Serialize)]
pub struct RateListing {
    #[serde(flatten)]
    pub rate: FxRate,
    pub from_code: String,
    pub to_code: String,
}

/// Newest first. `None` lists every row.
pub fn list_rates(conn: &Connection, limit: Option<usize>) -> Result<Vec<RateListing>> {
    let limit = limit.map_or(-1, |n| n as i64);
    let mut stmt = conn.prepare(
        "SELECT r.id, r.currency_from_id, r.currency_to_id, r.rate, r.rate_date, r.source,
                f.code, t.code
         FROM fx_rates r
         JOIN currencies f ON f.id=r.currency_from_id
         JOIN currencies t ON t.id=r.currency_to_id
         ORDER BY r.rate_date DESC, f.code, t.code, r.source
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, String>(7)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, from_id, to_id, rate, date, source, from_code, to_code) = row?;
        out.push(RateListing {
            rate: FxRate {
                id,
                currency_from_id: from_id,
                currency_to_id: to_id,
                rate: stored_decimal(&rate, "fx rate")?,
                rate_date: stored_date(&date, "rate date")?,
                source: source.parse()?,
            },
            from_code,
            to_code,
        });
    }
    Ok(out)
}
