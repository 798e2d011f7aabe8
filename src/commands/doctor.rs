// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::fx::cache::SqliteRateCache;
use crate::fx::store::list_rates;
use crate::fx::FallbackKind;
use crate::models::{Jurisdiction, RateSource};
use crate::tax::year_key;
use crate::utils::{find_currency_by_code, pretty_table};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

impl Issue {
    fn new(kind: &'static str, detail: String) -> Self {
        Self { kind, detail }
    }
}

pub fn handle(conn: &Connection, clock: Arc<dyn Clock>, m: &clap::ArgMatches) -> Result<()> {
    let purged = SqliteRateCache::new(conn, clock).purge_expired()?;
    if purged > 0 {
        tracing::info!(purged, "expired cache rows removed");
        println!("doctor: purged {} expired cached rate(s)", purged);
    }
    let cfg = EngineConfig::load(conn)?;
    let year = m.get_one::<i32>("year").copied();
    let rows: Vec<Vec<String>> = diagnose(conn, &cfg, year)?
        .into_iter()
        .map(|i| vec![i.kind.to_string(), i.detail])
        .collect();

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Read-only checks. Nothing here resolves rates, so no fallback rows are
/// written while diagnosing.
///
/// Colombian accounts are not checked for missing rates: the Renta report
/// drops foreign-currency transactions instead of converting them.
pub fn diagnose(conn: &Connection, cfg: &EngineConfig, year: Option<i32>) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Reports cannot run without their reporting currency
    for j in Jurisdiction::ALL {
        let code = cfg.reporting_currency(j);
        if find_currency_by_code(conn, code)?.is_none() {
            issues.push(Issue::new(
                "missing_reference_currency",
                format!("{} for {}", code, j.code()),
            ));
        }
    }

    // 2) Transactions that would convert at a fallback rate
    let mut stmt = conn.prepare(
        "SELECT t.id, t.transaction_date, t.original_currency_id, cur.code, j.code
         FROM transactions t
         JOIN accounts a ON a.id=t.account_id
         JOIN entities e ON e.id=a.entity_id
         JOIN currencies cur ON cur.id=t.original_currency_id
         JOIN jurisdictions j ON j.id=COALESCE(a.jurisdiction_id, e.jurisdiction_id)
         WHERE (?1 IS NULL OR substr(t.transaction_date,1,4)=?1)
         ORDER BY t.transaction_date, t.id",
    )?;
    let txns = stmt
        .query_map(params![year.map(year_key)], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (id, date, currency_id, code, jurisdiction) in txns {
        let Some(j) = Jurisdiction::from_code(&jurisdiction) else {
            continue;
        };
        if j == Jurisdiction::Colombia {
            continue;
        }
        let target_code = cfg.reporting_currency(j);
        let Some(target) = find_currency_by_code(conn, target_code)? else {
            continue;
        };
        if target.id == currency_id {
            continue;
        }
        let has_rate: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM fx_rates
                 WHERE currency_from_id=?1 AND currency_to_id=?2 AND rate_date=?3 LIMIT 1",
                params![currency_id, target.id, date],
                |r| r.get(0),
            )
            .optional()?;
        if has_rate.is_none() {
            issues.push(Issue::new(
                "missing_fx",
                format!("txn {} on {}: {} -> {}", id, date, code, target_code),
            ));
        }
    }

    // 3) Stored ecb rows that carry the static fallback value
    let fallback = cfg.fallback_rates();
    for listing in list_rates(conn, None)? {
        if listing.rate.source != RateSource::Ecb {
            continue;
        }
        let (rate, kind) = fallback.lookup(&listing.from_code, &listing.to_code);
        if listing.rate.rate == rate {
            let how = match kind {
                FallbackKind::Unavailable => "placeholder 1",
                _ => "fallback table",
            };
            issues.push(Issue::new(
                "synthesized_rate",
                format!(
                    "{} {} -> {} = {} ({})",
                    listing.rate.rate_date, listing.from_code, listing.to_code, rate, how
                ),
            ));
        }
    }

    Ok(issues)
}
