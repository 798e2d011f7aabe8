// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{currency_arg, required};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::fx::store::list_rates;
use crate::fx::FxService;
use crate::models::Currency;
use crate::utils::{
    find_currency_by_code, currency_code, http_client, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};

pub fn handle(conn: &Connection, clock: Arc<dyn Clock>, m: &clap::ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    let fx = FxService::from_config(conn, clock.clone(), &cfg);
    match m.subcommand() {
        Some(("resolve", sub)) => resolve(conn, &fx, sub)?,
        Some(("convert", sub)) => convert_amount(conn, &fx, sub)?,
        Some(("override", sub)) => {
            let (from, to, date) = pair(conn, sub)?;
            let rate = parse_decimal(required(sub, "rate")?)?;
            fx.set_override_rate(from.id, to.id, date, rate)?;
            println!("Override {} -> {} on {} set to {}", from.code, to.code, date, rate);
        }
        Some(("unset-override", sub)) => {
            let (from, to, date) = pair(conn, sub)?;
            if fx.remove_override_rate(from.id, to.id, date)? {
                println!("Override {} -> {} on {} removed", from.code, to.code, date);
            } else {
                println!("No override for {} -> {} on {}", from.code, to.code, date);
            }
        }
        Some(("list", sub)) => {
            let limit = *sub.get_one::<usize>("limit").unwrap_or(&50);
            let rates = list_rates(conn, Some(limit))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rates)? {
                let data = rates
                    .into_iter()
                    .map(|r| {
                        vec![
                            r.rate.rate_date.to_string(),
                            r.from_code,
                            r.to_code,
                            r.rate.rate.to_string(),
                            r.rate.source.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "From", "To", "Rate", "Source"], data));
            }
        }
        Some(("fetch", sub)) => {
            let base = currency_arg(conn, sub, "base")?;
            let days: usize = *sub.get_one::<usize>("days").unwrap_or(&30);
            fetch_rates(conn, &fx, clock.as_ref(), &base, days)?;
        }
        _ => {}
    }
    Ok(())
}

fn pair(conn: &Connection, sub: &clap::ArgMatches) -> Result<(Currency, Currency, NaiveDate)> {
    let from = currency_arg(conn, sub, "from")?;
    let to = currency_arg(conn, sub, "to")?;
    let date = parse_date(required(sub, "date")?)?;
    Ok((from, to, date))
}

#[derive(Debug, Serialize)]
struct Resolved<'a> {
    from: &'a str,
    to: &'a str,
    date: NaiveDate,
    #[serde(flatten)]
    resolution: crate::fx::Resolution,
}

fn resolve(conn: &Connection, fx: &FxService<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to, date) = pair(conn, sub)?;
    let resolution = fx.resolve_pair(&from, &to, date)?;
    let out = Resolved {
        from: &from.code,
        to: &to.code,
        date,
        resolution,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        println!(
            "1 {} = {} {} on {} ({:?})",
            out.from, out.resolution.rate, out.to, date, out.resolution.origin
        );
        for w in &out.resolution.warnings {
            eprintln!("warning: {}", w);
        }
    }
    Ok(())
}

fn convert_amount(conn: &Connection, fx: &FxService<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to, date) = pair(conn, sub)?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let (converted, resolution) = fx.convert_into(amount, from.id, &to, date)?;
    println!("{} {} -> {:.2} {}", amount, from.code, converted, to.code);
    for w in &resolution.warnings {
        eprintln!("warning: {}", w);
    }
    Ok(())
}

/// Frankfurter time series: `rates[date][quote] = units of quote per base`.
#[derive(Debug, Deserialize)]
pub struct Series {
    pub rates: HashMap<String, HashMap<String, f64>>,
    #[serde(rename = "base")]
    pub _base: String,
}

fn active_quotes(conn: &Connection, base: &Currency) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT code FROM currencies WHERE is_active=1 AND id<>?1 ORDER BY code")?;
    let rows = stmt.query_map(params![base.id], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn fetch_rates(
    conn: &Connection,
    fx: &FxService<'_>,
    clock: &dyn Clock,
    base: &Currency,
    days: usize,
) -> Result<()> {
    let today = clock.now().date_naive();
    let start = today - chrono::Duration::days(days as i64);
    let targets = active_quotes(conn, base)?;
    if targets.is_empty() {
        println!("No other active currencies; nothing to fetch.");
        return Ok(());
    }
    let to_param = targets.join(",");
    let url = format!(
        "https://api.frankfurter.dev/v1/{start}..{today}?base={}&symbols={to_param}",
        base.code
    );
    let client = http_client()?;
    let resp = client.get(url).send()?.error_for_status()?;
    let series: Series = resp.json()?;
    let stored = import_series(conn, fx, base, &series)?;
    tracing::info!(base = %base.code, stored, "ecb rates imported");
    println!("Stored {} ECB rates via Frankfurter.", stored);
    Ok(())
}

/// Stores every `(date, quote)` of a series as an `ecb` row. Quotes that are
/// not in `currencies` are skipped.
pub fn import_series(
    conn: &Connection,
    fx: &FxService<'_>,
    base: &Currency,
    series: &Series,
) -> Result<usize> {
    let mut quotes: HashMap<String, Option<Currency>> = HashMap::new();
    let mut stored = 0;
    for (date, mp) in &series.rates {
        let date = parse_date(date)?;
        for (quote, rate) in mp {
            let code = currency_code(quote)?;
            if !quotes.contains_key(&code) {
                quotes.insert(code.clone(), find_currency_by_code(conn, &code)?);
            }
            let Some(Some(to)) = quotes.get(&code) else {
                continue;
            };
            let rate = Decimal::try_from(*rate)
                .with_context(|| format!("Invalid rate {} for {} on {}", rate, code, date))?;
            fx.record_ecb_rate(base, to, date, rate)?;
            stored += 1;
        }
    }
    Ok(stored)
}
