// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context;
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result};
use crate::models::{Asset, Currency};

const UA: &str = concat!("taxledger/", env!("CARGO_PKG_VERSION"));

static ISO_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("static regex"));

pub fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> anyhow::Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Normalizes and validates an ISO 4217 code.
pub fn currency_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_uppercase();
    if ISO_CODE.is_match(&code) {
        Ok(code)
    } else {
        Err(LedgerError::InvalidCurrencyCode(raw.to_string()))
    }
}

pub fn stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| LedgerError::InvalidData(format!("{} '{}': {}", what, s, e)))
}

pub fn stored_date(s: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| LedgerError::InvalidData(format!("{} '{}': {}", what, s, e)))
}

fn currency_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: r.get(0)?,
        code: r.get(1)?,
        name: r.get(2)?,
        symbol: r.get(3)?,
        is_active: r.get::<_, i64>(4)? != 0,
    })
}

pub fn currency_by_id(conn: &Connection, id: i64) -> Result<Currency> {
    conn.query_row(
        "SELECT id, code, name, symbol, is_active FROM currencies WHERE id=?1",
        params![id],
        currency_from_row,
    )
    .optional()?
    .ok_or(LedgerError::CurrencyNotFound(id))
}

pub fn find_currency_by_code(conn: &Connection, code: &str) -> Result<Option<Currency>> {
    let c = conn
        .query_row(
            "SELECT id, code, name, symbol, is_active FROM currencies WHERE code=?1",
            params![code],
            currency_from_row,
        )
        .optional()?;
    Ok(c)
}

/// Looks up a currency a report cannot be produced without.
pub fn reference_currency(conn: &Connection, code: &str) -> Result<Currency> {
    find_currency_by_code(conn, code)?
        .ok_or_else(|| LedgerError::ReferenceCurrencyMissing(code.to_string()))
}

pub fn entity_ids_for_user(conn: &Connection, user_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM entities WHERE user_id=?1 ORDER BY id")?;
    let rows = stmt.query_map(params![user_id], |r| r.get::<_, i64>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Renders ids as a comma separated list for an `IN (...)` clause.
pub fn sql_id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn load_asset(conn: &Connection, asset_id: i64) -> Result<Asset> {
    let row = conn
        .query_row(
            "SELECT id, entity_id, jurisdiction_id, asset_type, name, acquisition_date,
                    acquisition_cost, acquisition_currency_id, useful_life_years,
                    annual_depreciation_amount
             FROM assets WHERE id=?1",
            params![asset_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, i64>(7)?,
                    r.get::<_, Option<i64>>(8)?,
                    r.get::<_, Option<String>>(9)?,
                ))
            },
        )
        .optional()?
        .ok_or(LedgerError::AssetNotFound(asset_id))?;
    let (id, entity_id, jurisdiction_id, kind, name, acq_date, cost, ccy, life, annual) = row;
    let annual_depreciation_amount = match annual {
        Some(s) if !s.trim().is_empty() => Some(stored_decimal(&s, "annual depreciation")?),
        _ => None,
    };
    let useful_life_years = match life {
        Some(v) => Some(u32::try_from(v).map_err(|_| {
            LedgerError::InvalidData(format!("useful life {} for asset {}", v, id))
        })?),
        None => None,
    };
    Ok(Asset {
        id,
        entity_id,
        jurisdiction_id,
        kind: kind.parse()?,
        name,
        acquisition_date: stored_date(&acq_date, "acquisition date")?,
        acquisition_cost: stored_decimal(&cost, "acquisition cost")?,
        acquisition_currency_id: ccy,
        useful_life_years,
        annual_depreciation_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_normalizes_case_and_whitespace() {
        assert_eq!(currency_code(" eur ").unwrap(), "EUR");
        assert!(matches!(
            currency_code("EURO"),
            Err(LedgerError::InvalidCurrencyCode(_))
        ));
        assert!(currency_code("E1R").is_err());
    }

    #[test]
    fn sql_id_list_joins_ids() {
        assert_eq!(sql_id_list(&[3, 1, 7]), "3,1,7");
        assert_eq!(sql_id_list(&[]), "");
    }
}
