// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::{params, Connection};
use taxledger::clock::FixedClock;

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    ))
}

/// Schema plus COP/EUR/USD/GBP and the CO/ES/US jurisdictions.
pub fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    taxledger::db::init_schema(&conn).unwrap();
    for (code, name) in [
        ("COP", "Colombian Peso"),
        ("EUR", "Euro"),
        ("USD", "US Dollar"),
        ("GBP", "Pound Sterling"),
    ] {
        conn.execute(
            "INSERT INTO currencies(code, name) VALUES (?1, ?2)",
            params![code, name],
        )
        .unwrap();
    }
    for (code, name, ccy) in [("CO", "Colombia", "COP"), ("ES", "Spain", "EUR"), ("US", "United States", "USD")] {
        conn.execute(
            "INSERT INTO jurisdictions(code, name, currency_id)
             VALUES (?1, ?2, (SELECT id FROM currencies WHERE code=?3))",
            params![code, name, ccy],
        )
        .unwrap();
    }
    conn
}

pub fn currency(conn: &Connection, code: &str) -> i64 {
    conn.query_row("SELECT id FROM currencies WHERE code=?1", params![code], |r| r.get(0))
        .unwrap()
}

pub fn jurisdiction(conn: &Connection, code: &str) -> i64 {
    conn.query_row("SELECT id FROM jurisdictions WHERE code=?1", params![code], |r| r.get(0))
        .unwrap()
}

pub fn user(conn: &Connection, name: &str) -> i64 {
    conn.execute("INSERT INTO users(name) VALUES (?1)", params![name]).unwrap();
    conn.last_insert_rowid()
}

pub fn entity(conn: &Connection, user_id: i64, name: &str, jurisdiction_code: &str) -> i64 {
    conn.execute(
        "INSERT INTO entities(user_id, name, jurisdiction_id) VALUES (?1, ?2, ?3)",
        params![user_id, name, jurisdiction(conn, jurisdiction_code)],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn account(conn: &Connection, entity_id: i64, name: &str, jurisdiction_code: &str, ccy: &str) -> i64 {
    conn.execute(
        "INSERT INTO accounts(entity_id, jurisdiction_id, name, currency_id) VALUES (?1, ?2, ?3, ?4)",
        params![entity_id, jurisdiction(conn, jurisdiction_code), name, currency(conn, ccy)],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn category(conn: &Connection, name: &str, kind: &str) -> i64 {
    conn.execute(
        "INSERT INTO transaction_categories(name, income_or_expense) VALUES (?1, ?2)",
        params![name, kind],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn map_category(conn: &Connection, category_id: i64, form: &str, line: &str, country: &str) {
    conn.execute(
        "INSERT INTO category_tax_mappings(category_id, tax_form_code, line_item, country)
         VALUES (?1, ?2, ?3, ?4)",
        params![category_id, form, line, country],
    )
    .unwrap();
}

pub fn txn(
    conn: &Connection,
    account_id: i64,
    category_id: i64,
    kind: &str,
    date: &str,
    amount: &str,
    ccy: &str,
) -> i64 {
    conn.execute(
        "INSERT INTO transactions(account_id, category_id, type, transaction_date,
                                  original_amount, original_currency_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![account_id, category_id, kind, date, amount, currency(conn, ccy)],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn ecb_rate(conn: &Connection, from: &str, to: &str, date: &str, rate: &str) {
    conn.execute(
        "INSERT INTO fx_rates(currency_from_id, currency_to_id, rate, rate_date, source)
         VALUES (?1, ?2, ?3, ?4, 'ecb')",
        params![currency(conn, from), currency(conn, to), rate, date],
    )
    .unwrap();
}

#[allow(clippy::too_many_arguments)]
pub fn asset(
    conn: &Connection,
    entity_id: i64,
    jurisdiction_code: &str,
    kind: &str,
    name: &str,
    acquired: &str,
    cost: &str,
    ccy: &str,
    life: Option<u32>,
    annual: Option<&str>,
) -> i64 {
    conn.execute(
        "INSERT INTO assets(entity_id, jurisdiction_id, asset_type, name, acquisition_date,
                            acquisition_cost, acquisition_currency_id, useful_life_years,
                            annual_depreciation_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entity_id,
            jurisdiction(conn, jurisdiction_code),
            kind,
            name,
            acquired,
            cost,
            currency(conn, ccy),
            life,
            annual
        ],
    )
    .unwrap();
    conn.last_insert_rowid()
}
