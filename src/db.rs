// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Taxledger", "taxledger"));

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("TAXLEDGER_DB") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("taxledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS currencies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS jurisdictions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        currency_id INTEGER,
        FOREIGN KEY(currency_id) REFERENCES currencies(id)
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entities(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        jurisdiction_id INTEGER,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(jurisdiction_id) REFERENCES jurisdictions(id)
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id INTEGER NOT NULL,
        jurisdiction_id INTEGER,
        name TEXT NOT NULL,
        account_type TEXT NOT NULL DEFAULT 'bank',
        currency_id INTEGER NOT NULL,
        FOREIGN KEY(entity_id) REFERENCES entities(id) ON DELETE CASCADE,
        FOREIGN KEY(jurisdiction_id) REFERENCES jurisdictions(id),
        FOREIGN KEY(currency_id) REFERENCES currencies(id)
    );

    CREATE TABLE IF NOT EXISTS account_balances(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        balance_date TEXT NOT NULL,
        balance TEXT NOT NULL, -- stored in the account currency
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS transaction_categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        income_or_expense TEXT NOT NULL CHECK(income_or_expense IN ('income','expense')),
        jurisdiction_id INTEGER,
        entity_id INTEGER,
        FOREIGN KEY(jurisdiction_id) REFERENCES jurisdictions(id),
        FOREIGN KEY(entity_id) REFERENCES entities(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS category_tax_mappings(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        tax_form_code TEXT NOT NULL,
        line_item TEXT NOT NULL,
        country TEXT NOT NULL,
        FOREIGN KEY(category_id) REFERENCES transaction_categories(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_mappings_form ON category_tax_mappings(tax_form_code);

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        type TEXT NOT NULL CHECK(type IN ('income','expense','transfer','fee')),
        transaction_date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        original_amount TEXT NOT NULL,
        original_currency_id INTEGER NOT NULL,
        converted_amount TEXT,
        converted_currency_id INTEGER,
        fx_rate TEXT,
        fx_source TEXT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES transaction_categories(id) ON DELETE SET NULL,
        FOREIGN KEY(original_currency_id) REFERENCES currencies(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);

    CREATE TABLE IF NOT EXISTS assets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id INTEGER NOT NULL,
        jurisdiction_id INTEGER NOT NULL,
        asset_type TEXT NOT NULL DEFAULT 'other',
        name TEXT NOT NULL,
        acquisition_date TEXT NOT NULL,
        acquisition_cost TEXT NOT NULL,
        acquisition_currency_id INTEGER NOT NULL,
        useful_life_years INTEGER,
        annual_depreciation_amount TEXT,
        FOREIGN KEY(entity_id) REFERENCES entities(id) ON DELETE CASCADE,
        FOREIGN KEY(jurisdiction_id) REFERENCES jurisdictions(id),
        FOREIGN KEY(acquisition_currency_id) REFERENCES currencies(id)
    );

    CREATE TABLE IF NOT EXISTS asset_valuations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_id INTEGER NOT NULL,
        valuation_date TEXT NOT NULL,
        value TEXT NOT NULL,
        currency_id INTEGER NOT NULL,
        FOREIGN KEY(asset_id) REFERENCES assets(id) ON DELETE CASCADE,
        FOREIGN KEY(currency_id) REFERENCES currencies(id)
    );

    -- FX rates: 1 unit of currency_from = rate units of currency_to
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        currency_from_id INTEGER NOT NULL,
        currency_to_id INTEGER NOT NULL,
        rate TEXT NOT NULL,
        rate_date TEXT NOT NULL,
        source TEXT NOT NULL CHECK(source IN ('override','ecb')),
        UNIQUE(currency_from_id, currency_to_id, rate_date, source),
        FOREIGN KEY(currency_from_id) REFERENCES currencies(id),
        FOREIGN KEY(currency_to_id) REFERENCES currencies(id)
    );

    CREATE TABLE IF NOT EXISTS rate_cache(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at INTEGER NOT NULL -- unix seconds
    );
    "#,
    )?;
    Ok(())
}
