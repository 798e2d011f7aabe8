// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{account, asset, clock, currency, ecb_rate, entity, setup, user};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use taxledger::tax::modelo720::{self, HoldingCategory, ThresholdStatus, ValuationBasis};
use taxledger::config::EngineConfig;
use taxledger::errors::LedgerError;
use taxledger::models::Jurisdiction;
use taxledger::tax::ReportContext;

fn balance(conn: &Connection, account_id: i64, date: &str, amount: &str) {
    conn.execute(
        "INSERT INTO account_balances(account_id, balance_date, balance) VALUES (?1, ?2, ?3)",
        params![account_id, date, amount],
    )
    .unwrap();
}

fn valuation(conn: &Connection, asset_id: i64, date: &str, value: &str, ccy: &str) {
    conn.execute(
        "INSERT INTO asset_valuations(asset_id, valuation_date, value, currency_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![asset_id, date, value, currency(conn, ccy)],
    )
    .unwrap();
}

fn status(s: &modelo720::ThresholdSummary, c: HoldingCategory) -> (Decimal, ThresholdStatus) {
    let cat = s.category(c).unwrap();
    (cat.total, cat.status)
}

#[test]
fn bank_above_and_real_estate_below_threshold() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let me = entity(&conn, u, "Jordi", "ES");

    let abroad = account(&conn, me, "Chase EUR", "US", "EUR");
    balance(&conn, abroad, "2024-06-30", "12000");
    balance(&conn, abroad, "2024-12-31", "10000");
    balance(&conn, abroad, "2024-12-31", "60000");
    balance(&conn, abroad, "2025-01-15", "99999");
    let home = account(&conn, me, "Sabadell", "ES", "EUR");
    balance(&conn, home, "2024-12-31", "500000");
    account(&conn, me, "Dormant", "CO", "COP");

    let flat = asset(&conn, me, "CO", "real_estate", "Apartamento Medellín", "2019-05-01", "300000000", "COP", None, None);
    valuation(&conn, flat, "2023-12-31", "70000000", "COP");
    valuation(&conn, flat, "2024-11-30", "80000000", "COP");
    ecb_rate(&conn, "COP", "EUR", "2024-11-30", "0.00025");

    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(s.reporting_currency, "EUR");
    assert_eq!(s.threshold, dec!(50000));
    assert_eq!(status(&s, HoldingCategory::BankAccounts), (dec!(60000), ThresholdStatus::Above));
    assert_eq!(status(&s, HoldingCategory::RealEstate), (dec!(20000.00), ThresholdStatus::Below));
    assert_eq!(status(&s, HoldingCategory::Securities), (Decimal::ZERO, ThresholdStatus::Below));
    assert_eq!(s.categories.len(), 3);
    assert_eq!(s.holdings.len(), 2);
    assert!(s.warnings.is_empty());

    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["categories"][0]["label"], "Bank Accounts");
    assert_eq!(json["categories"][0]["status"], "above");
    assert_eq!(json["categories"][1]["status"], "below");
}

#[test]
fn assets_without_valuation_use_acquisition_cost() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let me = entity(&conn, u, "Jordi", "ES");
    asset(&conn, me, "US", "securities", "Index fund", "2022-03-01", "1000", "USD", None, None);
    asset(&conn, me, "US", "securities", "Bought later", "2025-02-01", "5000", "USD", None, None);
    asset(&conn, me, "US", "vehicle", "Pickup", "2021-01-01", "30000", "USD", None, None);
    asset(&conn, me, "ES", "real_estate", "Piso Valencia", "2010-01-01", "200000", "EUR", None, None);

    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(s.holdings.len(), 1);
    let h = &s.holdings[0];
    assert_eq!(h.basis, ValuationBasis::AcquisitionCost);
    assert_eq!(h.valuation_date, common::ymd(2022, 3, 1));
    assert_eq!(h.original_value, dec!(1000));
    // No USD data: reciprocal of the EUR/USD 1.10 table entry.
    assert_eq!(h.value, dec!(909.09));
    assert_eq!(status(&s, HoldingCategory::Securities), (dec!(909.09), ThresholdStatus::Below));
    assert_eq!(s.warnings.len(), 1);
}

#[test]
fn threshold_comes_from_settings_and_is_strict() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let me = entity(&conn, u, "Jordi", "ES");
    let abroad = account(&conn, me, "Revolut", "US", "EUR");
    balance(&conn, abroad, "2024-12-01", "60000");

    taxledger::config::set_setting(&conn, "modelo720_threshold", "60000").unwrap();
    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(status(&s, HoldingCategory::BankAccounts), (dec!(60000), ThresholdStatus::Below));
}

#[test]
fn account_jurisdiction_falls_back_to_entity() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let llc = entity(&conn, u, "Jordi LLC", "US");
    conn.execute(
        "INSERT INTO accounts(entity_id, name, currency_id) VALUES (?1, 'Mercury', ?2)",
        params![llc, currency(&conn, "EUR")],
    )
    .unwrap();
    let acct = conn.last_insert_rowid();
    balance(&conn, acct, "2024-12-31", "51000");

    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(status(&s, HoldingCategory::BankAccounts), (dec!(51000), ThresholdStatus::Above));
    assert_eq!(s.holdings[0].jurisdiction, "US");
}

#[test]
fn home_jurisdiction_is_configurable() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let me = entity(&conn, u, "Jordi", "ES");
    let spanish = account(&conn, me, "Sabadell", "ES", "EUR");
    balance(&conn, spanish, "2024-12-31", "70000");

    taxledger::config::set_setting(&conn, "home_jurisdiction", "us").unwrap();
    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(s.home_jurisdiction, "US");
    assert_eq!(status(&s, HoldingCategory::BankAccounts), (dec!(70000), ThresholdStatus::Above));
}

#[test]
fn same_day_snapshots_use_the_last_written_row() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    let me = entity(&conn, u, "Jordi", "ES");

    let abroad = account(&conn, me, "Wise", "US", "EUR");
    balance(&conn, abroad, "2024-12-31", "70000");
    balance(&conn, abroad, "2024-12-31", "45000");

    let shares = asset(&conn, me, "US", "securities", "Broker shares", "2021-01-01", "1000", "EUR", None, None);
    valuation(&conn, shares, "2024-12-31", "90000", "EUR");
    valuation(&conn, shares, "2024-12-31", "30000", "EUR");

    let s = modelo720::summary(&ReportContext::new(&conn, clock()).unwrap(), u, 2024).unwrap();
    assert_eq!(status(&s, HoldingCategory::BankAccounts), (dec!(45000), ThresholdStatus::Below));
    assert_eq!(status(&s, HoldingCategory::Securities), (dec!(30000), ThresholdStatus::Below));
    let shares_row = s
        .holdings
        .iter()
        .find(|h| h.category == HoldingCategory::Securities)
        .unwrap();
    assert_eq!(shares_row.basis, ValuationBasis::Valuation);
    assert_eq!(shares_row.original_value, dec!(30000));
}

#[test]
fn missing_eur_is_a_configuration_error() {
    let conn = setup();
    let u = user(&conn, "Jordi");
    entity(&conn, u, "Jordi", "ES");
    let cfg = EngineConfig::default().with_reporting_currency(Jurisdiction::Spain, "CHF");
    let ctx = ReportContext::with_config(&conn, clock(), cfg);
    let err = modelo720::summary(&ctx, u, 2024).unwrap_err();
    assert!(matches!(err, LedgerError::ReferenceCurrencyMissing(ref c) if c == "CHF"));
}
