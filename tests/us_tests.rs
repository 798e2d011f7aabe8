// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{account, asset, category, clock, ecb_rate, entity, map_category, setup, txn, user};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use taxledger::config::EngineConfig;
use taxledger::errors::LedgerError;
use taxledger::models::Jurisdiction;
use taxledger::tax::{us, ReportContext};

#[test]
fn owner_flows_split_by_line_item() {
    let conn = setup();
    let c = &conn;
    let owner = user(c, "Camila");
    let llc = entity(c, owner, "Camila Holdings LLC", "US");
    let mercury = account(c, llc, "Mercury", "US", "USD");
    let wise = account(c, llc, "Wise EUR", "US", "EUR");

    let contribution = category(c, "Capital contribution", "income");
    map_category(c, contribution, "form_5472", us::OWNER_CONTRIBUTION, "US");
    let draw = category(c, "Owner draw", "expense");
    map_category(c, draw, "form_5472", us::OWNER_DRAW, "US");
    let loan = category(c, "Loan from owner", "income");
    map_category(c, loan, "form_5472", "related_party_loan", "US");
    let sales = category(c, "Sales", "income");

    txn(c, mercury, contribution, "income", "2024-01-05", "5000", "USD");
    txn(c, wise, contribution, "income", "2024-04-01", "1000", "EUR");
    ecb_rate(c, "EUR", "USD", "2024-04-01", "1.08");
    txn(c, mercury, draw, "expense", "2024-07-01", "-2000", "USD");
    txn(c, mercury, loan, "income", "2024-09-01", "3000", "USD");
    txn(c, mercury, contribution, "income", "2023-12-31", "400", "USD");
    txn(c, mercury, sales, "income", "2024-05-05", "12345", "USD");

    let ctx = ReportContext::new(c, clock()).unwrap();
    let s = us::owner_flow_summary(&ctx, owner, 2024).unwrap();
    assert_eq!(s.reporting_currency, "USD");
    assert_eq!(s.contributions, dec!(6080.00));
    assert_eq!(s.draws, dec!(-2000));
    assert_eq!(s.related_party_total, dec!(7080.00));
    assert!(s.warnings.is_empty());
}

#[test]
fn owner_flows_without_entities_are_zero() {
    let conn = setup();
    let lonely = user(&conn, "Nobody");
    let ctx = ReportContext::new(&conn, clock()).unwrap();
    let s = us::owner_flow_summary(&ctx, lonely, 2024).unwrap();
    assert_eq!(s.contributions, Decimal::ZERO);
    assert_eq!(s.draws, Decimal::ZERO);
    assert_eq!(s.related_party_total, Decimal::ZERO);
}

#[test]
fn schedule_e_rental_summary() {
    let conn = setup();
    let c = &conn;
    let owner = user(c, "Camila");
    let llc = entity(c, owner, "Camila Rentals LLC", "US");
    let checking = account(c, llc, "Chase", "US", "USD");
    let house = asset(
        c,
        llc,
        "US",
        "real_estate",
        "12 Palm St",
        "2020-01-01",
        "250000",
        "USD",
        Some(27),
        Some("9090.91"),
    );

    let rent = category(c, "Rental income", "income");
    let repairs = category(c, "Repairs", "expense");
    map_category(c, repairs, "schedule_e", "repairs", "US");
    let groceries = category(c, "Groceries", "expense");

    txn(c, checking, rent, "income", "2024-01-01", "2000", "USD");
    txn(c, checking, rent, "income", "2024-02-01", "2000", "USD");
    txn(c, checking, rent, "income", "2023-12-01", "1900", "USD");
    txn(c, checking, repairs, "expense", "2024-03-15", "-500", "USD");
    txn(c, checking, groceries, "expense", "2024-03-16", "-80", "USD");

    let ctx = ReportContext::new(c, clock()).unwrap();
    let s = us::schedule_e_summary(&ctx, house, 2024).unwrap();
    assert_eq!(s.asset_name, "12 Palm St");
    assert_eq!(s.income_by_category["Rental income"], dec!(4000));
    assert_eq!(s.expense_by_category["Repairs"], dec!(-500));
    assert!(!s.expense_by_category.contains_key("Groceries"));
    assert_eq!(s.income_total, dec!(4000));
    assert_eq!(s.expense_total, dec!(-500));
    assert_eq!(s.net_income, dec!(3500));
    assert_eq!(s.depreciation, dec!(9090.91));
}

#[test]
fn schedule_e_depreciation_is_in_dollars() {
    let conn = setup();
    let c = &conn;
    let owner = user(c, "Camila");
    let llc = entity(c, owner, "Camila Rentals LLC", "US");
    let flat = asset(c, llc, "ES", "real_estate", "Piso", "2021-06-01", "100000", "EUR", Some(50), Some("2000"));
    ecb_rate(c, "EUR", "USD", "2024-12-31", "1.04");

    let ctx = ReportContext::new(c, clock()).unwrap();
    let s = us::schedule_e_summary(&ctx, flat, 2024).unwrap();
    assert_eq!(s.depreciation, dec!(2080.00));
    assert_eq!(s.net_income, Decimal::ZERO);
}

#[test]
fn schedule_e_unknown_asset() {
    let conn = setup();
    let ctx = ReportContext::new(&conn, clock()).unwrap();
    let err = us::schedule_e_summary(&ctx, 77, 2024).unwrap_err();
    assert!(matches!(err, LedgerError::AssetNotFound(77)));
}

#[test]
fn missing_usd_fails_both_us_reports() {
    let conn = setup();
    let c = &conn;
    let owner = user(c, "Camila");
    let llc = entity(c, owner, "Camila Rentals LLC", "US");
    let house = asset(c, llc, "US", "real_estate", "12 Palm St", "2020-01-01", "250000", "USD", Some(27), None);

    let cfg = EngineConfig::default().with_reporting_currency(Jurisdiction::UnitedStates, "CAD");
    let ctx = ReportContext::with_config(c, clock(), cfg);
    let err = us::owner_flow_summary(&ctx, owner, 2024).unwrap_err();
    assert!(matches!(err, LedgerError::ReferenceCurrencyMissing(ref c) if c == "CAD"));
    let err = us::schedule_e_summary(&ctx, house, 2024).unwrap_err();
    assert!(matches!(err, LedgerError::ReferenceCurrencyMissing(ref c) if c == "CAD"));
}
