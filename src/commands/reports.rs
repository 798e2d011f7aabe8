// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use rusqlite::Connection;

use crate::clock::Clock;
use crate::fx::DataQualityWarning;
use crate::tax::{colombia, modelo720, spain, us, ReportContext, TaxSummary};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, clock: Arc<dyn Clock>, m: &clap::ArgMatches) -> Result<()> {
    let ctx = ReportContext::new(conn, clock)?;
    match m.subcommand() {
        Some(("colombia", sub)) => {
            let (user, year) = user_year(sub)?;
            let s = colombia::income_expense_summary(&ctx, user, year)?;
            print_summary(sub, &s)?;
        }
        Some(("irpf", sub)) => {
            let (user, year) = user_year(sub)?;
            let s = spain::irpf_summary(&ctx, user, year)?;
            print_summary(sub, &s)?;
        }
        Some(("modelo720", sub)) => {
            let (user, year) = user_year(sub)?;
            let s = modelo720::summary(&ctx, user, year)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let data = s
                    .categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.label.clone(),
                            fmt_money(&c.total, &s.reporting_currency),
                            c.status.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Total", "Status"], data));
                let holdings = s
                    .holdings
                    .iter()
                    .map(|h| {
                        vec![
                            h.category.label().to_string(),
                            h.name.clone(),
                            h.jurisdiction.clone(),
                            h.valuation_date.to_string(),
                            fmt_money(&h.original_value, &h.original_currency),
                            fmt_money(&h.value, &s.reporting_currency),
                        ]
                    })
                    .collect::<Vec<_>>();
                if !holdings.is_empty() {
                    println!(
                        "{}",
                        pretty_table(
                            &["Category", "Holding", "Where", "Valued", "Original", "Value"],
                            holdings
                        )
                    );
                }
                println!("Threshold: {}", fmt_money(&s.threshold, &s.reporting_currency));
                print_warnings(&s.warnings);
            }
        }
        Some(("form5472", sub)) => {
            let (user, year) = user_year(sub)?;
            let s = us::owner_flow_summary(&ctx, user, year)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let ccy = &s.reporting_currency;
                let data = vec![
                    vec!["Contributions".into(), fmt_money(&s.contributions, ccy)],
                    vec!["Draws".into(), fmt_money(&s.draws, ccy)],
                    vec!["Related-party total".into(), fmt_money(&s.related_party_total, ccy)],
                ];
                println!("{}", pretty_table(&["Form 5472", "Amount"], data));
                print_warnings(&s.warnings);
            }
        }
        Some(("schedule-e", sub)) => {
            let asset = *sub
                .get_one::<i64>("asset")
                .ok_or_else(|| anyhow!("--asset is required"))?;
            let year = *sub
                .get_one::<i32>("year")
                .ok_or_else(|| anyhow!("--year is required"))?;
            let s = us::schedule_e_summary(&ctx, asset, year)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let ccy = &s.reporting_currency;
                let mut data = category_rows("Income", &s.income_by_category, ccy);
                data.extend(category_rows("Expense", &s.expense_by_category, ccy));
                data.push(vec!["".into(), "Net".into(), fmt_money(&s.net_income, ccy)]);
                data.push(vec!["".into(), "Depreciation".into(), fmt_money(&s.depreciation, ccy)]);
                println!("{}", s.asset_name);
                println!("{}", pretty_table(&["Side", "Category", "Amount"], data));
                print_warnings(&s.warnings);
            }
        }
        _ => {}
    }
    Ok(())
}

fn user_year(sub: &clap::ArgMatches) -> Result<(i64, i32)> {
    let user = *sub
        .get_one::<i64>("user")
        .ok_or_else(|| anyhow!("--user is required"))?;
    let year = *sub
        .get_one::<i32>("year")
        .ok_or_else(|| anyhow!("--year is required"))?;
    Ok((user, year))
}

fn category_rows(side: &str, totals: &BTreeMap<String, Decimal>, ccy: &str) -> Vec<Vec<String>> {
    totals
        .iter()
        .map(|(name, amount)| vec![side.to_string(), name.clone(), fmt_money(amount, ccy)])
        .collect()
}

fn print_summary(sub: &clap::ArgMatches, s: &TaxSummary) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
        return Ok(());
    }
    let ccy = &s.reporting_currency;
    let mut data = category_rows("Income", &s.income_by_category, ccy);
    data.extend(category_rows("Expense", &s.expense_by_category, ccy));
    data.push(vec!["".into(), "Income total".into(), fmt_money(&s.income_total, ccy)]);
    data.push(vec!["".into(), "Expense total".into(), fmt_money(&s.expense_total, ccy)]);
    data.push(vec!["".into(), "Net".into(), fmt_money(&s.net_income, ccy)]);
    println!("{}", pretty_table(&["Side", "Category", "Amount"], data));

    if let (Some(income), Some(expense)) = (&s.income_by_source, &s.expense_by_source) {
        let mut sources = category_rows("Income", income, ccy);
        sources.extend(category_rows("Expense", expense, ccy));
        if !sources.is_empty() {
            println!("{}", pretty_table(&["Side", "Source", "Amount"], sources));
        }
    }
    print_warnings(&s.warnings);
    Ok(())
}

/// Data-quality warnings go to stderr so tables stay pipeable.
fn print_warnings(warnings: &[DataQualityWarning]) {
    for w in warnings {
        eprintln!("warning: {}", w);
    }
}
