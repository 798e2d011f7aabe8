// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::Value;

use super::required;
use crate::clock::Clock;
use crate::tax::{colombia, modelo720, spain, us, ReportContext, TaxSummary};

pub fn handle(conn: &Connection, clock: Arc<dyn Clock>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => {
            let kind = required(sub, "kind")?;
            let subject = if kind == "schedule-e" {
                *sub
                    .get_one::<i64>("asset")
                    .ok_or_else(|| anyhow!("--asset is required for schedule-e"))?
            } else {
                *sub
                    .get_one::<i64>("user")
                    .ok_or_else(|| anyhow!("--user is required for {}", kind))?
            };
            let year = *sub
                .get_one::<i32>("year")
                .ok_or_else(|| anyhow!("--year is required"))?;
            let fmt = required(sub, "format")?.to_lowercase();
            let out = required(sub, "out")?;
            let ctx = ReportContext::new(conn, clock)?;
            export_summary(&ctx, kind, subject, year, &fmt, Path::new(out))?;
            println!("Exported {} {} summary to {}", kind, year, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes one report as CSV (`section,name,amount` rows) or pretty JSON.
///
/// `subject` is the asset id for `schedule-e` and the user id otherwise.
pub fn export_summary(
    ctx: &ReportContext<'_>,
    kind: &str,
    subject: i64,
    year: i32,
    fmt: &str,
    out: &Path,
) -> Result<()> {
    if !matches!(fmt, "csv" | "json") {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }
    let (rows, doc) = match kind {
        "colombia" => summary_rows(&colombia::income_expense_summary(ctx, subject, year)?)?,
        "irpf" => summary_rows(&spain::irpf_summary(ctx, subject, year)?)?,
        "modelo720" => {
            let s = modelo720::summary(ctx, subject, year)?;
            let mut rows = vec![row("threshold", "threshold", s.threshold)];
            for c in &s.categories {
                rows.push(row("category", &c.label, c.total));
                rows.push(text_row("status", &c.label, c.status.as_str()));
            }
            for h in &s.holdings {
                rows.push(row("holding", &h.name, h.value));
            }
            (rows, serde_json::to_value(&s)?)
        }
        "form5472" => {
            let s = us::owner_flow_summary(ctx, subject, year)?;
            let rows = vec![
                row("form_5472", "contributions", s.contributions),
                row("form_5472", "draws", s.draws),
                row("form_5472", "related_party_total", s.related_party_total),
            ];
            (rows, serde_json::to_value(&s)?)
        }
        "schedule-e" => {
            let s = us::schedule_e_summary(ctx, subject, year)?;
            let mut rows = Vec::new();
            for (name, amount) in &s.income_by_category {
                rows.push(row("income_category", name, *amount));
            }
            for (name, amount) in &s.expense_by_category {
                rows.push(row("expense_category", name, *amount));
            }
            rows.push(row("total", "income", s.income_total));
            rows.push(row("total", "expense", s.expense_total));
            rows.push(row("total", "net", s.net_income));
            rows.push(row("total", "depreciation", s.depreciation));
            (rows, serde_json::to_value(&s)?)
        }
        other => bail!(
            "Unknown summary kind: {} (use colombia|irpf|modelo720|form5472|schedule-e)",
            other
        ),
    };

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record(["section", "name", "amount"])?;
        for r in rows {
            wtr.write_record(r)?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    }
    tracing::info!(kind, year, path = %out.display(), fmt, "summary exported");
    Ok(())
}

fn row(section: &str, name: &str, amount: Decimal) -> [String; 3] {
    text_row(section, name, &amount.to_string())
}

fn text_row(section: &str, name: &str, value: &str) -> [String; 3] {
    [section.to_string(), name.to_string(), value.to_string()]
}

fn summary_rows(s: &TaxSummary) -> Result<(Vec<[String; 3]>, Value)> {
    let mut rows = Vec::new();
    for (name, amount) in &s.income_by_category {
        rows.push(row("income_category", name, *amount));
    }
    for (name, amount) in &s.expense_by_category {
        rows.push(row("expense_category", name, *amount));
    }
    for (name, amount) in s.income_by_source.iter().flatten() {
        rows.push(row("income_source", name, *amount));
    }
    for (name, amount) in s.expense_by_source.iter().flatten() {
        rows.push(row("expense_source", name, *amount));
    }
    rows.push(row("total", "income", s.income_total));
    rows.push(row("total", "expense", s.expense_total));
    rows.push(row("total", "net", s.net_income));
    Ok((rows, serde_json::to_value(s)?))
}
