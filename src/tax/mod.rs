// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-jurisdiction tax aggregation.
//!
//! Every aggregator scopes transactions to the entities a user owns, keeps
//! only categories mapped to the jurisdiction's forms, filters by calendar
//! year and by the category's declared direction, then folds amounts into
//! grouped totals. Amounts are summed exactly as stored: expenses are
//! expected to be negative, but no sign is ever flipped here.

pub mod colombia;
pub mod mapping;
pub mod modelo720;
pub mod spain;
pub mod us;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::fx::{DataQualityWarning, FxService};
use crate::models::{CategoryKind, Jurisdiction, TaxForm};
use crate::utils::{sql_id_list, stored_date, stored_decimal};

/// Everything an aggregator needs: the ledger, FX resolution and settings.
pub struct ReportContext<'c> {
    pub conn: &'c Connection,
    pub fx: FxService<'c>,
    pub config: EngineConfig,
    pub clock: Arc<dyn Clock>,
}

impl<'c> ReportContext<'c> {
    /// Loads settings from the database and wires FX resolution from them.
    pub fn new(conn: &'c Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = EngineConfig::load(conn)?;
        Ok(Self::with_config(conn, clock, config))
    }

    pub fn with_config(conn: &'c Connection, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let fx = FxService::from_config(conn, clock.clone(), &config);
        Self {
            conn,
            fx,
            config,
            clock,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxSummary {
    pub jurisdiction: Jurisdiction,
    pub tax_year: i32,
    pub reporting_currency: String,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net_income: Decimal,
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_by_source: Option<BTreeMap<String, Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_by_source: Option<BTreeMap<String, Decimal>>,
    pub transaction_count: usize,
    pub warnings: Vec<DataQualityWarning>,
}

pub(crate) struct SummaryBuilder {
    income_by_category: BTreeMap<String, Decimal>,
    expense_by_category: BTreeMap<String, Decimal>,
    by_source: Option<(BTreeMap<String, Decimal>, BTreeMap<String, Decimal>)>,
    transaction_count: usize,
    warnings: Vec<DataQualityWarning>,
}

impl SummaryBuilder {
    pub(crate) fn new(track_sources: bool) -> Self {
        Self {
            income_by_category: BTreeMap::new(),
            expense_by_category: BTreeMap::new(),
            by_source: track_sources.then(|| (BTreeMap::new(), BTreeMap::new())),
            transaction_count: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn add(
        &mut self,
        kind: CategoryKind,
        category: &str,
        source: Option<&str>,
        amount: Decimal,
    ) {
        let by_category = match kind {
            CategoryKind::Income => &mut self.income_by_category,
            CategoryKind::Expense => &mut self.expense_by_category,
        };
        *by_category.entry(category.to_string()).or_insert(Decimal::ZERO) += amount;
        if let (Some((income, expense)), Some(label)) = (self.by_source.as_mut(), source) {
            let by_source = match kind {
                CategoryKind::Income => income,
                CategoryKind::Expense => expense,
            };
            *by_source.entry(label.to_string()).or_insert(Decimal::ZERO) += amount;
        }
        self.transaction_count += 1;
    }

    pub(crate) fn warn(&mut self, warnings: Vec<DataQualityWarning>) {
        self.warnings.extend(warnings);
    }

    pub(crate) fn finish(
        self,
        jurisdiction: Jurisdiction,
        tax_year: i32,
        reporting_currency: &str,
    ) -> TaxSummary {
        let income_total: Decimal = self.income_by_category.values().copied().sum();
        let expense_total: Decimal = self.expense_by_category.values().copied().sum();
        let (income_by_source, expense_by_source) = match self.by_source {
            Some((i, e)) => (Some(i), Some(e)),
            None => (None, None),
        };
        TaxSummary {
            jurisdiction,
            tax_year,
            reporting_currency: reporting_currency.to_string(),
            income_total,
            expense_total,
            net_income: income_total + expense_total,
            income_by_category: self.income_by_category,
            expense_by_category: self.expense_by_category,
            income_by_source,
            expense_by_source,
            transaction_count: self.transaction_count,
            warnings: self.warnings,
        }
    }
}

/// A transaction that passed entity, category, year and direction filters.
#[derive(Debug, Clone)]
pub(crate) struct TaxableRow {
    pub category_id: i64,
    pub category: String,
    pub kind: CategoryKind,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency_id: i64,
}

pub(crate) fn year_key(year: i32) -> String {
    format!("{:04}", year)
}

pub(crate) fn mapped_category_ids(conn: &Connection, forms: &[TaxForm]) -> Result<Vec<i64>> {
    let codes: Vec<&str> = forms.iter().map(TaxForm::code).collect();
    let sql = format!(
        "SELECT DISTINCT category_id FROM category_tax_mappings
         WHERE tax_form_code IN ({}) ORDER BY category_id",
        placeholders(codes.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(codes.iter()), |r| r.get::<_, i64>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub(crate) fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(",")
}

/// Transactions on the entities' accounts, in mapped categories, in `year`,
/// whose type matches the category direction. `currency_id` restricts to one
/// original currency.
pub(crate) fn load_taxable_rows(
    conn: &Connection,
    entity_ids: &[i64],
    category_ids: &[i64],
    year: i32,
    currency_id: Option<i64>,
) -> Result<Vec<TaxableRow>> {
    if entity_ids.is_empty() || category_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT c.id, c.name, c.income_or_expense, t.transaction_date, t.original_amount,
                t.original_currency_id
         FROM transactions t
         JOIN accounts a ON a.id=t.account_id
         JOIN transaction_categories c ON c.id=t.category_id
         WHERE a.entity_id IN ({})
           AND c.id IN ({})
           AND substr(t.transaction_date,1,4)=?1
           AND t.type=c.income_or_expense
           AND (?2 IS NULL OR t.original_currency_id=?2)
         ORDER BY t.transaction_date, t.id",
        sql_id_list(entity_ids),
        sql_id_list(category_ids)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![year_key(year), currency_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (category_id, category, kind, date, amount, currency_id) = row?;
        out.push(TaxableRow {
            category_id,
            kind: kind.parse()?,
            date: stored_date(&date, "transaction date")?,
            amount: stored_decimal(&amount, &format!("amount in '{}'", category))?,
            category,
            currency_id,
        });
    }
    Ok(out)
}
