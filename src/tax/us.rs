// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! US reporting: Form 5472 owner flows for a foreign-owned LLC and the
//! Schedule E rental summary for a single property.

use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{year_key, ReportContext};
use crate::depreciation::depreciation_for_year;
use crate::errors::Result;
use crate::fx::DataQualityWarning;
use crate::models::{CategoryKind, Currency, Jurisdiction, TaxForm};
use crate::utils::{
    entity_ids_for_user, load_asset, reference_currency, sql_id_list, stored_date, stored_decimal,
};

pub const OWNER_CONTRIBUTION: &str = "owner_contribution";
pub const OWNER_DRAW: &str = "owner_draw";

#[derive(Debug, Clone, Serialize)]
pub struct OwnerFlowSummary {
    pub tax_year: i32,
    pub reporting_currency: String,
    pub contributions: Decimal,
    pub draws: Decimal,
    pub related_party_total: Decimal,
    pub warnings: Vec<DataQualityWarning>,
}

pub fn owner_flow_summary(
    ctx: &ReportContext<'_>,
    user_id: i64,
    tax_year: i32,
) -> Result<OwnerFlowSummary> {
    let code = ctx.config.reporting_currency(Jurisdiction::UnitedStates);
    let usd = reference_currency(ctx.conn, code)?;
    let entity_ids = entity_ids_for_user(ctx.conn, user_id)?;

    let mut warnings = Vec::new();
    let contributions = line_item_total(
        ctx,
        &entity_ids,
        &usd,
        tax_year,
        Some(OWNER_CONTRIBUTION),
        &mut warnings,
    )?;
    let draws = line_item_total(ctx, &entity_ids, &usd, tax_year, Some(OWNER_DRAW), &mut warnings)?;
    let related_party_total =
        line_item_total(ctx, &entity_ids, &usd, tax_year, None, &mut warnings)?;

    Ok(OwnerFlowSummary {
        tax_year,
        reporting_currency: usd.code,
        contributions,
        draws,
        related_party_total,
        warnings,
    })
}

/// Sum of Form 5472 transactions converted to `target`, optionally limited
/// to categories mapped to one line item.
fn line_item_total(
    ctx: &ReportContext<'_>,
    entity_ids: &[i64],
    target: &Currency,
    tax_year: i32,
    line_item: Option<&str>,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<Decimal> {
    if entity_ids.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let sql = format!(
        "SELECT t.transaction_date, t.original_amount, t.original_currency_id
         FROM transactions t
         JOIN accounts a ON a.id=t.account_id
         WHERE a.entity_id IN ({})
           AND substr(t.transaction_date,1,4)=?1
           AND t.category_id IN (
               SELECT category_id FROM category_tax_mappings
               WHERE tax_form_code=?2 AND (?3 IS NULL OR line_item=?3))
         ORDER BY t.transaction_date, t.id",
        sql_id_list(entity_ids)
    );
    let mut stmt = ctx.conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![year_key(tax_year), TaxForm::Form5472.code(), line_item],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
            ))
        },
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut total = Decimal::ZERO;
    for row in rows {
        let (date, amount, currency_id) = row;
        let date = stored_date(&date, "transaction date")?;
        let amount = stored_decimal(&amount, "transaction amount")?;
        let (converted, resolution) = ctx.fx.convert_into(amount, currency_id, target, date)?;
        warnings.extend(resolution.warnings);
        total += converted;
    }
    Ok(total)
}

#[derive(Debug, Clone, Serialize)]
pub struct RentalSummary {
    pub asset_id: i64,
    pub asset_name: String,
    pub tax_year: i32,
    pub reporting_currency: String,
    pub income_total: Decimal,
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
    pub expense_total: Decimal,
    pub net_income: Decimal,
    /// Charged for the tax year, in the reporting currency. Not netted in.
    pub depreciation: Decimal,
    pub warnings: Vec<DataQualityWarning>,
}

/// Rental income and expenses on the accounts of the asset's entity.
///
/// A category is a rental category when its name contains "rental" or it is
/// mapped to Schedule E; its declared direction decides the side.
pub fn schedule_e_summary(
    ctx: &ReportContext<'_>,
    asset_id: i64,
    tax_year: i32,
) -> Result<RentalSummary> {
    let code = ctx.config.reporting_currency(Jurisdiction::UnitedStates);
    let usd = reference_currency(ctx.conn, code)?;
    let asset = load_asset(ctx.conn, asset_id)?;

    let mut stmt = ctx.conn.prepare(
        "SELECT c.name, c.income_or_expense, t.transaction_date, t.original_amount,
                t.original_currency_id
         FROM transactions t
         JOIN accounts a ON a.id=t.account_id
         JOIN transaction_categories c ON c.id=t.category_id
         WHERE a.entity_id=?1
           AND substr(t.transaction_date,1,4)=?2
           AND t.type=c.income_or_expense
           AND (c.name LIKE '%rental%'
                OR c.id IN (SELECT category_id FROM category_tax_mappings WHERE tax_form_code=?3))
         ORDER BY t.transaction_date, t.id",
    )?;
    let rows = stmt.query_map(
        params![asset.entity_id, year_key(tax_year), TaxForm::ScheduleE.code()],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, i64>(4)?,
            ))
        },
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut income_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut expense_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut warnings = Vec::new();
    for row in rows {
        let (category, kind, date, amount, currency_id) = row;
        let date: NaiveDate = stored_date(&date, "transaction date")?;
        let amount = stored_decimal(&amount, "transaction amount")?;
        let (converted, resolution) = ctx.fx.convert_into(amount, currency_id, &usd, date)?;
        warnings.extend(resolution.warnings);
        let bucket = match kind.parse::<CategoryKind>()? {
            CategoryKind::Income => &mut income_by_category,
            CategoryKind::Expense => &mut expense_by_category,
        };
        *bucket.entry(category).or_insert(Decimal::ZERO) += converted;
    }

    let income_total: Decimal = income_by_category.values().copied().sum();
    let expense_total: Decimal = expense_by_category.values().copied().sum();

    let mut depreciation = depreciation_for_year(&asset, tax_year);
    if let Some(year_end) = NaiveDate::from_ymd_opt(tax_year, 12, 31) {
        if !depreciation.is_zero() {
            let (converted, resolution) =
                ctx.fx
                    .convert_into(depreciation, asset.acquisition_currency_id, &usd, year_end)?;
            warnings.extend(resolution.warnings);
            depreciation = converted;
        }
    }

    Ok(RentalSummary {
        asset_id: asset.id,
        asset_name: asset.name.clone(),
        tax_year,
        reporting_currency: usd.code,
        income_total,
        income_by_category,
        expense_by_category,
        expense_total,
        net_income: income_total + expense_total,
        depreciation,
        warnings,
    })
}
