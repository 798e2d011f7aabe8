// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Modelo 720: year-end snapshot of holdings outside the home jurisdiction.
//!
//! This is not a transaction aggregation. Each foreign account or asset is
//! valued at its latest snapshot on or before Dec 31 (same-day snapshots go to
//! the highest id), converted to the Spanish reporting currency at the
//! snapshot date and added to its category total. Assets with no valuation
//! fall back to their acquisition cost. Accounts with no balance snapshot are
//! not reported.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

use super::ReportContext;
use crate::errors::{LedgerError, Result};
use crate::fx::DataQualityWarning;
use crate::models::{AssetKind, Jurisdiction};
use crate::utils::{entity_ids_for_user, reference_currency, sql_id_list, stored_date, stored_decimal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingCategory {
    BankAccounts,
    RealEstate,
    Securities,
}

impl HoldingCategory {
    pub const ALL: [HoldingCategory; 3] = [
        HoldingCategory::BankAccounts,
        HoldingCategory::RealEstate,
        HoldingCategory::Securities,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HoldingCategory::BankAccounts => "Bank Accounts",
            HoldingCategory::RealEstate => "Real Estate",
            HoldingCategory::Securities => "Securities",
        }
    }

    /// Vehicles and other assets are not declarable holdings.
    fn for_asset(kind: AssetKind) -> Option<Self> {
        match kind {
            AssetKind::RealEstate => Some(HoldingCategory::RealEstate),
            AssetKind::Securities => Some(HoldingCategory::Securities),
            AssetKind::Vehicle | AssetKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdStatus {
    Above,
    Below,
}

impl ThresholdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdStatus::Above => "above",
            ThresholdStatus::Below => "below",
        }
    }

    /// Strictly greater than the threshold is `Above`.
    pub fn classify(total: Decimal, threshold: Decimal) -> Self {
        if total > threshold {
            ThresholdStatus::Above
        } else {
            ThresholdStatus::Below
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryThreshold {
    pub category: HoldingCategory,
    pub label: String,
    pub total: Decimal,
    pub status: ThresholdStatus,
}

/// How a holding's year-end value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBasis {
    Balance,
    Valuation,
    AcquisitionCost,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignHolding {
    pub category: HoldingCategory,
    pub name: String,
    pub jurisdiction: String,
    pub valuation_date: NaiveDate,
    pub basis: ValuationBasis,
    pub original_value: Decimal,
    pub original_currency: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSummary {
    pub tax_year: i32,
    pub reporting_currency: String,
    pub home_jurisdiction: String,
    pub threshold: Decimal,
    pub categories: Vec<CategoryThreshold>,
    pub holdings: Vec<ForeignHolding>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ThresholdSummary {
    pub fn category(&self, category: HoldingCategory) -> Option<&CategoryThreshold> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// A foreign holding before conversion.
struct Snapshot {
    category: HoldingCategory,
    name: String,
    jurisdiction: String,
    date: NaiveDate,
    basis: ValuationBasis,
    amount: Decimal,
    currency_id: i64,
    currency_code: String,
}

pub fn summary(ctx: &ReportContext<'_>, user_id: i64, tax_year: i32) -> Result<ThresholdSummary> {
    let code = ctx.config.reporting_currency(Jurisdiction::Spain);
    let eur = reference_currency(ctx.conn, code)?;
    let year_end = NaiveDate::from_ymd_opt(tax_year, 12, 31)
        .ok_or_else(|| LedgerError::InvalidData(format!("tax year {}", tax_year)))?;
    let home = ctx.config.home_jurisdiction.as_str();
    let entity_ids = entity_ids_for_user(ctx.conn, user_id)?;

    let mut snapshots = account_snapshots(ctx, &entity_ids, home, year_end)?;
    snapshots.extend(asset_snapshots(ctx, &entity_ids, home, year_end)?);

    let mut warnings = Vec::new();
    let mut holdings = Vec::with_capacity(snapshots.len());
    for snap in snapshots {
        let (value, resolution) = ctx.fx.convert_into(snap.amount, snap.currency_id, &eur, snap.date)?;
        warnings.extend(resolution.warnings);
        holdings.push(ForeignHolding {
            category: snap.category,
            name: snap.name,
            jurisdiction: snap.jurisdiction,
            valuation_date: snap.date,
            basis: snap.basis,
            original_value: snap.amount,
            original_currency: snap.currency_code,
            value,
        });
    }

    let threshold = ctx.config.modelo720_threshold;
    let categories = HoldingCategory::ALL
        .iter()
        .map(|&category| {
            let total: Decimal = holdings
                .iter()
                .filter(|h| h.category == category)
                .map(|h| h.value)
                .sum();
            CategoryThreshold {
                category,
                label: category.label().to_string(),
                total,
                status: ThresholdStatus::classify(total, threshold),
            }
        })
        .collect();

    tracing::debug!(user_id, tax_year, holdings = holdings.len(), "modelo 720 snapshot");
    Ok(ThresholdSummary {
        tax_year,
        reporting_currency: eur.code,
        home_jurisdiction: home.to_string(),
        threshold,
        categories,
        holdings,
        warnings,
    })
}

/// Accounts whose own jurisdiction, or else their entity's, is foreign.
fn account_snapshots(
    ctx: &ReportContext<'_>,
    entity_ids: &[i64],
    home: &str,
    year_end: NaiveDate,
) -> Result<Vec<Snapshot>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT a.id, a.name, j.code, a.currency_id, cur.code
         FROM accounts a
         JOIN entities e ON e.id=a.entity_id
         JOIN jurisdictions j ON j.id=COALESCE(a.jurisdiction_id, e.jurisdiction_id)
         JOIN currencies cur ON cur.id=a.currency_id
         WHERE a.entity_id IN ({}) AND j.code<>?1
         ORDER BY a.id",
        sql_id_list(entity_ids)
    );
    let mut stmt = ctx.conn.prepare(&sql)?;
    let accounts = stmt
        .query_map(params![home], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let year_end = year_end.to_string();
    let mut out = Vec::new();
    for (account_id, name, jurisdiction, currency_id, currency_code) in accounts {
        let latest = ctx
            .conn
            .query_row(
                "SELECT balance_date, balance FROM account_balances
                 WHERE account_id=?1 AND balance_date<=?2
                 ORDER BY balance_date DESC, id DESC LIMIT 1",
                params![account_id, year_end],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((date, balance)) = latest else {
            tracing::debug!(account_id, "no balance snapshot by year end");
            continue;
        };
        out.push(Snapshot {
            category: HoldingCategory::BankAccounts,
            name,
            jurisdiction,
            date: stored_date(&date, "balance date")?,
            basis: ValuationBasis::Balance,
            amount: stored_decimal(&balance, "account balance")?,
            currency_id,
            currency_code,
        });
    }
    Ok(out)
}

fn asset_snapshots(
    ctx: &ReportContext<'_>,
    entity_ids: &[i64],
    home: &str,
    year_end: NaiveDate,
) -> Result<Vec<Snapshot>> {
    if entity_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT a.id, a.name, a.asset_type, j.code, a.acquisition_date, a.acquisition_cost,
                a.acquisition_currency_id, cur.code
         FROM assets a
         JOIN jurisdictions j ON j.id=a.jurisdiction_id
         JOIN currencies cur ON cur.id=a.acquisition_currency_id
         WHERE a.entity_id IN ({}) AND j.code<>?1 AND a.acquisition_date<=?2
         ORDER BY a.id",
        sql_id_list(entity_ids)
    );
    let year_end_key = year_end.to_string();
    let mut stmt = ctx.conn.prepare(&sql)?;
    let assets = stmt
        .query_map(params![home, year_end_key], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, i64>(6)?,
                r.get::<_, String>(7)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Vec::new();
    for (asset_id, name, kind, jurisdiction, acquired, cost, cost_ccy_id, cost_ccy) in assets {
        let Some(category) = HoldingCategory::for_asset(kind.parse()?) else {
            continue;
        };
        let latest = ctx
            .conn
            .query_row(
                "SELECT v.valuation_date, v.value, v.currency_id, c.code
                 FROM asset_valuations v JOIN currencies c ON c.id=v.currency_id
                 WHERE v.asset_id=?1 AND v.valuation_date<=?2
                 ORDER BY v.valuation_date DESC, v.id DESC LIMIT 1",
                params![asset_id, year_end_key],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let snapshot = match latest {
            Some((date, value, currency_id, currency_code)) => Snapshot {
                category,
                name,
                jurisdiction,
                date: stored_date(&date, "valuation date")?,
                basis: ValuationBasis::Valuation,
                amount: stored_decimal(&value, "valuation")?,
                currency_id,
                currency_code,
            },
            None => Snapshot {
                category,
                name,
                jurisdiction,
                date: stored_date(&acquired, "acquisition date")?,
                basis: ValuationBasis::AcquisitionCost,
                amount: stored_decimal(&cost, "acquisition cost")?,
                currency_id: cost_ccy_id,
                currency_code: cost_ccy,
            },
        };
        out.push(snapshot);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        let t = Decimal::new(50_000, 0);
        assert_eq!(ThresholdStatus::classify(Decimal::new(50_000, 0), t), ThresholdStatus::Below);
        assert_eq!(ThresholdStatus::classify(Decimal::new(5_000_001, 2), t), ThresholdStatus::Above);
        assert_eq!(ThresholdStatus::Above.as_str(), "above");
    }

    #[test]
    fn only_declarable_asset_kinds_have_a_category() {
        assert_eq!(HoldingCategory::for_asset(AssetKind::RealEstate), Some(HoldingCategory::RealEstate));
        assert_eq!(HoldingCategory::for_asset(AssetKind::Securities), Some(HoldingCategory::Securities));
        assert_eq!(HoldingCategory::for_asset(AssetKind::Vehicle), None);
    }
}
