// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::mapping::{load_mappings, MappingCollapse};
use super::{load_taxable_rows, ReportContext, SummaryBuilder, TaxSummary};
use crate::errors::Result;
use crate::models::{Jurisdiction, TaxForm};
use crate::utils::{entity_ids_for_user, reference_currency};

pub const IRPF_FORMS: [TaxForm; 3] = [
    TaxForm::Irpf,
    TaxForm::IrpfCapitalGains,
    TaxForm::IrpfForeignIncome,
];

pub fn irpf_summary(ctx: &ReportContext<'_>, user_id: i64, tax_year: i32) -> Result<TaxSummary> {
    irpf_summary_with(ctx, user_id, tax_year, MappingCollapse::default())
}

/// IRPF totals in the Spanish reporting currency, grouped by category and by
/// `"{form}: {line item}"` source label.
pub fn irpf_summary_with(
    ctx: &ReportContext<'_>,
    user_id: i64,
    tax_year: i32,
    collapse: MappingCollapse,
) -> Result<TaxSummary> {
    let code = ctx.config.reporting_currency(Jurisdiction::Spain);
    let currency = reference_currency(ctx.conn, code)?;

    let entity_ids = entity_ids_for_user(ctx.conn, user_id)?;
    let mappings = collapse.collapse(&load_mappings(ctx.conn, &IRPF_FORMS)?);
    let category_ids: Vec<i64> = mappings.keys().copied().collect();
    let rows = load_taxable_rows(ctx.conn, &entity_ids, &category_ids, tax_year, None)?;

    let mut summary = SummaryBuilder::new(true);
    for row in rows {
        let (amount, resolution) =
            ctx.fx
                .convert_into(row.amount, row.currency_id, &currency, row.date)?;
        summary.warn(resolution.warnings);
        let label = mappings.get(&row.category_id).map(|m| m.source_label());
        summary.add(row.kind, &row.category, label.as_deref(), amount);
    }
    Ok(summary.finish(Jurisdiction::Spain, tax_year, &currency.code))
}
