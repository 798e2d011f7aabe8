// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Colombian income tax return (Renta). Only transactions booked in the
//! reporting currency count, and their original amounts are used unconverted.

use super::{load_taxable_rows, mapped_category_ids, ReportContext, SummaryBuilder, TaxSummary};
use crate::errors::Result;
use crate::models::{Jurisdiction, TaxForm};
use crate::utils::{entity_ids_for_user, reference_currency};

pub fn income_expense_summary(
    ctx: &ReportContext<'_>,
    user_id: i64,
    tax_year: i32,
) -> Result<TaxSummary> {
    let code = ctx.config.reporting_currency(Jurisdiction::Colombia);
    let currency = reference_currency(ctx.conn, code)?;

    let entity_ids = entity_ids_for_user(ctx.conn, user_id)?;
    let category_ids = mapped_category_ids(ctx.conn, &[TaxForm::ColombianDeclaration])?;
    let rows = load_taxable_rows(
        ctx.conn,
        &entity_ids,
        &category_ids,
        tax_year,
        Some(currency.id),
    )?;

    let mut summary = SummaryBuilder::new(false);
    for row in &rows {
        summary.add(row.kind, &row.category, None, row.amount);
    }
    tracing::debug!(user_id, tax_year, rows = rows.len(), "colombia summary");
    Ok(summary.finish(Jurisdiction::Colombia, tax_year, &currency.code))
}
