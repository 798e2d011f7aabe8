// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Straight-line depreciation.
//!
//! Years charged are the whole years since acquisition, plus one once the
//! as-of date is on or past the acquisition anniversary of its own year. A
//! part year into which an anniversary falls is charged as a full year.

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::Clock;
use crate::errors::Result;
use crate::fx::round_money;
use crate::models::Asset;
use crate::utils::load_asset;

/// Whole years from `from` to `to`; zero when `to` precedes `from`.
pub fn full_years_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to < from {
        return 0;
    }
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

pub fn depreciation_years(acquired: NaiveDate, as_of: NaiveDate) -> u32 {
    if as_of < acquired {
        return 0;
    }
    let full = full_years_between(acquired, as_of);
    // Feb 29 acquisitions anniversary on Mar 1 in common years.
    let anniversary_reached = (as_of.month(), as_of.day()) >= (acquired.month(), acquired.day());
    if anniversary_reached { full + 1 } else { full }
}

pub fn accumulated_depreciation(asset: &Asset, as_of: NaiveDate) -> Decimal {
    let (Some(_), Some(annual)) = (asset.useful_life_years, asset.annual_depreciation_amount)
    else {
        return Decimal::ZERO;
    };
    let years = Decimal::from(depreciation_years(asset.acquisition_date, as_of));
    round_money(annual * years)
}

/// Depreciation charged within calendar `year`.
pub fn depreciation_for_year(asset: &Asset, year: i32) -> Decimal {
    let end = |y: i32| NaiveDate::from_ymd_opt(y, 12, 31);
    match (end(year), end(year - 1)) {
        (Some(this_end), Some(prev_end)) => {
            accumulated_depreciation(asset, this_end) - accumulated_depreciation(asset, prev_end)
        }
        _ => Decimal::ZERO,
    }
}

/// Share of useful life left, in percent. Never negative; 100 when the asset
/// has no useful life recorded.
pub fn percentage_remaining(asset: &Asset, today: NaiveDate) -> Decimal {
    let life = match asset.useful_life_years {
        Some(l) if l > 0 => Decimal::from(l),
        _ => return Decimal::ONE_HUNDRED,
    };
    let used = Decimal::from(full_years_between(asset.acquisition_date, today));
    let remaining = Decimal::ONE_HUNDRED - used / life * Decimal::ONE_HUNDRED;
    round_money(remaining.max(Decimal::ZERO))
}

pub fn accumulated_depreciation_for(
    conn: &Connection,
    asset_id: i64,
    as_of: NaiveDate,
) -> Result<Decimal> {
    let asset = load_asset(conn, asset_id)?;
    Ok(accumulated_depreciation(&asset, as_of))
}

pub fn percentage_remaining_for(
    conn: &Connection,
    asset_id: i64,
    clock: &dyn Clock,
) -> Result<Decimal> {
    let asset = load_asset(conn, asset_id)?;
    Ok(percentage_remaining(&asset, clock.now().date_naive()))
}

#[derive(Debug, Clone, Serialize)]
pub struct DepreciationReport {
    pub asset_id: i64,
    pub name: String,
    pub as_of: NaiveDate,
    pub acquisition_cost: Decimal,
    pub accumulated: Decimal,
    pub book_value: Decimal,
    pub percentage_remaining: Decimal,
}

pub fn report(
    conn: &Connection,
    asset_id: i64,
    as_of: NaiveDate,
    clock: &dyn Clock,
) -> Result<DepreciationReport> {
    let asset = load_asset(conn, asset_id)?;
    let accumulated = accumulated_depreciation(&asset, as_of);
    Ok(DepreciationReport {
        asset_id: asset.id,
        name: asset.name.clone(),
        as_of,
        acquisition_cost: asset.acquisition_cost,
        accumulated,
        book_value: asset.acquisition_cost - accumulated,
        percentage_remaining: percentage_remaining(&asset, clock.now().date_naive()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetKind;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn asset(acquired: NaiveDate, life: Option<u32>, annual: Option<Decimal>) -> Asset {
        Asset {
            id: 1,
            entity_id: 1,
            jurisdiction_id: 1,
            kind: AssetKind::RealEstate,
            name: "Flat".into(),
            acquisition_date: acquired,
            acquisition_cost: Decimal::new(100_000, 0),
            acquisition_currency_id: 1,
            useful_life_years: life,
            annual_depreciation_amount: annual,
        }
    }

    #[test]
    fn years_count_elapsed_anniversaries() {
        let acq = ymd(2020, 1, 1);
        assert_eq!(depreciation_years(acq, ymd(2019, 12, 31)), 0);
        assert_eq!(depreciation_years(acq, acq), 1);
        assert_eq!(depreciation_years(acq, ymd(2020, 12, 31)), 1);
        assert_eq!(depreciation_years(acq, ymd(2021, 1, 1)), 2);
        assert_eq!(depreciation_years(acq, ymd(2024, 6, 1)), 5);

        // Before this year's anniversary only whole years count.
        let mid = ymd(2020, 7, 15);
        assert_eq!(depreciation_years(mid, ymd(2020, 12, 31)), 1);
        assert_eq!(depreciation_years(mid, ymd(2024, 6, 1)), 3);
        assert_eq!(depreciation_years(mid, ymd(2024, 7, 15)), 5);
        assert_eq!(depreciation_years(mid, ymd(2024, 12, 31)), 5);
    }

    #[test]
    fn leap_day_acquisition() {
        let acq = ymd(2020, 2, 29);
        assert_eq!(full_years_between(acq, ymd(2021, 2, 28)), 0);
        assert_eq!(depreciation_years(acq, ymd(2021, 2, 28)), 0);
        assert_eq!(depreciation_years(acq, ymd(2021, 3, 1)), 2);
        assert_eq!(depreciation_years(acq, ymd(2021, 12, 31)), 2);
    }

    #[test]
    fn missing_fields_mean_no_depreciation() {
        let acq = ymd(2020, 1, 1);
        let annual = Some(Decimal::new(10_000, 0));
        assert_eq!(
            accumulated_depreciation(&asset(acq, None, annual), ymd(2024, 6, 1)),
            Decimal::ZERO
        );
        assert_eq!(
            accumulated_depreciation(&asset(acq, Some(10), None), ymd(2024, 6, 1)),
            Decimal::ZERO
        );
    }

    #[test]
    fn accumulated_and_yearly_charge() {
        let a = asset(ymd(2020, 1, 1), Some(10), Some(Decimal::new(1000033, 2)));
        assert_eq!(
            accumulated_depreciation(&a, ymd(2024, 6, 1)),
            Decimal::new(5000165, 2)
        );
        assert_eq!(depreciation_for_year(&a, 2022), Decimal::new(1000033, 2));
        assert_eq!(depreciation_for_year(&a, 2019), Decimal::ZERO);
    }

    #[test]
    fn percentage_remaining_clamps_at_zero() {
        let a = asset(ymd(2020, 1, 1), Some(4), Some(Decimal::new(10_000, 0)));
        assert_eq!(percentage_remaining(&a, ymd(2021, 6, 1)), Decimal::new(75, 0));
        assert_eq!(percentage_remaining(&a, ymd(2030, 6, 1)), Decimal::ZERO);
        let b = asset(ymd(2020, 1, 1), Some(3), None);
        assert_eq!(percentage_remaining(&b, ymd(2021, 1, 1)), Decimal::new(6667, 2));
        let c = asset(ymd(2020, 1, 1), None, None);
        assert_eq!(percentage_remaining(&c, ymd(2030, 1, 1)), Decimal::ONE_HUNDRED);
    }
}
