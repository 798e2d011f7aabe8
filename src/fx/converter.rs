// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::resolver::{FxService, Resolution};
use crate::errors::{LedgerError, Result};
use crate::models::Currency;

/// Money rounding: two places, midpoints away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn apply_rate(amount: Decimal, rate: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| LedgerError::InvalidData(format!("{} x {} overflows", amount, rate)))
}

impl FxService<'_> {
    /// `amount` in `from` expressed in `to`, rounded once at the end.
    pub fn convert(
        &self,
        amount: Decimal,
        from_id: i64,
        to_id: i64,
        date: NaiveDate,
    ) -> Result<Decimal> {
        Ok(self.convert_detailed(amount, from_id, to_id, date)?.0)
    }

    pub fn convert_detailed(
        &self,
        amount: Decimal,
        from_id: i64,
        to_id: i64,
        date: NaiveDate,
    ) -> Result<(Decimal, Resolution)> {
        let resolution = self.resolve_detailed(from_id, to_id, date)?;
        Ok((apply_rate(amount, resolution.rate)?, resolution))
    }

    pub fn convert_into(
        &self,
        amount: Decimal,
        from_id: i64,
        to: &Currency,
        date: NaiveDate,
    ) -> Result<(Decimal, Resolution)> {
        let resolution = if from_id == to.id {
            self.resolve_detailed(from_id, to.id, date)?
        } else {
            let from = crate::utils::currency_by_id(self.connection(), from_id)?;
            self.resolve_pair(&from, to, date)?
        };
        Ok((apply_rate(amount, resolution.rate)?, resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounding_table() {
        let cases = [
            ("100.005", "100.01"),
            ("100.004", "100.00"),
            ("-100.005", "-100.01"),
            ("-100.004", "-100.00"),
            ("0.125", "0.13"),
            ("2.675", "2.68"),
            ("1.0049999", "1.00"),
            ("42", "42"),
        ];
        for (input, expected) in cases {
            assert_eq!(round_money(d(input)), d(expected), "rounding {}", input);
        }
    }

    #[test]
    fn rate_applied_before_single_rounding() {
        // 33.333 * 3 = 99.999, rounded once rather than 33.33 * 3
        assert_eq!(apply_rate(d("33.333"), d("3")).unwrap(), d("100.00"));
        assert_eq!(apply_rate(d("10"), d("0.33335")).unwrap(), d("3.33"));
    }

    #[test]
    fn overflow_is_reported() {
        assert!(apply_rate(Decimal::MAX, d("2")).is_err());
    }
}
