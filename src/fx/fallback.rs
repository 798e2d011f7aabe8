// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// How a fallback rate was obtained from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Direct,
    Inverse,
    /// Neither direction is in the table; the rate is 1.
    Unavailable,
}

/// Static pair rates used when no real FX data exists for a date.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRates {
    rates: HashMap<(String, String), Decimal>,
}

impl Default for FallbackRates {
    fn default() -> Self {
        Self::from_pairs([
            ("EUR", "USD", Decimal::new(110, 2)),
            ("EUR", "COP", Decimal::new(4500, 0)),
            ("EUR", "GBP", Decimal::new(85, 2)),
            ("USD", "COP", Decimal::new(4100, 0)),
            ("GBP", "USD", Decimal::new(127, 2)),
        ])
    }
}

impl FallbackRates {
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, Decimal)>,
    {
        let mut table = Self::empty();
        for (from, to, rate) in pairs {
            table.insert(from, to, rate);
        }
        table
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: Decimal) {
        self.rates
            .insert((from.to_uppercase(), to.to_uppercase()), rate);
    }

    /// Direct pair, else reciprocal of the inverse pair, else 1.
    pub fn lookup(&self, from: &str, to: &str) -> (Decimal, FallbackKind) {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        if let Some(rate) = self.rates.get(&(from.clone(), to.clone())) {
            return (*rate, FallbackKind::Direct);
        }
        if let Some(inverse) = self.rates.get(&(to, from)) {
            if !inverse.is_zero() {
                return (Decimal::ONE / *inverse, FallbackKind::Inverse);
            }
        }
        (Decimal::ONE, FallbackKind::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_pair_wins() {
        let table = FallbackRates::default();
        assert_eq!(
            table.lookup("EUR", "USD"),
            (Decimal::new(110, 2), FallbackKind::Direct)
        );
    }

    #[test]
    fn inverse_pair_is_reciprocal() {
        let table = FallbackRates::from_pairs([("EUR", "USD", Decimal::new(110, 2))]);
        let (rate, kind) = table.lookup("usd", "eur");
        assert_eq!(kind, FallbackKind::Inverse);
        assert_eq!(rate, Decimal::ONE / Decimal::new(110, 2));
    }

    #[test]
    fn unknown_pair_is_one() {
        let table = FallbackRates::default();
        assert_eq!(
            table.lookup("JPY", "CHF"),
            (Decimal::ONE, FallbackKind::Unavailable)
        );
        assert_eq!(
            FallbackRates::empty().lookup("EUR", "USD").1,
            FallbackKind::Unavailable
        );
    }
}
