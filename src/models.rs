// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Override,
    Ecb,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::Override => "override",
            RateSource::Ecb => "ecb",
        }
    }
}

impl FromStr for RateSource {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "override" => Ok(RateSource::Override),
            "ecb" => Ok(RateSource::Ecb),
            other => Err(LedgerError::InvalidData(format!(
                "unknown rate source '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxRate {
    pub id: i64,
    pub currency_from_id: i64,
    pub currency_to_id: i64,
    pub rate: Decimal,
    pub rate_date: NaiveDate,
    pub source: RateSource,
}

/// Direction a category contributes to: income categories only ever feed the
/// income side of a summary and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(LedgerError::InvalidData(format!(
                "unknown category direction '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxForm {
    ColombianDeclaration,
    Irpf,
    IrpfCapitalGains,
    IrpfForeignIncome,
    Form5472,
    ScheduleE,
}

impl TaxForm {
    /// Code stored in `category_tax_mappings.tax_form_code`.
    pub fn code(&self) -> &'static str {
        match self {
            TaxForm::ColombianDeclaration => "ColombianDeclaration",
            TaxForm::Irpf => "IRPF",
            TaxForm::IrpfCapitalGains => "IRPFCapitalGains",
            TaxForm::IrpfForeignIncome => "IRPFForeignIncome",
            TaxForm::Form5472 => "form_5472",
            TaxForm::ScheduleE => "schedule_e",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxForm::ColombianDeclaration => "Colombian Declaration",
            TaxForm::Irpf => "IRPF",
            TaxForm::IrpfCapitalGains => "IRPF Capital Gains",
            TaxForm::IrpfForeignIncome => "IRPF Foreign Income",
            TaxForm::Form5472 => "Form 5472",
            TaxForm::ScheduleE => "Schedule E",
        }
    }
}

impl FromStr for TaxForm {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let form = match s {
            "ColombianDeclaration" => TaxForm::ColombianDeclaration,
            "IRPF" => TaxForm::Irpf,
            "IRPFCapitalGains" => TaxForm::IrpfCapitalGains,
            "IRPFForeignIncome" => TaxForm::IrpfForeignIncome,
            "form_5472" => TaxForm::Form5472,
            "schedule_e" => TaxForm::ScheduleE,
            other => {
                return Err(LedgerError::InvalidData(format!(
                    "unknown tax form code '{}'",
                    other
                )));
            }
        };
        Ok(form)
    }
}

impl fmt::Display for TaxForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTaxMapping {
    pub id: i64,
    pub category_id: i64,
    pub tax_form_code: String,
    pub line_item: String,
    pub country: String,
}

/// Jurisdictions the engine produces reports for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    Colombia,
    Spain,
    UnitedStates,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 3] = [
        Jurisdiction::Colombia,
        Jurisdiction::Spain,
        Jurisdiction::UnitedStates,
    ];

    /// ISO 3166 alpha-2 code, as stored in `jurisdictions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::Colombia => "CO",
            Jurisdiction::Spain => "ES",
            Jurisdiction::UnitedStates => "US",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|j| j.code().eq_ignore_ascii_case(code.trim()))
    }

    pub fn default_reporting_currency(&self) -> &'static str {
        match self {
            Jurisdiction::Colombia => "COP",
            Jurisdiction::Spain => "EUR",
            Jurisdiction::UnitedStates => "USD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    RealEstate,
    Securities,
    Vehicle,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::RealEstate => "real_estate",
            AssetKind::Securities => "securities",
            AssetKind::Vehicle => "vehicle",
            AssetKind::Other => "other",
        }
    }
}

impl FromStr for AssetKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real_estate" => Ok(AssetKind::RealEstate),
            "securities" => Ok(AssetKind::Securities),
            "vehicle" => Ok(AssetKind::Vehicle),
            "other" => Ok(AssetKind::Other),
            other => Err(LedgerError::InvalidData(format!(
                "unknown asset type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub entity_id: i64,
    pub jurisdiction_id: i64,
    pub kind: AssetKind,
    pub name: String,
    pub acquisition_date: NaiveDate,
    pub acquisition_cost: Decimal,
    pub acquisition_currency_id: i64,
    pub useful_life_years: Option<u32>,
    pub annual_depreciation_amount: Option<Decimal>,
}
