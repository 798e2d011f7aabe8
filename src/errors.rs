// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures surfaced by the FX and tax engine.
///
/// Missing FX data is never an error: the resolver always degrades to a
/// fallback rate. Only configuration gaps and invalid input end up here.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Reference currency '{0}' is not configured in the currencies table")]
    ReferenceCurrencyMissing(String),

    #[error("Currency id {0} not found")]
    CurrencyNotFound(i64),

    #[error("Asset {0} not found")]
    AssetNotFound(i64),

    #[error("Invalid FX rate '{0}': rates must be positive")]
    InvalidRate(String),

    #[error("Invalid currency code '{0}', expected a 3-letter ISO 4217 code")]
    InvalidCurrencyCode(String),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Unknown setting '{0}'")]
    UnknownSetting(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
