// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod assets;
pub mod doctor;
pub mod exporter;
pub mod fx;
pub mod reports;
pub mod settings;

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use crate::models::Currency;
use crate::utils::{currency_code, find_currency_by_code};

/// Resolves a currency code argument to a row in `currencies`.
pub(crate) fn currency_arg(conn: &Connection, sub: &clap::ArgMatches, name: &str) -> Result<Currency> {
    let raw = sub
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("--{} is required", name))?;
    let code = currency_code(raw)?;
    find_currency_by_code(conn, &code)?.ok_or_else(|| anyhow!("Unknown currency '{}'", code))
}

pub(crate) fn required<'a>(sub: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    sub.get_one::<String>(name)
        .ok_or_else(|| anyhow!("--{} is required", name))
}
