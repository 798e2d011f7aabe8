// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use crate::clock::Clock;
use crate::depreciation;
use crate::utils::{maybe_print_json, parse_date, pretty_table};

pub fn handle(conn: &Connection, clock: Arc<dyn Clock>, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("depreciation", sub)) = m.subcommand() {
        let asset = *sub
            .get_one::<i64>("asset")
            .ok_or_else(|| anyhow!("--asset is required"))?;
        let as_of = match sub.get_one::<String>("as-of") {
            Some(s) => parse_date(s)?,
            None => clock.now().date_naive(),
        };
        let r = depreciation::report(conn, asset, as_of, clock.as_ref())?;
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
            let data = vec![
                vec!["Acquisition cost".into(), format!("{:.2}", r.acquisition_cost)],
                vec!["Accumulated".into(), format!("{:.2}", r.accumulated)],
                vec!["Book value".into(), format!("{:.2}", r.book_value)],
                vec!["Remaining %".into(), format!("{:.2}", r.percentage_remaining)],
            ];
            println!("{} as of {}", r.name, r.as_of);
            println!("{}", pretty_table(&["Depreciation", "Value"], data));
        }
    }
    Ok(())
}
