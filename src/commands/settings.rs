// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::json;

use super::required;
use crate::config::{set_setting, EngineConfig};
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let entries = EngineConfig::load(conn)?.entries();
            let items: Vec<_> = entries
                .iter()
                .map(|(k, v)| json!({ "key": k, "value": v }))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = entries.into_iter().map(|(k, v)| vec![k, v]).collect();
                println!("{}", pretty_table(&["Setting", "Value"], data));
            }
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            set_setting(conn, key, value).with_context(|| format!("Setting {}", key))?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}
