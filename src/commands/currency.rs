// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::KeyValueStore;
use crate::utils::{json_flags, maybe_print_json, pretty_table, required};
use anyhow::Result;
use serde::Serialize;

/// Symbols offered without registering a custom currency.
pub const BUILTIN_CURRENCIES: &[(&str, &str)] = &[
    ("Rp", "Indonesian Rupiah"),
    ("$", "US Dollar"),
    ("€", "Euro"),
    ("£", "British Pound"),
    ("¥", "Japanese Yen"),
];

#[derive(Debug, Serialize)]
pub struct CurrencyRow {
    pub symbol: String,
    pub name: String,
    pub custom: bool,
    pub current: bool,
}

pub fn query_rows<S: KeyValueStore>(ledger: &Ledger<S>) -> Vec<CurrencyRow> {
    let current = ledger.currency();
    let builtin = BUILTIN_CURRENCIES.iter().map(|(s, n)| (s.to_string(), n.to_string(), false));
    let custom = ledger
        .state()
        .custom_currencies
        .iter()
        .map(|c| (c.symbol.clone(), c.name.clone(), true));
    builtin
        .chain(custom)
        .map(|(symbol, name, custom)| CurrencyRow {
            current: symbol == current,
            symbol,
            name,
            custom,
        })
        .collect()
}

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            ledger.set_currency(required(sub, "symbol")?)?;
            println!("Currency set to {}", ledger.currency());
        }
        Some(("add", sub)) => {
            ledger.add_custom_currency(required(sub, "symbol")?, required(sub, "name")?)?;
            println!("Added custom currency {} and selected it", ledger.currency());
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = query_rows(ledger);
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            if r.current { "*".into() } else { String::new() },
                            r.symbol.clone(),
                            r.name.clone(),
                            if r.custom { "custom".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["", "Symbol", "Name", ""], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
