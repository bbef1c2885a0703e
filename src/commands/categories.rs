// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::Flow;
use crate::store::KeyValueStore;
use crate::utils::{json_flags, maybe_print_json, pretty_table, required};
use anyhow::{Result, anyhow, bail};
use serde::Serialize;

fn flow_of(sub: &clap::ArgMatches) -> Result<Option<Flow>> {
    sub.get_one::<String>("type")
        .map(|s| s.parse::<Flow>().map_err(|e| anyhow!(e)))
        .transpose()
}

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let flow = flow_of(sub)?.ok_or_else(|| anyhow!("--type is required"))?;
            let name = required(sub, "name")?.trim();
            if name.is_empty() {
                bail!("Category name cannot be empty");
            }
            ledger.add_category(flow, name)?;
            println!("Added {} category '{}'", flow, name);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = query_rows(ledger, flow_of(sub)?);
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|r| vec![r.flow.to_string(), r.name.clone(), r.transactions.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Type", "Category", "Transactions"], rows));
            }
        }
        Some(("rm", sub)) => {
            let flow = flow_of(sub)?.ok_or_else(|| anyhow!("--type is required"))?;
            let name = required(sub, "name")?.trim();
            if !ledger.state().categories.contains(flow, name) {
                bail!("No {} category named '{}'", flow, name);
            }
            ledger.delete_category(flow, name)?;
            println!("Removed {} category '{}'", flow, name);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CategoryRow {
    #[serde(rename = "type")]
    pub flow: Flow,
    pub name: String,
    pub transactions: usize,
}

/// Categories in their stored order, income first, with usage counts.
pub fn query_rows<S: KeyValueStore>(ledger: &Ledger<S>, only: Option<Flow>) -> Vec<CategoryRow> {
    let cats = &ledger.state().categories;
    [Flow::Income, Flow::Expense]
        .into_iter()
        .filter(|f| only.is_none_or(|o| o == *f))
        .flat_map(|flow| {
            cats.names(flow).iter().map(move |name| CategoryRow {
                flow,
                name: name.clone(),
                transactions: ledger
                    .transactions()
                    .iter()
                    .filter(|t| t.flow == flow && &t.category == name)
                    .count(),
            })
        })
        .collect()
}
