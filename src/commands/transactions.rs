// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{TransactionFilter, filter_transactions};
use crate::ids::Id;
use crate::ledger::Ledger;
use crate::models::{Flow, Transaction, TransactionDraft};
use crate::store::KeyValueStore;
use crate::utils::{
    json_flags, maybe_print_json, optional_date, parse_amount, pretty_table, required, today,
};
use anyhow::{Result, anyhow, bail};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("rm", sub)) => remove(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn add<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let flow: Flow = required(sub, "type")?.parse().map_err(|e: String| anyhow!(e))?;
    let amount = parse_amount(required(sub, "amount")?)?;
    let category = required(sub, "category")?.trim().to_string();
    if !ledger.state().categories.contains(flow, &category) {
        bail!(
            "Unknown {} category '{}' (see `budgetin category list`)",
            flow,
            category
        );
    }
    let pocket_id = sub.get_one::<String>("pocket").map(|s| Id::from(s.trim()));
    if let Some(pid) = &pocket_id {
        if ledger.pocket(pid).is_none() {
            bail!("Pocket '{}' not found", pid);
        }
    }
    let date = optional_date(sub, "date")?.unwrap_or_else(today);
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let id = ledger.add_transaction(TransactionDraft {
        flow,
        amount,
        category: category.clone(),
        pocket_id,
        date,
        description,
    })?;
    println!(
        "Recorded {} {} {} in '{}' on {} (id: {})",
        flow,
        ledger.currency(),
        amount,
        category,
        date,
        id
    );
    Ok(())
}

fn remove<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = Id::from(required(sub, "id")?.trim());
    let Some(tx) = ledger.transactions().iter().find(|t| t.id == id) else {
        bail!("Transaction '{}' not found", id);
    };
    if let Some(link) = tx.transfer_link() {
        bail!(
            "Transaction '{}' is one leg of transfer '{}'; deleting it would unbalance the pair",
            id,
            link.transfer_id
        );
    }
    ledger.delete_transaction(&id)?;
    println!("Removed transaction {}", id);
    Ok(())
}

fn list<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(ledger, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.flow.clone(),
                    r.category.clone(),
                    format!("{:.2}", r.amount),
                    r.pocket.clone(),
                    r.description.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Type", "Category", "Amount", "Pocket", "Description", "Id"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub flow: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub pocket: String,
    pub description: String,
    pub transfer: bool,
}

impl TransactionRow {
    fn new<S: KeyValueStore>(ledger: &Ledger<S>, t: &Transaction) -> Self {
        let pocket = t
            .pocket_id
            .as_ref()
            .map(|pid| match ledger.pocket(pid) {
                Some(p) => p.name.clone(),
                None => pid.to_string(),
            })
            .unwrap_or_default();
        TransactionRow {
            id: t.id.to_string(),
            date: t.date.to_string(),
            flow: t.flow.to_string(),
            category: t.category.clone(),
            amount: t.amount,
            pocket,
            description: t.description.clone().unwrap_or_default(),
            transfer: t.is_transfer_leg(),
        }
    }
}

/// Rows for `tx list`, newest first, honoring the type/category/date filters
/// and `--limit`.
pub fn query_rows<S: KeyValueStore>(
    ledger: &Ledger<S>,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let flow = sub
        .get_one::<String>("type")
        .map(|s| s.parse::<Flow>().map_err(|e| anyhow!(e)))
        .transpose()?;
    let filter = TransactionFilter {
        flow,
        category: sub.get_one::<String>("category").cloned(),
        from: optional_date(sub, "from")?,
        to: optional_date(sub, "to")?,
    };
    let mut matching = filter_transactions(ledger.transactions(), &filter);
    if let Some(limit) = sub.get_one::<usize>("limit") {
        matching.truncate(*limit);
    }
    Ok(matching
        .into_iter()
        .map(|t| TransactionRow::new(ledger, t))
        .collect())
}
