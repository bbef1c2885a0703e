// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ids::Id;
use crate::ledger::Ledger;
use crate::models::{PocketDraft, PocketPatch};
use crate::store::KeyValueStore;
use crate::utils::{
    fmt_money, json_flags, maybe_print_json, optional_date, parse_amount, parse_color,
    parse_decimal, pretty_table, required, today,
};
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("edit", sub)) => edit(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = Id::from(required(sub, "id")?.trim());
            if ledger.pocket(&id).is_none() {
                bail!("Pocket '{}' not found", id);
            }
            ledger.delete_pocket(&id)?;
            println!("Removed pocket {}", id);
        }
        Some(("transfer", sub)) => transfer(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn add<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let name = required(sub, "name")?.trim().to_string();
    if name.is_empty() {
        bail!("Pocket name cannot be empty");
    }
    let balance = parse_decimal(required(sub, "balance")?)?;
    let draft = PocketDraft {
        name: name.clone(),
        color: parse_color(required(sub, "color")?)?,
        icon: required(sub, "icon")?.trim().to_string(),
    };
    let id = ledger.add_pocket(draft, balance)?;
    println!(
        "Added pocket '{}' with {} (id: {})",
        name,
        fmt_money(&balance, ledger.currency()),
        id
    );
    Ok(())
}

fn edit<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let id = Id::from(required(sub, "id")?.trim());
    let patch = PocketPatch {
        name: sub
            .get_one::<String>("name")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        color: sub
            .get_one::<String>("color")
            .map(|s| parse_color(s))
            .transpose()?,
        icon: sub.get_one::<String>("icon").map(|s| s.trim().to_string()),
        balance: sub
            .get_one::<String>("balance")
            .map(|s| parse_decimal(s))
            .transpose()?,
    };
    ledger.update_pocket(&id, patch)?;
    println!("Updated pocket {}", id);
    Ok(())
}

fn transfer<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let from = Id::from(required(sub, "from")?.trim());
    let to = Id::from(required(sub, "to")?.trim());
    let amount = parse_amount(required(sub, "amount")?)?;
    let date = optional_date(sub, "date")?.unwrap_or_else(today);
    let transfer_id = ledger.transfer_between_pockets_on(&from, &to, amount, date)?;
    println!(
        "Moved {} from {} to {} (transfer: {})",
        fmt_money(&amount, ledger.currency()),
        from,
        to,
        transfer_id
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PocketRow {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub color: String,
    pub icon: String,
}

pub fn query_rows<S: KeyValueStore>(ledger: &Ledger<S>) -> Vec<PocketRow> {
    ledger
        .pockets()
        .iter()
        .map(|p| PocketRow {
            id: p.id.to_string(),
            name: p.name.clone(),
            balance: p.balance,
            color: p.color.clone(),
            icon: p.icon.clone(),
        })
        .collect()
}

fn list<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(ledger);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let total = data
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.balance));
        let mut rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.name.clone(),
                    format!("{:.2}", p.balance),
                    p.color.clone(),
                    p.icon.clone(),
                ]
            })
            .collect();
        rows.push(vec![
            String::new(),
            "Total".into(),
            format!("{:.2}", total),
            String::new(),
            String::new(),
        ]);
        println!(
            "{}",
            pretty_table(&["Id", "Name", "Balance", "Color", "Icon"], rows)
        );
    }
    Ok(())
}
