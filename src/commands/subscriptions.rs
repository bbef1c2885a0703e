// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{monthly_equivalent, monthly_subscription_cost};
use crate::ids::Id;
use crate::ledger::Ledger;
use crate::models::{BillingCycle, SubscriptionDraft};
use crate::store::KeyValueStore;
use crate::utils::{
    fmt_money, json_flags, maybe_print_json, parse_amount, parse_date, pretty_table, required,
};
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ledger, sub)?,
        Some(("list", sub)) => list(ledger, sub)?,
        Some(("rm", sub)) => {
            let id = Id::from(required(sub, "id")?.trim());
            if !ledger.subscriptions().iter().any(|s| s.id == id) {
                bail!("Subscription '{}' not found", id);
            }
            ledger.delete_subscription(&id)?;
            println!("Removed subscription {}", id);
        }
        Some(("cost", sub)) => cost(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

fn add<S: KeyValueStore>(ledger: &mut Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let name = required(sub, "name")?.trim().to_string();
    let amount = parse_amount(required(sub, "amount")?)?;
    let pocket_id = sub.get_one::<String>("pocket").map(|s| Id::from(s.trim()));
    if let Some(pid) = &pocket_id {
        if ledger.pocket(pid).is_none() {
            bail!("Pocket '{}' not found", pid);
        }
    }
    let draft = SubscriptionDraft {
        name: name.clone(),
        amount,
        category: required(sub, "category")?.trim().to_string(),
        billing_cycle: BillingCycle::from(required(sub, "cycle")?),
        next_billing_date: parse_date(required(sub, "next")?)?,
        pocket_id,
        description: sub
            .get_one::<String>("description")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    let cycle = draft.billing_cycle.label().to_string();
    let id = ledger.add_subscription(draft)?;
    println!(
        "Added subscription '{}' {} {} (id: {})",
        name,
        fmt_money(&amount, ledger.currency()),
        cycle,
        id
    );
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRow {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub billing_cycle: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_equivalent: Decimal,
    pub next_billing_date: String,
    pub category: String,
}

pub fn query_rows<S: KeyValueStore>(ledger: &Ledger<S>) -> Vec<SubscriptionRow> {
    let mut subs: Vec<_> = ledger.subscriptions().iter().collect();
    subs.sort_by_key(|s| s.next_billing_date);
    subs.into_iter()
        .map(|s| SubscriptionRow {
            id: s.id.to_string(),
            name: s.name.clone(),
            amount: s.amount,
            billing_cycle: s.billing_cycle.as_str().to_string(),
            monthly_equivalent: monthly_equivalent(s).round_dp(2),
            next_billing_date: s.next_billing_date.to_string(),
            category: s.category.clone(),
        })
        .collect()
}

fn list<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(ledger);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    format!("{:.2}", r.amount),
                    r.billing_cycle.clone(),
                    format!("{:.2}", r.monthly_equivalent),
                    r.next_billing_date.clone(),
                    r.category.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Amount", "Cycle", "Per month", "Next", "Category", "Id"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CostReport<'a> {
    currency: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    monthly_cost: Decimal,
    subscriptions: usize,
}

fn cost<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let out = CostReport {
        currency: ledger.currency(),
        monthly_cost: monthly_subscription_cost(ledger.subscriptions()).round_dp(2),
        subscriptions: ledger.subscriptions().len(),
    };
    if !maybe_print_json(json_flag, jsonl_flag, &out)? {
        println!(
            "Monthly subscription cost: {} across {} subscription(s)",
            fmt_money(&out.monthly_cost, out.currency),
            out.subscriptions
        );
    }
    Ok(())
}
