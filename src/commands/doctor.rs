// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::pocket_activity;
use crate::ledger::Ledger;
use crate::models::LedgerState;
use crate::store::KeyValueStore;
use crate::utils::{json_flags, maybe_print_json, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

/// Reference and consistency problems in `state`. None of these block the
/// ledger from working; they point at data edited by hand or imported from a
/// damaged backup.
pub fn diagnose(state: &LedgerState) -> Vec<Issue> {
    let mut out = Vec::new();

    // 1) Transactions pointing at pockets that no longer exist
    for t in &state.transactions {
        if let Some(pid) = &t.pocket_id {
            if !state.pockets.iter().any(|p| &p.id == pid) {
                out.push(issue("unknown_pocket", format!("transaction {} -> pocket {}", t.id, pid)));
            }
        }
    }

    // 2) Transfers must come in matched pairs
    let mut legs: HashMap<&str, usize> = HashMap::new();
    for link in state.transactions.iter().filter_map(|t| t.transfer_link()) {
        *legs.entry(link.transfer_id.as_str()).or_default() += 1;
    }
    let mut unpaired: Vec<_> = legs.into_iter().filter(|(_, n)| *n != 2).collect();
    unpaired.sort();
    for (transfer_id, n) in unpaired {
        out.push(issue("unpaired_transfer", format!("transfer {} has {} leg(s)", transfer_id, n)));
    }

    // 3) Categories missing from the category lists; transfer legs carry a
    // fixed category of their own
    for t in state.transactions.iter().filter(|t| !t.is_transfer_leg()) {
        if !state.categories.contains(t.flow, &t.category) {
            out.push(issue(
                "unknown_category",
                format!("transaction {} uses {} category '{}'", t.id, t.flow, t.category),
            ));
        }
    }

    // 4) Negative pocket balances
    for p in state.pockets.iter().filter(|p| p.balance < Decimal::ZERO) {
        out.push(issue("negative_balance", format!("pocket {} ({}) at {}", p.id, p.name, p.balance)));
    }
    out
}

#[derive(Serialize)]
struct DoctorReport<'a> {
    issues: &'a [Issue],
    pockets: Vec<crate::analytics::PocketActivity>,
}

pub fn handle<S: KeyValueStore>(ledger: &Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(m);
    let state = ledger.state();
    let issues = diagnose(state);
    let activity = pocket_activity(&state.pockets, &state.transactions);

    let report = DoctorReport {
        issues: &issues,
        pockets: activity,
    };
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }

    // The cached balance is authoritative; history only explains part of it.
    let rows = report
        .pockets
        .iter()
        .map(|a| {
            vec![
                a.pocket_id.to_string(),
                a.name.clone(),
                format!("{:.2}", a.cached_balance),
                format!("{:.2}", a.net_from_history),
                format!("{:.2}", a.implied_opening_balance()),
                a.transaction_count.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Pocket", "Name", "Balance", "From history", "Opening/adjusted", "Transactions"],
            rows
        )
    );

    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .iter()
            .map(|i| vec![i.kind.to_string(), i.detail.clone()])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
