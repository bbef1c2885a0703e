// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ids::Id;
use crate::ledger::Ledger;
use crate::models::{Flow, Snapshot, TransactionDraft};
use crate::store::KeyValueStore;
use crate::utils::{parse_date, parse_decimal, required};
use anyhow::{Context, Result, anyhow, bail};
use csv::ReaderBuilder;

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    let path = required(m, "path")?.trim();
    match required(m, "format")?.to_lowercase().as_str() {
        "json" => import_snapshot(ledger, path),
        "csv" => import_transactions(ledger, path),
        other => bail!("Unknown format: {} (use json|csv)", other),
    }
}

/// Replaces the ledger contents from an export file. A file that does not
/// parse leaves the ledger untouched; single records that do not parse are
/// left out and counted.
fn import_snapshot<S: KeyValueStore>(ledger: &mut Ledger<S>, path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid budgetin export", path))?;
    let skipped = snapshot.skipped_records;
    ledger.import_data(snapshot)?;
    println!(
        "Imported {} transaction(s) and {} pocket(s) from {}",
        ledger.transactions().len(),
        ledger.pockets().len(),
        path
    );
    if skipped > 0 {
        println!("Skipped {} malformed record(s)", skipped);
    }
    Ok(())
}

/// Appends ordinary transactions from a CSV in the export column order.
/// Every row is validated before the first one is recorded. Transfer legs are
/// skipped: replaying one half of a transfer would unbalance its pockets.
fn import_transactions<S: KeyValueStore>(ledger: &mut Ledger<S>, path: &str) -> Result<()> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let mut drafts = Vec::new();
    let mut skipped = 0usize;
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let line = i + 2;
        let field = |idx: usize, name: &str| -> Result<String> {
            rec.get(idx)
                .map(|s| s.trim().to_string())
                .with_context(|| format!("line {}: {} missing", line, name))
        };
        if !field(6, "transfer_id").unwrap_or_default().is_empty() {
            skipped += 1;
            continue;
        }
        let date_raw = field(0, "date")?;
        let date = parse_date(&date_raw).with_context(|| format!("line {}", line))?;
        let flow: Flow = field(1, "type")?
            .parse()
            .map_err(|e: String| anyhow!("line {}: {}", line, e))?;
        let category = field(2, "category")?;
        let amount = parse_decimal(&field(3, "amount")?).with_context(|| format!("line {}", line))?;
        let pocket_id = Some(field(4, "pocket_id").unwrap_or_default())
            .filter(|s| !s.is_empty())
            .map(Id::from);
        if let Some(pid) = &pocket_id {
            if ledger.pocket(pid).is_none() {
                bail!("line {}: pocket '{}' not found", line, pid);
            }
        }
        let description = Some(field(5, "description").unwrap_or_default()).filter(|s| !s.is_empty());
        drafts.push(TransactionDraft {
            flow,
            amount,
            category,
            pocket_id,
            date,
            description,
        });
    }

    let count = drafts.len();
    for draft in drafts {
        ledger.add_transaction(draft)?;
    }
    if skipped > 0 {
        tracing::warn!(skipped, "transfer legs in CSV were not imported");
    }
    println!("Imported {} transaction(s) from {}", count, path);
    Ok(())
}
