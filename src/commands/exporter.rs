// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::KeyValueStore;
use crate::utils::{required, today};
use anyhow::{Context, Result, bail};

/// Column order of the transaction CSV, shared with the importer.
pub const CSV_HEADER: [&str; 7] = [
    "date",
    "type",
    "category",
    "amount",
    "pocket_id",
    "description",
    "transfer_id",
];

pub fn default_export_name() -> String {
    format!("budgetin_export_{}.json", today())
}

pub fn handle<S: KeyValueStore>(ledger: &Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    let fmt = required(m, "format")?.to_lowercase();
    let out = m
        .get_one::<String>("out")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(default_export_name);

    match fmt.as_str() {
        "json" => {
            let snapshot = ledger.export_data();
            std::fs::write(&out, serde_json::to_string_pretty(&snapshot)?)
                .with_context(|| format!("Write {}", out))?;
        }
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out).with_context(|| format!("Create {}", out))?;
            wtr.write_record(CSV_HEADER)?;
            for t in ledger.transactions() {
                wtr.write_record([
                    t.date.to_string(),
                    t.flow.to_string(),
                    t.category.clone(),
                    t.amount.to_string(),
                    t.pocket_id.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                    t.description.clone().unwrap_or_default(),
                    t.transfer_link()
                        .map(|l| l.transfer_id.to_string())
                        .unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        other => bail!("Unknown format: {} (use json|csv)", other),
    }
    println!("Exported {} to {}", fmt, out);
    Ok(())
}
