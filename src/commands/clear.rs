// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::KeyValueStore;
use anyhow::{Result, bail};

pub fn handle<S: KeyValueStore>(ledger: &mut Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    if !m.get_flag("yes") {
        bail!("This erases all transactions, subscriptions, categories and pockets. Re-run with --yes to confirm.");
    }
    ledger.clear_all_data()?;
    println!("All data cleared (currency kept: {})", ledger.currency());
    Ok(())
}
