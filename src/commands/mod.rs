// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod clear;
pub mod currency;
pub mod doctor;
pub mod exporter;
pub mod importer;
pub mod pockets;
pub mod reports;
pub mod subscriptions;
pub mod transactions;

use crate::ledger::Ledger;
use crate::store::KeyValueStore;
use anyhow::Result;

/// Runs the subcommand in `matches` against `ledger`. Returns `false` when
/// no subcommand was given.
pub fn dispatch<S: KeyValueStore>(ledger: &mut Ledger<S>, matches: &clap::ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("tx", sub)) => transactions::handle(ledger, sub)?,
        Some(("sub", sub)) => subscriptions::handle(ledger, sub)?,
        Some(("pocket", sub)) => pockets::handle(ledger, sub)?,
        Some(("category", sub)) => categories::handle(ledger, sub)?,
        Some(("currency", sub)) => currency::handle(ledger, sub)?,
        Some(("report", sub)) => reports::handle(ledger, sub)?,
        Some(("export", sub)) => exporter::handle(ledger, sub)?,
        Some(("import", sub)) => importer::handle(ledger, sub)?,
        Some(("clear", sub)) => clear::handle(ledger, sub)?,
        Some(("doctor", sub)) => doctor::handle(ledger, sub)?,
        _ => return Ok(false),
    }
    Ok(true)
}
