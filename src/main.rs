// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use budgetin::{cli, commands, db, ledger::Ledger};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("budgetin=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("budgetin=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_logging(matches.get_flag("verbose"));

    let db_arg = matches.get_one::<String>("db").map(Path::new);
    let store = db::open_or_init(db_arg)?;
    let mut ledger = Ledger::open(store)?;

    if !commands::dispatch(&mut ledger, &matches)? {
        cli::build_cli().print_help()?;
        println!();
    }
    Ok(())
}
