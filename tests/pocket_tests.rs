// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetin::error::LedgerError;
use budgetin::ledger::Ledger;
use budgetin::store::MemoryStore;
use budgetin::{cli, commands, commands::pockets};
use rust_decimal::Decimal;

fn run(ledger: &mut Ledger<MemoryStore>, args: &[&str]) -> anyhow::Result<()> {
    let argv = std::iter::once("budgetin").chain(args.iter().copied());
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    commands::dispatch(ledger, &matches)?;
    Ok(())
}

fn funded() -> Ledger<MemoryStore> {
    let mut ledger = Ledger::open(MemoryStore::new()).unwrap();
    run(&mut ledger, &["pocket", "edit", "1", "--balance", "100"]).unwrap();
    run(&mut ledger, &["pocket", "edit", "2", "--balance", "50"]).unwrap();
    ledger
}

#[test]
fn transfer_moves_money_and_books_two_legs() {
    let mut ledger = funded();
    run(
        &mut ledger,
        &["pocket", "transfer", "--from", "1", "--to", "2", "--amount", "30", "--date", "2024-05-01"],
    )
    .unwrap();

    let rows = pockets::query_rows(&ledger);
    assert_eq!(rows[0].balance, Decimal::from(70));
    assert_eq!(rows[1].balance, Decimal::from(80));

    let legs = ledger.transactions();
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].description.as_deref(), Some("Transfer to Bank Account"));
    assert_eq!(legs[1].description.as_deref(), Some("Transfer from Cash"));
    assert_eq!(
        legs[0].transfer_link().unwrap().transfer_id,
        legs[1].transfer_link().unwrap().transfer_id
    );
}

#[test]
fn overdrawn_transfer_changes_nothing() {
    let mut ledger = funded();
    let err = run(&mut ledger, &["pocket", "transfer", "--from", "2", "--to", "1", "--amount", "51"])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InsufficientFunds { .. })
    ));
    assert!(ledger.transactions().is_empty());
    assert_eq!(ledger.pockets()[1].balance, Decimal::from(50));
}

#[test]
fn add_edit_and_remove_pocket() {
    let mut ledger = funded();
    run(
        &mut ledger,
        &["pocket", "add", "--name", "Savings", "--color", "#FF9800", "--balance", "250"],
    )
    .unwrap();
    let savings = ledger.pockets().last().unwrap().clone();
    assert_eq!(savings.color, "#ff9800");
    assert_eq!(savings.icon, "wallet");
    assert_eq!(savings.balance, Decimal::from(250));

    run(&mut ledger, &["pocket", "edit", savings.id.as_str(), "--name", "Rainy Day"]).unwrap();
    assert_eq!(ledger.pocket(&savings.id).unwrap().name, "Rainy Day");
    assert_eq!(ledger.pocket(&savings.id).unwrap().balance, Decimal::from(250));

    run(&mut ledger, &["pocket", "rm", savings.id.as_str()]).unwrap();
    assert_eq!(ledger.pockets().len(), 2);
}

#[test]
fn pocket_with_history_cannot_be_removed() {
    let mut ledger = funded();
    run(
        &mut ledger,
        &["tx", "add", "-t", "income", "--amount", "5", "--category", "Gifts", "--pocket", "2"],
    )
    .unwrap();
    let err = run(&mut ledger, &["pocket", "rm", "2"]).unwrap_err();
    assert!(matches!(err.downcast_ref::<LedgerError>(), Some(LedgerError::PocketInUse(_))));
    run(&mut ledger, &["pocket", "rm", "1"]).unwrap();
    let err = run(&mut ledger, &["pocket", "rm", "2"]).unwrap_err();
    assert!(matches!(err.downcast_ref::<LedgerError>(), Some(LedgerError::LastPocket)));
}

#[test]
fn invalid_color_is_rejected() {
    let mut ledger = funded();
    assert!(run(&mut ledger, &["pocket", "add", "--name", "X", "--color", "blue"]).is_err());
    assert_eq!(ledger.pockets().len(), 2);
}
