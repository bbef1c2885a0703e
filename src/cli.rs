// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn flow_arg(required: bool) -> Arg {
    Arg::new("type")
        .long("type")
        .short('t')
        .required(required)
        .value_parser(["income", "expense"])
        .help("income or expense")
}

fn as_of_arg() -> Arg {
    Arg::new("as-of")
        .long("as-of")
        .value_name("YYYY-MM-DD")
        .help("Reference date instead of today")
}

pub fn build_cli() -> Command {
    Command::new("budgetin")
        .about("Personal finance tracker: transactions, pockets, subscriptions and trends")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("BUDGETIN_DB")
                .value_name("PATH")
                .help("State database file (default: platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(tx_cmd())
        .subcommand(sub_cmd())
        .subcommand(pocket_cmd())
        .subcommand(category_cmd())
        .subcommand(currency_cmd())
        .subcommand(report_cmd())
        .subcommand(
            Command::new("export")
                .about("Write a backup of all data")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("FILE")
                        .help("Output file (default: budgetin_export_<date>.json)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("json")
                        .help("json (full backup) or csv (transactions only)"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Load data from a file")
                .arg(Arg::new("path").long("path").required(true).value_name("FILE"))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("json")
                        .help("json (replace from backup) or csv (append transactions)"),
                ),
        )
        .subcommand(
            Command::new("clear").about("Erase all data except currency settings").arg(
                Arg::new("yes")
                    .long("yes")
                    .action(ArgAction::SetTrue)
                    .help("Confirm"),
            ),
        )
        .subcommand(json_args(
            Command::new("doctor").about("Check pocket balances and references"),
        ))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(flow_arg(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("pocket").long("pocket").help("Pocket id"))
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                .arg(Arg::new("description").long("description").short('d')),
        )
        .subcommand(json_args(
            Command::new("list")
                .arg(flow_arg(false))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("from").long("from").value_name("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").value_name("YYYY-MM-DD"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
}

fn sub_cmd() -> Command {
    Command::new("sub")
        .about("Recurring subscriptions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(
                    Arg::new("cycle")
                        .long("cycle")
                        .default_value("monthly")
                        .help("weekly, monthly, quarterly or annually"),
                )
                .arg(Arg::new("next").long("next").required(true).value_name("YYYY-MM-DD"))
                .arg(Arg::new("pocket").long("pocket"))
                .arg(Arg::new("description").long("description").short('d')),
        )
        .subcommand(json_args(Command::new("list")))
        .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
        .subcommand(json_args(
            Command::new("cost").about("Monthly-equivalent subscription cost"),
        ))
}

fn pocket_cmd() -> Command {
    Command::new("pocket")
        .about("Pockets (money containers)")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("color").long("color").default_value("#9e9e9e"))
                .arg(Arg::new("icon").long("icon").default_value("wallet"))
                .arg(Arg::new("balance").long("balance").default_value("0")),
        )
        .subcommand(json_args(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("color").long("color"))
                .arg(Arg::new("icon").long("icon"))
                .arg(
                    Arg::new("balance")
                        .long("balance")
                        .allow_hyphen_values(true)
                        .help("Overwrite the cached balance"),
                ),
        )
        .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
        .subcommand(
            Command::new("transfer")
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Income and expense categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(flow_arg(true))
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(json_args(Command::new("list").arg(flow_arg(false))))
        .subcommand(
            Command::new("rm")
                .arg(flow_arg(true))
                .arg(Arg::new("name").required(true)),
        )
}

fn currency_cmd() -> Command {
    Command::new("currency")
        .about("Display currency")
        .subcommand_required(true)
        .subcommand(Command::new("set").arg(Arg::new("symbol").required(true)))
        .subcommand(
            Command::new("add")
                .about("Register a custom currency and select it")
                .arg(Arg::new("symbol").required(true))
                .arg(Arg::new("name").required(true)),
        )
        .subcommand(json_args(Command::new("list")))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Summaries and trends")
        .subcommand_required(true)
        .subcommand(json_args(
            Command::new("summary")
                .arg(
                    Arg::new("period")
                        .long("period")
                        .default_value("month")
                        .help("week, month, quarter or year"),
                )
                .arg(as_of_arg()),
        ))
        .subcommand(json_args(
            Command::new("daily").arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
        ))
        .subcommand(json_args(
            Command::new("calendar").arg(
                Arg::new("month")
                    .long("month")
                    .value_name("YYYY-MM")
                    .help("Default: current month"),
            ),
        ))
        .subcommand(json_args(
            Command::new("trend")
                .arg(
                    Arg::new("months")
                        .long("months")
                        .default_value("6")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("top")
                        .long("top")
                        .default_value("5")
                        .value_parser(value_parser!(usize)),
                )
                .arg(as_of_arg()),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
