// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{
    CalendarMonth, CategoryTotals, MonthBucket, Period, Summary, TrendAnalysis, analyze_trend, calendar_month,
    daily_transactions, filter_by_period, monthly_subscription_cost, monthly_trend,
    recent_transactions, summarize, top_expense_categories,
};
use crate::analytics::trend::MIN_POPULATED_MONTHS;
use crate::ledger::Ledger;
use crate::models::Flow;
use crate::store::KeyValueStore;
use crate::utils::{
    fmt_money, json_flags, maybe_print_json, optional_date, parse_month, pretty_table, required,
    today,
};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle<S: KeyValueStore>(ledger: &Ledger<S>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(ledger, sub)?,
        Some(("daily", sub)) => daily(ledger, sub)?,
        Some(("calendar", sub)) => calendar(ledger, sub)?,
        Some(("trend", sub)) => trend(ledger, sub)?,
        _ => {}
    }
    Ok(())
}

/// Dashboard figures for one rolling period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub period: Period,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub currency: String,
    #[serde(flatten)]
    pub summary: Summary,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_subscriptions: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pocket_total: Decimal,
    pub recent: Vec<RecentEntry>,
}

#[derive(Debug, Serialize)]
pub struct RecentEntry {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub flow: Flow,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: Option<String>,
}

pub fn dashboard<S: KeyValueStore>(ledger: &Ledger<S>, period: Period, now: NaiveDate) -> DashboardReport {
    let in_period = filter_by_period(ledger.transactions(), period, now);
    DashboardReport {
        period,
        from: period.start(now),
        to: now,
        currency: ledger.currency().to_string(),
        summary: summarize(in_period),
        monthly_subscriptions: monthly_subscription_cost(ledger.subscriptions()).round_dp(2),
        pocket_total: ledger
            .pockets()
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.balance)),
        recent: recent_transactions(ledger.transactions(), 5)
            .into_iter()
            .map(|t| RecentEntry {
                date: t.date,
                flow: t.flow,
                category: t.category.clone(),
                amount: t.amount,
                description: t.description.clone(),
            })
            .collect(),
    }
}

fn summary<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let period = Period::from(required(sub, "period")?);
    let now = optional_date(sub, "as-of")?.unwrap_or_else(today);
    let report = dashboard(ledger, period, now);
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }
    let ccy = &report.currency;
    let s = &report.summary;
    println!("{} to {}", report.from, report.to);
    println!(
        "{}",
        pretty_table(
            &["Income", "Expenses", "Balance", "Subscriptions / month", "In pockets"],
            vec![vec![
                fmt_money(&s.total_income, ccy),
                fmt_money(&s.total_expenses, ccy),
                fmt_money(&s.balance, ccy),
                fmt_money(&report.monthly_subscriptions, ccy),
                fmt_money(&report.pocket_total, ccy),
            ]],
        )
    );
    if !s.expenses_by_category.is_empty() {
        let rows = s
            .expenses_by_category
            .ranked()
            .into_iter()
            .map(|(cat, amt)| vec![cat, format!("{:.2}", amt), share(amt, s.total_expenses)])
            .collect();
        println!("{}", pretty_table(&["Expense category", "Amount", "Share"], rows));
    }
    if !report.recent.is_empty() {
        let rows = report
            .recent
            .iter()
            .map(|r| {
                vec![
                    r.date.to_string(),
                    r.flow.to_string(),
                    r.category.clone(),
                    format!("{:.2}", r.amount),
                    r.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Category", "Amount", "Description"], rows)
        );
    }
    Ok(())
}

fn share(part: Decimal, whole: Decimal) -> String {
    if whole.is_zero() {
        return "0.0%".into();
    }
    match part.checked_div(whole) {
        Some(ratio) => format!("{:.1}%", ratio.saturating_mul(Decimal::ONE_HUNDRED)),
        None => "-".into(),
    }
}

fn daily<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let date = optional_date(sub, "date")?.unwrap_or_else(today);
    let day = daily_transactions(ledger.transactions(), date);
    if maybe_print_json(json_flag, jsonl_flag, &day)? {
        return Ok(());
    }
    let ccy = ledger.currency();
    println!(
        "{}: {} transaction(s), income {}, expense {}, balance {}",
        day.date,
        day.count,
        fmt_money(&day.income, ccy),
        fmt_money(&day.expense, ccy),
        fmt_money(&day.balance, ccy)
    );
    if day.count > 0 {
        let rows = day
            .transactions
            .iter()
            .map(|t| {
                vec![
                    t.flow.to_string(),
                    t.category.clone(),
                    format!("{:.2}", t.amount),
                    t.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Type", "Category", "Amount", "Description"], rows));
    }
    Ok(())
}

pub fn month_grid<S: KeyValueStore>(ledger: &Ledger<S>, month: NaiveDate) -> Result<CalendarMonth> {
    calendar_month(ledger.transactions(), month.year(), month.month())
        .ok_or_else(|| anyhow!("Invalid month {}", month.format("%Y-%m")))
}

fn calendar<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let month = match sub.get_one::<String>("month") {
        Some(s) => parse_month(s)?,
        None => today().with_day(1).context("first of month")?,
    };
    let grid = month_grid(ledger, month)?;
    if maybe_print_json(json_flag, jsonl_flag, &grid)? {
        return Ok(());
    }

    // Seven columns, Sunday first; each cell is the day number plus a
    // +/- marker and heat level for days with activity.
    let mut cells: Vec<String> = vec![String::new(); grid.leading_blanks as usize];
    for d in &grid.days {
        let marker = match d.dominant {
            Some(Flow::Income) => format!(" +{}", d.level),
            Some(Flow::Expense) => format!(" -{}", d.level),
            None => String::new(),
        };
        cells.push(format!("{}{}", d.date.day(), marker));
    }
    while cells.len() % 7 != 0 {
        cells.push(String::new());
    }
    let rows = cells.chunks(7).map(|w| w.to_vec()).collect();
    println!("{}", month.format("%B %Y"));
    println!(
        "{}",
        pretty_table(&["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"], rows)
    );
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub months: Vec<MonthBucket>,
    #[serde(flatten)]
    pub analysis: TrendAnalysis,
    pub outlook: String,
    /// Largest first.
    pub top_expense_categories: CategoryTotals,
}

pub fn trend_report<S: KeyValueStore>(
    ledger: &Ledger<S>,
    months: usize,
    top: usize,
    now: NaiveDate,
) -> TrendReport {
    let buckets = monthly_trend(ledger.transactions(), months, now);
    let analysis = analyze_trend(&buckets);
    let populated = buckets.iter().filter(|b| b.is_populated()).count();
    let outlook = if populated < MIN_POPULATED_MONTHS {
        format!(
            "Not enough data: {} of the last {} months have transactions, trends need {}.",
            populated,
            buckets.len(),
            MIN_POPULATED_MONTHS
        )
    } else {
        analysis.outlook().message().to_string()
    };
    TrendReport {
        top_expense_categories: top_expense_categories(&buckets, top).into_iter().collect(),
        outlook,
        analysis,
        months: buckets,
    }
}

fn trend<S: KeyValueStore>(ledger: &Ledger<S>, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let months = *sub.get_one::<usize>("months").unwrap_or(&6);
    let top = *sub.get_one::<usize>("top").unwrap_or(&5);
    let now = optional_date(sub, "as-of")?.unwrap_or_else(today);
    let report = trend_report(ledger, months, top, now);
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }

    let rows = report
        .months
        .iter()
        .map(|b| {
            vec![
                b.label(),
                format!("{:.2}", b.income),
                format!("{:.2}", b.expenses),
                format!("{:.2}", b.balance),
                b.transaction_count.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expenses", "Balance", "Transactions"], rows)
    );

    let a = &report.analysis;
    println!(
        "{}",
        pretty_table(
            &["Metric", "Value"],
            vec![
                vec!["Average income".into(), format!("{:.2}", a.average_income)],
                vec!["Average expenses".into(), format!("{:.2}", a.average_expenses)],
                vec!["Savings rate".into(), format!("{:.1}%", a.savings_rate)],
                vec!["Income growth / month".into(), format!("{:.1}%", a.income_growth_rate)],
                vec!["Expense growth / month".into(), format!("{:.1}%", a.expense_growth_rate)],
                vec!["Next month income".into(), format!("{:.2}", a.prediction.next_month_income)],
                vec![
                    "Next month expenses".into(),
                    format!("{:.2}", a.prediction.next_month_expenses),
                ],
            ],
        )
    );
    if !report.top_expense_categories.is_empty() {
        let rows = report
            .top_expense_categories
            .iter()
            .map(|(c, v)| vec![c.to_string(), format!("{:.2}", v)])
            .collect();
        println!("{}", pretty_table(&["Top expense category", "Total"], rows));
    }
    println!("{}", report.outlook);
    Ok(())
}
