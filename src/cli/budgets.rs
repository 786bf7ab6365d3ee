use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::amount::parse_amount;
use crate::budget::{Budget, BudgetAmounts, BudgetEntry, BudgetReportRow};
use crate::dates::parse_date;
use crate::engine::Engine;
use crate::error::{BooksError, Result};
use crate::fmt::amount_display;
use crate::models::AccountType;
use rust_decimal::Decimal;

/// Parse one "account:amount[:carryover]" budget entry argument.
fn parse_entry_spec(engine: &Engine, spec: &str) -> Result<BudgetEntry> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (account_key, amount_str, carryover_str) = match parts.as_slice() {
        [account, amount] => (*account, *amount, None),
        [account, amount, carryover] => (*account, *amount, Some(*carryover)),
        _ => {
            return Err(BooksError::InvalidBudget(format!(
                "invalid entry \"{spec}\" (expected account:amount or account:amount:carryover)"
            )))
        }
    };
    let account = engine.find_account(account_key)?;
    // only expense and income accounts show up in budgets
    if !matches!(
        account.account_type,
        AccountType::Expense | AccountType::Income
    ) {
        return Err(BooksError::InvalidBudget(format!(
            "\"{}\" is {}; budgets only cover expense and income accounts",
            account.name,
            account.account_type.as_str()
        )));
    }
    Ok(BudgetEntry {
        account,
        amounts: BudgetAmounts {
            amount: Some(parse_amount(amount_str)?),
            carryover: carryover_str.map(parse_amount).transpose()?,
            notes: String::new(),
        },
        spent: Decimal::ZERO,
        income: Decimal::ZERO,
    })
}

pub fn add(
    engine: &Engine,
    year: Option<i32>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    name: Option<&str>,
    entries: &[String],
) -> Result<()> {
    let mut budget = match (year, start_date, end_date) {
        (Some(year), _, _) => Budget::for_year(year)?,
        (None, Some(start), Some(end)) => Budget::new(parse_date(start)?, parse_date(end)?)?,
        _ => {
            return Err(BooksError::InvalidBudget(
                "pass --year, or both --start and --end".to_string(),
            ))
        }
    };
    budget.name = name.map(str::to_string);
    for spec in entries {
        budget.entries.push(parse_entry_spec(engine, spec)?);
    }
    engine.save_budget(&mut budget)?;
    println!("Added budget {}", budget.display(true));
    Ok(())
}

pub fn list(engine: &Engine) -> Result<()> {
    let budgets = engine.get_budgets()?;
    if budgets.is_empty() {
        println!("No budgets. Add one with `bricbooks budget add`.");
        return Ok(());
    }
    for budget in budgets {
        println!("{}", budget.display(true));
    }
    Ok(())
}

pub fn show(engine: &Engine, id: i64) -> Result<()> {
    let budget = engine.get_budget(id)?;
    println!("{}", budget.display(false).bold());
    let mut table = Table::new();
    table.set_header(vec!["Account", "Amount", "Carryover", "Notes"]);
    for entry in &budget.entries {
        let Some(amount) = entry.amounts.amount else {
            continue;
        };
        table.add_row(vec![
            Cell::new(entry.account.display_name()),
            Cell::new(amount_display(amount)),
            Cell::new(
                entry
                    .amounts
                    .carryover
                    .map(amount_display)
                    .unwrap_or_default(),
            ),
            Cell::new(&entry.amounts.notes),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn report_table(rows: &[BudgetReportRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Account",
        "Amount",
        "Income",
        "Carryover",
        "Total Budget",
        "Spent",
        "Remaining",
        "Remaining %",
        "Status",
        "Notes",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.amount),
            Cell::new(&row.income),
            Cell::new(&row.carryover),
            Cell::new(&row.total_budget),
            Cell::new(&row.spent),
            Cell::new(&row.remaining),
            Cell::new(&row.remaining_percent),
            Cell::new(&row.current_status),
            Cell::new(&row.notes),
        ]);
    }
    table
}

pub fn report(engine: &Engine, id: i64) -> Result<()> {
    let budget = engine.get_budget(id)?;
    let report = budget.report(Some(Local::now().date_naive()));
    println!("{}", budget.display(false).bold());
    println!("{}\n{}", "Income".bold(), report_table(&report.income));
    println!("{}\n{}", "Expense".bold(), report_table(&report.expense));
    Ok(())
}
