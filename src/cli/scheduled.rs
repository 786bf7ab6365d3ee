use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{apply_payee, parse_split_specs};
use crate::dates::parse_date;
use crate::engine::Engine;
use crate::error::Result;
use crate::fmt::amount_display;
use crate::models::{Frequency, ScheduledTransaction};

pub fn add(
    engine: &Engine,
    name: &str,
    frequency: &str,
    next_due_date: Option<&str>,
    splits: &[String],
    payee: Option<&str>,
) -> Result<()> {
    let frequency = Frequency::parse(frequency)?;
    let next_due_date = next_due_date.map(parse_date).transpose()?;
    let mut splits = parse_split_specs(engine, splits)?;
    apply_payee(&mut splits, payee)?;
    let mut scheduled_txn = ScheduledTransaction::new(name, frequency, next_due_date, splits)?;
    engine.save_scheduled_transaction(&mut scheduled_txn)?;
    println!(
        "Added scheduled transaction {}: {name}",
        scheduled_txn.id.unwrap_or_default()
    );
    Ok(())
}

pub fn list(engine: &Engine) -> Result<()> {
    let today = Local::now().date_naive();
    let scheduled_txns = engine.get_scheduled_transactions()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Frequency", "Next Due", "Due?"]);
    for st in scheduled_txns {
        let next_due = st
            .next_due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let due = if st.is_due(today) { "due" } else { "" };
        table.add_row(vec![
            Cell::new(st.id.unwrap_or_default()),
            Cell::new(st.name),
            Cell::new(st.frequency.as_str()),
            Cell::new(next_due),
            Cell::new(due),
        ]);
    }
    println!("Scheduled transactions\n{table}");
    Ok(())
}

pub fn show(engine: &Engine, id: i64) -> Result<()> {
    let st = engine.get_scheduled_transaction(id)?;
    println!("{}", st.name.bold());
    println!("Frequency:  {}", st.frequency.as_str());
    match st.next_due_date {
        Some(due) => println!("Next due:   {}", due.format("%Y-%m-%d")),
        None => println!("Next due:   (none)"),
    }
    if !st.description.is_empty() {
        println!("Description: {}", st.description);
    }
    println!("Splits:");
    for split in &st.splits {
        let payee = split
            .payee
            .as_ref()
            .map(|p| format!("  ({})", p.name))
            .unwrap_or_default();
        println!(
            "  {}  {}{payee}",
            split.account.display_name(),
            amount_display(split.amount)
        );
    }
    Ok(())
}

pub fn enter(engine: &Engine, id: i64, date: Option<&str>) -> Result<()> {
    let date = date.map(parse_date).transpose()?;
    let txn = engine.enter_scheduled_transaction(id, date, None)?;
    println!(
        "Entered transaction {} on {}",
        txn.id.unwrap_or_default(),
        txn.txn_date.format("%Y-%m-%d")
    );
    Ok(())
}

pub fn skip(engine: &Engine, id: i64) -> Result<()> {
    engine.skip_scheduled_transaction(id)?;
    let st = engine.get_scheduled_transaction(id)?;
    match st.next_due_date {
        Some(due) => println!("Skipped; next due {}", due.format("%Y-%m-%d")),
        None => println!("Skipped"),
    }
    Ok(())
}
