use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{apply_payee, parse_split_specs};
use crate::dates::parse_date;
use crate::engine::{Engine, TransactionFilter};
use crate::error::Result;
use crate::fmt::amount_display;
use crate::ledger::LedgerRow;
use crate::models::{ReconcileStatus, Transaction};

pub fn add(
    engine: &Engine,
    date: &str,
    splits: &[String],
    description: Option<&str>,
    payee: Option<&str>,
) -> Result<()> {
    let date = parse_date(date)?;
    let mut splits = parse_split_specs(engine, splits)?;
    apply_payee(&mut splits, payee)?;
    let mut txn = Transaction::new(date, splits, description.unwrap_or_default())?;
    engine.save_transaction(&mut txn)?;
    println!("Added transaction {}", txn.id.unwrap_or_default());
    Ok(())
}

pub fn list(
    engine: &Engine,
    account_key: &str,
    transfer_account: Option<&str>,
    status: Option<&str>,
    query: Option<&str>,
) -> Result<()> {
    let account = engine.find_account(account_key)?;
    let filter = TransactionFilter {
        transfer_account_id: transfer_account
            .map(|key| engine.find_account(key))
            .transpose()?
            .and_then(|a| a.id),
        status: status.map(ReconcileStatus::parse).transpose()?.flatten(),
        query: query.map(str::to_string),
    };
    let txns = engine.get_transactions(&account, &filter)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Date",
        "Description",
        "Payee",
        "Action",
        "Status",
        "Withdrawal",
        "Deposit",
        "Transfer Account",
        "Balance",
    ]);
    for txn in &txns {
        let row = LedgerRow::build(&account, txn);
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.date),
            Cell::new(row.description),
            Cell::new(row.payee),
            Cell::new(row.action),
            Cell::new(row.status),
            Cell::new(row.withdrawal),
            Cell::new(row.deposit),
            Cell::new(row.categories),
            Cell::new(row.balance),
        ]);
    }
    println!("{}\n{table}", account.display_name().bold());

    if filter.is_empty() {
        let balances = engine.get_current_balances(&account)?;
        println!(
            "Current balance: {}   Cleared: {}",
            amount_display(balances.current),
            amount_display(balances.current_cleared)
        );
    }

    if let Some(account_id) = account.id {
        let due = engine.get_scheduled_transactions_due(Some(&[account_id]))?;
        for st in due {
            println!(
                "{}",
                format!(
                    "Scheduled transaction due: {} ({}) - enter with `bricbooks scheduled enter {}`",
                    st.name,
                    st.next_due_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    st.id.unwrap_or_default()
                )
                .yellow()
            );
        }
    }
    Ok(())
}

/// Cycle the reconciled status of one account's split.
pub fn status(engine: &Engine, id: i64, account_key: &str) -> Result<()> {
    let account = engine.find_account(account_key)?;
    let account_id = account.id.expect("account loaded from storage");
    let mut txn = engine.get_transaction(id)?;
    let split = txn
        .splits
        .iter_mut()
        .find(|s| s.account.id == Some(account_id))
        .ok_or_else(|| {
            crate::error::BooksError::InvalidTransaction(format!(
                "transaction {id} has no split for {}",
                account.display_name()
            ))
        })?;
    split.status = ReconcileStatus::cycle(split.status);
    let new_status = split.status.map(|s| s.as_str()).unwrap_or("(none)");
    engine.save_transaction(&mut txn)?;
    println!("Transaction {id} {} status: {new_status}", account.display_name());
    Ok(())
}

pub fn edit(
    engine: &Engine,
    id: i64,
    date: Option<&str>,
    description: Option<&str>,
    payee: Option<&str>,
    splits: &[String],
) -> Result<()> {
    let mut txn = engine.get_transaction(id)?;
    if let Some(date) = date {
        txn.txn_date = parse_date(date)?;
    }
    if let Some(description) = description {
        txn.description = description.to_string();
    }
    if !splits.is_empty() {
        txn.splits = parse_split_specs(engine, splits)?;
    }
    apply_payee(&mut txn.splits, payee)?;
    engine.save_transaction(&mut txn)?;
    println!("Updated transaction {id}");
    Ok(())
}

pub fn delete(engine: &Engine, id: i64) -> Result<()> {
    engine.delete_transaction(id)?;
    println!("Deleted transaction {id}");
    Ok(())
}
