//! TSV export of the whole book: one accounts file, one ledger file per
//! asset account, one file per budget.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use unicode_normalization::UnicodeNormalization;

use crate::engine::{Engine, TransactionFilter};
use crate::error::Result;
use crate::ledger::LedgerRow;
use crate::models::AccountType;

/// Strip a name down to something safe for a filename.
fn to_ascii(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "_")
        .nfkd()
        .filter(|c| c.is_ascii() && (c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .collect()
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

/// Export everything into a timestamped directory under `directory`,
/// returning the directory created.
pub fn export(engine: &Engine, directory: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    let export_dir = directory.join(format!("bricbooks_export_{timestamp}"));
    fs::create_dir_all(&export_dir)?;

    let accounts = engine.get_accounts(None)?;

    let mut writer = tsv_writer(&export_dir.join("accounts.tsv"))?;
    writer.write_record(["type", "number", "name"])?;
    for account in &accounts {
        writer.write_record([
            account.account_type.as_str(),
            account.number.as_deref().unwrap_or(""),
            &account.name,
        ])?;
    }
    writer.flush()?;

    for account in &accounts {
        if account.account_type != AccountType::Asset {
            continue;
        }
        let filename = format!("acc_{}.tsv", to_ascii(&account.name));
        let mut writer = tsv_writer(&export_dir.join(filename))?;
        writer.write_record(["date", "type", "description", "amount", "transfer account"])?;
        let txns = engine.get_transactions(account, &TransactionFilter::default())?;
        for txn in &txns {
            let row = LedgerRow::build(account, txn);
            let amount = if row.withdrawal.is_empty() {
                row.deposit
            } else {
                format!("-{}", row.withdrawal)
            };
            writer.write_record([
                &row.date,
                &row.txn_type,
                &row.description,
                &amount,
                &row.categories,
            ])?;
        }
        writer.flush()?;
    }

    for budget in engine.get_budgets()? {
        let filename = format!(
            "budget_{}_{}.tsv",
            budget.start_date.format("%Y-%m-%d"),
            budget.end_date.format("%Y-%m-%d")
        );
        let mut writer = tsv_writer(&export_dir.join(filename))?;
        writer.write_record([
            "account",
            "amount",
            "income",
            "carryover",
            "total budget",
            "spent",
            "remaining",
            "remaining percent",
            "current status",
            "notes",
        ])?;
        let report = budget.report(None);
        for row in report.expense.iter().chain(report.income.iter()) {
            writer.write_record([
                &row.name,
                &row.amount,
                &row.income,
                &row.carryover,
                &row.total_budget,
                &row.spent,
                &row.remaining,
                &row.remaining_percent,
                &row.current_status,
                &row.notes,
            ])?;
        }
        writer.flush()?;
    }

    Ok(export_dir)
}
