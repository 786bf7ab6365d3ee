pub mod accounts;
pub mod budgets;
pub mod demo;
pub mod export;
pub mod init;
pub mod payees;
pub mod scheduled;
pub mod status;
pub mod txns;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::amount::{parse_amount, parse_quantity};
use crate::engine::Engine;
use crate::error::{BooksError, Result};
use crate::models::{Payee, ReconcileStatus, Split, TransactionAction};

/// Parse one "account:amount[:flag[:quantity]]" split argument. The account
/// may be given as id, number, or name. The flag slot takes a reconciled
/// status (C or R) or a share action (share-buy, share-sell, ...); it can be
/// left empty when only a quantity is wanted ("Fund:100::4.5").
pub(crate) fn parse_split_spec(engine: &Engine, spec: &str) -> Result<Split> {
    let parts: Vec<&str> = spec.split(':').collect();
    let (account_key, amount_str, flag_str, quantity_str) = match parts.as_slice() {
        [account, amount] => (*account, *amount, None, None),
        [account, amount, flag] => (*account, *amount, Some(*flag), None),
        [account, amount, flag, quantity] => (*account, *amount, Some(*flag), Some(*quantity)),
        _ => {
            return Err(BooksError::InvalidTransaction(format!(
                "invalid split \"{spec}\" (expected account:amount[:flag[:quantity]])"
            )))
        }
    };
    let account = engine.find_account(account_key)?;
    let amount = parse_amount(amount_str)?;
    let mut split = Split::new(account, amount);
    if let Some(flag) = flag_str {
        match ReconcileStatus::parse(flag) {
            Ok(status) => split.status = status,
            Err(_) => split.action = TransactionAction::parse(flag)?,
        }
    }
    if let Some(quantity) = quantity_str {
        split.quantity = parse_quantity(quantity)?;
    }
    Ok(split)
}

pub(crate) fn parse_split_specs(engine: &Engine, specs: &[String]) -> Result<Vec<Split>> {
    specs
        .iter()
        .map(|spec| parse_split_spec(engine, spec))
        .collect()
}

/// Attach a payee to the first split, which is where ledger rendering
/// looks first.
pub(crate) fn apply_payee(splits: &mut [Split], payee_name: Option<&str>) -> Result<()> {
    if let Some(name) = payee_name {
        if let Some(split) = splits.first_mut() {
            split.payee = Some(Payee::new(name)?);
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "bricbooks",
    about = "Double-entry bookkeeping in a single sqlite file.",
    version
)]
pub struct Cli {
    /// Book file to operate on (default: the book in the data directory)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new book file (or the default one in the data directory).
    Init {
        /// Directory for book files (default: ~/Documents/bricbooks)
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Record and browse transactions.
    Txn {
        #[command(subcommand)]
        command: TxnCommands,
    },
    /// Manage payees.
    Payees {
        #[command(subcommand)]
        command: PayeesCommands,
    },
    /// Manage scheduled (recurring) transactions.
    Scheduled {
        #[command(subcommand)]
        command: ScheduledCommands,
    },
    /// Manage budgets.
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Export all data as tab-separated files.
    Export {
        /// Directory to create the export under
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Load sample data (accounts, transactions, a budget) to explore.
    Demo,
    /// Show the book file and summary statistics.
    Status,
    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Checking'
        name: String,
        /// Account type: asset, security, liability, equity, income, expense
        #[arg(long = "type")]
        account_type: String,
        /// Account number, used for ordering listings
        #[arg(long)]
        number: Option<String>,
        /// Ticker symbol for security accounts (default: the account name)
        #[arg(long)]
        ticker: Option<String>,
        /// Parent account (id, number, or name)
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List accounts, grouped by type.
    List {
        /// Only accounts of this type
        #[arg(long = "type")]
        account_type: Option<String>,
    },
    /// Update an existing account.
    Update {
        /// Account to update (id, number, or name)
        account: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        number: Option<String>,
        /// New parent account (id, number, or name)
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Mark the account closed; it disappears from listings
        #[arg(long)]
        close: bool,
    },
}

#[derive(Subcommand)]
pub enum TxnCommands {
    /// Add a transaction. Splits must balance to zero.
    Add {
        /// Transaction date: YYYY-MM-DD or MM/DD/YYYY
        date: String,
        /// Splits: account:amount[:flag[:quantity]], e.g. Checking:-12.50 Food:12.50
        #[arg(required = true, num_args = 2..)]
        splits: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Payee, recorded on the first split
        #[arg(long)]
        payee: Option<String>,
    },
    /// Show an account's ledger.
    List {
        /// Account (id, number, or name)
        account: String,
        /// Only transactions also touching this account
        #[arg(long = "transfer-account")]
        transfer_account: Option<String>,
        /// Only transactions with this status on the account's split: C or R
        #[arg(long)]
        status: Option<String>,
        /// Case-insensitive search of descriptions and payees
        #[arg(long)]
        query: Option<String>,
    },
    /// Cycle a split's reconciled status: blank -> C -> R -> blank.
    Status {
        /// Transaction id (shown in `bricbooks txn list`)
        id: i64,
        /// The account whose split to update (id, number, or name)
        account: String,
    },
    /// Edit a transaction by id.
    Edit {
        /// Transaction id (shown in `bricbooks txn list`)
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        payee: Option<String>,
        /// Replacement splits: account:amount[:flag[:quantity]]
        #[arg(num_args = 2..)]
        splits: Vec<String>,
    },
    /// Delete a transaction by id.
    Delete {
        /// Transaction id (shown in `bricbooks txn list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PayeesCommands {
    /// Add a payee.
    Add {
        name: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List payees alphabetically.
    List,
}

#[derive(Subcommand)]
pub enum ScheduledCommands {
    /// Add a scheduled transaction.
    Add {
        /// Name, e.g. 'rent'
        name: String,
        /// weekly, monthly, semi_monthly, quarterly, or yearly
        #[arg(long)]
        frequency: String,
        /// Next due date: YYYY-MM-DD
        #[arg(long = "next-due-date")]
        next_due_date: Option<String>,
        /// Splits: account:amount[:flag]
        #[arg(required = true, num_args = 2..)]
        splits: Vec<String>,
        /// Payee, recorded on the first split
        #[arg(long)]
        payee: Option<String>,
    },
    /// List scheduled transactions, flagging the ones that are due.
    List,
    /// Show one scheduled transaction with its splits.
    Show {
        /// Scheduled transaction id
        id: i64,
    },
    /// Record the pending occurrence as a transaction and advance the
    /// schedule.
    Enter {
        /// Scheduled transaction id
        id: i64,
        /// Date for the recorded transaction (default: the due date)
        #[arg(long)]
        date: Option<String>,
    },
    /// Skip the pending occurrence.
    Skip {
        /// Scheduled transaction id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget.
    Add {
        /// Calendar year to budget, e.g. 2026
        #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
        year: Option<i32>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "start", requires = "end_date")]
        start_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "end", requires = "start_date")]
        end_date: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Budgeted amounts: account:amount[:carryover]
        entries: Vec<String>,
    },
    /// List budgets, newest first.
    List,
    /// Show a budget's entered amounts.
    Show {
        /// Budget id (shown in `bricbooks budget list`)
        id: i64,
    },
    /// Budget progress report: budgeted vs actual, with status against the
    /// elapsed time period.
    Report {
        /// Budget id (shown in `bricbooks budget list`)
        id: i64,
    },
}
