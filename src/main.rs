mod amount;
mod budget;
mod cli;
mod dates;
mod engine;
mod error;
mod export;
mod fmt;
mod ledger;
mod models;
mod settings;
mod storage;

use std::path::Path;

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use cli::{
    AccountsCommands, BudgetCommands, Cli, Commands, PayeesCommands, ScheduledCommands,
    TxnCommands,
};
use engine::Engine;
use error::Result;
use settings::Settings;

fn open_engine(file: Option<&Path>) -> Result<Engine> {
    let path = Settings::load()?.resolve_book_path(file)?;
    Engine::open(&path)
}

fn run(cli: Cli) -> Result<()> {
    let file = cli.file.as_deref();
    match cli.command {
        Commands::Init { data_dir } => cli::init::run(file, data_dir),
        Commands::Accounts { command } => {
            let engine = open_engine(file)?;
            match command {
                AccountsCommands::Add {
                    name,
                    account_type,
                    number,
                    ticker,
                    parent,
                    description,
                } => cli::accounts::add(
                    &engine,
                    &name,
                    &account_type,
                    number.as_deref(),
                    ticker.as_deref(),
                    parent.as_deref(),
                    description.as_deref(),
                ),
                AccountsCommands::List { account_type } => {
                    cli::accounts::list(&engine, account_type.as_deref())
                }
                AccountsCommands::Update {
                    account,
                    name,
                    number,
                    parent,
                    description,
                    close,
                } => cli::accounts::update(
                    &engine,
                    &account,
                    name.as_deref(),
                    number.as_deref(),
                    parent.as_deref(),
                    description.as_deref(),
                    close,
                ),
            }
        }
        Commands::Txn { command } => {
            let engine = open_engine(file)?;
            match command {
                TxnCommands::Add {
                    date,
                    splits,
                    description,
                    payee,
                } => cli::txns::add(
                    &engine,
                    &date,
                    &splits,
                    description.as_deref(),
                    payee.as_deref(),
                ),
                TxnCommands::List {
                    account,
                    transfer_account,
                    status,
                    query,
                } => cli::txns::list(
                    &engine,
                    &account,
                    transfer_account.as_deref(),
                    status.as_deref(),
                    query.as_deref(),
                ),
                TxnCommands::Status { id, account } => cli::txns::status(&engine, id, &account),
                TxnCommands::Edit {
                    id,
                    date,
                    description,
                    payee,
                    splits,
                } => cli::txns::edit(
                    &engine,
                    id,
                    date.as_deref(),
                    description.as_deref(),
                    payee.as_deref(),
                    &splits,
                ),
                TxnCommands::Delete { id } => cli::txns::delete(&engine, id),
            }
        }
        Commands::Payees { command } => {
            let engine = open_engine(file)?;
            match command {
                PayeesCommands::Add { name, notes } => {
                    cli::payees::add(&engine, &name, notes.as_deref())
                }
                PayeesCommands::List => cli::payees::list(&engine),
            }
        }
        Commands::Scheduled { command } => {
            let engine = open_engine(file)?;
            match command {
                ScheduledCommands::Add {
                    name,
                    frequency,
                    next_due_date,
                    splits,
                    payee,
                } => cli::scheduled::add(
                    &engine,
                    &name,
                    &frequency,
                    next_due_date.as_deref(),
                    &splits,
                    payee.as_deref(),
                ),
                ScheduledCommands::List => cli::scheduled::list(&engine),
                ScheduledCommands::Show { id } => cli::scheduled::show(&engine, id),
                ScheduledCommands::Enter { id, date } => {
                    cli::scheduled::enter(&engine, id, date.as_deref())
                }
                ScheduledCommands::Skip { id } => cli::scheduled::skip(&engine, id),
            }
        }
        Commands::Budget { command } => {
            let engine = open_engine(file)?;
            match command {
                BudgetCommands::Add {
                    year,
                    start_date,
                    end_date,
                    name,
                    entries,
                } => cli::budgets::add(
                    &engine,
                    year,
                    start_date.as_deref(),
                    end_date.as_deref(),
                    name.as_deref(),
                    &entries,
                ),
                BudgetCommands::List => cli::budgets::list(&engine),
                BudgetCommands::Show { id } => cli::budgets::show(&engine, id),
                BudgetCommands::Report { id } => cli::budgets::report(&engine, id),
            }
        }
        Commands::Export { dir } => {
            let engine = open_engine(file)?;
            cli::export::run(&engine, &dir)
        }
        Commands::Demo => {
            let engine = open_engine(file)?;
            cli::demo::run(&engine)
        }
        Commands::Status => {
            let path = Settings::load()?.resolve_book_path(file)?;
            let engine = Engine::open(&path)?;
            cli::status::run(&engine, &path)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
