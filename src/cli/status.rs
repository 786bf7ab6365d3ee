use std::path::Path;

use crate::engine::Engine;
use crate::error::Result;
use crate::fmt::format_bytes;

pub fn run(engine: &Engine, path: &Path) -> Result<()> {
    println!("Book file:  {}", path.display());
    if path.exists() {
        let size = std::fs::metadata(path)?.len();
        println!("File size:  {}", format_bytes(size));
    }

    let accounts = engine.get_accounts(None)?.len();
    let transactions = engine.count_transactions()?;
    let payees = engine.get_payees()?.len();
    let scheduled = engine.get_scheduled_transactions()?.len();
    let budgets = engine.get_budgets()?.len();

    println!();
    println!("Accounts:        {accounts}");
    println!("Transactions:    {transactions}");
    println!("Payees:          {payees}");
    println!("Scheduled:       {scheduled}");
    println!("Budgets:         {budgets}");
    Ok(())
}
