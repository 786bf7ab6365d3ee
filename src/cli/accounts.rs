use comfy_table::{Cell, Table};

use crate::engine::Engine;
use crate::error::Result;
use crate::fmt::amount_display;
use crate::models::{Account, AccountType, Commodity, CommodityType};

#[allow(clippy::too_many_arguments)]
pub fn add(
    engine: &Engine,
    name: &str,
    account_type: &str,
    number: Option<&str>,
    ticker: Option<&str>,
    parent: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let account_type = AccountType::parse(account_type)?;
    let mut account = Account::new(account_type, name)?;
    account.number = number.map(str::to_string);
    if account_type == AccountType::Security {
        // each security trades as its own commodity
        let code = ticker.unwrap_or(name);
        let commodity = match engine.get_commodity_by_code(code)? {
            Some(commodity) => commodity,
            None => {
                let mut commodity = Commodity::new(CommodityType::Security, code, name)?;
                engine.save_commodity(&mut commodity)?;
                commodity
            }
        };
        account.commodity_id = commodity.id;
    }
    if let Some(parent) = parent {
        account.parent_id = engine.find_account(parent)?.id;
    }
    if let Some(description) = description {
        account.description = description.to_string();
    }
    engine.save_account(&mut account)?;
    println!("Added account: {}", account.display_name());
    Ok(())
}

pub fn list(engine: &Engine, account_type: Option<&str>) -> Result<()> {
    let account_type = account_type.map(AccountType::parse).transpose()?;
    let accounts = engine.get_accounts(account_type)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Number", "Name", "Current", "Cleared"]);
    for account in &accounts {
        let indent = "  ".repeat(account.child_level);
        let balances = engine.get_current_balances(account)?;
        table.add_row(vec![
            Cell::new(account.id.unwrap_or_default()),
            Cell::new(account.account_type.as_str()),
            Cell::new(account.number.as_deref().unwrap_or_default()),
            Cell::new(format!("{indent}{}", account.name)),
            Cell::new(amount_display(balances.current)),
            Cell::new(amount_display(balances.current_cleared)),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    engine: &Engine,
    account_key: &str,
    name: Option<&str>,
    number: Option<&str>,
    parent: Option<&str>,
    description: Option<&str>,
    close: bool,
) -> Result<()> {
    let mut account = engine.find_account(account_key)?;
    if let Some(name) = name {
        account.name = name.to_string();
    }
    if let Some(number) = number {
        account.number = Some(number.to_string());
    }
    if let Some(parent) = parent {
        account.parent_id = engine.find_account(parent)?.id;
    }
    if let Some(description) = description {
        account.description = description.to_string();
    }
    if close {
        account.closed = true;
    }
    engine.save_account(&mut account)?;
    println!("Updated account: {}", account.display_name());
    Ok(())
}
