//! Sample data for exploring the program: a couple of asset accounts
//! funded from Opening Balances, two months of spending, a rent schedule,
//! and a budget.

use chrono::{Duration, Local};
use rust_decimal::Decimal;

use crate::budget::{Budget, BudgetAmounts, BudgetEntry};
use crate::dates::parse_date;
use crate::engine::Engine;
use crate::error::Result;
use crate::models::{
    Account, AccountType, Frequency, Payee, ScheduledTransaction, Split, Transaction,
};

struct DemoAccount {
    account_type: AccountType,
    number: Option<&'static str>,
    name: &'static str,
    parent: Option<&'static str>,
}

const ACCOUNTS: &[DemoAccount] = &[
    DemoAccount { account_type: AccountType::Equity, number: None, name: "Opening Balances", parent: None },
    DemoAccount { account_type: AccountType::Asset, number: None, name: "Checking", parent: None },
    DemoAccount { account_type: AccountType::Asset, number: None, name: "Saving", parent: None },
    DemoAccount { account_type: AccountType::Liability, number: None, name: "Mortgage", parent: None },
    DemoAccount { account_type: AccountType::Liability, number: None, name: "Credit Card", parent: None },
    DemoAccount { account_type: AccountType::Expense, number: Some("300"), name: "Food", parent: None },
    DemoAccount { account_type: AccountType::Expense, number: Some("310"), name: "Restaurants", parent: Some("Food") },
    DemoAccount { account_type: AccountType::Expense, number: Some("400"), name: "Transportation", parent: None },
    DemoAccount { account_type: AccountType::Expense, number: Some("410"), name: "Gas Stations", parent: Some("Transportation") },
    DemoAccount { account_type: AccountType::Expense, number: Some("420"), name: "Car Insurance", parent: Some("Transportation") },
    DemoAccount { account_type: AccountType::Expense, number: Some("500"), name: "Housing", parent: None },
    DemoAccount { account_type: AccountType::Expense, number: Some("510"), name: "Rent", parent: Some("Housing") },
    DemoAccount { account_type: AccountType::Expense, number: Some("520"), name: "Mortgage Interest", parent: Some("Housing") },
    DemoAccount { account_type: AccountType::Expense, number: Some("600"), name: "Medical", parent: None },
    DemoAccount { account_type: AccountType::Expense, number: Some("700"), name: "Taxes", parent: None },
];

/// (date, from account, to account, amount)
const TXNS: &[(&str, &str, &str, &str)] = &[
    ("2018-01-01", "Opening Balances", "Checking", "1000"),
    ("2018-01-01", "Opening Balances", "Saving", "1000"),
    ("2018-01-02", "Checking", "Restaurants", "20"),
    ("2018-01-04", "Checking", "Restaurants", "30"),
    ("2018-01-06", "Checking", "Restaurants", "40"),
    ("2018-01-07", "Checking", "Restaurants", "50"),
    ("2018-01-08", "Checking", "Restaurants", "60"),
    ("2018-01-09", "Saving", "Checking", "100"),
    ("2018-01-10", "Checking", "Restaurants", "70"),
    ("2018-01-11", "Checking", "Restaurants", "80"),
    ("2018-02-11", "Checking", "Restaurants", "90"),
    ("2018-02-12", "Checking", "Housing", "180"),
    ("2018-02-13", "Saving", "Checking", "80.13"),
    ("2018-02-14", "Checking", "Gas Stations", "50"),
    ("2018-02-16", "Checking", "Gas Stations", "10"),
    ("2018-02-17", "Checking", "Gas Stations", "20"),
    ("2018-02-18", "Checking", "Gas Stations", "40"),
    ("2018-02-19", "Checking", "Gas Stations", "30"),
    ("2018-02-21", "Checking", "Gas Stations", "50"),
    ("2018-02-23", "Checking", "Gas Stations", "70"),
    ("2018-02-24", "Checking", "Gas Stations", "90"),
    ("2018-02-25", "Saving", "Checking", "40"),
];

fn dec(s: &str) -> Result<Decimal> {
    crate::amount::parse_amount(s)
}

pub fn run(engine: &Engine) -> Result<()> {
    for spec in ACCOUNTS {
        let mut account = Account::new(spec.account_type, spec.name)?;
        account.number = spec.number.map(str::to_string);
        if let Some(parent) = spec.parent {
            account.parent_id = engine.find_account(parent)?.id;
        }
        engine.save_account(&mut account)?;
    }

    let checking = engine.find_account("Checking")?;
    let restaurants = engine.find_account("Restaurants")?;
    let housing = engine.find_account("Housing")?;
    let gas_stations = engine.find_account("Gas Stations")?;
    let taxes = engine.find_account("Taxes")?;

    // first restaurant visit carries a payee
    let mut burgers = Transaction::new(
        parse_date("2018-01-01")?,
        vec![
            Split::new(checking.clone(), dec("-10")?)
                .with_payee(Payee::new("Joe's Burgers")?),
            Split::new(restaurants.clone(), dec("10")?),
        ],
        "",
    )?;
    engine.save_transaction(&mut burgers)?;

    for (date, from, to, amount) in TXNS {
        let from = engine.find_account(from)?;
        let to = engine.find_account(to)?;
        let amount = dec(amount)?;
        let mut txn = Transaction::new(
            parse_date(date)?,
            vec![Split::new(from, -amount), Split::new(to, amount)],
            "",
        )?;
        engine.save_transaction(&mut txn)?;
    }

    // a split purchase: gas and a meal on one card swipe
    let mut split_purchase = Transaction::new(
        parse_date("2018-02-15")?,
        vec![
            Split::new(checking.clone(), dec("-70")?),
            Split::new(gas_stations.clone(), dec("40")?),
            Split::new(restaurants.clone(), dec("30")?),
        ],
        "",
    )?;
    engine.save_transaction(&mut split_purchase)?;

    let today = Local::now().date_naive();
    let mut rent = ScheduledTransaction::new(
        "rent",
        Frequency::Monthly,
        Some(today - Duration::days(1)),
        vec![
            Split::new(checking.clone(), dec("-100")?),
            Split::new(housing.clone(), dec("100")?),
        ],
    )?;
    engine.save_scheduled_transaction(&mut rent)?;
    let mut tax_bill = ScheduledTransaction::new(
        "taxes",
        Frequency::Yearly,
        Some(today + Duration::days(1)),
        vec![
            Split::new(checking.clone(), dec("-25")?),
            Split::new(taxes.clone(), dec("25")?),
        ],
    )?;
    engine.save_scheduled_transaction(&mut tax_bill)?;

    let mut budget = Budget::for_year(2018)?;
    for (account, amount, carryover) in [
        (restaurants, "500", "0"),
        (gas_stations, "450", "10"),
        (housing, "200", "0"),
    ] {
        budget.entries.push(BudgetEntry {
            account,
            amounts: BudgetAmounts {
                amount: Some(dec(amount)?),
                carryover: Some(dec(carryover)?),
                notes: String::new(),
            },
            spent: Decimal::ZERO,
            income: Decimal::ZERO,
        });
    }
    engine.save_budget(&mut budget)?;

    println!("Demo data loaded. Try:");
    println!("  bricbooks accounts list");
    println!("  bricbooks txn list Checking");
    println!("  bricbooks scheduled list");
    println!("  bricbooks budget report {}", budget.id.unwrap_or(1));
    Ok(())
}
