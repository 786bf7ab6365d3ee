//! Turning transactions into the rows a ledger listing shows for one
//! account: withdrawal/deposit columns, the transfer account, status.

use rust_decimal::Decimal;

use crate::fmt::{amount_display, quantity_display};
use crate::models::{Account, AccountType, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRow {
    pub id: String,
    pub date: String,
    pub description: String,
    pub payee: String,
    /// Split type, from the source record (for imported data).
    pub txn_type: String,
    pub action: String,
    pub status: String,
    pub withdrawal: String,
    pub deposit: String,
    /// The other side of the transaction, or "multiple" for 3+ splits.
    pub categories: String,
    pub balance: String,
}

impl LedgerRow {
    /// Build the display row for `txn` as seen from `account`'s ledger.
    pub fn build(account: &Account, txn: &Transaction) -> LedgerRow {
        let account_id = account.id.unwrap_or_default();
        let split = txn.split_for_account(account_id);

        let (withdrawal, deposit) = match split {
            Some(split) => {
                let amount = if account.account_type == AccountType::Security {
                    split.quantity
                } else {
                    split.amount
                };
                if amount < Decimal::ZERO {
                    (amount_display(-amount), String::new())
                } else {
                    (String::new(), amount_display(amount))
                }
            }
            None => (String::new(), String::new()),
        };

        // the payee on our split wins, otherwise any payee on the txn
        let payee = split
            .and_then(|s| s.payee.as_ref())
            .or_else(|| txn.splits.iter().find_map(|s| s.payee.as_ref()))
            .map(|p| p.name.clone())
            .unwrap_or_default();

        let description = if txn.description.is_empty() {
            split.map(|s| s.description.clone()).unwrap_or_default()
        } else {
            txn.description.clone()
        };

        let others: Vec<&Account> = txn
            .splits
            .iter()
            .filter(|s| s.account.id != Some(account_id))
            .map(|s| &s.account)
            .collect();
        let categories = match others.as_slice() {
            [] => String::new(),
            [other] => other.display_name(),
            _ => "multiple".to_string(),
        };

        let balance = match txn.balance {
            Some(balance) if account.account_type == AccountType::Security => {
                quantity_display(balance)
            }
            Some(balance) => amount_display(balance),
            None => String::new(),
        };

        LedgerRow {
            id: txn.id.map(|id| id.to_string()).unwrap_or_default(),
            date: txn.txn_date.format("%Y-%m-%d").to_string(),
            description,
            payee,
            txn_type: split.map(|s| s.split_type.clone()).unwrap_or_default(),
            action: split.map(|s| s.action.as_str().to_string()).unwrap_or_default(),
            status: split
                .and_then(|s| s.status)
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            withdrawal,
            deposit,
            categories,
            balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payee, ReconcileStatus, Split, TransactionAction};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn account(account_type: AccountType, name: &str, id: i64) -> Account {
        let mut a = Account::new(account_type, name).unwrap();
        a.id = Some(id);
        a
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 2).unwrap()
    }

    #[test]
    fn test_withdrawal_and_deposit_columns() {
        let checking = account(AccountType::Asset, "Checking", 1);
        let food = account(AccountType::Expense, "Food", 2);
        let mut txn = Transaction::new(
            date(),
            vec![
                Split::new(checking.clone(), dec("-1234.56")),
                Split::new(food.clone(), dec("1234.56")),
            ],
            "groceries",
        )
        .unwrap();
        txn.id = Some(7);
        txn.balance = Some(dec("-1234.56"));

        let row = LedgerRow::build(&checking, &txn);
        assert_eq!(row.id, "7");
        assert_eq!(row.date, "2018-01-02");
        assert_eq!(row.withdrawal, "1,234.56");
        assert_eq!(row.deposit, "");
        assert_eq!(row.categories, "Food");
        assert_eq!(row.balance, "-1,234.56");

        let row = LedgerRow::build(&food, &txn);
        assert_eq!(row.withdrawal, "");
        assert_eq!(row.deposit, "1,234.56");
        assert_eq!(row.categories, "Checking");
    }

    #[test]
    fn test_categories_multiple_and_numbered_display() {
        let checking = account(AccountType::Asset, "Checking", 1);
        let mut food = account(AccountType::Expense, "Food", 2);
        food.number = Some("300".to_string());
        let gas = account(AccountType::Expense, "Gas", 3);

        let txn = Transaction::new(
            date(),
            vec![
                Split::new(checking.clone(), dec("-50")),
                Split::new(food.clone(), dec("30")),
                Split::new(gas, dec("20")),
            ],
            "",
        )
        .unwrap();
        let row = LedgerRow::build(&checking, &txn);
        assert_eq!(row.categories, "multiple");

        let two_way = Transaction::new(
            date(),
            vec![
                Split::new(checking.clone(), dec("-30")),
                Split::new(food, dec("30")),
            ],
            "",
        )
        .unwrap();
        let row = LedgerRow::build(&checking, &two_way);
        assert_eq!(row.categories, "300 - Food");
    }

    #[test]
    fn test_payee_and_description_fallbacks() {
        let checking = account(AccountType::Asset, "Checking", 1);
        let food = account(AccountType::Expense, "Food", 2);
        let mut checking_split = Split::new(checking.clone(), dec("-5"));
        checking_split.description = "split note".to_string();
        let txn = Transaction::new(
            date(),
            vec![
                checking_split,
                Split::new(food.clone(), dec("5")).with_payee(Payee::new("Wendys").unwrap()),
            ],
            "",
        )
        .unwrap();

        // payee comes from the other split, description from our own
        let row = LedgerRow::build(&checking, &txn);
        assert_eq!(row.payee, "Wendys");
        assert_eq!(row.description, "split note");
    }

    #[test]
    fn test_status_and_action() {
        let checking = account(AccountType::Asset, "Checking", 1);
        let fund = account(AccountType::Security, "Fund", 2);
        let mut fund_split = Split::new(fund.clone(), dec("100")).with_quantity(dec("4.5"));
        fund_split.action = TransactionAction::Buy;
        fund_split.status = Some(ReconcileStatus::Cleared);
        let mut txn = Transaction::new(
            date(),
            vec![Split::new(checking, dec("-100")), fund_split],
            "buy shares",
        )
        .unwrap();
        txn.balance = Some(dec("4.5"));

        let row = LedgerRow::build(&fund, &txn);
        assert_eq!(row.action, "share-buy");
        assert_eq!(row.status, "C");
        // security ledgers show share quantities
        assert_eq!(row.deposit, "4.50");
        assert_eq!(row.balance, "4.5");
    }
}
