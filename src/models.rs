//! Business objects. They know nothing about storage or the CLI.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::dates;
use crate::error::{BooksError, Result};
use crate::fmt::amount_display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommodityType {
    Currency,
    Security,
}

impl CommodityType {
    pub const ALL: [CommodityType; 2] = [CommodityType::Currency, CommodityType::Security];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommodityType::Currency => "currency",
            CommodityType::Security => "security",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "currency" => Ok(CommodityType::Currency),
            "security" => Ok(CommodityType::Security),
            _ => Err(BooksError::Other(format!(
                "invalid commodity type \"{value}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commodity {
    pub id: Option<i64>,
    pub commodity_type: CommodityType,
    pub code: String,
    pub name: String,
}

impl Commodity {
    pub fn new(commodity_type: CommodityType, code: &str, name: &str) -> Result<Self> {
        if code.is_empty() {
            return Err(BooksError::Other("commodity must have a code".to_string()));
        }
        if name.is_empty() {
            return Err(BooksError::Other("commodity must have a name".to_string()));
        }
        Ok(Commodity {
            id: None,
            commodity_type,
            code: code.to_string(),
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Asset,
    /// Mutual funds, stocks: anything traded in shares.
    Security,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    /// Display/listing order: assets first, equity last.
    pub const ALL: [AccountType; 6] = [
        AccountType::Asset,
        AccountType::Security,
        AccountType::Liability,
        AccountType::Income,
        AccountType::Expense,
        AccountType::Equity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Security => "security",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Income => "income",
            AccountType::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "asset" => Ok(AccountType::Asset),
            "security" => Ok(AccountType::Security),
            "liability" => Ok(AccountType::Liability),
            "equity" => Ok(AccountType::Equity),
            "income" => Ok(AccountType::Income),
            "expense" => Ok(AccountType::Expense),
            _ => Err(BooksError::InvalidAccount(format!(
                "invalid account type \"{value}\""
            ))),
        }
    }
}

/// Extra per-account data stored as JSON: only the keys `term`,
/// `fixed-interest` and `interest-rate-percent` are allowed.
pub fn validate_other_data(other_data: &serde_json::Value) -> Result<()> {
    let obj = other_data
        .as_object()
        .ok_or_else(|| BooksError::InvalidAccount("other_data must be an object".to_string()))?;
    for (key, value) in obj {
        match key.as_str() {
            "term" => {
                let ok = value.as_str().is_some_and(|term| {
                    term.len() > 1
                        && term.ends_with(['y', 'm', 'w', 'd'])
                        && term[..term.len() - 1].chars().all(|c| c.is_ascii_digit())
                });
                if !ok {
                    return Err(BooksError::InvalidAccount(format!(
                        "invalid term value: {value}"
                    )));
                }
            }
            "fixed-interest" => {
                if !value.is_boolean() {
                    return Err(BooksError::InvalidAccount(format!(
                        "invalid fixed-interest value: {value}"
                    )));
                }
            }
            "interest-rate-percent" => {
                if !value.is_string() && !value.is_number() {
                    return Err(BooksError::InvalidAccount(format!(
                        "invalid interest-rate-percent value: {value}"
                    )));
                }
            }
            _ => {
                return Err(BooksError::InvalidAccount(format!("invalid key: {key}")));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Option<i64>,
    pub account_type: AccountType,
    pub commodity_id: Option<i64>,
    pub number: Option<String>,
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: String,
    pub alternate_id: String,
    pub closed: bool,
    pub other_data: serde_json::Value,
    /// Depth under its top-level ancestor, for indented listings.
    pub child_level: usize,
}

impl Account {
    pub fn new(account_type: AccountType, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(BooksError::InvalidAccount(
                "account must have a name".to_string(),
            ));
        }
        Ok(Account {
            id: None,
            account_type,
            commodity_id: None,
            number: None,
            name: name.to_string(),
            parent_id: None,
            description: String::new(),
            alternate_id: String::new(),
            closed: false,
            other_data: serde_json::json!({}),
            child_level: 0,
        })
    }

    /// "410 - Gas Stations" when numbered, otherwise just the name.
    pub fn display_name(&self) -> String {
        match &self.number {
            Some(number) => format!("{} - {}", number, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub id: Option<i64>,
    pub name: String,
    pub notes: String,
}

impl Payee {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(BooksError::Other("must pass in a payee name".to_string()));
        }
        Ok(Payee {
            id: None,
            name: name.to_string(),
            notes: String::new(),
        })
    }
}

/// Reconciled state of one split: cleared against a statement, or fully
/// reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
    Cleared,
    Reconciled,
}

impl ReconcileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStatus::Cleared => "C",
            ReconcileStatus::Reconciled => "R",
        }
    }

    pub fn parse(value: &str) -> Result<Option<Self>> {
        match value.to_uppercase().as_str() {
            "" => Ok(None),
            "C" => Ok(Some(ReconcileStatus::Cleared)),
            "R" => Ok(Some(ReconcileStatus::Reconciled)),
            _ => Err(BooksError::InvalidTransaction(format!(
                "invalid reconciled state \"{value}\""
            ))),
        }
    }

    /// none -> cleared -> reconciled -> none
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(ReconcileStatus::Cleared),
            Some(ReconcileStatus::Cleared) => Some(ReconcileStatus::Reconciled),
            Some(ReconcileStatus::Reconciled) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionAction {
    #[default]
    Default,
    Buy,
    Sell,
    Split,
    Reinvest,
    Add,
    Remove,
}

impl TransactionAction {
    pub const ALL: [TransactionAction; 7] = [
        TransactionAction::Default,
        TransactionAction::Buy,
        TransactionAction::Sell,
        TransactionAction::Split,
        TransactionAction::Reinvest,
        TransactionAction::Add,
        TransactionAction::Remove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionAction::Default => "",
            TransactionAction::Buy => "share-buy",
            TransactionAction::Sell => "share-sell",
            TransactionAction::Split => "share-split",
            TransactionAction::Reinvest => "share-reinvest",
            TransactionAction::Add => "share-add",
            TransactionAction::Remove => "share-remove",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "" => Ok(TransactionAction::Default),
            "share-buy" => Ok(TransactionAction::Buy),
            "share-sell" => Ok(TransactionAction::Sell),
            "share-split" => Ok(TransactionAction::Split),
            "share-reinvest" => Ok(TransactionAction::Reinvest),
            "share-add" => Ok(TransactionAction::Add),
            "share-remove" => Ok(TransactionAction::Remove),
            _ => Err(BooksError::InvalidTransaction(format!(
                "invalid action \"{value}\""
            ))),
        }
    }
}

/// One leg of a transaction. Carries a full copy of its account so ledger
/// rendering and validation don't need to go back to storage.
#[derive(Debug, Clone)]
pub struct Split {
    pub account: Account,
    pub amount: Decimal,
    pub quantity: Decimal,
    pub status: Option<ReconcileStatus>,
    pub payee: Option<Payee>,
    pub split_type: String,
    pub description: String,
    pub action: TransactionAction,
    pub reconcile_date: Option<NaiveDate>,
}

impl Split {
    pub fn new(account: Account, amount: Decimal) -> Self {
        Split {
            account,
            amount,
            quantity: amount,
            status: None,
            payee: None,
            split_type: String::new(),
            description: String::new(),
            action: TransactionAction::Default,
            reconcile_date: None,
        }
    }

    pub fn with_payee(mut self, payee: Payee) -> Self {
        self.payee = Some(payee);
        self
    }

    pub fn with_status(mut self, status: ReconcileStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Splits must balance to zero, and share actions only make sense against
/// security accounts.
pub fn check_splits(splits: &[Split]) -> Result<()> {
    if splits.is_empty() {
        return Err(BooksError::InvalidTransaction(
            "transaction must have splits".to_string(),
        ));
    }
    let total: Decimal = splits.iter().map(|s| s.amount).sum();
    for split in splits {
        if split.action != TransactionAction::Default
            && split.account.account_type != AccountType::Security
        {
            return Err(BooksError::InvalidTransaction(
                "actions can only be used with security accounts".to_string(),
            ));
        }
    }
    if !total.is_zero() {
        let amounts: Vec<String> = splits.iter().map(|s| amount_display(s.amount)).collect();
        return Err(BooksError::InvalidTransaction(format!(
            "splits don't balance: {}",
            amounts.join(", ")
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub txn_date: NaiveDate,
    pub entry_date: Option<NaiveDate>,
    pub description: String,
    pub alternate_id: String,
    pub splits: Vec<Split>,
    /// Running balance, attached by the engine for unfiltered ledger views.
    pub balance: Option<Decimal>,
}

impl Transaction {
    pub fn new(txn_date: NaiveDate, splits: Vec<Split>, description: &str) -> Result<Self> {
        check_splits(&splits)?;
        Ok(Transaction {
            id: None,
            txn_date,
            entry_date: None,
            description: description.to_string(),
            alternate_id: String::new(),
            splits,
            balance: None,
        })
    }

    pub fn split_for_account(&self, account_id: i64) -> Option<&Split> {
        self.splits.iter().find(|s| s.account.id == Some(account_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Monthly,
    SemiMonthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::SemiMonthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::SemiMonthly => "semi_monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "semi_monthly" => Ok(Frequency::SemiMonthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(BooksError::InvalidScheduledTransaction(format!(
                "invalid frequency \"{value}\""
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledTransaction {
    pub id: Option<i64>,
    pub name: String,
    pub frequency: Frequency,
    pub next_due_date: Option<NaiveDate>,
    pub splits: Vec<Split>,
    pub description: String,
}

impl ScheduledTransaction {
    pub fn new(
        name: &str,
        frequency: Frequency,
        next_due_date: Option<NaiveDate>,
        splits: Vec<Split>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(BooksError::InvalidScheduledTransaction(
                "must have a name".to_string(),
            ));
        }
        check_splits(&splits)?;
        Ok(ScheduledTransaction {
            id: None,
            name: name.to_string(),
            frequency,
            next_due_date,
            splits,
            description: String::new(),
        })
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        matches!(self.next_due_date, Some(due) if due <= today)
    }

    /// Called once the pending occurrence has been entered (or skipped).
    pub fn advance_to_next_due_date(&mut self) {
        if let Some(due) = self.next_due_date {
            self.next_due_date = Some(match self.frequency {
                Frequency::Weekly => dates::increment_week(due),
                Frequency::Monthly => dates::increment_month(due),
                Frequency::SemiMonthly => dates::increment_half_month(due),
                Frequency::Quarterly => dates::increment_quarter(due),
                Frequency::Yearly => dates::increment_year(due),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn asset(name: &str, id: i64) -> Account {
        let mut a = Account::new(AccountType::Asset, name).unwrap();
        a.id = Some(id);
        a
    }

    fn expense(name: &str, id: i64) -> Account {
        let mut a = Account::new(AccountType::Expense, name).unwrap();
        a.id = Some(id);
        a
    }

    #[test]
    fn test_account_requires_name() {
        assert!(Account::new(AccountType::Asset, "").is_err());
    }

    #[test]
    fn test_account_display_name() {
        let mut a = Account::new(AccountType::Expense, "Gas Stations").unwrap();
        assert_eq!(a.display_name(), "Gas Stations");
        a.number = Some("410".to_string());
        assert_eq!(a.display_name(), "410 - Gas Stations");
    }

    #[test]
    fn test_other_data_validation() {
        assert!(validate_other_data(&serde_json::json!({})).is_ok());
        assert!(validate_other_data(&serde_json::json!({"term": "30y"})).is_ok());
        assert!(validate_other_data(&serde_json::json!({"fixed-interest": true})).is_ok());
        assert!(validate_other_data(&serde_json::json!({"interest-rate-percent": "5/2"})).is_ok());
        assert!(validate_other_data(&serde_json::json!({"term": "yearly"})).is_err());
        assert!(validate_other_data(&serde_json::json!({"bogus": 1})).is_err());
        assert!(validate_other_data(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_splits_must_balance() {
        let splits = vec![
            Split::new(asset("Checking", 1), Decimal::from(-10)),
            Split::new(expense("Food", 2), Decimal::from(10)),
        ];
        assert!(check_splits(&splits).is_ok());

        let splits = vec![
            Split::new(asset("Checking", 1), Decimal::from(-10)),
            Split::new(expense("Food", 2), Decimal::from(11)),
        ];
        let err = check_splits(&splits).unwrap_err();
        assert!(err.to_string().contains("splits don't balance"));
    }

    #[test]
    fn test_actions_require_security_account() {
        let mut buy = Split::new(asset("Checking", 1), Decimal::from(-10));
        buy.action = TransactionAction::Buy;
        let splits = vec![buy, Split::new(expense("Food", 2), Decimal::from(10))];
        assert!(check_splits(&splits).is_err());
    }

    #[test]
    fn test_transaction_new_checks_splits() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(Transaction::new(date, vec![], "").is_err());
        let splits = vec![
            Split::new(asset("Checking", 1), Decimal::from(-10)),
            Split::new(expense("Food", 2), Decimal::from(10)),
        ];
        let txn = Transaction::new(date, splits, "lunch").unwrap();
        assert_eq!(txn.description, "lunch");
        assert!(txn.split_for_account(1).is_some());
        assert!(txn.split_for_account(99).is_none());
    }

    #[test]
    fn test_split_quantity_defaults_to_amount() {
        let amt = Decimal::from_str("12.34").unwrap();
        let split = Split::new(asset("Checking", 1), amt);
        assert_eq!(split.quantity, amt);
        let split = split.with_quantity(Decimal::from_str("1.5").unwrap());
        assert_eq!(split.quantity, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_reconcile_status_cycle() {
        assert_eq!(ReconcileStatus::cycle(None), Some(ReconcileStatus::Cleared));
        assert_eq!(
            ReconcileStatus::cycle(Some(ReconcileStatus::Cleared)),
            Some(ReconcileStatus::Reconciled)
        );
        assert_eq!(ReconcileStatus::cycle(Some(ReconcileStatus::Reconciled)), None);
    }

    #[test]
    fn test_reconcile_status_parse() {
        assert_eq!(ReconcileStatus::parse("c").unwrap(), Some(ReconcileStatus::Cleared));
        assert_eq!(ReconcileStatus::parse("R").unwrap(), Some(ReconcileStatus::Reconciled));
        assert_eq!(ReconcileStatus::parse("").unwrap(), None);
        assert!(ReconcileStatus::parse("X").is_err());
    }

    #[test]
    fn test_scheduled_txn_due_and_advance() {
        let today = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        let splits = vec![
            Split::new(asset("Checking", 1), Decimal::from(-100)),
            Split::new(expense("Housing", 2), Decimal::from(100)),
        ];
        let mut st =
            ScheduledTransaction::new("rent", Frequency::Monthly, Some(today), splits).unwrap();
        assert!(st.is_due(today));
        assert!(!st.is_due(today.pred_opt().unwrap()));
        st.advance_to_next_due_date();
        assert_eq!(st.next_due_date, NaiveDate::from_ymd_opt(2020, 7, 15));
    }

    #[test]
    fn test_frequency_round_trip() {
        for f in Frequency::ALL {
            assert_eq!(Frequency::parse(f.as_str()).unwrap(), f);
        }
        assert!(Frequency::parse("daily").is_err());
    }
}
