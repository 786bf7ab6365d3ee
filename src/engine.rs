//! The operations layer the CLI talks to. Wraps storage and adds the
//! behaviors that span multiple objects: ledger ordering and running
//! balances, filtering, and the scheduled transaction workflow.

use std::path::Path;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::budget::Budget;
use crate::error::Result;
use crate::models::{
    Account, AccountType, Commodity, Payee, ReconcileStatus, ScheduledTransaction, Transaction,
};
use crate::storage::SQLiteStorage;

/// Filters for a ledger listing. Any active filter suppresses the running
/// balance column, since a partial view has no meaningful balance.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    /// Only transactions that also touch this account.
    pub transfer_account_id: Option<i64>,
    pub status: Option<ReconcileStatus>,
    /// Case-insensitive match against description and payee.
    pub query: Option<String>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.transfer_account_id.is_none() && self.status.is_none() && self.query.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    /// Balance through today, ignoring future-dated transactions.
    pub current: Decimal,
    /// Same, counting only cleared and reconciled splits.
    pub current_cleared: Decimal,
}

pub struct Engine {
    storage: SQLiteStorage,
}

impl Engine {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Engine {
            storage: SQLiteStorage::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Engine {
            storage: SQLiteStorage::open_in_memory()?,
        })
    }

    // --- accounts ---

    /// Look up an account by id, number, or name, in that order. This is
    /// what CLI arguments go through.
    pub fn find_account(&self, key: &str) -> Result<Account> {
        if let Ok(id) = key.parse::<i64>() {
            if let Ok(account) = self.storage.get_account(id) {
                return Ok(account);
            }
        }
        if let Ok(account) = self.storage.get_account_by_number(key) {
            return Ok(account);
        }
        self.storage.get_account_by_name(key)
    }

    pub fn get_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
        self.storage.get_accounts(account_type)
    }

    pub fn save_account(&self, account: &mut Account) -> Result<()> {
        self.storage.save_account(account)
    }

    pub fn delete_account(&self, account_id: i64, reparent_children: bool) -> Result<()> {
        self.storage.delete_account(account_id, reparent_children)
    }

    pub fn get_commodity_by_code(&self, code: &str) -> Result<Option<Commodity>> {
        self.storage.get_commodity_by_code(code)
    }

    pub fn save_commodity(&self, commodity: &mut Commodity) -> Result<()> {
        self.storage.save_commodity(commodity)
    }

    // --- payees ---

    pub fn get_payees(&self) -> Result<Vec<Payee>> {
        let mut payees = self.storage.get_payees()?;
        payees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(payees)
    }

    pub fn save_payee(&self, payee: &mut Payee) -> Result<()> {
        self.storage.save_payee(payee)
    }

    pub fn count_transactions(&self) -> Result<i64> {
        self.storage.count_transactions()
    }

    // --- transactions ---

    pub fn get_transaction(&self, id: i64) -> Result<Transaction> {
        self.storage.get_txn(id)
    }

    pub fn save_transaction(&self, txn: &mut Transaction) -> Result<()> {
        self.storage.save_txn(txn)
    }

    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        self.storage.delete_txn(id)
    }

    fn matches(txn: &Transaction, account_id: i64, filter: &TransactionFilter) -> bool {
        if let Some(transfer_id) = filter.transfer_account_id {
            if txn.split_for_account(transfer_id).is_none() {
                return false;
            }
        }
        if let Some(status) = filter.status {
            let split_status = txn
                .split_for_account(account_id)
                .and_then(|split| split.status);
            if split_status != Some(status) {
                return false;
            }
        }
        if let Some(query) = &filter.query {
            let query = query.to_lowercase();
            let in_description = txn.description.to_lowercase().contains(&query);
            let in_payee = txn.splits.iter().any(|split| {
                split
                    .payee
                    .as_ref()
                    .is_some_and(|p| p.name.to_lowercase().contains(&query))
            });
            if !in_description && !in_payee {
                return false;
            }
        }
        true
    }

    /// An account's ledger, sorted by date. When no filter is active each
    /// transaction carries the running balance after it was applied;
    /// security accounts run the balance over share quantities.
    pub fn get_transactions(
        &self,
        account: &Account,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let account_id = account.id.expect("account loaded from storage");
        let mut txns = self.storage.get_transactions(account_id)?;
        txns.sort_by_key(|t| (t.txn_date, t.id));
        if filter.is_empty() {
            let mut balance = Decimal::ZERO;
            for txn in &mut txns {
                if let Some(split) = txn.split_for_account(account_id) {
                    if account.account_type == AccountType::Security {
                        balance += split.quantity;
                    } else {
                        balance += split.amount;
                    }
                }
                txn.balance = Some(balance);
            }
        } else {
            txns.retain(|t| Self::matches(t, account_id, filter));
        }
        Ok(txns)
    }

    /// Balances through today. Future-dated transactions don't count yet.
    pub fn get_current_balances(&self, account: &Account) -> Result<Balances> {
        let today = Local::now().date_naive();
        self.get_balances_as_of(account, today)
    }

    pub fn get_balances_as_of(&self, account: &Account, date: NaiveDate) -> Result<Balances> {
        let account_id = account.id.expect("account loaded from storage");
        let txns = self.get_transactions(account, &TransactionFilter::default())?;
        let mut current = Decimal::ZERO;
        let mut current_cleared = Decimal::ZERO;
        for txn in &txns {
            if txn.txn_date > date {
                break;
            }
            if let Some(balance) = txn.balance {
                current = balance;
            }
            if let Some(split) = txn.split_for_account(account_id) {
                if split.status.is_some() {
                    current_cleared += split.amount;
                }
            }
        }
        Ok(Balances {
            current,
            current_cleared,
        })
    }

    // --- scheduled transactions ---

    pub fn get_scheduled_transaction(&self, id: i64) -> Result<ScheduledTransaction> {
        self.storage.get_scheduled_transaction(id)
    }

    pub fn get_scheduled_transactions(&self) -> Result<Vec<ScheduledTransaction>> {
        self.storage.get_scheduled_transactions()
    }

    pub fn save_scheduled_transaction(
        &self,
        scheduled_txn: &mut ScheduledTransaction,
    ) -> Result<()> {
        self.storage.save_scheduled_transaction(scheduled_txn)
    }

    /// Scheduled transactions whose next due date has arrived, optionally
    /// only those touching the given accounts.
    pub fn get_scheduled_transactions_due(
        &self,
        account_ids: Option<&[i64]>,
    ) -> Result<Vec<ScheduledTransaction>> {
        let today = Local::now().date_naive();
        let mut due: Vec<ScheduledTransaction> = self
            .storage
            .get_scheduled_transactions()?
            .into_iter()
            .filter(|st| st.is_due(today))
            .collect();
        if let Some(ids) = account_ids {
            due.retain(|st| {
                st.splits
                    .iter()
                    .any(|split| split.account.id.is_some_and(|id| ids.contains(&id)))
            });
        }
        Ok(due)
    }

    /// Skip the pending occurrence without recording a transaction.
    pub fn skip_scheduled_transaction(&self, id: i64) -> Result<()> {
        let mut scheduled_txn = self.storage.get_scheduled_transaction(id)?;
        scheduled_txn.advance_to_next_due_date();
        self.storage.save_scheduled_transaction(&mut scheduled_txn)
    }

    /// Record the pending occurrence as a real transaction and advance the
    /// schedule. The date and splits can be tweaked before entering; when
    /// not given they come from the schedule itself.
    pub fn enter_scheduled_transaction(
        &self,
        id: i64,
        txn_date: Option<NaiveDate>,
        txn: Option<Transaction>,
    ) -> Result<Transaction> {
        let mut scheduled_txn = self.storage.get_scheduled_transaction(id)?;
        let mut txn = match txn {
            Some(txn) => txn,
            None => {
                let date = txn_date
                    .or(scheduled_txn.next_due_date)
                    .unwrap_or_else(|| Local::now().date_naive());
                Transaction::new(date, scheduled_txn.splits.clone(), &scheduled_txn.name)?
            }
        };
        if let Some(date) = txn_date {
            txn.txn_date = date;
        }
        self.storage.save_txn(&mut txn)?;
        scheduled_txn.advance_to_next_due_date();
        self.storage.save_scheduled_transaction(&mut scheduled_txn)?;
        Ok(txn)
    }

    // --- budgets ---

    pub fn get_budget(&self, id: i64) -> Result<Budget> {
        self.storage.get_budget(id)
    }

    pub fn get_budgets(&self) -> Result<Vec<Budget>> {
        self.storage.get_budgets()
    }

    pub fn save_budget(&self, budget: &mut Budget) -> Result<()> {
        self.storage.save_budget(budget)
    }
}
