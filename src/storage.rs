//! SQLite persistence. Handles saving and retrieving business objects; all
//! user strings are normalized to NFC before they hit the file.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use unicode_normalization::UnicodeNormalization;

use crate::amount::{from_fraction, to_fraction};
use crate::budget::{Budget, BudgetAmounts, BudgetEntry};
use crate::dates::parse_date;
use crate::error::{BooksError, Result};
use crate::models::{
    check_splits, validate_other_data, Account, AccountType, Commodity, CommodityType, Frequency,
    Payee, ReconcileStatus, ScheduledTransaction, Split, Transaction, TransactionAction,
};

pub const SCHEMA_VERSION: i64 = 0;

const DB_INIT_STATEMENTS: &[&str] = &[
    "CREATE TABLE commodity_types (
        type TEXT NOT NULL PRIMARY KEY,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (type != '')) STRICT",
    "CREATE TABLE commodities (
        id INTEGER PRIMARY KEY,
        type TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        trading_currency_id INTEGER,
        trading_market TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (type != ''),
        CHECK (code != ''),
        CHECK (name != ''),
        FOREIGN KEY(type) REFERENCES commodity_types(type) ON DELETE RESTRICT,
        FOREIGN KEY(trading_currency_id) REFERENCES commodities(id) ON DELETE RESTRICT) STRICT",
    "CREATE TRIGGER commodity_updated UPDATE ON commodities BEGIN
        UPDATE commodities SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE institutions (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        address TEXT NOT NULL DEFAULT '',
        routing_number TEXT NOT NULL DEFAULT '',
        bic TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (name != '')) STRICT",
    "CREATE TRIGGER institution_updated UPDATE ON institutions BEGIN
        UPDATE institutions SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE account_types (
        type TEXT NOT NULL PRIMARY KEY,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (type != '')) STRICT",
    "CREATE TABLE accounts (
        id INTEGER PRIMARY KEY,
        type TEXT NOT NULL,
        commodity_id INTEGER NOT NULL,
        institution_id INTEGER,
        number TEXT UNIQUE,
        name TEXT NOT NULL,
        parent_id INTEGER,
        description TEXT NOT NULL DEFAULT '',
        closed INTEGER NOT NULL DEFAULT 0,
        alternate_id TEXT NOT NULL DEFAULT '',
        other_data TEXT NOT NULL DEFAULT '{}',
        open_date TEXT,
        close_date TEXT,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (number != ''),
        CHECK (name != ''),
        CHECK (json_type(other_data) IS 'object'),
        CHECK (closed = 0 OR closed = 1),
        CHECK (open_date IS NULL OR open_date IS strftime('%Y-%m-%d', open_date)),
        CHECK (close_date IS NULL OR (closed = 1 AND close_date IS strftime('%Y-%m-%d', close_date))),
        FOREIGN KEY(type) REFERENCES account_types(type) ON DELETE RESTRICT,
        FOREIGN KEY(parent_id) REFERENCES accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(commodity_id) REFERENCES commodities(id) ON DELETE RESTRICT,
        FOREIGN KEY(institution_id) REFERENCES institutions(id) ON DELETE RESTRICT,
        UNIQUE(name, parent_id)) STRICT",
    "CREATE TRIGGER account_updated UPDATE ON accounts BEGIN
        UPDATE accounts SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE budgets (
        id INTEGER PRIMARY KEY,
        name TEXT,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (start_date IS strftime('%Y-%m-%d', start_date)),
        CHECK (end_date IS strftime('%Y-%m-%d', end_date))) STRICT",
    "CREATE TRIGGER budget_updated UPDATE ON budgets BEGIN
        UPDATE budgets SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE budget_values (
        id INTEGER PRIMARY KEY,
        budget_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        amount_numerator INTEGER NOT NULL,
        amount_denominator INTEGER NOT NULL,
        carryover_numerator INTEGER,
        carryover_denominator INTEGER,
        notes TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (amount_denominator != 0),
        CHECK (carryover_denominator != 0),
        FOREIGN KEY(budget_id) REFERENCES budgets(id) ON DELETE RESTRICT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT) STRICT",
    "CREATE TRIGGER budget_value_updated UPDATE ON budget_values BEGIN
        UPDATE budget_values SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE payees (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        notes TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (name != '')) STRICT",
    "CREATE TRIGGER payee_updated UPDATE ON payees BEGIN
        UPDATE payees SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE scheduled_transaction_frequencies (
        frequency TEXT NOT NULL PRIMARY KEY,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (frequency != '')) STRICT",
    "CREATE TABLE scheduled_transactions (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        frequency TEXT NOT NULL,
        next_due_date TEXT,
        type TEXT,
        description TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(frequency) REFERENCES scheduled_transaction_frequencies(frequency) ON DELETE RESTRICT,
        CHECK (name != ''),
        CHECK (next_due_date IS NULL OR next_due_date IS strftime('%Y-%m-%d', next_due_date))) STRICT",
    "CREATE TRIGGER scheduled_transaction_updated UPDATE ON scheduled_transactions BEGIN
        UPDATE scheduled_transactions SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE scheduled_transaction_splits (
        id INTEGER PRIMARY KEY,
        scheduled_transaction_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        value_numerator INTEGER NOT NULL,
        value_denominator INTEGER NOT NULL,
        quantity_numerator INTEGER,
        quantity_denominator INTEGER,
        reconciled_state TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        action TEXT,
        payee_id INTEGER,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(scheduled_transaction_id) REFERENCES scheduled_transactions(id) ON DELETE RESTRICT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(payee_id) REFERENCES payees(id) ON DELETE RESTRICT,
        CHECK (reconciled_state = '' OR reconciled_state = 'C' OR reconciled_state = 'R'),
        CHECK (value_denominator != 0),
        CHECK (quantity_denominator != 0)) STRICT",
    "CREATE TRIGGER scheduled_transaction_split_updated UPDATE ON scheduled_transaction_splits BEGIN
        UPDATE scheduled_transaction_splits SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE transaction_actions (
        action TEXT NOT NULL PRIMARY KEY,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP) STRICT",
    "CREATE TABLE transactions (
        id INTEGER PRIMARY KEY,
        commodity_id INTEGER NOT NULL,
        date TEXT,
        description TEXT NOT NULL DEFAULT '',
        entry_date TEXT NOT NULL DEFAULT (date('now', 'localtime')),
        alternate_id TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(commodity_id) REFERENCES commodities(id) ON DELETE RESTRICT,
        CHECK (date IS NULL OR date IS strftime('%Y-%m-%d', date)),
        CHECK (entry_date IS strftime('%Y-%m-%d', entry_date))) STRICT",
    "CREATE TRIGGER transaction_updated UPDATE ON transactions BEGIN
        UPDATE transactions SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE transaction_splits (
        id INTEGER PRIMARY KEY,
        transaction_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        value_numerator INTEGER NOT NULL,
        value_denominator INTEGER NOT NULL,
        quantity_numerator INTEGER,
        quantity_denominator INTEGER,
        reconciled_state TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        action TEXT NOT NULL DEFAULT '',
        payee_id INTEGER,
        post_date TEXT,
        reconcile_date TEXT,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(transaction_id) REFERENCES transactions(id) ON DELETE RESTRICT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(action) REFERENCES transaction_actions(action) ON DELETE RESTRICT,
        FOREIGN KEY(payee_id) REFERENCES payees(id) ON DELETE RESTRICT,
        CHECK (reconciled_state = '' OR reconciled_state = 'C' OR reconciled_state = 'R'),
        CHECK (post_date IS NULL OR (reconciled_state != '' AND post_date IS strftime('%Y-%m-%d', post_date))),
        CHECK (reconcile_date IS NULL OR (reconciled_state = 'R' AND reconcile_date IS strftime('%Y-%m-%d', reconcile_date))),
        CHECK (value_denominator != 0),
        CHECK (quantity_denominator != 0)) STRICT",
    "CREATE INDEX transaction_split_txn_id_index ON transaction_splits(transaction_id)",
    "CREATE TRIGGER transaction_split_updated UPDATE ON transaction_splits BEGIN
        UPDATE transaction_splits SET updated = CURRENT_TIMESTAMP WHERE id = old.id; END;",
    "CREATE TABLE misc (
        key TEXT UNIQUE NOT NULL,
        value ANY NOT NULL,
        created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CHECK (key != '')) STRICT",
    "CREATE TRIGGER misc_updated UPDATE ON misc BEGIN
        UPDATE misc SET updated = CURRENT_TIMESTAMP WHERE key = old.key; END;",
];

/// Save all user data as NFC.
fn nfc(s: &str) -> String {
    s.nfc().collect()
}

fn date_str(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[derive(Debug)]
pub struct SQLiteStorage {
    conn: Connection,
}

impl SQLiteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| BooksError::InvalidStorageFile(e.to_string()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| BooksError::InvalidStorageFile(e.to_string()))?;
        let storage = SQLiteStorage { conn };
        let table_count: i64 = storage
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| BooksError::InvalidStorageFile(e.to_string()))?;
        if table_count == 0 {
            storage.setup_schema()?;
        }
        let schema_version: i64 = storage
            .conn
            .query_row("SELECT value FROM misc WHERE key = 'schema_version'", [], |row| {
                row.get(0)
            })
            .map_err(|e| BooksError::InvalidStorageFile(e.to_string()))?;
        if schema_version != SCHEMA_VERSION {
            return Err(BooksError::InvalidStorageFile(format!(
                "wrong schema version: {schema_version}"
            )));
        }
        Ok(storage)
    }

    fn setup_schema(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for statement in DB_INIT_STATEMENTS {
            tx.execute_batch(statement)?;
        }
        for commodity_type in CommodityType::ALL {
            tx.execute(
                "INSERT INTO commodity_types(type) VALUES (?1)",
                params![commodity_type.as_str()],
            )?;
        }
        for frequency in Frequency::ALL {
            tx.execute(
                "INSERT INTO scheduled_transaction_frequencies(frequency) VALUES (?1)",
                params![frequency.as_str()],
            )?;
        }
        for account_type in AccountType::ALL {
            tx.execute(
                "INSERT INTO account_types(type) VALUES (?1)",
                params![account_type.as_str()],
            )?;
        }
        for action in TransactionAction::ALL {
            tx.execute(
                "INSERT INTO transaction_actions(action) VALUES (?1)",
                params![action.as_str()],
            )?;
        }
        tx.execute(
            "INSERT INTO misc(key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        tx.execute(
            "INSERT INTO commodities(type, code, name) VALUES (?1, 'USD', 'US Dollar')",
            params![CommodityType::Currency.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    // --- commodities ---

    pub fn get_commodity_by_code(&self, code: &str) -> Result<Option<Commodity>> {
        let row: Option<(i64, String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, type, code, name FROM commodities WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        match row {
            Some((id, type_str, code, name)) => Ok(Some(Commodity {
                id: Some(id),
                commodity_type: CommodityType::parse(&type_str)?,
                code,
                name,
            })),
            None => Ok(None),
        }
    }

    pub fn save_commodity(&self, commodity: &mut Commodity) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO commodities(type, code, name) VALUES (?1, ?2, ?3)",
            params![
                commodity.commodity_type.as_str(),
                nfc(&commodity.code),
                nfc(&commodity.name)
            ],
        )?;
        commodity.id = Some(tx.last_insert_rowid());
        tx.commit()?;
        Ok(())
    }

    // --- accounts ---

    fn account_from_row(
        &self,
        row: (
            i64,
            String,
            i64,
            Option<String>,
            String,
            Option<i64>,
            String,
            String,
            i64,
            String,
        ),
    ) -> Result<Account> {
        let (id, type_str, commodity_id, number, name, parent_id, alternate_id, description, closed, other_data) =
            row;
        Ok(Account {
            id: Some(id),
            account_type: AccountType::parse(&type_str)?,
            commodity_id: Some(commodity_id),
            number,
            name,
            parent_id,
            description,
            alternate_id,
            closed: closed == 1,
            other_data: serde_json::from_str(&other_data)
                .map_err(|e| BooksError::InvalidAccount(format!("bad other_data: {e}")))?,
            child_level: 0,
        })
    }

    const ACCOUNT_FIELDS: &'static str =
        "id, type, commodity_id, number, name, parent_id, alternate_id, description, closed, other_data";

    fn query_account(&self, where_clause: &str, param: &dyn rusqlite::ToSql) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE {}",
            Self::ACCOUNT_FIELDS,
            where_clause
        );
        let row = self
            .conn
            .query_row(&sql, [param], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })
            .optional()?;
        row.map(|r| self.account_from_row(r)).transpose()
    }

    pub fn get_account(&self, id: i64) -> Result<Account> {
        self.query_account("id = ?1", &id)?
            .ok_or_else(|| BooksError::InvalidAccount(format!("no account with id \"{id}\"")))
    }

    pub fn get_account_by_number(&self, number: &str) -> Result<Account> {
        self.query_account("number = ?1", &number)?.ok_or_else(|| {
            BooksError::InvalidAccount(format!("no account with number \"{number}\""))
        })
    }

    pub fn get_account_by_name(&self, name: &str) -> Result<Account> {
        self.query_account("name = ?1", &name)?
            .ok_or_else(|| BooksError::InvalidAccount(format!("no account with name \"{name}\"")))
    }

    pub fn save_account(&self, account: &mut Account) -> Result<()> {
        validate_other_data(&account.other_data)?;
        let number = account.number.as_deref().filter(|n| !n.is_empty()).map(nfc);
        let other_data = nfc(&serde_json::to_string(&account.other_data).map_err(|e| {
            BooksError::InvalidAccount(format!("bad other_data: {e}"))
        })?);
        let tx = self.conn.unchecked_transaction()?;
        if let Some(id) = account.id {
            let changed = tx.execute(
                "UPDATE accounts SET type = ?1, number = ?2, name = ?3, parent_id = ?4,
                    alternate_id = ?5, description = ?6, closed = ?7, other_data = ?8
                 WHERE id = ?9",
                params![
                    account.account_type.as_str(),
                    number,
                    nfc(&account.name),
                    account.parent_id,
                    nfc(&account.alternate_id),
                    nfc(&account.description),
                    account.closed as i64,
                    other_data,
                    id
                ],
            )?;
            if changed < 1 {
                return Err(BooksError::InvalidAccount(format!(
                    "no account with id {id} to update"
                )));
            }
        } else {
            // default USD commodity
            let commodity_id = account.commodity_id.unwrap_or(1);
            tx.execute(
                "INSERT INTO accounts(type, commodity_id, number, name, parent_id,
                    alternate_id, description, closed, other_data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    account.account_type.as_str(),
                    commodity_id,
                    number,
                    nfc(&account.name),
                    account.parent_id,
                    nfc(&account.alternate_id),
                    nfc(&account.description),
                    account.closed as i64,
                    other_data
                ],
            )?;
            account.id = Some(tx.last_insert_rowid());
            account.commodity_id = Some(commodity_id);
        }
        tx.commit()?;
        Ok(())
    }

    fn account_children(&self, parent_id: i64, child_level: usize) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM accounts WHERE closed = 0 AND parent_id = ?1 ORDER BY number, name",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![parent_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut children = Vec::new();
        for id in ids {
            let mut account = self.get_account(id)?;
            account.child_level = child_level;
            children.push(account.clone());
            children.extend(self.account_children(id, child_level + 1)?);
        }
        Ok(children)
    }

    fn accounts_by_type(&self, account_type: AccountType) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM accounts WHERE type = ?1 AND closed = 0 AND parent_id IS NULL
             ORDER BY number, name",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![account_type.as_str()], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut accounts = Vec::new();
        for id in ids {
            accounts.push(self.get_account(id)?);
            accounts.extend(self.account_children(id, 1)?);
        }
        Ok(accounts)
    }

    /// Open accounts, grouped by type, children nested beneath their parents.
    pub fn get_accounts(&self, account_type: Option<AccountType>) -> Result<Vec<Account>> {
        match account_type {
            Some(t) => self.accounts_by_type(t),
            None => {
                let mut accounts = Vec::new();
                for t in AccountType::ALL {
                    accounts.extend(self.accounts_by_type(t)?);
                }
                Ok(accounts)
            }
        }
    }

    pub fn delete_account(&self, account_id: i64, reparent_children: bool) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if reparent_children {
            tx.execute(
                "UPDATE accounts SET parent_id = NULL WHERE parent_id = ?1",
                params![account_id],
            )?;
        }
        tx.execute("DELETE FROM accounts WHERE id = ?1", params![account_id])?;
        tx.commit()?;
        Ok(())
    }

    // --- payees ---

    pub fn get_payee(&self, id: i64) -> Result<Option<Payee>> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, notes FROM payees WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(row.map(|(id, name, notes)| Payee {
            id: Some(id),
            name,
            notes,
        }))
    }

    pub fn get_payee_by_name(&self, name: &str) -> Result<Option<Payee>> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, notes FROM payees WHERE name = ?1",
                params![nfc(name)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        Ok(row.map(|(id, name, notes)| Payee {
            id: Some(id),
            name,
            notes,
        }))
    }

    pub fn get_payees(&self) -> Result<Vec<Payee>> {
        let mut stmt = self.conn.prepare("SELECT id, name, notes FROM payees")?;
        let rows: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .map(|(id, name, notes)| Payee {
                id: Some(id),
                name,
                notes,
            })
            .collect())
    }

    pub fn save_payee(&self, payee: &mut Payee) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(id) = payee.id {
            let changed = tx.execute(
                "UPDATE payees SET name = ?1, notes = ?2 WHERE id = ?3",
                params![nfc(&payee.name), nfc(&payee.notes), id],
            )?;
            if changed < 1 {
                return Err(BooksError::Other(format!("no payee with id {id} to update")));
            }
        } else {
            tx.execute(
                "INSERT INTO payees(name, notes) VALUES (?1, ?2)",
                params![nfc(&payee.name), nfc(&payee.notes)],
            )?;
            payee.id = Some(tx.last_insert_rowid());
        }
        tx.commit()?;
        Ok(())
    }

    /// Make sure every split's account and payee exist in the file.
    fn resolve_split_refs(&self, splits: &mut [Split]) -> Result<()> {
        for split in splits.iter_mut() {
            if split.account.id.is_none() {
                self.save_account(&mut split.account)?;
            }
            if let Some(payee) = &mut split.payee {
                if payee.id.is_none() {
                    match self.get_payee_by_name(&payee.name)? {
                        Some(existing) => payee.id = existing.id,
                        None => self.save_payee(payee)?,
                    }
                }
            }
        }
        Ok(())
    }

    // --- transactions ---

    fn load_txn_splits(&self, txn_id: i64) -> Result<Vec<Split>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, type, value_numerator, value_denominator,
                    quantity_numerator, quantity_denominator, reconciled_state,
                    action, payee_id, description, reconcile_date
             FROM transaction_splits WHERE transaction_id = ?1",
        )?;
        #[allow(clippy::type_complexity)]
        let rows: Vec<(
            i64,
            String,
            i64,
            i64,
            Option<i64>,
            Option<i64>,
            String,
            String,
            Option<i64>,
            String,
            Option<String>,
        )> = stmt
            .query_map(params![txn_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut splits = Vec::new();
        for (account_id, split_type, value_num, value_den, qty_num, qty_den, state, action, payee_id, description, reconcile_date) in
            rows
        {
            let account = self.get_account(account_id)?;
            let amount = from_fraction(value_num, value_den)?;
            let quantity = match (qty_num, qty_den) {
                (Some(n), Some(d)) => from_fraction(n, d)?,
                _ => amount,
            };
            let payee = match payee_id {
                Some(id) => self.get_payee(id)?,
                None => None,
            };
            splits.push(Split {
                account,
                amount,
                quantity,
                status: ReconcileStatus::parse(&state)?,
                payee,
                split_type,
                description,
                action: TransactionAction::parse(&action)?,
                reconcile_date: reconcile_date.as_deref().map(parse_date).transpose()?,
            });
        }
        Ok(splits)
    }

    pub fn get_txn(&self, txn_id: i64) -> Result<Transaction> {
        let (id, date, description, alternate_id, entry_date): (
            i64,
            String,
            String,
            String,
            String,
        ) = self.conn.query_row(
            "SELECT id, date, description, alternate_id, entry_date
             FROM transactions WHERE id = ?1",
            params![txn_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;
        Ok(Transaction {
            id: Some(id),
            txn_date: parse_date(&date)?,
            entry_date: Some(parse_date(&entry_date)?),
            description,
            alternate_id,
            splits: self.load_txn_splits(id)?,
            balance: None,
        })
    }

    pub fn get_transactions(&self, account_id: i64) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT transaction_id FROM transaction_splits WHERE account_id = ?1",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![account_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ids.into_iter().map(|id| self.get_txn(id)).collect()
    }

    pub fn save_txn(&self, txn: &mut Transaction) -> Result<()> {
        check_splits(&txn.splits)?;
        self.resolve_split_refs(&mut txn.splits)?;

        let tx = self.conn.unchecked_transaction()?;
        let txn_id = if let Some(id) = txn.id {
            let changed = match txn.entry_date {
                Some(entry) => tx.execute(
                    "UPDATE transactions SET date = ?1, description = ?2, alternate_id = ?3, entry_date = ?4
                     WHERE id = ?5",
                    params![
                        date_str(txn.txn_date),
                        nfc(&txn.description),
                        nfc(&txn.alternate_id),
                        date_str(entry),
                        id
                    ],
                )?,
                None => tx.execute(
                    "UPDATE transactions SET date = ?1, description = ?2, alternate_id = ?3
                     WHERE id = ?4",
                    params![
                        date_str(txn.txn_date),
                        nfc(&txn.description),
                        nfc(&txn.alternate_id),
                        id
                    ],
                )?,
            };
            if changed < 1 {
                return Err(BooksError::InvalidTransaction(format!(
                    "no transaction with id {id} to update"
                )));
            }
            id
        } else {
            match txn.entry_date {
                Some(entry) => tx.execute(
                    "INSERT INTO transactions(commodity_id, date, description, alternate_id, entry_date)
                     VALUES (1, ?1, ?2, ?3, ?4)",
                    params![
                        date_str(txn.txn_date),
                        nfc(&txn.description),
                        nfc(&txn.alternate_id),
                        date_str(entry)
                    ],
                )?,
                None => tx.execute(
                    "INSERT INTO transactions(commodity_id, date, description, alternate_id)
                     VALUES (1, ?1, ?2, ?3)",
                    params![
                        date_str(txn.txn_date),
                        nfc(&txn.description),
                        nfc(&txn.alternate_id)
                    ],
                )?,
            };
            tx.last_insert_rowid()
        };

        let mut stmt =
            tx.prepare("SELECT account_id FROM transaction_splits WHERE transaction_id = ?1")?;
        let old_account_ids: Vec<i64> = stmt
            .query_map(params![txn_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        let new_account_ids: Vec<i64> = txn.splits.iter().filter_map(|s| s.account.id).collect();
        for old_id in &old_account_ids {
            if !new_account_ids.contains(old_id) {
                tx.execute(
                    "DELETE FROM transaction_splits WHERE transaction_id = ?1 AND account_id = ?2",
                    params![txn_id, old_id],
                )?;
            }
        }
        for split in &txn.splits {
            let account_id = split.account.id.expect("split accounts resolved above");
            let (value_num, value_den) = to_fraction(split.amount)?;
            let (qty_num, qty_den) = to_fraction(split.quantity)?;
            let status = split.status.map(|s| s.as_str()).unwrap_or("");
            // schema only allows a reconcile date on reconciled splits
            let reconcile_date = match (split.status, split.reconcile_date) {
                (Some(ReconcileStatus::Reconciled), Some(d)) => Some(date_str(d)),
                _ => None,
            };
            if old_account_ids.contains(&account_id) {
                tx.execute(
                    "UPDATE transaction_splits SET value_numerator = ?1, value_denominator = ?2,
                        quantity_numerator = ?3, quantity_denominator = ?4, reconciled_state = ?5,
                        reconcile_date = ?6, type = ?7, description = ?8, payee_id = ?9, action = ?10
                     WHERE transaction_id = ?11 AND account_id = ?12",
                    params![
                        value_num,
                        value_den,
                        qty_num,
                        qty_den,
                        status,
                        reconcile_date,
                        nfc(&split.split_type),
                        nfc(&split.description),
                        split.payee.as_ref().and_then(|p| p.id),
                        split.action.as_str(),
                        txn_id,
                        account_id
                    ],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO transaction_splits(transaction_id, account_id, value_numerator,
                        value_denominator, quantity_numerator, quantity_denominator,
                        reconciled_state, reconcile_date, type, description, payee_id, action)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        txn_id,
                        account_id,
                        value_num,
                        value_den,
                        qty_num,
                        qty_den,
                        status,
                        reconcile_date,
                        nfc(&split.split_type),
                        nfc(&split.description),
                        split.payee.as_ref().and_then(|p| p.id),
                        split.action.as_str()
                    ],
                )?;
            }
        }
        tx.commit()?;
        txn.id = Some(txn_id);
        Ok(())
    }

    pub fn delete_txn(&self, txn_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM transaction_splits WHERE transaction_id = ?1",
            params![txn_id],
        )?;
        tx.execute("DELETE FROM transactions WHERE id = ?1", params![txn_id])?;
        tx.commit()?;
        Ok(())
    }

    // --- scheduled transactions ---

    pub fn save_scheduled_transaction(&self, scheduled_txn: &mut ScheduledTransaction) -> Result<()> {
        check_splits(&scheduled_txn.splits)?;
        self.resolve_split_refs(&mut scheduled_txn.splits)?;
        let next_due = scheduled_txn.next_due_date.map(date_str);

        let tx = self.conn.unchecked_transaction()?;
        let st_id = if let Some(id) = scheduled_txn.id {
            let changed = tx.execute(
                "UPDATE scheduled_transactions SET name = ?1, frequency = ?2, next_due_date = ?3,
                    description = ?4
                 WHERE id = ?5",
                params![
                    nfc(&scheduled_txn.name),
                    scheduled_txn.frequency.as_str(),
                    next_due,
                    nfc(&scheduled_txn.description),
                    id
                ],
            )?;
            if changed < 1 {
                return Err(BooksError::InvalidScheduledTransaction(format!(
                    "no scheduled transaction with id {id} to update"
                )));
            }
            id
        } else {
            tx.execute(
                "INSERT INTO scheduled_transactions(name, frequency, next_due_date, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    nfc(&scheduled_txn.name),
                    scheduled_txn.frequency.as_str(),
                    next_due,
                    nfc(&scheduled_txn.description)
                ],
            )?;
            tx.last_insert_rowid()
        };

        let mut stmt = tx.prepare(
            "SELECT account_id FROM scheduled_transaction_splits WHERE scheduled_transaction_id = ?1",
        )?;
        let old_account_ids: Vec<i64> = stmt
            .query_map(params![st_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        let new_account_ids: Vec<i64> = scheduled_txn
            .splits
            .iter()
            .filter_map(|s| s.account.id)
            .collect();
        for old_id in &old_account_ids {
            if !new_account_ids.contains(old_id) {
                tx.execute(
                    "DELETE FROM scheduled_transaction_splits
                     WHERE scheduled_transaction_id = ?1 AND account_id = ?2",
                    params![st_id, old_id],
                )?;
            }
        }
        for split in &scheduled_txn.splits {
            let account_id = split.account.id.expect("split accounts resolved above");
            let (value_num, value_den) = to_fraction(split.amount)?;
            let status = split.status.map(|s| s.as_str()).unwrap_or("");
            let payee_id = split.payee.as_ref().and_then(|p| p.id);
            if old_account_ids.contains(&account_id) {
                tx.execute(
                    "UPDATE scheduled_transaction_splits SET value_numerator = ?1,
                        value_denominator = ?2, quantity_numerator = ?1, quantity_denominator = ?2,
                        reconciled_state = ?3, payee_id = ?4
                     WHERE scheduled_transaction_id = ?5 AND account_id = ?6",
                    params![value_num, value_den, status, payee_id, st_id, account_id],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO scheduled_transaction_splits(scheduled_transaction_id, account_id,
                        value_numerator, value_denominator, quantity_numerator, quantity_denominator,
                        reconciled_state, payee_id)
                     VALUES (?1, ?2, ?3, ?4, ?3, ?4, ?5, ?6)",
                    params![st_id, account_id, value_num, value_den, status, payee_id],
                )?;
            }
        }
        tx.commit()?;
        scheduled_txn.id = Some(st_id);
        Ok(())
    }

    pub fn get_scheduled_transaction(&self, id: i64) -> Result<ScheduledTransaction> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, value_numerator, value_denominator, reconciled_state, payee_id
             FROM scheduled_transaction_splits WHERE scheduled_transaction_id = ?1",
        )?;
        let rows: Vec<(i64, i64, i64, String, Option<i64>)> = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut splits = Vec::new();
        for (account_id, value_num, value_den, state, payee_id) in rows {
            let account = self.get_account(account_id)?;
            let amount = from_fraction(value_num, value_den)?;
            let mut split = Split::new(account, amount);
            split.status = ReconcileStatus::parse(&state)?;
            if let Some(payee_id) = payee_id {
                split.payee = self.get_payee(payee_id)?;
            }
            splits.push(split);
        }
        let (name, frequency, next_due_date, description): (
            String,
            String,
            Option<String>,
            String,
        ) = self.conn.query_row(
            "SELECT name, frequency, next_due_date, description
             FROM scheduled_transactions WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
        Ok(ScheduledTransaction {
            id: Some(id),
            name,
            frequency: Frequency::parse(&frequency)?,
            next_due_date: next_due_date.as_deref().map(parse_date).transpose()?,
            splits,
            description,
        })
    }

    pub fn get_scheduled_transactions(&self) -> Result<Vec<ScheduledTransaction>> {
        let mut stmt = self.conn.prepare("SELECT id FROM scheduled_transactions")?;
        let ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ids.into_iter()
            .map(|id| self.get_scheduled_transaction(id))
            .collect()
    }

    pub fn count_transactions(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM transactions", [], |row| row.get(0))?)
    }

    // --- budgets ---

    fn write_budget_value(
        &self,
        tx: &Connection,
        budget_id: i64,
        account_id: i64,
        amounts: &BudgetAmounts,
        update: bool,
    ) -> Result<()> {
        let Some(amount) = amounts.amount else {
            return Ok(());
        };
        let (amount_num, amount_den) = to_fraction(amount)?;
        let carryover = amounts.carryover.map(to_fraction).transpose()?;
        let (carry_num, carry_den) = match carryover {
            Some((n, d)) => (Some(n), Some(d)),
            None => (None, None),
        };
        if update {
            tx.execute(
                "UPDATE budget_values SET amount_numerator = ?1, amount_denominator = ?2,
                    carryover_numerator = ?3, carryover_denominator = ?4, notes = ?5
                 WHERE budget_id = ?6 AND account_id = ?7",
                params![
                    amount_num,
                    amount_den,
                    carry_num,
                    carry_den,
                    nfc(&amounts.notes),
                    budget_id,
                    account_id
                ],
            )?;
        } else {
            tx.execute(
                "INSERT INTO budget_values(budget_id, account_id, amount_numerator,
                    amount_denominator, carryover_numerator, carryover_denominator, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    budget_id,
                    account_id,
                    amount_num,
                    amount_den,
                    carry_num,
                    carry_den,
                    nfc(&amounts.notes)
                ],
            )?;
        }
        Ok(())
    }

    pub fn save_budget(&self, budget: &mut Budget) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(id) = budget.id {
            tx.execute(
                "UPDATE budgets SET name = ?1, start_date = ?2, end_date = ?3 WHERE id = ?4",
                params![
                    budget.name.as_deref().map(nfc),
                    date_str(budget.start_date),
                    date_str(budget.end_date),
                    id
                ],
            )?;
            let mut stmt =
                tx.prepare("SELECT account_id FROM budget_values WHERE budget_id = ?1")?;
            let old_account_ids: Vec<i64> = stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            drop(stmt);
            let keep: Vec<i64> = budget
                .entries
                .iter()
                .filter(|e| e.amounts.amount.is_some())
                .filter_map(|e| e.account.id)
                .collect();
            for old_id in &old_account_ids {
                if !keep.contains(old_id) {
                    tx.execute(
                        "DELETE FROM budget_values WHERE budget_id = ?1 AND account_id = ?2",
                        params![id, old_id],
                    )?;
                }
            }
            for entry in &budget.entries {
                let Some(account_id) = entry.account.id else {
                    continue;
                };
                let update = old_account_ids.contains(&account_id);
                self.write_budget_value(&tx, id, account_id, &entry.amounts, update)?;
            }
        } else {
            tx.execute(
                "INSERT INTO budgets(name, start_date, end_date) VALUES (?1, ?2, ?3)",
                params![
                    budget.name.as_deref().map(nfc),
                    date_str(budget.start_date),
                    date_str(budget.end_date)
                ],
            )?;
            let budget_id = tx.last_insert_rowid();
            for entry in &budget.entries {
                let Some(account_id) = entry.account.id else {
                    continue;
                };
                self.write_budget_value(&tx, budget_id, account_id, &entry.amounts, false)?;
            }
            budget.id = Some(budget_id);
        }
        tx.commit()?;
        Ok(())
    }

    /// Actual income and spending against one account between the budget
    /// dates (exclusive on both ends, as the original books did).
    fn account_activity(
        &self,
        account_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(Decimal, Decimal)> {
        let mut stmt = self.conn.prepare(
            "SELECT ts.value_numerator, ts.value_denominator
             FROM transaction_splits ts INNER JOIN transactions t ON ts.transaction_id = t.id
             WHERE ts.account_id = ?1 AND t.date > ?2 AND t.date < ?3",
        )?;
        let rows: Vec<(i64, i64)> = stmt
            .query_map(
                params![account_id, date_str(start_date), date_str(end_date)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut spent = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        for (num, den) in rows {
            let amount = from_fraction(num, den)?;
            if amount < Decimal::ZERO {
                income -= amount;
            } else {
                spent += amount;
            }
        }
        Ok((spent, income))
    }

    pub fn get_budget(&self, id: i64) -> Result<Budget> {
        let (name, start, end): (Option<String>, String, String) = self.conn.query_row(
            "SELECT name, start_date, end_date FROM budgets WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let start_date = parse_date(&start)?;
        let end_date = parse_date(&end)?;
        let mut accounts = self.get_accounts(Some(AccountType::Expense))?;
        accounts.extend(self.get_accounts(Some(AccountType::Income))?);
        let mut entries = Vec::new();
        for account in accounts {
            let account_id = account.id.expect("stored accounts have ids");
            let (spent, income) = self.account_activity(account_id, start_date, end_date)?;
            let row: Option<(i64, i64, Option<i64>, Option<i64>, String)> = self
                .conn
                .query_row(
                    "SELECT amount_numerator, amount_denominator, carryover_numerator,
                            carryover_denominator, notes
                     FROM budget_values WHERE budget_id = ?1 AND account_id = ?2",
                    params![id, account_id],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;
            let amounts = match row {
                Some((amount_num, amount_den, carry_num, carry_den, notes)) => BudgetAmounts {
                    amount: Some(from_fraction(amount_num, amount_den)?),
                    carryover: Some(from_fraction(carry_num.unwrap_or(0), carry_den.unwrap_or(1))?),
                    notes,
                },
                None => BudgetAmounts::default(),
            };
            entries.push(BudgetEntry {
                account,
                amounts,
                spent,
                income,
            });
        }
        Ok(Budget {
            id: Some(id),
            name,
            start_date,
            end_date,
            entries,
        })
    }

    pub fn get_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM budgets ORDER BY start_date DESC")?;
        let ids: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ids.into_iter().map(|id| self.get_budget(id)).collect()
    }
}
