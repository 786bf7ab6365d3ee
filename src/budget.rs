//! Budgets: user-entered amounts per income/expense account over a date
//! range, plus the progress report comparing budgeted to actual activity.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BooksError, Result};
use crate::fmt::amount_display;
use crate::models::{Account, AccountType};

/// User-entered values for one account. Zero amounts are dropped at entry so
/// empty form fields don't produce spurious rows.
#[derive(Debug, Clone, Default)]
pub struct BudgetAmounts {
    pub amount: Option<Decimal>,
    pub carryover: Option<Decimal>,
    pub notes: String,
}

/// One account's slice of a budget: the entered values plus actual spending
/// and income pulled from the ledger.
#[derive(Debug, Clone)]
pub struct BudgetEntry {
    pub account: Account,
    pub amounts: BudgetAmounts,
    pub spent: Decimal,
    pub income: Decimal,
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entries: Vec<BudgetEntry>,
}

/// Display row: all values already converted to strings, zeros blanked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetReportRow {
    pub name: String,
    pub amount: String,
    pub income: String,
    pub carryover: String,
    pub total_budget: String,
    pub spent: String,
    pub remaining: String,
    pub remaining_percent: String,
    pub current_status: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetReport {
    pub income: Vec<BudgetReportRow>,
    pub expense: Vec<BudgetReportRow>,
}

fn round_percent(percent: Decimal) -> Decimal {
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// How much of the budget time period is left, as a percentage.
fn remaining_time_period(
    current_date: NaiveDate,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Decimal {
    let days_in_budget = (end_date - start_date).num_days() + 1;
    let days_passed = (current_date - start_date).num_days();
    Decimal::ONE_HUNDRED
        - (Decimal::from(days_passed) / Decimal::from(days_in_budget)) * Decimal::ONE_HUNDRED
}

/// Compare budget amount remaining to budget time remaining: "+5%" means 5%
/// ahead of pace.
fn current_status(
    current_date: Option<NaiveDate>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    remaining_percent: Decimal,
) -> String {
    match current_date {
        Some(current) if current > start_date && current < end_date => {
            let remaining_time = remaining_time_period(current, start_date, end_date);
            let difference = round_percent(remaining_time - remaining_percent);
            if difference > Decimal::ZERO {
                format!("+{difference}%")
            } else {
                format!("{difference}%")
            }
        }
        _ => String::new(),
    }
}

fn blank_if_zero(value: Decimal) -> String {
    if value.is_zero() {
        String::new()
    } else {
        amount_display(value)
    }
}

/// Running numeric totals for a group of accounts or a whole section.
#[derive(Debug, Clone, Default)]
struct Totals {
    amount: Decimal,
    carryover: Decimal,
    income: Decimal,
    spent: Decimal,
}

fn sorted_by_number(mut accounts: Vec<&BudgetEntry>) -> Vec<&BudgetEntry> {
    accounts.sort_by_key(|e| e.account.number.clone().unwrap_or_else(|| "ZZZ".to_string()));
    accounts
}

impl Budget {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date < start_date {
            return Err(BooksError::InvalidBudget(
                "end date must not precede start date".to_string(),
            ));
        }
        Ok(Budget {
            id: None,
            name: None,
            start_date,
            end_date,
            entries: Vec::new(),
        })
    }

    /// Calendar-year budget: Jan 1 through Dec 31.
    pub fn for_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| BooksError::InvalidBudget(format!("invalid year {year}")))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| BooksError::InvalidBudget(format!("invalid year {year}")))?;
        Budget::new(start, end)
    }

    pub fn display(&self, show_id: bool) -> String {
        let mut s = format!("{} - {}", self.start_date, self.end_date);
        if let Some(name) = &self.name {
            s = format!("{name} ({s})");
        }
        if show_id {
            if let Some(id) = self.id {
                s = format!("{id}: {s}");
            }
        }
        s
    }

    fn entry_row(&self, entry: &BudgetEntry, current_date: Option<NaiveDate>) -> BudgetReportRow {
        let mut row = BudgetReportRow {
            name: entry.account.name.clone(),
            spent: blank_if_zero(entry.spent),
            income: blank_if_zero(entry.income),
            notes: entry.amounts.notes.clone(),
            ..Default::default()
        };
        let Some(amount) = entry.amounts.amount else {
            return row;
        };
        let carryover = entry.amounts.carryover.unwrap_or(Decimal::ZERO);
        row.amount = blank_if_zero(amount);
        row.carryover = blank_if_zero(carryover);
        if entry.account.account_type == AccountType::Expense {
            let total_budget = amount + carryover + entry.income;
            let remaining = total_budget - entry.spent;
            row.total_budget = blank_if_zero(total_budget);
            row.remaining = blank_if_zero(remaining);
            if total_budget.is_zero() {
                row.remaining_percent = "error".to_string();
            } else {
                let percent_available = (remaining / total_budget) * Decimal::ONE_HUNDRED;
                row.remaining_percent = format!("{}%", round_percent(percent_available));
                row.current_status =
                    current_status(current_date, self.start_date, self.end_date, percent_available);
            }
        } else {
            let remaining = amount - entry.income;
            row.remaining = blank_if_zero(remaining);
            if amount.is_zero() {
                row.remaining_percent = "error".to_string();
            } else {
                let remaining_percent =
                    Decimal::ONE_HUNDRED - (entry.income / amount) * Decimal::ONE_HUNDRED;
                row.remaining_percent = format!("{}%", round_percent(remaining_percent));
                row.current_status =
                    current_status(current_date, self.start_date, self.end_date, remaining_percent);
            }
        }
        row
    }

    fn accumulate(&self, entry: &BudgetEntry, group: &mut Totals, section: &mut Totals) {
        let amount = entry.amounts.amount.unwrap_or(Decimal::ZERO);
        let carryover = entry.amounts.carryover.unwrap_or(Decimal::ZERO);
        group.amount += amount;
        group.carryover += carryover;
        group.income += entry.income;
        group.spent += entry.spent;
        section.amount += amount;
        section.carryover += carryover;
        section.income += entry.income;
        section.spent += entry.spent;
    }

    fn expense_totals_row(
        &self,
        name: &str,
        totals: &Totals,
        current_date: Option<NaiveDate>,
    ) -> BudgetReportRow {
        let total_budget = totals.amount + totals.carryover + totals.income;
        let remaining = total_budget - totals.spent;
        let percent_available = if total_budget.is_zero() {
            Decimal::ZERO
        } else {
            (remaining / total_budget) * Decimal::ONE_HUNDRED
        };
        BudgetReportRow {
            name: name.to_string(),
            amount: blank_if_zero(totals.amount),
            carryover: blank_if_zero(totals.carryover),
            income: blank_if_zero(totals.income),
            spent: blank_if_zero(totals.spent),
            total_budget: blank_if_zero(total_budget),
            remaining: blank_if_zero(remaining),
            remaining_percent: format!("{}%", round_percent(percent_available)),
            current_status: current_status(
                current_date,
                self.start_date,
                self.end_date,
                percent_available,
            ),
            ..Default::default()
        }
    }

    fn income_totals_row(
        &self,
        name: &str,
        totals: &Totals,
        current_date: Option<NaiveDate>,
    ) -> BudgetReportRow {
        let remaining = totals.amount - totals.income;
        let remaining_percent = if totals.amount.is_zero() {
            Decimal::ZERO
        } else {
            (remaining / totals.amount) * Decimal::ONE_HUNDRED
        };
        BudgetReportRow {
            name: name.to_string(),
            amount: blank_if_zero(totals.amount),
            income: blank_if_zero(totals.income),
            remaining: blank_if_zero(remaining),
            remaining_percent: format!("{}%", round_percent(remaining_percent)),
            current_status: current_status(
                current_date,
                self.start_date,
                self.end_date,
                remaining_percent,
            ),
            ..Default::default()
        }
    }

    /// Income and expense sections with per-account rows, a group total after
    /// each parent account that has children, and overall totals last.
    pub fn report(&self, current_date: Option<NaiveDate>) -> BudgetReport {
        let mut report = BudgetReport::default();
        let mut income_totals = Totals::default();
        let mut expense_totals = Totals::default();

        let top_level = |t: AccountType| -> Vec<&BudgetEntry> {
            sorted_by_number(
                self.entries
                    .iter()
                    .filter(|e| e.account.parent_id.is_none() && e.account.account_type == t)
                    .collect(),
            )
        };
        let mut ordered = top_level(AccountType::Income);
        ordered.extend(top_level(AccountType::Expense));

        for top in ordered {
            let is_expense = top.account.account_type == AccountType::Expense;
            let mut group = Totals::default();
            let section = if is_expense {
                &mut expense_totals
            } else {
                &mut income_totals
            };
            self.accumulate(top, &mut group, section);
            let row = self.entry_row(top, current_date);
            if is_expense {
                report.expense.push(row);
            } else {
                report.income.push(row);
            }

            let children = sorted_by_number(
                self.entries
                    .iter()
                    .filter(|e| e.account.parent_id == top.account.id)
                    .collect(),
            );
            let has_children = !children.is_empty();
            for child in children {
                let section = if is_expense {
                    &mut expense_totals
                } else {
                    &mut income_totals
                };
                self.accumulate(child, &mut group, section);
                let row = self.entry_row(child, current_date);
                if is_expense {
                    report.expense.push(row);
                } else {
                    report.income.push(row);
                }
            }
            if has_children {
                let name = format!("Total {}", top.account.name);
                if is_expense {
                    report
                        .expense
                        .push(self.expense_totals_row(&name, &group, current_date));
                } else {
                    report
                        .income
                        .push(self.income_totals_row(&name, &group, current_date));
                }
            }
        }

        report
            .income
            .push(self.income_totals_row("Total Income", &income_totals, current_date));
        report
            .expense
            .push(self.expense_totals_row("Total Expense", &expense_totals, current_date));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn expense_account(name: &str, id: i64, number: Option<&str>, parent: Option<i64>) -> Account {
        let mut a = Account::new(AccountType::Expense, name).unwrap();
        a.id = Some(id);
        a.number = number.map(|n| n.to_string());
        a.parent_id = parent;
        a
    }

    fn income_account(name: &str, id: i64) -> Account {
        let mut a = Account::new(AccountType::Income, name).unwrap();
        a.id = Some(id);
        a
    }

    fn entry(account: Account, amount: Option<&str>, spent: &str, income: &str) -> BudgetEntry {
        BudgetEntry {
            account,
            amounts: BudgetAmounts {
                amount: amount.map(dec),
                carryover: None,
                notes: String::new(),
            },
            spent: dec(spent),
            income: dec(income),
        }
    }

    #[test]
    fn test_for_year() {
        let b = Budget::for_year(2018).unwrap();
        assert_eq!(b.start_date, d(2018, 1, 1));
        assert_eq!(b.end_date, d(2018, 12, 31));
    }

    #[test]
    fn test_dates_must_be_ordered() {
        assert!(Budget::new(d(2018, 6, 1), d(2018, 1, 1)).is_err());
    }

    #[test]
    fn test_display() {
        let mut b = Budget::for_year(2018).unwrap();
        b.id = Some(3);
        b.name = Some("house fund".to_string());
        assert_eq!(b.display(true), "3: house fund (2018-01-01 - 2018-12-31)");
        assert_eq!(b.display(false), "house fund (2018-01-01 - 2018-12-31)");
    }

    #[test]
    fn test_expense_row_math() {
        // amount 10, carryover 5, extra income 5 => total budget 20; spent 10 => 50% left
        let mut b = Budget::for_year(2018).unwrap();
        let mut e = entry(expense_account("Food", 1, None, None), Some("10"), "10", "5");
        e.amounts.carryover = Some(dec("5"));
        b.entries.push(e);
        let report = b.report(None);
        let row = &report.expense[0];
        assert_eq!(row.name, "Food");
        assert_eq!(row.amount, "10.00");
        assert_eq!(row.carryover, "5.00");
        assert_eq!(row.income, "5.00");
        assert_eq!(row.total_budget, "20.00");
        assert_eq!(row.spent, "10.00");
        assert_eq!(row.remaining, "10.00");
        assert_eq!(row.remaining_percent, "50%");
    }

    #[test]
    fn test_income_row_math() {
        let mut b = Budget::for_year(2018).unwrap();
        b.entries
            .push(entry(income_account("Salary", 1), Some("100"), "0", "70"));
        let report = b.report(None);
        let row = &report.income[0];
        assert_eq!(row.remaining, "30.00");
        assert_eq!(row.remaining_percent, "30%");
        // overall totals row comes last
        let totals = report.income.last().unwrap();
        assert_eq!(totals.name, "Total Income");
        assert_eq!(totals.amount, "100.00");
    }

    #[test]
    fn test_account_without_amount_gets_bare_row() {
        let mut b = Budget::for_year(2018).unwrap();
        b.entries
            .push(entry(expense_account("Misc", 1, None, None), None, "25", "0"));
        let report = b.report(None);
        let row = &report.expense[0];
        assert_eq!(row.name, "Misc");
        assert_eq!(row.spent, "25.00");
        assert_eq!(row.amount, "");
        assert_eq!(row.total_budget, "");
        assert_eq!(row.remaining_percent, "");
    }

    #[test]
    fn test_group_totals_for_parent_with_children() {
        let mut b = Budget::for_year(2018).unwrap();
        b.entries.push(entry(
            expense_account("Transportation", 400, Some("400"), None),
            Some("10"),
            "0",
            "0",
        ));
        b.entries.push(entry(
            expense_account("Gas", 410, Some("410"), Some(400)),
            Some("450"),
            "100",
            "0",
        ));
        b.entries.push(entry(
            expense_account("Insurance", 420, Some("420"), Some(400)),
            Some("40"),
            "0",
            "0",
        ));
        let report = b.report(None);
        let names: Vec<&str> = report.expense.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Transportation", "Gas", "Insurance", "Total Transportation", "Total Expense"]
        );
        let group = &report.expense[3];
        assert_eq!(group.amount, "500.00");
        assert_eq!(group.spent, "100.00");
        assert_eq!(group.total_budget, "500.00");
        assert_eq!(group.remaining, "400.00");
        assert_eq!(group.remaining_percent, "80%");
    }

    #[test]
    fn test_accounts_sorted_by_number_with_unnumbered_last() {
        let mut b = Budget::for_year(2018).unwrap();
        b.entries.push(entry(
            expense_account("NoNumber", 1, None, None),
            Some("1"),
            "0",
            "0",
        ));
        b.entries.push(entry(
            expense_account("Housing", 2, Some("500"), None),
            Some("1"),
            "0",
            "0",
        ));
        b.entries.push(entry(
            expense_account("Food", 3, Some("300"), None),
            Some("1"),
            "0",
            "0",
        ));
        let report = b.report(None);
        let names: Vec<&str> = report.expense.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Food", "Housing", "NoNumber", "Total Expense"]);
    }

    #[test]
    fn test_current_status_midway() {
        // Jan 1 - Jan 10, current Jan 5: 60% of the period remains but 80%
        // of the budget does, so spending is 20 points under pace.
        let mut b = Budget::new(d(2018, 1, 1), d(2018, 1, 10)).unwrap();
        b.entries.push(entry(
            expense_account("Food", 1, None, None),
            Some("100"),
            "20",
            "0",
        ));
        let report = b.report(Some(d(2018, 1, 5)));
        assert_eq!(report.expense[0].current_status, "-20%");
    }

    #[test]
    fn test_current_status_outside_period_is_empty() {
        let mut b = Budget::for_year(2018).unwrap();
        b.entries.push(entry(
            expense_account("Food", 1, None, None),
            Some("100"),
            "20",
            "0",
        ));
        let report = b.report(Some(d(2019, 6, 1)));
        assert_eq!(report.expense[0].current_status, "");
    }

    #[test]
    fn test_zero_total_budget_is_error() {
        let mut b = Budget::for_year(2018).unwrap();
        let mut e = entry(expense_account("Food", 1, None, None), Some("10"), "0", "0");
        e.amounts.carryover = Some(dec("-10"));
        b.entries.push(e);
        let report = b.report(None);
        assert_eq!(report.expense[0].remaining_percent, "error");
    }
}
