//! Date parsing and the schedule arithmetic used by recurring transactions.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{BooksError, Result};

/// Parse `YYYY-MM-DD` or `MM/DD/YYYY`.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Ok(d);
    }
    Err(BooksError::InvalidDate(format!("invalid date \"{value}\"")))
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // callers only build dates already clamped to valid days
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn increment_week(date: NaiveDate) -> NaiveDate {
    date + Duration::days(7)
}

/// One month later, clamping end-of-month days so the result always exists
/// (Jan 29-31 land on Feb 28; day 31 before a 30-day month lands on the 30th).
pub fn increment_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        return ymd(date.year() + 1, 1, date.day());
    }
    if date.month() == 1 && date.day() > 28 {
        return ymd(date.year(), 2, 28);
    }
    if date.day() == 31 && [3, 5, 8, 10].contains(&date.month()) {
        return ymd(date.year(), date.month() + 1, 30);
    }
    ymd(date.year(), date.month() + 1, date.day())
}

/// Half a month later: days 1-15 pair with 16-30/31, with special handling
/// around February and 31-day months.
pub fn increment_half_month(date: NaiveDate) -> NaiveDate {
    let year = if date.month() == 12 && date.day() > 15 {
        date.year() + 1
    } else {
        date.year()
    };
    if date.month() == 2 {
        if date.day() > 27 {
            return ymd(year, 3, 15);
        } else if date.day() > 14 {
            return ymd(year, 3, date.day() % 14);
        } else {
            return ymd(year, 2, date.day() + 14);
        }
    }
    let month = if date.day() > 15 {
        if date.month() == 12 {
            1
        } else {
            date.month() + 1
        }
    } else {
        date.month()
    };
    if date.day() == 30 || date.day() == 31 {
        if date.month() == 1 {
            return ymd(year, month, 14);
        }
        return ymd(year, month, 15);
    }
    if date.day() > 15 {
        return ymd(year, month, date.day() % 15);
    }
    ymd(year, month, date.day() + 15)
}

/// Three months later, clamping days that don't exist in the target month.
pub fn increment_quarter(date: NaiveDate) -> NaiveDate {
    let day = if date.day() == 31 && [1, 3, 8].contains(&date.month()) {
        30
    } else if date.day() > 28 && date.month() == 11 {
        28
    } else {
        date.day()
    };
    let month = match date.month() {
        10 => 1,
        11 => 2,
        12 => 3,
        m => m + 3,
    };
    let year = if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    };
    ymd(year, month, day)
}

pub fn increment_year(date: NaiveDate) -> NaiveDate {
    if date.month() == 2 && date.day() == 29 {
        return ymd(date.year() + 1, 2, 28);
    }
    ymd(date.year() + 1, date.month(), date.day())
}
