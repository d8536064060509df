#![forbid(unsafe_code)]

use time::{Date, Month};

/// A calendar month with day-of-month stripped. Orders chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum YearMonthError {
    MonthOutOfRange,
    YearOutOfRange,
    InvalidKey,
}

impl YearMonthError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MonthOutOfRange => "month must be between 1 and 12",
            Self::YearOutOfRange => "year must be between 1 and 9999",
            Self::InvalidKey => "month key must look like 2025-03",
        }
    }
}

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Result<Self, YearMonthError> {
        if !(1..=9999).contains(&year) {
            return Err(YearMonthError::YearOutOfRange);
        }
        if !(1..=12).contains(&month) {
            return Err(YearMonthError::MonthOutOfRange);
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn minus_months(self, months: u32) -> Self {
        let total = self.year as i64 * 12 + (self.month as i64 - 1) - months as i64;
        Self {
            year: total.div_euclid(12) as i32,
            month: total.rem_euclid(12) as u8 + 1,
        }
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: Self) -> i64 {
        (self.year as i64 - earlier.year as i64) * 12 + (self.month as i64 - earlier.month as i64)
    }

    pub fn first_day(self) -> Date {
        let month = Month::try_from(self.month).unwrap_or(Month::January);
        Date::from_calendar_date(self.year, month, 1).unwrap_or(Date::MIN)
    }

    pub fn last_day(self) -> Date {
        let month = Month::try_from(self.month).unwrap_or(Month::January);
        let day = time::util::days_in_year_month(self.year, month);
        Date::from_calendar_date(self.year, month, day).unwrap_or(Date::MAX)
    }

    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn parse(value: &str) -> Result<Self, YearMonthError> {
        let Some((year, month)) = value.split_once('-') else {
            return Err(YearMonthError::InvalidKey);
        };
        let year = year
            .parse::<i32>()
            .map_err(|_| YearMonthError::InvalidKey)?;
        let month = month
            .parse::<u8>()
            .map_err(|_| YearMonthError::InvalidKey)?;
        Self::new(year, month)
    }

    pub fn label(self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    /// Ascending inclusive iteration; empty when `last < first`.
    pub fn range(first: Self, last: Self) -> MonthRange {
        MonthRange {
            cursor: if first <= last { Some(first) } else { None },
            last,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MonthRange {
    cursor: Option<YearMonth>,
    last: YearMonth,
}

impl Iterator for MonthRange {
    type Item = YearMonth;

    fn next(&mut self) -> Option<YearMonth> {
        let current = self.cursor?;
        self.cursor = if current < self.last {
            Some(current.next())
        } else {
            None
        };
        Some(current)
    }
}

fn month_name(month: u8) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Renders minutes as "7h 30m" ("0m" for zero), keeping the sign up front.
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let total = minutes.unsigned_abs();
    let hours = total / 60;
    let rest = total % 60;
    if hours == 0 {
        format!("{sign}{rest}m")
    } else if rest == 0 {
        format!("{sign}{hours}h")
    } else {
        format!("{sign}{hours}h {rest}m")
    }
}

#[cfg(test)]
mod tests;
