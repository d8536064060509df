#![forbid(unsafe_code)]

use crate::month::YearMonth;
use time::Date;

/// ISO 4217 currency code: exactly three ASCII uppercase letters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, CurrencyCodeError> {
        let value = value.into();
        validate_currency_code(&value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurrencyCodeError {
    WrongLength,
    InvalidChar,
}

impl CurrencyCodeError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::WrongLength => "currency code must be exactly 3 letters",
            Self::InvalidChar => "currency code must be ASCII uppercase letters",
        }
    }
}

fn validate_currency_code(value: &str) -> Result<(), CurrencyCodeError> {
    if value.len() != 3 {
        return Err(CurrencyCodeError::WrongLength);
    }
    if value.chars().any(|ch| !ch.is_ascii_uppercase()) {
        return Err(CurrencyCodeError::InvalidChar);
    }
    Ok(())
}

/// Retainer terms as read from the owning contract record. Immutable per
/// computation; the ledger never writes these back.
#[derive(Clone, Debug)]
pub struct RetainerConfig {
    pub included_minutes_per_month: i64,
    /// Hourly overage rate in minor currency units (cents).
    pub overage_rate_cents: i64,
    pub rollover_enabled: bool,
    /// Defines cycle alignment; the day of month is ignored.
    pub start_date: Date,
    pub currency: CurrencyCode,
}

/// One unit of billable time, assembled fresh from the time-entry store on
/// every read. Category fields reflect the owning task at read time.
#[derive(Clone, Debug)]
pub struct WorkRecord {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Date,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub minutes: i64,
    pub note: Option<String>,
}

/// Position of a month inside its 3-month cycle. Months before the contract
/// start carry the neutral sentinel: index -1, position 0, neither flag set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleInfo {
    pub cycle_index: i64,
    pub month_in_cycle: u8,
    pub cycle_start: bool,
    pub cycle_end: bool,
}

/// One row of the derived balance history.
#[derive(Clone, Debug)]
pub struct ComputedMonth {
    pub month: YearMonth,
    pub label: String,
    pub cycle_index: i64,
    pub month_in_cycle: u8,
    pub cycle_start: bool,
    pub cycle_end: bool,
    pub records: Vec<WorkRecord>,
    pub worked_minutes: i64,
    pub start_balance: i64,
    pub available_minutes: i64,
    pub end_balance: i64,
    /// Settled overage; populated only when `settles` is true.
    pub extra_minutes: i64,
    /// Settled leftover; populated only when `settles` is true.
    pub unused_minutes: i64,
    pub settles: bool,
}

#[derive(Clone, Debug)]
pub struct CategoryGroup {
    pub category_id: Option<String>,
    /// None marks the uncategorized bucket.
    pub category_name: Option<String>,
    pub total_minutes: i64,
    pub tasks: Vec<TaskRollup>,
}

/// Per-task summary inside a category group: durations summed, earliest
/// date kept.
#[derive(Clone, Debug)]
pub struct TaskRollup {
    pub task_id: String,
    pub title: String,
    pub first_date: Date,
    pub minutes: i64,
}
