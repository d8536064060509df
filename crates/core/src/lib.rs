#![forbid(unsafe_code)]

pub mod ledger;
pub mod month;

pub use ledger::*;
pub use month::{YearMonth, YearMonthError, format_minutes};
