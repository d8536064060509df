#![forbid(unsafe_code)]

use hb_core::YearMonth;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// The only place the wall clock leaks into the ledger; everything below
/// this crate takes an explicit month.
pub(crate) fn current_month() -> YearMonth {
    YearMonth::from_date(OffsetDateTime::now_utc().date())
}

pub(crate) fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
