#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::ledger::cycle::cycle_info;
use crate::ledger::types::{ComputedMonth, RetainerConfig, WorkRecord};
use crate::month::YearMonth;

/// Derives the full balance history from the contract start month through
/// `max(as_of, latest month present in the data)`, ascending.
///
/// With rollover enabled the running balance carries across months, is
/// forced to zero on every cycle start, and settles only on cycle ends.
/// Negative mid-cycle balances persist and reduce the next month's
/// available minutes (borrowing against future budget). Without rollover
/// every month stands alone and settles immediately.
pub fn compute_retainer_months(
    config: &RetainerConfig,
    records: &BTreeMap<YearMonth, Vec<WorkRecord>>,
    as_of: YearMonth,
) -> Vec<ComputedMonth> {
    let first = YearMonth::from_date(config.start_date);
    let mut last = as_of;
    if let Some(latest) = records.keys().next_back()
        && *latest > last
    {
        last = *latest;
    }
    if last < first {
        return Vec::new();
    }

    let budget = config.included_minutes_per_month;
    let mut balance = 0i64;
    let mut out = Vec::new();

    for month in YearMonth::range(first, last) {
        let info = cycle_info(month, config.start_date);
        let month_records = records.get(&month).cloned().unwrap_or_default();
        let worked: i64 = month_records.iter().map(|record| record.minutes).sum();

        let start_balance = if config.rollover_enabled && !info.cycle_start {
            balance
        } else {
            0
        };
        let available = start_balance + budget;
        let end_balance = available - worked;
        balance = end_balance;

        let settles = if config.rollover_enabled {
            info.cycle_end
        } else {
            true
        };
        let (extra, unused) = if settles {
            ((-end_balance).max(0), end_balance.max(0))
        } else {
            (0, 0)
        };

        out.push(ComputedMonth {
            month,
            label: month.label(),
            cycle_index: info.cycle_index,
            month_in_cycle: info.month_in_cycle,
            cycle_start: info.cycle_start,
            cycle_end: info.cycle_end,
            records: month_records,
            worked_minutes: worked,
            start_balance,
            available_minutes: available,
            end_balance,
            extra_minutes: extra,
            unused_minutes: unused,
            settles,
        });
    }

    out
}

/// Settlement money for overage minutes, rounded half-up to the cent.
pub fn overage_amount_cents(extra_minutes: i64, rate_cents_per_hour: i64) -> i64 {
    (extra_minutes * rate_cents_per_hour + 30) / 60
}
