#![forbid(unsafe_code)]

use crate::ledger::types::CycleInfo;
use crate::month::YearMonth;
use time::Date;

/// Cycle length is fixed at one quarter; not configurable.
pub const CYCLE_MONTHS: i64 = 3;

pub fn cycle_info(month: YearMonth, start_date: Date) -> CycleInfo {
    let start = YearMonth::from_date(start_date);
    if month < start {
        return CycleInfo {
            cycle_index: -1,
            month_in_cycle: 0,
            cycle_start: false,
            cycle_end: false,
        };
    }

    let since_start = month.months_since(start);
    let month_in_cycle = (since_start % CYCLE_MONTHS) as u8 + 1;
    CycleInfo {
        cycle_index: since_start / CYCLE_MONTHS,
        month_in_cycle,
        cycle_start: month_in_cycle == 1,
        cycle_end: i64::from(month_in_cycle) == CYCLE_MONTHS,
    }
}
