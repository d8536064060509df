#![forbid(unsafe_code)]

use crate::ledger::types::ComputedMonth;
use crate::month::format_minutes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagSeverity {
    Success,
    Warning,
    Destructive,
}

impl TagSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Destructive => "destructive",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTag {
    pub label: &'static str,
    pub severity: TagSeverity,
}

/// Settled months report their settlement outcome; overage wins over the
/// on-budget label, and an exact zero balance is always on-budget (never
/// "unused", never "over"). Mid-cycle months only distinguish a deficit.
pub fn month_status_tag(month: &ComputedMonth) -> StatusTag {
    if month.settles {
        if month.extra_minutes > 0 {
            return StatusTag {
                label: "Over budget",
                severity: TagSeverity::Destructive,
            };
        }
        if month.unused_minutes > 0 {
            return StatusTag {
                label: "Unused hours",
                severity: TagSeverity::Warning,
            };
        }
        return StatusTag {
            label: "On budget",
            severity: TagSeverity::Success,
        };
    }

    if month.end_balance < 0 {
        StatusTag {
            label: "Overdrawn",
            severity: TagSeverity::Warning,
        }
    } else {
        StatusTag {
            label: "On track",
            severity: TagSeverity::Success,
        }
    }
}

/// The "started with" line under a statement month.
pub fn start_subtitle(month: &ComputedMonth, rollover_enabled: bool) -> String {
    if !rollover_enabled {
        return format!(
            "Monthly budget of {}, no rollover",
            format_minutes(month.available_minutes)
        );
    }
    if month.cycle_start {
        return format!(
            "New cycle, started fresh with {}",
            format_minutes(month.available_minutes)
        );
    }
    if month.start_balance > 0 {
        format!(
            "Started with {} carried over, {} available",
            format_minutes(month.start_balance),
            format_minutes(month.available_minutes)
        )
    } else if month.start_balance < 0 {
        format!(
            "Started {} in deficit, {} available",
            format_minutes(-month.start_balance),
            format_minutes(month.available_minutes)
        )
    } else {
        format!(
            "Started with no carry-over, {} available",
            format_minutes(month.available_minutes)
        )
    }
}

/// The "ending balance" line under a statement month.
pub fn end_subtitle(month: &ComputedMonth, rollover_enabled: bool) -> String {
    if month.settles {
        if month.extra_minutes > 0 {
            return format!("Settled {} over budget", format_minutes(month.extra_minutes));
        }
        if month.unused_minutes > 0 {
            return if rollover_enabled {
                format!(
                    "Cycle closed with {} unused",
                    format_minutes(month.unused_minutes)
                )
            } else {
                format!(
                    "Month closed with {} unused",
                    format_minutes(month.unused_minutes)
                )
            };
        }
        return "Settled exactly on budget".to_string();
    }

    if month.end_balance < 0 {
        format!(
            "Carrying a {} deficit into next month",
            format_minutes(-month.end_balance)
        )
    } else if month.end_balance > 0 {
        format!(
            "Carrying {} into next month",
            format_minutes(month.end_balance)
        )
    } else {
        "Fully used, nothing carries forward".to_string()
    }
}
