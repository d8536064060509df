#![forbid(unsafe_code)]

use crate::clock::current_month;
use hb_core::YearMonth;
use hb_storage::{SqliteStore, StoreError};
use serde::Serialize;
use serde_json::Value;

/// Dashboard card for one project month. Fetching the widget is the
/// designated trigger that materializes the month's period row, so budget
/// and rollover get frozen the first time anyone looks at the month.
#[derive(Clone, Debug, Serialize)]
pub struct UsageWidget {
    pub project_id: String,
    pub month: String,
    pub label: String,
    pub period_id: String,
    pub included_minutes: i64,
    pub rollover_minutes: i64,
    pub used_minutes: i64,
    pub total_available: i64,
    pub overage_minutes: i64,
    pub usage_percent: i64,
    pub expiring_minutes: i64,
    pub warnings: WidgetWarnings,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct WidgetWarnings {
    pub overage: bool,
    pub usage80: bool,
    pub expiring: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct UsageHistory {
    pub project_id: String,
    pub periods: Vec<UsagePeriod>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UsagePeriod {
    pub period_id: String,
    pub month: String,
    pub label: String,
    pub included_minutes: i64,
    pub rollover_minutes: i64,
    pub total_available: i64,
    pub used_minutes: i64,
    pub overage_minutes: i64,
}

impl UsageWidget {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl UsageHistory {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub fn usage_widget(
    store: &mut SqliteStore,
    project_id: &str,
    as_of: Option<YearMonth>,
) -> Result<UsageWidget, StoreError> {
    let month = as_of.unwrap_or_else(current_month);
    let period = store.period_get_or_create(project_id, month)?;
    let usage = store.month_usage(project_id, month)?;

    Ok(UsageWidget {
        project_id: project_id.to_string(),
        month: month.key(),
        label: month.label(),
        period_id: period.id,
        included_minutes: usage.included_minutes,
        rollover_minutes: usage.rollover_minutes,
        used_minutes: usage.used_minutes,
        total_available: usage.total_available,
        overage_minutes: usage.overage_minutes,
        usage_percent: usage.usage_percent,
        expiring_minutes: usage.expiring_minutes,
        warnings: WidgetWarnings {
            overage: usage.warnings.overage,
            usage80: usage.warnings.usage80,
            expiring: usage.warnings.expiring,
        },
    })
}

/// Persisted periods of the project, newest first, with live usage held
/// against each period's own frozen total.
pub fn usage_history(store: &SqliteStore, project_id: &str) -> Result<UsageHistory, StoreError> {
    store.retainer_config(project_id)?;

    let mut periods = Vec::new();
    for usage in store.period_history(project_id)? {
        let month = YearMonth::from_date(usage.period.period_start);
        periods.push(UsagePeriod {
            period_id: usage.period.id,
            month: month.key(),
            label: month.label(),
            included_minutes: usage.period.included_minutes,
            rollover_minutes: usage.period.rollover_minutes,
            total_available: usage.period.included_minutes + usage.period.rollover_minutes,
            used_minutes: usage.used_minutes,
            overage_minutes: usage.overage_minutes,
        });
    }
    Ok(UsageHistory {
        project_id: project_id.to_string(),
        periods,
    })
}
