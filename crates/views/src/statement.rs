#![forbid(unsafe_code)]

use crate::clock::{current_month, format_date, now_rfc3339};
use crate::compose::monthly_work_records;
use hb_core::{
    CategoryGroup, ComputedMonth, RetainerConfig, WorkRecord, YearMonth, compute_retainer_months,
    end_subtitle, group_by_category, month_status_tag, overage_amount_cents, start_subtitle,
};
use hb_storage::{SqliteStore, StoreError};
use serde::Serialize;
use serde_json::Value;

/// Filters applied to the statement document. `from`/`to` narrow which
/// months are returned and `category_id` narrows what each month displays;
/// neither ever feeds back into the balance math.
#[derive(Clone, Debug, Default)]
pub struct StatementQuery {
    pub project_id: String,
    pub from: Option<YearMonth>,
    pub to: Option<YearMonth>,
    pub category_id: Option<String>,
    pub as_of: Option<YearMonth>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RetainerStatement {
    pub project_id: String,
    pub generated_at: String,
    pub config: StatementConfig,
    pub months: Vec<StatementMonth>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementConfig {
    pub included_minutes_per_month: i64,
    pub rollover_enabled: bool,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementMonth {
    pub month: String,
    pub label: String,
    pub cycle_index: i64,
    pub month_in_cycle: u8,
    pub cycle_start: bool,
    pub cycle_end: bool,
    pub status: StatementStatus,
    pub start_subtitle: String,
    pub end_subtitle: String,
    /// Sum of the displayed records only; narrows along with the category
    /// filter, unlike the balance columns below.
    pub worked_minutes: i64,
    pub start_balance: i64,
    pub available_minutes: i64,
    pub end_balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<StatementSettlement>,
    pub records: Vec<StatementRecord>,
    pub categories: Vec<StatementCategory>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementStatus {
    pub label: &'static str,
    pub severity: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementSettlement {
    pub extra_minutes: i64,
    pub unused_minutes: i64,
    pub overage_amount_cents: i64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementRecord {
    pub task_id: String,
    pub title: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// None marks the uncategorized bucket, sorted last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub total_minutes: i64,
    pub tasks: Vec<StatementTask>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementTask {
    pub task_id: String,
    pub title: String,
    pub first_date: String,
    pub minutes: i64,
}

impl RetainerStatement {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Builds the statement document for a retainer project. The balance
/// recurrence always runs over the entire history up to `as_of` (or the
/// current month); the query filters only shape what the document shows.
pub fn retainer_statement(
    store: &SqliteStore,
    query: StatementQuery,
) -> Result<RetainerStatement, StoreError> {
    let config = store.retainer_config(&query.project_id)?;
    let records = monthly_work_records(store, &query.project_id)?;
    let as_of = query.as_of.unwrap_or_else(current_month);
    let history = compute_retainer_months(&config, &records, as_of);

    let category_id = query.category_id.as_deref();
    let mut months = Vec::new();
    for month in &history {
        if let Some(from) = query.from
            && month.month < from
        {
            continue;
        }
        if let Some(to) = query.to
            && month.month > to
        {
            continue;
        }
        months.push(statement_month(month, category_id, &config));
    }

    Ok(RetainerStatement {
        project_id: query.project_id,
        generated_at: now_rfc3339(),
        config: StatementConfig {
            included_minutes_per_month: config.included_minutes_per_month,
            rollover_enabled: config.rollover_enabled,
            currency: config.currency.as_str().to_string(),
        },
        months,
    })
}

fn statement_month(
    month: &ComputedMonth,
    category_id: Option<&str>,
    config: &RetainerConfig,
) -> StatementMonth {
    let shown: Vec<WorkRecord> = match category_id {
        Some(id) => month
            .records
            .iter()
            .filter(|record| record.category_id.as_deref() == Some(id))
            .cloned()
            .collect(),
        None => month.records.clone(),
    };
    let worked_minutes: i64 = shown.iter().map(|record| record.minutes).sum();
    let groups = group_by_category(&shown);
    let status = month_status_tag(month);

    let settlement = if month.settles {
        Some(StatementSettlement {
            extra_minutes: month.extra_minutes,
            unused_minutes: month.unused_minutes,
            overage_amount_cents: overage_amount_cents(
                month.extra_minutes,
                config.overage_rate_cents,
            ),
            currency: config.currency.as_str().to_string(),
        })
    } else {
        None
    };

    StatementMonth {
        month: month.month.key(),
        label: month.label.clone(),
        cycle_index: month.cycle_index,
        month_in_cycle: month.month_in_cycle,
        cycle_start: month.cycle_start,
        cycle_end: month.cycle_end,
        status: StatementStatus {
            label: status.label,
            severity: status.severity.as_str(),
        },
        start_subtitle: start_subtitle(month, config.rollover_enabled),
        end_subtitle: end_subtitle(month, config.rollover_enabled),
        worked_minutes,
        start_balance: month.start_balance,
        available_minutes: month.available_minutes,
        end_balance: month.end_balance,
        settlement,
        records: shown.iter().map(statement_record).collect(),
        categories: groups.iter().map(statement_category).collect(),
    }
}

fn statement_record(record: &WorkRecord) -> StatementRecord {
    StatementRecord {
        task_id: record.task_id.clone(),
        title: record.title.clone(),
        date: format_date(record.date),
        category_id: record.category_id.clone(),
        category_name: record.category_name.clone(),
        minutes: record.minutes,
        note: record.note.clone(),
    }
}

fn statement_category(group: &CategoryGroup) -> StatementCategory {
    StatementCategory {
        category_id: group.category_id.clone(),
        category_name: group.category_name.clone(),
        total_minutes: group.total_minutes,
        tasks: group
            .tasks
            .iter()
            .map(|task| StatementTask {
                task_id: task.task_id.clone(),
                title: task.title.clone(),
                first_date: format_date(task.first_date),
                minutes: task.minutes,
            })
            .collect(),
    }
}
