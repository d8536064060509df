#![forbid(unsafe_code)]

use super::StoreError;
use hb_core::YearMonth;
use time::Date;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingType {
    Retainer,
    Hourly,
    Fixed,
}

impl BillingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retainer => "retainer",
            Self::Hourly => "hourly",
            Self::Fixed => "fixed",
        }
    }

    pub(in crate::store) fn parse(value: &str) -> Result<Self, StoreError> {
        match value {
            "retainer" => Ok(Self::Retainer),
            "hourly" => Ok(Self::Hourly),
            "fixed" => Ok(Self::Fixed),
            _ => Err(StoreError::InvalidInput("unknown billing type")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub client: String,
    pub billing_type: BillingType,
    pub archived: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct ContractRow {
    pub project_id: String,
    pub included_minutes: i64,
    pub overage_rate_cents: i64,
    pub rollover_enabled: bool,
    pub start_date: Date,
    pub currency: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct TaskRow {
    pub id: String,
    pub project_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub archived: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug)]
pub struct TimeEntryRow {
    pub id: String,
    pub task_id: String,
    pub date: Date,
    pub minutes: i64,
    pub note: Option<String>,
    pub created_at_ms: i64,
}

/// One persisted ledger month. `included_minutes` and `rollover_minutes` are
/// snapshots taken when the row was created and are never updated.
#[derive(Clone, Debug)]
pub struct PeriodRow {
    pub id: String,
    pub project_id: String,
    pub period_start: Date,
    pub period_end: Date,
    pub included_minutes: i64,
    pub rollover_minutes: i64,
    pub created_at_ms: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageWarnings {
    pub overage: bool,
    pub usage80: bool,
    pub expiring: bool,
}

/// Live usage figures for one project month. `used_minutes` is recomputed
/// from the time-entry store on every call, never read from a period row.
#[derive(Clone, Debug)]
pub struct UsageSnapshot {
    pub project_id: String,
    pub month: YearMonth,
    /// None when no period row exists yet and the live contract budget was
    /// used as the fallback.
    pub period_id: Option<String>,
    pub included_minutes: i64,
    pub rollover_minutes: i64,
    pub used_minutes: i64,
    pub total_available: i64,
    pub overage_minutes: i64,
    pub usage_percent: i64,
    pub expiring_minutes: i64,
    pub warnings: UsageWarnings,
}

#[derive(Clone, Debug)]
pub struct PeriodUsage {
    pub period: PeriodRow,
    pub used_minutes: i64,
    pub overage_minutes: i64,
}

#[derive(Clone, Debug)]
pub struct EventRow {
    pub seq: i64,
    pub ts_ms: i64,
    pub project_id: Option<String>,
    pub entity_id: Option<String>,
    pub event_type: String,
    pub payload_json: String,
}
