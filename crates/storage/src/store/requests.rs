#![forbid(unsafe_code)]

use super::types::BillingType;
use time::Date;

#[derive(Clone, Debug)]
pub struct CreateProjectRequest {
    pub name: String,
    pub client: String,
    pub billing_type: BillingType,
}

#[derive(Clone, Debug)]
pub struct SetContractRequest {
    pub project_id: String,
    pub included_minutes: i64,
    /// Hourly overage rate in minor currency units.
    pub overage_rate_cents: i64,
    pub rollover_enabled: bool,
    pub start_date: Date,
    pub currency: String,
}

#[derive(Clone, Debug)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct CreateTaskRequest {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CreateTimeEntryRequest {
    pub task_id: String,
    pub date: Date,
    pub minutes: i64,
    pub note: Option<String>,
}
