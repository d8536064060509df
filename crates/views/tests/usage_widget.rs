#![forbid(unsafe_code)]

use hb_core::YearMonth;
use hb_storage::{
    BillingType, CreateProjectRequest, CreateTaskRequest, CreateTimeEntryRequest,
    SetContractRequest, SqliteStore, StoreError,
};
use hb_views::{usage_history, usage_widget};
use std::path::PathBuf;
use time::{Date, Month};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("hb_views_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn date(year: i32, month: u8, day: u8) -> Date {
    Date::from_calendar_date(year, Month::try_from(month).expect("month"), day).expect("date")
}

fn ym(year: i32, month: u8) -> YearMonth {
    YearMonth::new(year, month).expect("year-month")
}

fn retainer_fixture(store: &mut SqliteStore, included_minutes: i64) -> (String, String) {
    let project = store
        .project_create(CreateProjectRequest {
            name: "Acme Retainer".to_string(),
            client: "Acme".to_string(),
            billing_type: BillingType::Retainer,
        })
        .expect("project");
    store
        .contract_set(SetContractRequest {
            project_id: project.id.clone(),
            included_minutes,
            overage_rate_cents: 10_000,
            rollover_enabled: true,
            start_date: date(2025, 1, 1),
            currency: "USD".to_string(),
        })
        .expect("contract");
    let task = store
        .task_create(CreateTaskRequest {
            project_id: project.id.clone(),
            title: "Ongoing work".to_string(),
            description: None,
            category_id: None,
        })
        .expect("task");
    (project.id, task.id)
}

fn log_minutes(store: &mut SqliteStore, task_id: &str, on: Date, minutes: i64) {
    store
        .time_entry_create(CreateTimeEntryRequest {
            task_id: task_id.to_string(),
            date: on,
            minutes,
            note: None,
        })
        .expect("entry");
}

#[test]
fn first_widget_fetch_materializes_the_period() {
    let dir = temp_dir("first_widget_fetch_materializes_the_period");
    let mut store = SqliteStore::open(&dir).expect("open store");
    let (project_id, _task_id) = retainer_fixture(&mut store, 600);

    assert!(
        store
            .period_get(&project_id, ym(2025, 2))
            .expect("get")
            .is_none()
    );

    let widget = usage_widget(&mut store, &project_id, Some(ym(2025, 2))).expect("widget");
    let period = store
        .period_get(&project_id, ym(2025, 2))
        .expect("get")
        .expect("materialized");

    assert_eq!(widget.period_id, period.id);
    assert_eq!(widget.month, "2025-02");
    assert_eq!(widget.label, "February 2025");
    assert_eq!(widget.included_minutes, 600);
    assert_eq!(widget.rollover_minutes, 0);
    assert_eq!(widget.total_available, 600);
    assert_eq!(widget.used_minutes, 0);
}

#[test]
fn widget_usage_is_live_while_the_snapshot_stays_frozen() {
    let dir = temp_dir("widget_usage_is_live_while_the_snapshot_stays_frozen");
    let mut store = SqliteStore::open(&dir).expect("open store");
    let (project_id, task_id) = retainer_fixture(&mut store, 600);

    let first = usage_widget(&mut store, &project_id, Some(ym(2025, 2))).expect("widget");
    assert_eq!(first.used_minutes, 0);
    assert_eq!(first.usage_percent, 0);

    log_minutes(&mut store, &task_id, date(2025, 2, 10), 90);
    store
        .contract_set(SetContractRequest {
            project_id: project_id.clone(),
            included_minutes: 900,
            overage_rate_cents: 10_000,
            rollover_enabled: true,
            start_date: date(2025, 1, 1),
            currency: "USD".to_string(),
        })
        .expect("raise budget");

    let second = usage_widget(&mut store, &project_id, Some(ym(2025, 2))).expect("widget");
    assert_eq!(second.period_id, first.period_id);
    assert_eq!(second.used_minutes, 90);
    assert_eq!(second.usage_percent, 15);
    assert_eq!(second.included_minutes, 600);

    let march = usage_widget(&mut store, &project_id, Some(ym(2025, 3))).expect("widget");
    assert_eq!(march.included_minutes, 900);
}

#[test]
fn widget_flags_overage_and_mutes_the_eighty_percent_warning() {
    let dir = temp_dir("widget_flags_overage_and_mutes_the_eighty_percent_warning");
    let mut store = SqliteStore::open(&dir).expect("open store");
    let (project_id, task_id) = retainer_fixture(&mut store, 600);
    log_minutes(&mut store, &task_id, date(2025, 2, 10), 700);

    let widget = usage_widget(&mut store, &project_id, Some(ym(2025, 2))).expect("widget");
    assert_eq!(widget.overage_minutes, 100);
    assert_eq!(widget.usage_percent, 117);
    assert!(widget.warnings.overage);
    assert!(!widget.warnings.usage80);

    let value = widget.to_value();
    assert_eq!(value["warnings"]["overage"], true);
    assert_eq!(value["usage_percent"], 117);
}

#[test]
fn widget_flags_rollover_about_to_expire() {
    let dir = temp_dir("widget_flags_rollover_about_to_expire");
    let mut store = SqliteStore::open(&dir).expect("open store");
    let (project_id, task_id) = retainer_fixture(&mut store, 600);

    usage_widget(&mut store, &project_id, Some(ym(2025, 1))).expect("january widget");
    log_minutes(&mut store, &task_id, date(2025, 1, 10), 400);

    let april = usage_widget(&mut store, &project_id, Some(ym(2025, 4))).expect("april widget");
    assert_eq!(april.rollover_minutes, 200);
    assert_eq!(april.total_available, 800);
    assert_eq!(april.expiring_minutes, 200);
    assert!(april.warnings.expiring);
    assert!(!april.warnings.overage);
}

#[test]
fn history_lists_periods_newest_first() {
    let dir = temp_dir("history_lists_periods_newest_first");
    let mut store = SqliteStore::open(&dir).expect("open store");
    let (project_id, task_id) = retainer_fixture(&mut store, 600);

    usage_widget(&mut store, &project_id, Some(ym(2025, 1))).expect("widget");
    log_minutes(&mut store, &task_id, date(2025, 1, 10), 700);
    usage_widget(&mut store, &project_id, Some(ym(2025, 2))).expect("widget");
    log_minutes(&mut store, &task_id, date(2025, 2, 10), 120);
    usage_widget(&mut store, &project_id, Some(ym(2025, 3))).expect("widget");

    let history = usage_history(&store, &project_id).expect("history");
    assert_eq!(history.project_id, project_id);
    assert_eq!(history.periods.len(), 3);

    let march = &history.periods[0];
    assert_eq!(march.month, "2025-03");
    assert_eq!(march.label, "March 2025");
    assert_eq!(march.rollover_minutes, 480);
    assert_eq!(march.total_available, 1080);
    assert_eq!(march.used_minutes, 0);

    let february = &history.periods[1];
    assert_eq!(february.month, "2025-02");
    assert_eq!(february.used_minutes, 120);
    assert_eq!(february.overage_minutes, 0);

    let january = &history.periods[2];
    assert_eq!(january.month, "2025-01");
    assert_eq!(january.used_minutes, 700);
    assert_eq!(january.overage_minutes, 100);
}

#[test]
fn usage_surfaces_follow_the_billing_taxonomy() {
    let dir = temp_dir("usage_surfaces_follow_the_billing_taxonomy");
    let mut store = SqliteStore::open(&dir).expect("open store");

    let hourly = store
        .project_create(CreateProjectRequest {
            name: "Consulting".to_string(),
            client: "Beta".to_string(),
            billing_type: BillingType::Hourly,
        })
        .expect("project");

    assert!(matches!(
        usage_widget(&mut store, &hourly.id, Some(ym(2025, 1))),
        Err(StoreError::NotRetainerBilled { .. })
    ));
    assert!(matches!(
        usage_history(&store, &hourly.id),
        Err(StoreError::NotRetainerBilled { .. })
    ));
    assert!(matches!(
        usage_history(&store, "PRJ-999"),
        Err(StoreError::UnknownProject)
    ));
}
