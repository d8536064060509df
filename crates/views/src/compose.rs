#![forbid(unsafe_code)]

use hb_core::{WorkRecord, YearMonth};
use hb_storage::{SqliteStore, StoreError};
use std::collections::BTreeMap;

/// Joins every non-archived task of the project with its category and fans
/// the task's time entries out into per-month work records. Category names
/// are resolved at read time, so renames and moves show up on the next
/// call; nothing here is cached.
pub fn monthly_work_records(
    store: &SqliteStore,
    project_id: &str,
) -> Result<BTreeMap<YearMonth, Vec<WorkRecord>>, StoreError> {
    let mut category_names: BTreeMap<String, Option<String>> = BTreeMap::new();
    let mut months: BTreeMap<YearMonth, Vec<WorkRecord>> = BTreeMap::new();

    for task in store.tasks_for_project(project_id)? {
        if task.archived {
            continue;
        }

        let category_name = match task.category_id.as_deref() {
            Some(category_id) => match category_names.get(category_id) {
                Some(name) => name.clone(),
                None => {
                    let name = store.category_get(category_id)?.map(|row| row.name);
                    category_names.insert(category_id.to_string(), name.clone());
                    name
                }
            },
            None => None,
        };

        for entry in store.time_entries_for_task(&task.id)? {
            let month = YearMonth::from_date(entry.date);
            months.entry(month).or_default().push(WorkRecord {
                task_id: task.id.clone(),
                title: task.title.clone(),
                description: task.description.clone(),
                date: entry.date,
                category_id: task.category_id.clone(),
                category_name: category_name.clone(),
                minutes: entry.minutes,
                note: entry.note,
            });
        }
    }

    for records in months.values_mut() {
        records.sort_by(|a, b| (a.date, &a.task_id).cmp(&(b.date, &b.task_id)));
    }
    Ok(months)
}
