#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::ledger::types::{CategoryGroup, TaskRollup, WorkRecord};

struct GroupAcc {
    category_id: Option<String>,
    category_name: Option<String>,
    tasks: BTreeMap<String, TaskRollup>,
}

/// Buckets a flat record list by category, one rollup per unique task
/// (summed minutes, earliest date). Groups sort by category name ascending;
/// the uncategorized bucket always sorts last. Rollups sort by earliest
/// date, then task id.
pub fn group_by_category(records: &[WorkRecord]) -> Vec<CategoryGroup> {
    let mut groups: BTreeMap<(bool, String), GroupAcc> = BTreeMap::new();

    for record in records {
        let key = match &record.category_name {
            Some(name) => (false, name.clone()),
            None => (true, String::new()),
        };
        let group = groups.entry(key).or_insert_with(|| GroupAcc {
            category_id: record.category_id.clone(),
            category_name: record.category_name.clone(),
            tasks: BTreeMap::new(),
        });
        let rollup = group
            .tasks
            .entry(record.task_id.clone())
            .or_insert_with(|| TaskRollup {
                task_id: record.task_id.clone(),
                title: record.title.clone(),
                first_date: record.date,
                minutes: 0,
            });
        rollup.minutes += record.minutes;
        if record.date < rollup.first_date {
            rollup.first_date = record.date;
        }
    }

    groups
        .into_values()
        .map(|group| {
            let mut tasks: Vec<TaskRollup> = group.tasks.into_values().collect();
            tasks.sort_by(|a, b| {
                a.first_date
                    .cmp(&b.first_date)
                    .then_with(|| a.task_id.cmp(&b.task_id))
            });
            let total_minutes = tasks.iter().map(|rollup| rollup.minutes).sum();
            CategoryGroup {
                category_id: group.category_id,
                category_name: group.category_name,
                total_minutes,
                tasks,
            }
        })
        .collect()
}
