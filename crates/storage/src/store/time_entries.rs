#![forbid(unsafe_code)]

use super::*;
use rusqlite::params;
use time::Date;

impl SqliteStore {
    /// The write boundary of the ledger: durations are validated before any
    /// SQL runs, so zero/negative minutes can never reach the balance math.
    pub fn time_entry_create(
        &mut self,
        request: CreateTimeEntryRequest,
    ) -> Result<TimeEntryRow, StoreError> {
        if request.minutes <= 0 {
            return Err(StoreError::InvalidInput("minutes must be positive"));
        }

        let now_ms = now_ms();
        let entry_date = format_date(request.date);
        let tx = self.conn.transaction()?;
        let Some(project_id) = task_project_tx(&tx, &request.task_id)? else {
            return Err(StoreError::UnknownId);
        };

        let id = format!("TE-{:06}", next_counter_tx(&tx, "time_entries")?);
        tx.execute(
            r#"
            INSERT INTO time_entries(id, task_id, entry_date, minutes, note, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id,
                request.task_id,
                entry_date,
                request.minutes,
                request.note,
                now_ms,
            ],
        )?;

        let payload = serde_json::json!({
            "task_id": request.task_id,
            "date": entry_date,
            "minutes": request.minutes,
        })
        .to_string();
        insert_event_tx(
            &tx,
            now_ms,
            Some(&project_id),
            Some(&id),
            "time_entry_added",
            &payload,
        )?;

        tx.commit()?;
        Ok(TimeEntryRow {
            id,
            task_id: request.task_id,
            date: request.date,
            minutes: request.minutes,
            note: request.note,
            created_at_ms: now_ms,
        })
    }

    pub fn time_entries_for_task(&self, task_id: &str) -> Result<Vec<TimeEntryRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, entry_date, minutes, note, created_at_ms \
             FROM time_entries WHERE task_id=?1 \
             ORDER BY entry_date ASC, id ASC",
        )?;
        let mut rows = stmt.query(params![task_id])?;
        collect_entries(&mut rows)
    }

    /// Every entry booked on the project between the two dates, inclusive.
    /// Archived tasks still count here: the contract bills hours that were
    /// worked, not hours on tasks that stayed visible.
    pub fn time_entries_for_project_in_range(
        &self,
        project_id: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<TimeEntryRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.task_id, e.entry_date, e.minutes, e.note, e.created_at_ms \
             FROM time_entries e JOIN tasks t ON t.id = e.task_id \
             WHERE t.project_id=?1 AND e.entry_date>=?2 AND e.entry_date<=?3 \
             ORDER BY e.entry_date ASC, e.id ASC",
        )?;
        let mut rows = stmt.query(params![project_id, format_date(from), format_date(to)])?;
        collect_entries(&mut rows)
    }

    pub fn project_minutes_in_range(
        &self,
        project_id: &str,
        from: Date,
        to: Date,
    ) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(e.minutes), 0) \
             FROM time_entries e JOIN tasks t ON t.id = e.task_id \
             WHERE t.project_id=?1 AND e.entry_date>=?2 AND e.entry_date<=?3",
            params![project_id, format_date(from), format_date(to)],
            |row| row.get(0),
        )?)
    }

    pub fn recent_events(&self, limit: usize) -> Result<Vec<EventRow>, StoreError> {
        let limit = to_sqlite_i64(limit)?;
        let mut stmt = self.conn.prepare(
            "SELECT seq, ts_ms, project_id, entity_id, event_type, payload_json \
             FROM events ORDER BY seq DESC LIMIT ?1",
        )?;

        let mut rows = stmt.query(params![limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(EventRow {
                seq: row.get(0)?,
                ts_ms: row.get(1)?,
                project_id: row.get(2)?,
                entity_id: row.get(3)?,
                event_type: row.get(4)?,
                payload_json: row.get(5)?,
            });
        }
        Ok(out)
    }
}

fn collect_entries(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<TimeEntryRow>, StoreError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let date = parse_date(&row.get::<_, String>(2)?)?;
        out.push(TimeEntryRow {
            id: row.get(0)?,
            task_id: row.get(1)?,
            date,
            minutes: row.get(3)?,
            note: row.get(4)?,
            created_at_ms: row.get(5)?,
        });
    }
    Ok(out)
}
