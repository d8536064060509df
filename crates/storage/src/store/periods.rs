#![forbid(unsafe_code)]

use super::*;
use hb_core::YearMonth;
use rusqlite::{Connection, params};

/// An unused monthly allotment stays eligible for rollover for exactly this
/// many following months, then expires.
const ROLLOVER_WINDOW_MONTHS: u32 = 3;

impl SqliteStore {
    pub fn period_get(
        &self,
        project_id: &str,
        month: YearMonth,
    ) -> Result<Option<PeriodRow>, StoreError> {
        period_row(&self.conn, project_id, &format_date(month.first_day()))
    }

    /// Lazily materializes the ledger row for one project month. Budget and
    /// rollover are snapshotted exactly once, on first access; later calls
    /// (and concurrent first accesses losing the insert race) return the
    /// stored row untouched.
    pub fn period_get_or_create(
        &mut self,
        project_id: &str,
        month: YearMonth,
    ) -> Result<PeriodRow, StoreError> {
        let config = self.retainer_config(project_id)?;
        let start_key = format_date(month.first_day());
        if let Some(existing) = period_row(&self.conn, project_id, &start_key)? {
            return Ok(existing);
        }

        let rollover_minutes = self.rollover_window_minutes(project_id, month)?;
        let included = config.included_minutes_per_month;
        let end_key = format_date(month.last_day());
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        if let Some(existing) = period_row(&tx, project_id, &start_key)? {
            return Ok(existing);
        }

        let id = format!("RP-{:03}", next_counter_tx(&tx, "retainer_periods")?);
        let insert = tx.execute(
            r#"
            INSERT INTO retainer_periods(project_id, period_start, id, period_end, included_minutes, rollover_minutes, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                project_id,
                start_key,
                id,
                end_key,
                included,
                rollover_minutes,
                now_ms,
            ],
        );

        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                drop(tx);
                if let Some(existing) = period_row(&self.conn, project_id, &start_key)? {
                    return Ok(existing);
                }
            }
            return Err(StoreError::Sql(err));
        }

        let payload = serde_json::json!({
            "period_start": start_key,
            "included_minutes": included,
            "rollover_minutes": rollover_minutes,
        })
        .to_string();
        insert_event_tx(
            &tx,
            now_ms,
            Some(project_id),
            Some(&id),
            "retainer_period_opened",
            &payload,
        )?;

        tx.commit()?;
        Ok(PeriodRow {
            id,
            project_id: project_id.to_string(),
            period_start: month.first_day(),
            period_end: month.last_day(),
            included_minutes: included,
            rollover_minutes,
            created_at_ms: now_ms,
        })
    }

    /// Live usage snapshot for one project month. Falls back to the current
    /// contract budget (and zero rollover) when no period row exists yet;
    /// `used_minutes` is always summed fresh from the time entries.
    pub fn month_usage(
        &self,
        project_id: &str,
        month: YearMonth,
    ) -> Result<UsageSnapshot, StoreError> {
        let config = self.retainer_config(project_id)?;

        let period = self.period_get(project_id, month)?;
        let (period_id, included, rollover) = match &period {
            Some(row) => (
                Some(row.id.clone()),
                row.included_minutes,
                row.rollover_minutes,
            ),
            None => (None, config.included_minutes_per_month, 0),
        };

        let used = self.project_minutes_in_range(project_id, month.first_day(), month.last_day())?;
        let total_available = included + rollover;
        let overage_minutes = (used - total_available).max(0);
        let usage_percent = if total_available > 0 {
            (100 * used + total_available / 2) / total_available
        } else {
            0
        };

        let expiring_minutes =
            match self.period_get(project_id, month.minus_months(ROLLOVER_WINDOW_MONTHS))? {
                Some(prior) => self.period_unused_minutes(&prior)?,
                None => 0,
            };

        let overage = overage_minutes > 0;
        let warnings = UsageWarnings {
            overage,
            usage80: usage_percent >= 80 && !overage,
            expiring: expiring_minutes > 0,
        };

        Ok(UsageSnapshot {
            project_id: project_id.to_string(),
            month,
            period_id,
            included_minutes: included,
            rollover_minutes: rollover,
            used_minutes: used,
            total_available,
            overage_minutes,
            usage_percent,
            expiring_minutes,
            warnings,
        })
    }

    /// All persisted periods of a project, newest first, each re-enriched
    /// with live usage against its own snapshotted total.
    pub fn period_history(&self, project_id: &str) -> Result<Vec<PeriodUsage>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, period_start, id, period_end, included_minutes, rollover_minutes, created_at_ms \
             FROM retainer_periods WHERE project_id=?1 \
             ORDER BY period_start DESC",
        )?;
        let mut rows = stmt.query(params![project_id])?;
        let mut periods = Vec::new();
        while let Some(row) = rows.next()? {
            periods.push(map_period_row(row)?);
        }

        let mut out = Vec::new();
        for period in periods {
            let used = self.project_minutes_in_range(
                project_id,
                period.period_start,
                period.period_end,
            )?;
            let overage_minutes = (used - (period.included_minutes + period.rollover_minutes)).max(0);
            out.push(PeriodUsage {
                period,
                used_minutes: used,
                overage_minutes,
            });
        }
        Ok(out)
    }

    /// The trailing-window figure persisted into a new period: each of the 3
    /// prior months contributes the unused part of its own included
    /// allotment (never inherited rollover), and only if a period row was
    /// actually materialized for it.
    fn rollover_window_minutes(
        &self,
        project_id: &str,
        month: YearMonth,
    ) -> Result<i64, StoreError> {
        let mut total = 0i64;
        for back in 1..=ROLLOVER_WINDOW_MONTHS {
            let Some(period) = self.period_get(project_id, month.minus_months(back))? else {
                continue;
            };
            total += self.period_unused_minutes(&period)?;
        }
        Ok(total)
    }

    fn period_unused_minutes(&self, period: &PeriodRow) -> Result<i64, StoreError> {
        let used = self.project_minutes_in_range(
            &period.project_id,
            period.period_start,
            period.period_end,
        )?;
        Ok((period.included_minutes - used).max(0))
    }
}

fn period_row(
    conn: &Connection,
    project_id: &str,
    start_key: &str,
) -> Result<Option<PeriodRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT project_id, period_start, id, period_end, included_minutes, rollover_minutes, created_at_ms \
         FROM retainer_periods WHERE project_id=?1 AND period_start=?2",
    )?;
    let mut rows = stmt.query(params![project_id, start_key])?;
    match rows.next()? {
        Some(row) => Ok(Some(map_period_row(row)?)),
        None => Ok(None),
    }
}

fn map_period_row(row: &rusqlite::Row<'_>) -> Result<PeriodRow, StoreError> {
    Ok(PeriodRow {
        project_id: row.get(0)?,
        period_start: parse_date(&row.get::<_, String>(1)?)?,
        id: row.get(2)?,
        period_end: parse_date(&row.get::<_, String>(3)?)?,
        included_minutes: row.get(4)?,
        rollover_minutes: row.get(5)?,
        created_at_ms: row.get(6)?,
    })
}
