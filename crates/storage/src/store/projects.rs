#![forbid(unsafe_code)]

use super::*;
use hb_core::{CurrencyCode, RetainerConfig};
use rusqlite::{Connection, OptionalExtension, params};

impl SqliteStore {
    pub fn project_create(
        &mut self,
        request: CreateProjectRequest,
    ) -> Result<ProjectRow, StoreError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }
        let client = request.client.trim().to_string();
        if client.is_empty() {
            return Err(StoreError::InvalidInput("client must not be empty"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let id = format!("PRJ-{:03}", next_counter_tx(&tx, "projects")?);

        tx.execute(
            r#"
            INSERT INTO projects(id, name, client, billing_type, archived, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
            "#,
            params![id, name, client, request.billing_type.as_str(), now_ms],
        )?;

        let payload = serde_json::json!({
            "name": name,
            "client": client,
            "billing_type": request.billing_type.as_str(),
        })
        .to_string();
        insert_event_tx(&tx, now_ms, Some(&id), Some(&id), "project_created", &payload)?;

        tx.commit()?;
        Ok(ProjectRow {
            id,
            name,
            client,
            billing_type: request.billing_type,
            archived: false,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        })
    }

    pub fn project_get(&self, project_id: &str) -> Result<Option<ProjectRow>, StoreError> {
        project_row(&self.conn, project_id)
    }

    pub fn project_archive(&mut self, project_id: &str) -> Result<(), StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE projects SET archived=1, updated_at_ms=?2 WHERE id=?1",
            params![project_id, now_ms],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownProject);
        }

        insert_event_tx(
            &tx,
            now_ms,
            Some(project_id),
            Some(project_id),
            "project_archived",
            "{}",
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Creates or replaces the retainer terms of a project. The billing
    /// figures are validated up front; the row is upserted keeping its
    /// original creation stamp.
    pub fn contract_set(&mut self, request: SetContractRequest) -> Result<ContractRow, StoreError> {
        if request.included_minutes < 0 {
            return Err(StoreError::InvalidInput(
                "included minutes must not be negative",
            ));
        }
        if request.overage_rate_cents < 0 {
            return Err(StoreError::InvalidInput(
                "overage rate must not be negative",
            ));
        }
        let currency = CurrencyCode::try_new(request.currency.clone())
            .map_err(|err| StoreError::InvalidInput(err.message()))?;

        let project = self
            .project_get(&request.project_id)?
            .ok_or(StoreError::UnknownProject)?;
        if project.billing_type != BillingType::Retainer {
            return Err(StoreError::NotRetainerBilled {
                billing_type: project.billing_type.as_str().to_string(),
            });
        }

        let now_ms = now_ms();
        let start_date = format_date(request.start_date);
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO retainer_contracts(project_id, included_minutes, overage_rate_cents, rollover_enabled, start_date, currency, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(project_id) DO UPDATE SET
              included_minutes=excluded.included_minutes,
              overage_rate_cents=excluded.overage_rate_cents,
              rollover_enabled=excluded.rollover_enabled,
              start_date=excluded.start_date,
              currency=excluded.currency,
              updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                request.project_id,
                request.included_minutes,
                request.overage_rate_cents,
                request.rollover_enabled,
                start_date,
                currency.as_str(),
                now_ms,
            ],
        )?;

        let payload = serde_json::json!({
            "included_minutes": request.included_minutes,
            "overage_rate_cents": request.overage_rate_cents,
            "rollover_enabled": request.rollover_enabled,
            "start_date": start_date,
            "currency": currency.as_str(),
        })
        .to_string();
        insert_event_tx(
            &tx,
            now_ms,
            Some(&request.project_id),
            Some(&request.project_id),
            "contract_set",
            &payload,
        )?;

        let Some(row) = contract_row(&tx, &request.project_id)? else {
            return Err(StoreError::InvalidInput("contract row missing after write"));
        };

        tx.commit()?;
        Ok(row)
    }

    pub fn contract_get(&self, project_id: &str) -> Result<Option<ContractRow>, StoreError> {
        contract_row(&self.conn, project_id)
    }

    /// Resolves the billing terms the calculators consume, enforcing the
    /// billing-type taxonomy: unknown project, non-retainer project, and
    /// retainer project without a contract are three distinct errors.
    pub fn retainer_config(&self, project_id: &str) -> Result<RetainerConfig, StoreError> {
        let project = self
            .project_get(project_id)?
            .ok_or(StoreError::UnknownProject)?;
        if project.billing_type != BillingType::Retainer {
            return Err(StoreError::NotRetainerBilled {
                billing_type: project.billing_type.as_str().to_string(),
            });
        }
        let contract = self
            .contract_get(project_id)?
            .ok_or(StoreError::ContractMissing)?;
        let currency = CurrencyCode::try_new(contract.currency)
            .map_err(|err| StoreError::InvalidInput(err.message()))?;

        Ok(RetainerConfig {
            included_minutes_per_month: contract.included_minutes,
            overage_rate_cents: contract.overage_rate_cents,
            rollover_enabled: contract.rollover_enabled,
            start_date: contract.start_date,
            currency,
        })
    }
}

fn project_row(conn: &Connection, project_id: &str) -> Result<Option<ProjectRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, client, billing_type, archived, created_at_ms, updated_at_ms \
             FROM projects WHERE id=?1",
            params![project_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, client, billing_type, archived, created_at_ms, updated_at_ms)) => {
            Ok(Some(ProjectRow {
                id,
                name,
                client,
                billing_type: BillingType::parse(&billing_type)?,
                archived: archived != 0,
                created_at_ms,
                updated_at_ms,
            }))
        }
        None => Ok(None),
    }
}

fn contract_row(conn: &Connection, project_id: &str) -> Result<Option<ContractRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT project_id, included_minutes, overage_rate_cents, rollover_enabled, start_date, currency, created_at_ms, updated_at_ms \
             FROM retainer_contracts WHERE project_id=?1",
            params![project_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((
            project_id,
            included_minutes,
            overage_rate_cents,
            rollover_enabled,
            start_date,
            currency,
            created_at_ms,
            updated_at_ms,
        )) => Ok(Some(ContractRow {
            project_id,
            included_minutes,
            overage_rate_cents,
            rollover_enabled: rollover_enabled != 0,
            start_date: parse_date(&start_date)?,
            currency,
            created_at_ms,
            updated_at_ms,
        })),
        None => Ok(None),
    }
}
