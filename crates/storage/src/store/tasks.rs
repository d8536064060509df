#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn category_create(
        &mut self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryRow, StoreError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let id = format!("CAT-{:03}", next_counter_tx(&tx, "categories")?);

        let insert = tx.execute(
            "INSERT INTO categories(id, name, created_at_ms) VALUES (?1, ?2, ?3)",
            params![id, name, now_ms],
        );
        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                return Err(StoreError::InvalidInput("category name already taken"));
            }
            return Err(StoreError::Sql(err));
        }

        let payload = serde_json::json!({ "name": name }).to_string();
        insert_event_tx(&tx, now_ms, None, Some(&id), "category_created", &payload)?;

        tx.commit()?;
        Ok(CategoryRow {
            id,
            name,
            created_at_ms: now_ms,
        })
    }

    pub fn category_get(&self, category_id: &str) -> Result<Option<CategoryRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, created_at_ms FROM categories WHERE id=?1",
                params![category_id],
                |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at_ms: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn task_create(&mut self, request: CreateTaskRequest) -> Result<TaskRow, StoreError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title must not be empty"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        ensure_project_tx(&tx, &request.project_id)?;
        if let Some(category_id) = request.category_id.as_deref()
            && !category_exists_tx(&tx, category_id)?
        {
            return Err(StoreError::UnknownId);
        }

        let id = format!("TASK-{:03}", next_counter_tx(&tx, "tasks")?);
        tx.execute(
            r#"
            INSERT INTO tasks(id, project_id, category_id, title, description, archived, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
            "#,
            params![
                id,
                request.project_id,
                request.category_id,
                title,
                request.description,
                now_ms,
            ],
        )?;

        let payload = serde_json::json!({
            "title": title,
            "category_id": request.category_id,
        })
        .to_string();
        insert_event_tx(
            &tx,
            now_ms,
            Some(&request.project_id),
            Some(&id),
            "task_created",
            &payload,
        )?;

        tx.commit()?;
        Ok(TaskRow {
            id,
            project_id: request.project_id,
            category_id: request.category_id,
            title,
            description: request.description,
            archived: false,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        })
    }

    /// Moves a task to a category (or out of every category with `None`).
    /// Work records pick the change up immediately since category linkage is
    /// resolved live at read time.
    pub fn task_set_category(
        &mut self,
        task_id: &str,
        category_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let Some(project_id) = task_project_tx(&tx, task_id)? else {
            return Err(StoreError::UnknownId);
        };
        if let Some(category_id) = category_id
            && !category_exists_tx(&tx, category_id)?
        {
            return Err(StoreError::UnknownId);
        }

        tx.execute(
            "UPDATE tasks SET category_id=?2, updated_at_ms=?3 WHERE id=?1",
            params![task_id, category_id, now_ms],
        )?;

        let payload = serde_json::json!({ "category_id": category_id }).to_string();
        insert_event_tx(
            &tx,
            now_ms,
            Some(&project_id),
            Some(task_id),
            "task_category_set",
            &payload,
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn task_archive(&mut self, task_id: &str) -> Result<(), StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let Some(project_id) = task_project_tx(&tx, task_id)? else {
            return Err(StoreError::UnknownId);
        };

        tx.execute(
            "UPDATE tasks SET archived=1, updated_at_ms=?2 WHERE id=?1",
            params![task_id, now_ms],
        )?;

        insert_event_tx(
            &tx,
            now_ms,
            Some(&project_id),
            Some(task_id),
            "task_archived",
            "{}",
        )?;

        tx.commit()?;
        Ok(())
    }

    /// All tasks of a project, archived ones included; callers that only
    /// want billable work filter on the flag.
    pub fn tasks_for_project(&self, project_id: &str) -> Result<Vec<TaskRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, category_id, title, description, archived, created_at_ms, updated_at_ms \
             FROM tasks WHERE project_id=?1 \
             ORDER BY created_at_ms ASC, id ASC",
        )?;

        let mut rows = stmt.query(params![project_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(TaskRow {
                id: row.get(0)?,
                project_id: row.get(1)?,
                category_id: row.get(2)?,
                title: row.get(3)?,
                description: row.get(4)?,
                archived: row.get::<_, i64>(5)? != 0,
                created_at_ms: row.get(6)?,
                updated_at_ms: row.get(7)?,
            });
        }
        Ok(out)
    }
}
