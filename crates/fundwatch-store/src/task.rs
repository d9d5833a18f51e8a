use crate::codec::{blob, id_col, json_col, key_cols, opt_json_col, opt_ts_col, parsed_col, ts_col};
use crate::{SqliteStore, StoreError};
use fundwatch_domain::traits::TaskStore;
use fundwatch_domain::{
    AssigneeChange, EntityId, FieldKey, Priority, TaskFilter, TaskId, TaskKind, TaskStatus,
    TaskTransition, VerificationTask,
};
use rusqlite::{params, OptionalExtension, Row, ToSql};

const TASK_COLUMNS: &str = "id, kind, subject, entity_id, field, round, priority, status, \
                            created_at, due_at, assignee, resolution_notes, chosen_value, \
                            resolved_at";

const ORDER: &str = " ORDER BY due_at, priority_rank, created_at, id";

fn task_row(row: &Row<'_>) -> rusqlite::Result<VerificationTask> {
    Ok(VerificationTask {
        id: TaskId::from_value(id_col(row, 0)?),
        kind: parsed_col(row, 1, TaskKind::parse)?,
        subject: json_col(row, 2)?,
        entity_id: EntityId::from_value(id_col(row, 3)?),
        key: key_cols(row, 4)?,
        priority: parsed_col(row, 6, Priority::parse)?,
        status: parsed_col(row, 7, TaskStatus::parse)?,
        created_at: ts_col(row, 8)?,
        due_at: ts_col(row, 9)?,
        assignee: row.get(10)?,
        resolution_notes: row.get(11)?,
        chosen_value: opt_json_col(row, 12)?,
        resolved_at: opt_ts_col(row, 13)?,
    })
}

impl TaskStore for SqliteStore {
    fn insert_task(&mut self, task: &VerificationTask) -> Result<(), Self::Error> {
        let id_bytes = blob(task.id.value());

        let exists = self
            .conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::Duplicate(format!("task {}", task.id)));
        }

        let chosen_value = task
            .chosen_value
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO tasks (id, kind, subject, entity_id, field, round, priority,
                                priority_rank, status, created_at, due_at, assignee,
                                resolution_notes, chosen_value, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                &id_bytes,
                task.kind.as_str(),
                serde_json::to_string(&task.subject)?,
                blob(task.entity_id.value()),
                task.key.field.as_str(),
                task.key.round_label(),
                task.priority.as_str(),
                task.priority.rank(),
                task.status.as_str(),
                task.created_at as i64,
                task.due_at as i64,
                &task.assignee,
                &task.resolution_notes,
                chosen_value,
                task.resolved_at.map(|t| t as i64),
            ],
        )?;

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> Result<Option<VerificationTask>, Self::Error> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![blob(id.value())],
                task_row,
            )
            .optional()?;
        Ok(task)
    }

    fn open_task_for(
        &self,
        entity: EntityId,
        key: &FieldKey,
        kind: TaskKind,
    ) -> Result<Option<VerificationTask>, Self::Error> {
        let task = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM tasks
                     WHERE entity_id = ?1 AND field = ?2 AND round = ?3 AND kind = ?4
                       AND status IN ('pending', 'in_review'){} LIMIT 1",
                    TASK_COLUMNS, ORDER
                ),
                params![
                    blob(entity.value()),
                    key.field.as_str(),
                    key.round_label(),
                    kind.as_str()
                ],
                task_row,
            )
            .optional()?;
        Ok(task)
    }

    fn transition_task(
        &mut self,
        id: TaskId,
        transition: &TaskTransition,
    ) -> Result<bool, Self::Error> {
        if transition.expected.is_empty() {
            return Ok(false);
        }

        let mut sql = String::from(
            "UPDATE tasks SET status = ?,
                 resolution_notes = COALESCE(?, resolution_notes),
                 chosen_value = COALESCE(?, chosen_value),
                 resolved_at = COALESCE(?, resolved_at)",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![
            Box::new(transition.to.as_str()),
            Box::new(transition.resolution_notes.clone()),
            Box::new(
                transition
                    .chosen_value
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
            ),
            Box::new(transition.resolved_at.map(|t| t as i64)),
        ];

        match &transition.assignee {
            AssigneeChange::Keep => {}
            AssigneeChange::Set(assignee) => {
                sql.push_str(", assignee = ?");
                params.push(Box::new(assignee.clone()));
            }
            AssigneeChange::Clear => sql.push_str(", assignee = NULL"),
        }

        // Compare-and-set: the status guard makes the update a no-op when
        // another writer moved the task first
        let placeholders = vec!["?"; transition.expected.len()].join(", ");
        sql.push_str(&format!(" WHERE id = ? AND status IN ({})", placeholders));
        params.push(Box::new(blob(id.value())));
        for status in &transition.expected {
            params.push(Box::new(status.as_str()));
        }

        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = self.conn.execute(&sql, &param_refs[..])?;

        Ok(changed == 1)
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<VerificationTask>, Self::Error> {
        let mut sql = format!("SELECT {} FROM tasks WHERE 1=1", TASK_COLUMNS);
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if filter.open_only {
            sql.push_str(" AND status IN ('pending', 'in_review')");
        }

        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            params.push(Box::new(priority.as_str()));
        }

        if let Some(kind) = filter.kind {
            sql.push_str(" AND kind = ?");
            params.push(Box::new(kind.as_str()));
        }

        if let Some(entity) = filter.entity_id {
            sql.push_str(" AND entity_id = ?");
            params.push(Box::new(blob(entity.value())));
        }

        if let Some(due_before) = filter.due_before {
            sql.push_str(" AND due_at < ?");
            params.push(Box::new(due_before as i64));
        }

        sql.push_str(ORDER);

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let tasks = stmt
            .query_map(&param_refs[..], task_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }
}
