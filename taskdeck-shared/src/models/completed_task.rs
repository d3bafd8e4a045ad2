/// Completed-task history model
///
/// `completed_tasks` is append-only: rows are created exactly once, inside
/// the relocation transaction in [`crate::models::task::Task::apply_update`],
/// and no operation updates or deletes them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE completed_tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ NOT NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// );
/// ```

use crate::models::task::{Task, TaskPriority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A task that has been completed and moved to the history table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedTask {
    /// Unique history-row ID
    pub id: Uuid,

    /// ID of the originating active task
    pub task_id: Uuid,

    /// Title at completion time
    pub title: String,

    /// Description at completion time
    pub description: Option<String>,

    /// Due date at completion time
    pub due_date: DateTime<Utc>,

    /// Priority at completion time
    pub priority: TaskPriority,

    /// When the task transitioned to completed
    pub completed_at: DateTime<Utc>,

    /// Owning user
    pub user_id: Uuid,
}

impl CompletedTask {
    /// Inserts a history row for a task, within the relocation transaction
    ///
    /// The completion timestamp is the transaction's `NOW()`, i.e. the time
    /// of the transition. Only called from `Task::apply_update`; there is no
    /// standalone way to append history.
    pub(crate) async fn insert_from(
        tx: &mut Transaction<'_, Postgres>,
        task: &Task,
    ) -> Result<Self, sqlx::Error> {
        let completed = sqlx::query_as::<_, CompletedTask>(
            r#"
            INSERT INTO completed_tasks (task_id, title, description, due_date, priority, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, title, description, due_date, priority, completed_at, user_id
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.user_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(completed)
    }

    /// Lists a user's completed tasks, most recent first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let completed = sqlx::query_as::<_, CompletedTask>(
            r#"
            SELECT id, task_id, title, description, due_date, priority, completed_at, user_id
            FROM completed_tasks
            WHERE user_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(completed)
    }

    /// Counts a user's completed tasks
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM completed_tasks WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
