/// Task model and database operations
///
/// Active tasks live in the `tasks` table. When an update flips a task's
/// status to `completed`, the row is relocated: a history row is inserted
/// into `completed_tasks` and the active row deleted, atomically in one
/// transaction. The active table therefore only ever holds pending rows in
/// practice.
///
/// # Lifecycle
///
/// ```text
/// create ──> pending ──(update, status stays pending)──> pending
///                    ──(update, status -> completed)───> relocated to history
///                    ──(delete)─────────────────────────> gone
/// ```
///
/// The relocation decision is a pure function of the status before and after
/// the update ([`UpdateAction::for_transition`]), unit-testable without a
/// database.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'completed');
/// CREATE TYPE task_priority AS ENUM ('critical', 'high', 'medium', 'low');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{Task, CreateTask, TaskPriority, TaskStatus, UpdateTask};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Write report".to_string(),
///     description: None,
///     due_date: Utc::now(),
///     priority: TaskPriority::High,
///     user_id: Uuid::new_v4(),
/// }).await?;
///
/// // Completing the task moves it to the history table
/// let outcome = Task::apply_update(&pool, task.id, UpdateTask {
///     title: task.title.clone(),
///     description: task.description.clone(),
///     due_date: task.due_date,
///     priority: task.priority,
///     status: TaskStatus::Completed,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use crate::models::completed_task::CompletedTask;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status
///
/// `Completed` never persists in the active table: the update path relocates
/// such rows to `completed_tasks` in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open and waiting to be done
    Pending,

    /// Task is finished (transient in the active store)
    Completed,
}

impl TaskStatus {
    /// Converts status to string for logging and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Converts priority to string for logging and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Critical => "critical",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// What an update must do with the active row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Move the row to the completed-task history table
    Relocate,

    /// Update the active row in place
    UpdateInPlace,
}

impl UpdateAction {
    /// Decides the action from the status before and after an update
    ///
    /// Relocation happens if and only if the prior status was not
    /// `completed` and the new status is `completed`. Every other
    /// combination is an in-place update.
    pub fn for_transition(previous: TaskStatus, new: TaskStatus) -> Self {
        if previous != TaskStatus::Completed && new == TaskStatus::Completed {
            UpdateAction::Relocate
        } else {
            UpdateAction::UpdateInPlace
        }
    }
}

/// Task model representing an active task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// When the task is due
    pub due_date: DateTime<Utc>,

    /// Current status
    pub status: TaskStatus,

    /// Task priority
    pub priority: TaskPriority,

    /// Owning user
    pub user_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Tasks are always created pending; there is no way to create a task
/// directly in the history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Due date
    pub due_date: DateTime<Utc>,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Owning user
    pub user_id: Uuid,
}

/// Input for updating a task
///
/// Updates replace the mutable fields wholesale (original wire contract).
/// Setting `status` to `completed` triggers relocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: String,

    /// New description
    pub description: Option<String>,

    /// New due date
    pub due_date: DateTime<Utc>,

    /// New priority
    #[serde(default)]
    pub priority: TaskPriority,

    /// New status
    pub status: TaskStatus,
}

/// Result of applying an update to a task
///
/// Serialized untagged: clients receive either the updated active task or
/// the completed-task record, matching the original response shapes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskUpdateOutcome {
    /// The task stayed in the active store
    Active(Task),

    /// The task was relocated to the history table
    Completed(CompletedTask),
}

impl Task {
    /// Creates a new task in pending state
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails (including an
    /// unknown `user_id`, which violates the foreign key)
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, due_date, status, priority, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, status, priority, user_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's active tasks with pagination, ordered by due date
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, status, priority, user_id,
                   created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY due_date ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts a user's active tasks
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Applies an update, relocating the task to history on completion
    ///
    /// Runs in a single transaction:
    /// 1. Lock and read the current row (`FOR UPDATE`), capturing the
    ///    previous status.
    /// 2. Update the row in place.
    /// 3. If [`UpdateAction::for_transition`] says `Relocate`, insert the
    ///    history row (completion timestamp = now) and delete the active
    ///    row.
    ///
    /// Rollback on any error leaves the pre-update row visible; there is no
    /// state in which the task exists in both tables or in neither.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` if the task does not exist
    /// - `Ok(Some(TaskUpdateOutcome::Active))` for an in-place update
    /// - `Ok(Some(TaskUpdateOutcome::Completed))` when the task moved to
    ///   the history table
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails
    pub async fn apply_update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<TaskUpdateOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, status, priority, user_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let action = UpdateAction::for_transition(current.status, data.status);

        let updated = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                due_date = $4,
                priority = $5,
                status = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, due_date, status, priority, user_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.status)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = match action {
            UpdateAction::UpdateInPlace => TaskUpdateOutcome::Active(updated),
            UpdateAction::Relocate => {
                let completed = CompletedTask::insert_from(&mut tx, &updated).await?;

                sqlx::query("DELETE FROM tasks WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                tracing::info!(task_id = %id, user_id = %updated.user_id, "Task relocated to history");
                TaskUpdateOutcome::Completed(completed)
            }
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }

    /// Deletes an active task
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted, `false` if the task did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Critical.as_str(), "critical");
        assert_eq!(TaskPriority::High.as_str(), "high");
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
        assert_eq!(TaskPriority::Low.as_str(), "low");
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_transition_pending_to_completed_relocates() {
        assert_eq!(
            UpdateAction::for_transition(TaskStatus::Pending, TaskStatus::Completed),
            UpdateAction::Relocate
        );
    }

    #[test]
    fn test_transition_pending_to_pending_updates_in_place() {
        assert_eq!(
            UpdateAction::for_transition(TaskStatus::Pending, TaskStatus::Pending),
            UpdateAction::UpdateInPlace
        );
    }

    #[test]
    fn test_transition_completed_to_completed_updates_in_place() {
        // Already-completed rows are never relocated again
        assert_eq!(
            UpdateAction::for_transition(TaskStatus::Completed, TaskStatus::Completed),
            UpdateAction::UpdateInPlace
        );
    }

    #[test]
    fn test_transition_completed_to_pending_updates_in_place() {
        assert_eq!(
            UpdateAction::for_transition(TaskStatus::Completed, TaskStatus::Pending),
            UpdateAction::UpdateInPlace
        );
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_create_task_priority_defaults_in_json() {
        let data: CreateTask = serde_json::from_str(
            r#"{
                "title": "t",
                "due_date": "2025-01-01T00:00:00Z",
                "user_id": "00000000-0000-0000-0000-000000000001"
            }"#,
        )
        .unwrap();
        assert_eq!(data.priority, TaskPriority::Medium);
        assert!(data.description.is_none());
    }
}
