/// Task endpoints
///
/// CRUD over active tasks, the dashboard aggregates, and the completed-task
/// history listing. Updating a task whose status flips to `completed`
/// relocates it to the history table; the response is then the completed
/// record instead of the active task.
///
/// # Endpoints
///
/// - `GET    /tasks/dashboard` - Aggregate counts for a user
/// - `GET    /tasks/` - Paginated list ordered by due date
/// - `POST   /tasks/` - Create active task
/// - `GET    /tasks/:id` - Fetch one active task
/// - `PUT    /tasks/:id` - Update; may trigger relocation
/// - `DELETE /tasks/:id` - Remove active task
/// - `GET    /completed-tasks` - List completed tasks for a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::models::completed_task::CompletedTask;
use taskdeck_shared::models::task::{CreateTask, Task, TaskUpdateOutcome, UpdateTask};
use uuid::Uuid;
use validator::Validate;

/// Query parameters identifying the requesting user
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// Owning user
    pub user_id: Uuid,
}

/// Query parameters for the paginated task list
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Owning user
    pub user_id: Uuid,

    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,

    /// Page size
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Due date
    pub due_date: chrono::DateTime<chrono::Utc>,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: taskdeck_shared::models::task::TaskPriority,

    /// Owning user
    pub user_id: Uuid,
}

/// Task update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// New description
    pub description: Option<String>,

    /// New due date
    pub due_date: chrono::DateTime<chrono::Utc>,

    /// New priority
    #[serde(default)]
    pub priority: taskdeck_shared::models::task::TaskPriority,

    /// New status; `completed` triggers relocation
    pub status: taskdeck_shared::models::task::TaskStatus,
}

/// Dashboard aggregate response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Active + completed tasks
    pub total: i64,

    /// Active tasks (the active table holds only pending rows)
    pub pending: i64,

    /// Completed tasks, counted from the history table
    pub completed: i64,

    /// completed / total * 100; 0 when there are no tasks at all
    pub completion_rate: f64,
}

/// Paginated task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    /// One page of tasks, ordered by due date
    pub tasks: Vec<Task>,

    /// Total number of pages at the requested page size
    pub total_pages: i64,
}

/// Deletion confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Dashboard aggregates for a user
///
/// `total` is the sum of active and completed counts; the completion rate
/// is a percentage, 0 when the user has no tasks anywhere.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let pending = Task::count_by_user(&state.db, query.user_id).await?;
    let completed = CompletedTask::count_by_user(&state.db, query.user_id).await?;

    let total = pending + completed;
    let completion_rate = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    Ok(Json(DashboardResponse {
        total,
        pending,
        completed,
        completion_rate,
    }))
}

/// Lists completed tasks for a user, most recent first
pub async fn list_completed_tasks(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<CompletedTask>>> {
    let completed = CompletedTask::list_by_user(&state.db, query.user_id).await?;
    Ok(Json(completed))
}

/// Fetches one active task
///
/// # Errors
///
/// - `404 Not Found`: Unknown task id (including tasks already relocated
///   to the history table)
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Row offset for a 1-based page
///
/// Saturates instead of overflowing, so an absurdly large page number
/// resolves to an offset past every row and yields an empty page.
fn list_offset(page: i64, per_page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Paginated list of a user's active tasks, ordered by due date
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let offset = list_offset(page, per_page);

    let tasks = Task::list_by_user(&state.db, query.user_id, per_page, offset).await?;
    let total_tasks = Task::count_by_user(&state.db, query.user_id).await?;
    let total_pages = (total_tasks + per_page - 1) / per_page;

    Ok(Json(TaskListResponse { tasks, total_pages }))
}

/// Creates an active task
///
/// Tasks always start pending regardless of any status in the payload.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            user_id: req.user_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %task.user_id, "Task created");

    Ok(Json(task))
}

/// Updates a task, relocating it to history when status flips to completed
///
/// The relocation (insert into history + delete from active) runs in one
/// database transaction; a failure in either statement rolls the whole
/// update back. When relocation happens the response body is the completed
/// record; otherwise it is the updated active task.
///
/// # Errors
///
/// - `404 Not Found`: Unknown task id
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskUpdateOutcome>> {
    req.validate()?;

    let outcome = Task::apply_update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(outcome))
}

/// Deletes an active task
///
/// # Errors
///
/// - `404 Not Found`: Unknown task id; no store is mutated
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = Task::delete(&state.db, id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, "Task deleted");

    Ok(Json(DeleteResponse {
        message: "Task deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListQuery = serde_json::from_str(
            r#"{"user_id": "00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 10);
    }

    #[test]
    fn test_create_request_title_validation() {
        let req = CreateTaskRequest {
            title: String::new(),
            description: None,
            due_date: chrono::Utc::now(),
            priority: Default::default(),
            user_id: Uuid::new_v4(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_list_offset() {
        assert_eq!(list_offset(1, 10), 0);
        assert_eq!(list_offset(3, 10), 20);
    }

    #[test]
    fn test_list_offset_saturates_on_huge_page() {
        // A well-formed but enormous page number must not overflow; it
        // saturates and the page comes back empty
        assert_eq!(list_offset(i64::MAX, 100), i64::MAX);
        assert_eq!(list_offset(i64::MAX, 1), i64::MAX - 1);
    }

    #[test]
    fn test_total_pages_rounding() {
        // 11 tasks at 10 per page -> 2 pages; 10 -> 1; 0 -> 0
        let pages = |total: i64, per_page: i64| (total + per_page - 1) / per_page;
        assert_eq!(pages(11, 10), 2);
        assert_eq!(pages(10, 10), 1);
        assert_eq!(pages(0, 10), 0);
    }
}
