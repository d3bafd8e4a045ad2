/// Database models for Taskdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Local shadow rows for provider-owned identities
/// - `task`: Active tasks and the completion lifecycle
/// - `completed_task`: Append-only history of completed tasks
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::User;
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::upsert_by_email(&pool, "user@example.com", None).await?;
/// # Ok(())
/// # }
/// ```

pub mod completed_task;
pub mod task;
pub mod user;
