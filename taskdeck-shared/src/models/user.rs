/// User model and database operations
///
/// Users are owned by the external identity provider; this table is a
/// denormalized local shadow keyed by email. Credentials never live here:
/// `password_hash` is a placeholder column kept for schema compatibility and
/// is always NULL in practice.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     external_id VARCHAR(64),
///     password_hash VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
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
/// // Created on signup confirmation
/// let user = User::upsert_by_email(&pool, "user@example.com", Some("sub-123")).await?;
/// println!("Shadow row: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Local shadow row for a provider-owned identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address
    ///
    /// Must be unique across all users; also the throttle key.
    pub email: String,

    /// Subject identifier issued by the external provider
    pub external_id: Option<String>,

    /// Placeholder only. Authentication is delegated to the provider;
    /// this column is never populated.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// When the shadow row was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates the shadow row for an email, or returns the existing one
    ///
    /// Called when the provider confirms a signup. Idempotent: a repeated
    /// confirmation for the same email returns the existing row and fills
    /// in `external_id` if it was previously unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn upsert_by_email(
        pool: &PgPool,
        email: &str,
        external_id: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, external_id)
            VALUES ($1, $2)
            ON CONFLICT (email)
            DO UPDATE SET external_id = COALESCE(users.external_id, EXCLUDED.external_id)
            RETURNING id, email, external_id, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(external_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }
}
