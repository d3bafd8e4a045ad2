/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (delegated to the identity provider)
/// - `tasks`: Task CRUD, dashboard aggregates, and completed-task history

pub mod auth;
pub mod health;
pub mod tasks;
