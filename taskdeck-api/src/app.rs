/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::AppState, config::Config};
/// use taskdeck_shared::idp::cognito::CognitoGateway;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let idp = Arc::new(CognitoGateway::new(&config.idp.region, &config.idp.client_id));
/// let state = AppState::new(pool, config, idp);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::auth::throttle::{LoginThrottle, ThrottleConfig};
use taskdeck_shared::idp::IdentityGateway;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// External identity provider gateway
    pub idp: Arc<dyn IdentityGateway>,

    /// Login-attempt throttle, process lifetime only
    pub throttle: Arc<LoginThrottle>,
}

impl AppState {
    /// Creates new application state
    ///
    /// The login throttle is built from the configuration and owned here;
    /// its state vanishes on restart.
    pub fn new(db: PgPool, config: Config, idp: Arc<dyn IdentityGateway>) -> Self {
        let throttle = LoginThrottle::new(ThrottleConfig {
            max_attempts: config.throttle.max_attempts,
            lockout_seconds: config.throttle.lockout_seconds,
        });

        Self {
            db,
            config: Arc::new(config),
            idp,
            throttle: Arc::new(throttle),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                  # Health check
/// ├── /auth/                   # Authentication (delegated to provider)
/// │   ├── POST /signup
/// │   ├── POST /confirm
/// │   ├── POST /login          # consults the login throttle
/// │   ├── GET  /session
/// │   ├── POST /logout
/// │   ├── POST /forgot-password
/// │   └── POST /reset-password
/// ├── /tasks/                  # Task CRUD
/// │   ├── GET    /dashboard
/// │   ├── GET    /
/// │   ├── POST   /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id          # may relocate the task to history
/// │   └── DELETE /:id
/// └── /completed-tasks         # Append-only history
/// ```
///
/// # Middleware Stack
///
/// 1. Request tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/confirm", post(routes::auth::confirm))
        .route("/login", post(routes::auth::login))
        .route("/session", get(routes::auth::session))
        .route("/logout", post(routes::auth::logout))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    let task_routes = Router::new()
        .route("/dashboard", get(routes::tasks::dashboard))
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .route("/completed-tasks", get(routes::tasks::list_completed_tasks))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
