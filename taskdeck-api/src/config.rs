/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `AWS_REGION`: Identity provider region (default: us-west-1)
/// - `COGNITO_CLIENT_ID`: Identity provider app client ID (required)
/// - `LOGIN_MAX_ATTEMPTS`: Failed logins before lockout (default: 3)
/// - `LOGIN_LOCKOUT_SECONDS`: Lockout window (default: 300)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or "*" (default: "*")
/// - `COOKIE_SECURE`: Set the Secure flag on session cookies (default: false)
/// - `RUST_LOG`: Log level filter
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Identity provider configuration
    pub idp: IdpConfig,

    /// Login throttle configuration
    pub throttle: ThrottleConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins ("*" for permissive development mode)
    pub cors_origins: Vec<String>,

    /// Whether session cookies carry the Secure flag
    pub cookie_secure: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    /// Provider region (e.g. "us-west-1")
    pub region: String,

    /// App client ID issued by the provider
    pub client_id: String,
}

/// Login throttle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Failed attempts allowed before lockout
    pub max_attempts: u32,

    /// Lockout window in seconds
    pub lockout_seconds: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-west-1".to_string());

        let client_id = env::var("COGNITO_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("COGNITO_CLIENT_ID environment variable is required"))?;

        let max_attempts = env::var("LOGIN_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()?;

        let lockout_seconds = env::var("LOGIN_LOCKOUT_SECONDS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<i64>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                cookie_secure,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            idp: IdpConfig { region, client_id },
            throttle: ThrottleConfig {
                max_attempts,
                lockout_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                cookie_secure: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            idp: IdpConfig {
                region: "us-west-1".to_string(),
                client_id: "test-client".to_string(),
            },
            throttle: ThrottleConfig {
                max_attempts: 3,
                lockout_seconds: 300,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }
}
