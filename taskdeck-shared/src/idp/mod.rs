/// Identity provider gateway
///
/// Signup, confirmation, credential verification, and password reset are
/// delegated to a managed identity service; this module defines the adapter
/// boundary and its error taxonomy.
///
/// Provider failures are surfaced as explicit [`IdpError`] kinds and
/// translated into transport-level status codes exactly once, at the HTTP
/// boundary in the API crate.
///
/// # Modules
///
/// - `cognito`: AWS Cognito Identity Provider client (reqwest)
/// - `mock`: In-memory gateway for tests and local development
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::idp::{cognito::CognitoGateway, IdentityGateway};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = CognitoGateway::new("us-west-1", "client-id");
/// let tokens = gateway.initiate_auth("user@example.com", "hunter22!").await?;
/// println!("access token: {}", tokens.access_token);
/// # Ok(())
/// # }
/// ```

pub mod cognito;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors surfaced by the identity provider
///
/// Display strings are the messages returned to clients, so they are written
/// for humans, not logs.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdpError {
    /// An account already exists for the email
    #[error("User already exists")]
    UserExists,

    /// The supplied verification code does not match
    #[error("Invalid verification code")]
    CodeMismatch,

    /// The verification code has expired
    #[error("Verification code expired")]
    CodeExpired,

    /// Credentials did not verify
    #[error("Incorrect username or password")]
    NotAuthorized,

    /// Password rejected by the provider's policy
    #[error("Password does not meet the security requirements")]
    WeakPassword,

    /// Account exists but signup was never confirmed
    #[error("User is not confirmed")]
    UserNotConfirmed,

    /// Provider-side rate limit (e.g. too many reset requests)
    #[error("Attempt limit exceeded, please try again later")]
    LimitExceeded,

    /// Any other provider-reported failure, message verbatim
    #[error("{0}")]
    Provider(String),

    /// The provider could not be reached or returned garbage
    #[error("Identity provider request failed: {0}")]
    Transport(String),
}

/// Result of a successful signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpOutput {
    /// Provider-issued subject identifier for the new account
    pub user_sub: String,

    /// Whether the account is already confirmed (false until the emailed
    /// code is submitted)
    pub user_confirmed: bool,
}

/// Tokens issued on successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Access token (1-hour cookie)
    pub access_token: String,

    /// Identity token (1-hour cookie)
    pub id_token: String,

    /// Refresh token (24-hour cookie); absent on some auth flows
    pub refresh_token: Option<String>,
}

/// External identity service contract
///
/// Consumed, never reimplemented: the five operations mirror the provider's
/// unauthenticated client API. Implementations must map provider failures to
/// the matching [`IdpError`] kind so the HTTP boundary can translate them.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Registers a new identity; the provider emails a verification code
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, IdpError>;

    /// Confirms a signup with the emailed code
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), IdpError>;

    /// Verifies credentials and issues session tokens
    async fn initiate_auth(&self, email: &str, password: &str) -> Result<AuthTokens, IdpError>;

    /// Starts the password-reset flow; the provider emails a reset code
    async fn forgot_password(&self, email: &str) -> Result<(), IdpError>;

    /// Completes a password reset with the emailed code
    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdpError>;
}
