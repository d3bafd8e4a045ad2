/// Mock identity gateway for tests and local development
///
/// Keeps accounts in memory and issues deterministic tokens, so the auth
/// flows can be exercised without network access or a Cognito user pool.
///
/// # Behavior
///
/// - Verification and reset codes are always [`MockGateway::CODE`]
///   ("123456"); any other code is a mismatch, and the sentinel "000000"
///   reports an expired code.
/// - Passwords shorter than 8 characters are rejected as weak, mirroring
///   the provider's default policy.
/// - Tokens are `"<kind>-<email>"`, stable across calls.
///
/// # Example
///
/// ```
/// use taskdeck_shared::idp::{mock::MockGateway, IdentityGateway};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = MockGateway::new();
/// gateway.sign_up("user@example.com", "S3cure-pass!").await?;
/// gateway.confirm_sign_up("user@example.com", MockGateway::CODE).await?;
/// let tokens = gateway.initiate_auth("user@example.com", "S3cure-pass!").await?;
/// assert_eq!(tokens.access_token, "access-user@example.com");
/// # Ok(())
/// # }
/// ```

use crate::idp::{AuthTokens, IdentityGateway, IdpError, SignUpOutput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    user_sub: String,
    confirmed: bool,
}

/// In-memory [`IdentityGateway`] implementation
#[derive(Debug, Default)]
pub struct MockGateway {
    accounts: Mutex<HashMap<String, MockAccount>>,
}

impl MockGateway {
    /// The verification and reset code every mock account accepts
    pub const CODE: &'static str = "123456";

    /// Sentinel code that reports as expired
    pub const EXPIRED_CODE: &'static str = "000000";

    /// Creates an empty mock gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway pre-seeded with one confirmed account
    pub fn with_confirmed_user(email: &str, password: &str) -> Self {
        let gateway = Self::new();
        gateway.accounts.lock().unwrap().insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                user_sub: Uuid::new_v4().to_string(),
                confirmed: true,
            },
        );
        gateway
    }

    fn check_password_policy(password: &str) -> Result<(), IdpError> {
        if password.len() < 8 {
            return Err(IdpError::WeakPassword);
        }
        Ok(())
    }

    fn check_code(code: &str) -> Result<(), IdpError> {
        if code == Self::EXPIRED_CODE {
            return Err(IdpError::CodeExpired);
        }
        if code != Self::CODE {
            return Err(IdpError::CodeMismatch);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for MockGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, IdpError> {
        Self::check_password_policy(password)?;

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdpError::UserExists);
        }

        let user_sub = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                user_sub: user_sub.clone(),
                confirmed: false,
            },
        );

        Ok(SignUpOutput {
            user_sub,
            user_confirmed: false,
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), IdpError> {
        Self::check_code(code)?;

        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                Ok(())
            }
            None => Err(IdpError::Provider("User not found".to_string())),
        }
    }

    async fn initiate_auth(&self, email: &str, password: &str) -> Result<AuthTokens, IdpError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts.get(email).ok_or(IdpError::NotAuthorized)?;

        if !account.confirmed {
            return Err(IdpError::UserNotConfirmed);
        }
        if account.password != password {
            return Err(IdpError::NotAuthorized);
        }

        Ok(AuthTokens {
            access_token: format!("access-{}", email),
            id_token: format!("id-{}", email),
            refresh_token: Some(format!("refresh-{}", email)),
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<(), IdpError> {
        let accounts = self.accounts.lock().unwrap();
        // The real provider does not reveal whether the account exists;
        // silently succeed either way
        let _ = accounts.get(email);
        Ok(())
    }

    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdpError> {
        Self::check_code(code)?;
        Self::check_password_policy(new_password)?;

        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(email) {
            Some(account) => {
                account.password = new_password.to_string();
                Ok(())
            }
            None => Err(IdpError::Provider("User not found".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_confirm_then_login() {
        let gateway = MockGateway::new();

        let output = gateway.sign_up("a@x.com", "password1").await.unwrap();
        assert!(!output.user_confirmed);

        gateway
            .confirm_sign_up("a@x.com", MockGateway::CODE)
            .await
            .unwrap();

        let tokens = gateway.initiate_auth("a@x.com", "password1").await.unwrap();
        assert_eq!(tokens.access_token, "access-a@x.com");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-a@x.com"));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let gateway = MockGateway::new();
        gateway.sign_up("a@x.com", "password1").await.unwrap();
        let err = gateway.sign_up("a@x.com", "password1").await.unwrap_err();
        assert!(matches!(err, IdpError::UserExists));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let gateway = MockGateway::new();
        let err = gateway.sign_up("a@x.com", "short").await.unwrap_err();
        assert!(matches!(err, IdpError::WeakPassword));
    }

    #[tokio::test]
    async fn test_bad_code_and_expired_code() {
        let gateway = MockGateway::new();
        gateway.sign_up("a@x.com", "password1").await.unwrap();

        let err = gateway.confirm_sign_up("a@x.com", "999999").await.unwrap_err();
        assert!(matches!(err, IdpError::CodeMismatch));

        let err = gateway
            .confirm_sign_up("a@x.com", MockGateway::EXPIRED_CODE)
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::CodeExpired));
    }

    #[tokio::test]
    async fn test_login_before_confirmation_rejected() {
        let gateway = MockGateway::new();
        gateway.sign_up("a@x.com", "password1").await.unwrap();
        let err = gateway
            .initiate_auth("a@x.com", "password1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::UserNotConfirmed));
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let gateway = MockGateway::with_confirmed_user("a@x.com", "password1");

        let err = gateway.initiate_auth("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, IdpError::NotAuthorized));

        let err = gateway
            .initiate_auth("nobody@x.com", "password1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::NotAuthorized));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let gateway = MockGateway::with_confirmed_user("a@x.com", "password1");

        gateway.forgot_password("a@x.com").await.unwrap();
        gateway
            .confirm_forgot_password("a@x.com", MockGateway::CODE, "newpassw0rd")
            .await
            .unwrap();

        let err = gateway
            .initiate_auth("a@x.com", "password1")
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::NotAuthorized));

        gateway
            .initiate_auth("a@x.com", "newpassw0rd")
            .await
            .unwrap();
    }
}
