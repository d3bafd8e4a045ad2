/// AWS Cognito identity gateway
///
/// Speaks the Cognito Identity Provider JSON protocol directly: every call
/// is a POST to the regional endpoint with
/// `Content-Type: application/x-amz-json-1.1` and an
/// `X-Amz-Target: AWSCognitoIdentityProviderService.<Operation>` header.
/// The five operations used here are unauthenticated client calls keyed by
/// the app client ID, so no request signing is needed.
///
/// Provider failures arrive as JSON bodies carrying a `__type` field
/// (e.g. `"UsernameExistsException"`); [`map_error_type`] translates those
/// into [`IdpError`] kinds.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::idp::{cognito::CognitoGateway, IdentityGateway};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = CognitoGateway::new("us-west-1", "3n5km...");
/// gateway.sign_up("user@example.com", "S3cure-pass!").await?;
/// # Ok(())
/// # }
/// ```

use crate::idp::{AuthTokens, IdentityGateway, IdpError, SignUpOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Cognito-backed [`IdentityGateway`] implementation
#[derive(Debug, Clone)]
pub struct CognitoGateway {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

/// Error body returned by the Cognito service
#[derive(Debug, Deserialize)]
struct CognitoErrorBody {
    /// Exception type, sometimes namespaced ("...#UsernameExistsException")
    #[serde(rename = "__type")]
    error_type: Option<String>,

    /// Human-readable message; field casing varies by operation
    #[serde(alias = "Message")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "UserSub")]
    user_sub: String,

    #[serde(rename = "UserConfirmed", default)]
    user_confirmed: bool,
}

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    access_token: String,

    #[serde(rename = "IdToken")]
    id_token: String,

    #[serde(rename = "RefreshToken")]
    refresh_token: Option<String>,
}

/// Maps a Cognito exception type to an [`IdpError`] kind
///
/// The type string may carry a namespace prefix, so matching is on the
/// suffix. Unknown types fall through to `Provider` with the service
/// message verbatim.
fn map_error_type(error_type: &str, message: Option<String>) -> IdpError {
    let name = error_type.rsplit('#').next().unwrap_or(error_type);

    match name {
        "UsernameExistsException" => IdpError::UserExists,
        "CodeMismatchException" => IdpError::CodeMismatch,
        "ExpiredCodeException" => IdpError::CodeExpired,
        "NotAuthorizedException" => IdpError::NotAuthorized,
        "InvalidPasswordException" => IdpError::WeakPassword,
        "UserNotConfirmedException" => IdpError::UserNotConfirmed,
        "LimitExceededException" | "TooManyRequestsException" => IdpError::LimitExceeded,
        _ => IdpError::Provider(message.unwrap_or_else(|| name.to_string())),
    }
}

impl CognitoGateway {
    /// Creates a gateway for the given region and app client
    pub fn new(region: &str, client_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("https://cognito-idp.{}.amazonaws.com/", region),
            client_id: client_id.to_string(),
        }
    }

    /// Creates a gateway with an explicit endpoint (cognito-local, tests)
    pub fn with_endpoint(endpoint: &str, client_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Issues one operation against the service
    ///
    /// Success responses deserialize into `T`; error responses are decoded
    /// from the `__type` body and mapped to an [`IdpError`] kind.
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<T, IdpError> {
        debug!(operation = operation, "Calling identity provider");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .json(&body)
            .send()
            .await
            .map_err(|e| IdpError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdpError::Transport(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| {
                IdpError::Transport(format!("Malformed provider response: {}", e))
            });
        }

        let error: CognitoErrorBody = serde_json::from_slice(&bytes).unwrap_or(CognitoErrorBody {
            error_type: None,
            message: None,
        });

        warn!(
            operation = operation,
            status = %status,
            error_type = ?error.error_type,
            "Identity provider call failed"
        );

        match error.error_type {
            Some(error_type) => Err(map_error_type(&error_type, error.message)),
            None => Err(IdpError::Transport(format!(
                "Provider returned {} with no error type",
                status
            ))),
        }
    }
}

#[async_trait]
impl IdentityGateway for CognitoGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, IdpError> {
        let response: SignUpResponse = self
            .call(
                "SignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "Password": password,
                    "UserAttributes": [
                        { "Name": "email", "Value": email }
                    ]
                }),
            )
            .await?;

        Ok(SignUpOutput {
            user_sub: response.user_sub,
            user_confirmed: response.user_confirmed,
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), IdpError> {
        let _: serde_json::Value = self
            .call(
                "ConfirmSignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "ConfirmationCode": code
                }),
            )
            .await?;

        Ok(())
    }

    async fn initiate_auth(&self, email: &str, password: &str) -> Result<AuthTokens, IdpError> {
        let response: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                json!({
                    "ClientId": self.client_id,
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "AuthParameters": {
                        "USERNAME": email,
                        "PASSWORD": password
                    }
                }),
            )
            .await?;

        // A challenge response (e.g. forced password change) carries no
        // AuthenticationResult; this deployment does not use challenges
        let result = response.authentication_result.ok_or_else(|| {
            IdpError::Provider("Authentication failed".to_string())
        })?;

        Ok(AuthTokens {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<(), IdpError> {
        let _: serde_json::Value = self
            .call(
                "ForgotPassword",
                json!({
                    "ClientId": self.client_id,
                    "Username": email
                }),
            )
            .await?;

        Ok(())
    }

    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdpError> {
        let _: serde_json::Value = self
            .call(
                "ConfirmForgotPassword",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "ConfirmationCode": code,
                    "Password": new_password
                }),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_error_types() {
        assert!(matches!(
            map_error_type("UsernameExistsException", None),
            IdpError::UserExists
        ));
        assert!(matches!(
            map_error_type("CodeMismatchException", None),
            IdpError::CodeMismatch
        ));
        assert!(matches!(
            map_error_type("ExpiredCodeException", None),
            IdpError::CodeExpired
        ));
        assert!(matches!(
            map_error_type("NotAuthorizedException", None),
            IdpError::NotAuthorized
        ));
        assert!(matches!(
            map_error_type("InvalidPasswordException", None),
            IdpError::WeakPassword
        ));
        assert!(matches!(
            map_error_type("UserNotConfirmedException", None),
            IdpError::UserNotConfirmed
        ));
        assert!(matches!(
            map_error_type("LimitExceededException", None),
            IdpError::LimitExceeded
        ));
    }

    #[test]
    fn test_map_namespaced_error_type() {
        let err = map_error_type(
            "com.amazonaws.cognito.identity.idp#NotAuthorizedException",
            None,
        );
        assert!(matches!(err, IdpError::NotAuthorized));
    }

    #[test]
    fn test_map_unknown_error_type_keeps_message() {
        let err = map_error_type(
            "InternalErrorException",
            Some("Something went wrong".to_string()),
        );
        match err {
            IdpError::Provider(msg) => assert_eq!(msg, "Something went wrong"),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display_messages() {
        assert_eq!(IdpError::UserExists.to_string(), "User already exists");
        assert_eq!(
            IdpError::CodeMismatch.to_string(),
            "Invalid verification code"
        );
        assert_eq!(
            IdpError::CodeExpired.to_string(),
            "Verification code expired"
        );
        assert_eq!(
            IdpError::NotAuthorized.to_string(),
            "Incorrect username or password"
        );
    }

    #[test]
    fn test_endpoint_from_region() {
        let gateway = CognitoGateway::new("us-west-1", "client");
        assert_eq!(
            gateway.endpoint,
            "https://cognito-idp.us-west-1.amazonaws.com/"
        );
    }
}
