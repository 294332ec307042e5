//! Sign-in collaborator used by the bridge
//!
//! The bridge never performs the token exchange itself. It calls an
//! [`Authenticator`] and relays whatever comes back into the embedded page.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tokens and profile returned by a successful sign-in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Profile object as returned by the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl AuthTokens {
    /// Create an empty token set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builder method: set the ID token
    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    /// Builder method: set the user profile
    pub fn with_user(mut self, user: serde_json::Value) -> Self {
        self.user = Some(user);
        self
    }

    /// Whether an access or ID token is present
    pub fn has_token(&self) -> bool {
        self.access_token.is_some() || self.id_token.is_some()
    }
}

/// Any way a sign-in can fail. All of them reach the page as one error string.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Sign-in was cancelled")]
    Cancelled,

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Sign-in completed without a token")]
    MissingToken,

    #[error("Failed to fetch user profile: {0}")]
    Profile(String),

    #[error("Sign-in is not configured")]
    Unconfigured,
}

pub type AuthResult = std::result::Result<AuthTokens, AuthError>;

/// Performs the interactive sign-in against the identity provider
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self) -> AuthResult;
}

/// Collapse a provider result: a success without any token is a failure
pub fn settle(result: AuthResult) -> AuthResult {
    match result {
        Ok(tokens) if !tokens.has_token() => Err(AuthError::MissingToken),
        other => other,
    }
}

/// Authenticator for hosts with no identity provider wired up
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAuthenticator;

#[async_trait]
impl Authenticator for UnconfiguredAuthenticator {
    async fn sign_in(&self) -> AuthResult {
        Err(AuthError::Unconfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_serialize_camel_case() {
        let tokens = AuthTokens::new()
            .with_access_token("T")
            .with_id_token("I")
            .with_user(serde_json::json!({"email": "a@b.c"}));

        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "accessToken": "T",
                "idToken": "I",
                "user": {"email": "a@b.c"}
            })
        );
    }

    #[test]
    fn test_missing_fields_skipped() {
        let json = serde_json::to_value(AuthTokens::new().with_access_token("T")).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "T"}));
    }

    #[test]
    fn test_settle_requires_a_token() {
        assert_eq!(settle(Ok(AuthTokens::new())), Err(AuthError::MissingToken));

        let user_only = AuthTokens::new().with_user(serde_json::json!({"name": "x"}));
        assert_eq!(settle(Ok(user_only)), Err(AuthError::MissingToken));

        let tokens = AuthTokens::new().with_id_token("I");
        assert_eq!(settle(Ok(tokens.clone())), Ok(tokens));
        assert_eq!(settle(Err(AuthError::Cancelled)), Err(AuthError::Cancelled));
    }

    #[tokio::test]
    async fn test_unconfigured_fails() {
        let result = UnconfiguredAuthenticator.sign_in().await;
        assert_eq!(result, Err(AuthError::Unconfigured));
    }
}
