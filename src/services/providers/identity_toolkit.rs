//! Identity Toolkit REST provider
//!
//! Email/password and OAuth sign-in against the `accounts:*` endpoints. The provider keeps
//! the session token in memory and publishes the signed-in identity through [`AuthState`].
//!
//! API Flow:
//! 1. Sign up: /v1/accounts:signUp → localId + idToken
//! 2. Sign in: /v1/accounts:signInWithPassword or /v1/accounts:signInWithIdp
//! 3. Profile changes: /v1/accounts:update with the current idToken

use crate::{
    error::{AppError, AppResult, AuthError},
    models::{AccountUpdate, OAuthCredential, User},
    services::providers::{AuthListener, AuthState, AuthSubscription, IdentityProvider},
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

pub struct IdentityToolkitProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    oauth_request_uri: String,
    /// idToken of the signed-in session
    id_token: RwLock<Option<String>>,
    auth: AuthState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: String,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<&'a str>,
    return_secure_token: bool,
}

/// Response shared by the sign-up, sign-in and update endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<&AccountResponse> for User {
    fn from(account: &AccountResponse) -> Self {
        User {
            uid: account.local_id.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone().filter(|name| !name.is_empty()),
            photo_url: account.photo_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

impl IdentityToolkitProvider {
    pub fn new(api_key: String, api_url: String, oauth_request_uri: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            oauth_request_uri,
            id_token: RwLock::new(None),
            auth: AuthState::new(),
        }
    }

    /// POSTs `body` to `accounts:{method}` and decodes the response
    async fn call<B, R>(&self, method: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{}", self.api_url, method);

        tracing::debug!(method = %method, "Calling identity provider");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(method = %method, error = %e, "Identity provider unreachable");
                AuthError::NetworkRequestFailed
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = parse_error_code(&body);
            tracing::warn!(
                method = %method,
                status = %status,
                code = ?code,
                "Identity provider rejected request"
            );
            return Err(match code {
                Some(code) => AuthError::from_provider_code(&code).into(),
                None => AppError::ExternalApi(format!("Identity provider returned status {}", status)),
            });
        }

        Ok(response.json().await?)
    }

    /// Stores the session from a sign-in response and publishes the identity
    async fn establish(&self, account: AccountResponse) -> AppResult<User> {
        let id_token = account.id_token.clone().ok_or_else(|| {
            AppError::ExternalApi("Identity provider response missing idToken".to_string())
        })?;
        let user = User::from(&account);

        *self.id_token.write().await = Some(id_token);
        self.auth.set(Some(user.clone()));

        tracing::info!(uid = %user.uid, "Signed in");
        Ok(user)
    }
}

fn parse_error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    fn subscribe(&self, listener: AuthListener) -> AuthSubscription {
        self.auth.subscribe(listener)
    }

    fn current_user(&self) -> Option<User> {
        self.auth.current()
    }

    async fn id_token(&self) -> Option<String> {
        self.id_token.read().await.clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<User> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account: AccountResponse = self.call("signUp", &request).await?;
        self.establish(account).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account: AccountResponse = self.call("signInWithPassword", &request).await?;
        self.establish(account).await
    }

    async fn sign_in_with_oauth(&self, credential: &OAuthCredential) -> AppResult<User> {
        let request = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                credential.id_token, credential.provider_id
            ),
            request_uri: self.oauth_request_uri.clone(),
            return_secure_token: true,
            return_idp_credential: true,
        };
        let account: AccountResponse = self.call("signInWithIdp", &request).await?;
        self.establish(account).await
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.id_token.write().await.take();
        self.auth.set(None);
        tracing::info!("Signed out");
        Ok(())
    }

    async fn update_account(&self, update: &AccountUpdate) -> AppResult<User> {
        let id_token = self
            .id_token()
            .await
            .ok_or_else(|| AppError::Unauthorized("No authenticated user".to_string()))?;

        let request = UpdateRequest {
            id_token: &id_token,
            display_name: update.display_name.as_deref(),
            photo_url: update.photo_url.as_deref(),
            return_secure_token: true,
        };
        let account: AccountResponse = self.call("update", &request).await?;
        let user = User::from(&account);
        self.auth.set(Some(user.clone()));

        Ok(user)
    }

    fn name(&self) -> &'static str {
        "identity_toolkit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_code() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        assert_eq!(parse_error_code(body), Some("EMAIL_EXISTS".to_string()));
        assert_eq!(parse_error_code("not json"), None);
    }

    #[test]
    fn test_account_response_to_user() {
        let account: AccountResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#SignupNewUserResponse",
                "localId": "abc123",
                "email": "mina@example.com",
                "displayName": "",
                "idToken": "token",
                "refreshToken": "refresh"
            }"#,
        )
        .unwrap();

        let user = User::from(&account);
        assert_eq!(user.uid, "abc123");
        assert_eq!(user.email.as_deref(), Some("mina@example.com"));
        assert_eq!(user.display_name, None);
        assert_eq!(user.photo_url, None);
    }

    #[tokio::test]
    async fn test_unreachable_provider_maps_to_network_error() {
        let provider = IdentityToolkitProvider::new(
            "key".to_string(),
            "http://127.0.0.1:1".to_string(),
            "http://localhost".to_string(),
        );

        let result = provider.sign_in("mina@example.com", "secret").await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::NetworkRequestFailed))
        ));
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_session() {
        let provider = IdentityToolkitProvider::new(
            "key".to_string(),
            "http://127.0.0.1:1".to_string(),
            "http://localhost".to_string(),
        );
        provider.sign_out().await.unwrap();
        assert!(provider.id_token().await.is_none());
    }

    #[tokio::test]
    async fn test_established_session_exposes_id_token() {
        let provider = IdentityToolkitProvider::new(
            "key".to_string(),
            "http://127.0.0.1:1".to_string(),
            "http://localhost".to_string(),
        );
        let account: AccountResponse = serde_json::from_str(
            r#"{"localId": "abc123", "idToken": "token", "refreshToken": "refresh"}"#,
        )
        .unwrap();

        let user = provider.establish(account).await.unwrap();
        assert_eq!(user.uid, "abc123");
        assert_eq!(provider.id_token().await.as_deref(), Some("token"));

        provider.sign_out().await.unwrap();
        assert!(provider.id_token().await.is_none());
    }
}
