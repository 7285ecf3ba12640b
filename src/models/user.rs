use serde::{Deserialize, Serialize};

/// Authenticated identity as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Email/password pair submitted by the sign-up and sign-in forms
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token obtained from an external OAuth provider, exchanged for an identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthCredential {
    /// Provider identifier, e.g. `google.com`
    #[serde(default = "default_oauth_provider")]
    pub provider_id: String,
    pub id_token: String,
}

fn default_oauth_provider() -> String {
    "google.com".to_string()
}

/// Changes to the account's basic profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}
